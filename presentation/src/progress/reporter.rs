//! Progress reporting for council execution

use colored::Colorize;
use council_application::ProgressNotifier;
use council_domain::{Model, Stage};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// Reports progress during a council run with progress bars
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            stage_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .map(|style| style.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn stage_short_name(stage: &Stage) -> &'static str {
        match stage {
            Stage::Collect => "Stage 1",
            Stage::Synthesize => "Stage 3",
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_stage_start(&self, stage: &Stage, total_tasks: usize) {
        let pb = self.multi.add(ProgressBar::new(total_tasks as u64));
        pb.set_style(Self::stage_style());
        pb.set_prefix(stage.display_name().to_string());
        pb.set_message("Starting...");

        if let Ok(mut slot) = self.stage_bar.lock() {
            *slot = Some(pb);
        }
    }

    fn on_model_complete(&self, _stage: &Stage, model: &Model, success: bool) {
        let Ok(slot) = self.stage_bar.lock() else {
            return;
        };
        if let Some(pb) = slot.as_ref() {
            let status = if success {
                format!("{} {}", "v".green(), model)
            } else {
                format!("{} {}", "x".red(), model)
            };
            pb.set_message(status);
            pb.inc(1);
        }
    }

    fn on_stage_complete(&self, stage: &Stage) {
        let Ok(mut slot) = self.stage_bar.lock() else {
            return;
        };
        if let Some(pb) = slot.take() {
            let name = Self::stage_short_name(stage);
            pb.finish_with_message(format!("{} complete!", name.green()));
        }
    }
}

/// Simple text-based progress (no bars), written to stderr
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_stage_start(&self, stage: &Stage, total_tasks: usize) {
        eprintln!(
            "{} {} ({} tasks)",
            "->".cyan(),
            stage.display_name().bold(),
            total_tasks
        );
    }

    fn on_model_complete(&self, _stage: &Stage, model: &Model, success: bool) {
        if success {
            eprintln!("  {} {}", "v".green(), model);
        } else {
            eprintln!("  {} {} (failed)", "x".red(), model);
        }
    }

    fn on_stage_complete(&self, _stage: &Stage) {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(id: &str) -> Model {
        Model::new(id).unwrap()
    }

    #[test]
    fn test_bar_is_released_when_stage_completes() {
        let reporter = ProgressReporter::new();
        reporter.on_stage_start(&Stage::Collect, 2);
        reporter.on_model_complete(&Stage::Collect, &model("a/one"), true);
        reporter.on_model_complete(&Stage::Collect, &model("b/two"), false);

        assert_eq!(
            reporter.stage_bar.lock().unwrap().as_ref().map(|pb| pb.position()),
            Some(2)
        );

        reporter.on_stage_complete(&Stage::Collect);
        assert!(reporter.stage_bar.lock().unwrap().is_none());
    }

    #[test]
    fn test_completion_without_stage_is_ignored() {
        let reporter = ProgressReporter::new();
        reporter.on_model_complete(&Stage::Synthesize, &model("c/chair"), true);
        reporter.on_stage_complete(&Stage::Synthesize);
        assert!(reporter.stage_bar.lock().unwrap().is_none());
    }
}
