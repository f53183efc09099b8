//! Console output formatter for council results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_application::SendMessageOutput;
use council_domain::{OutputFormat, StageThreeResult};
use serde::Serialize;

/// JSON document printed by `--output json`
#[derive(Serialize)]
struct JsonReport<'a> {
    question: &'a str,
    #[serde(flatten)]
    result: &'a SendMessageOutput,
}

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format according to the selected output format
    pub fn render(format: OutputFormat, question: &str, result: &SendMessageOutput) -> String {
        match format {
            OutputFormat::Full => Self::format(question, result),
            OutputFormat::Synthesis => Self::format_synthesis_only(question, result),
            OutputFormat::Json => Self::format_json(question, result),
        }
    }

    /// Format the complete council result
    pub fn format(question: &str, result: &SendMessageOutput) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("LLM Council Results"));
        output.push('\n');

        if let Some(title) = &result.title {
            output.push_str(&format!("{} {}\n", "Title:".cyan().bold(), title));
        }
        output.push_str(&format!("{} {}\n\n", "Question:".cyan().bold(), question));

        let models: Vec<&str> = result.stage1.iter().map(|r| r.model.as_str()).collect();
        output.push_str(&format!(
            "{} {}\n",
            "Answered by:".cyan().bold(),
            if models.is_empty() {
                "none".red().to_string()
            } else {
                models.join(", ")
            }
        ));

        if !result.context.is_empty() {
            output.push_str(&Self::section_header("Context"));
            for doc in &result.context {
                output.push_str(&format!("  * {}\n", doc.source));
            }
        }

        output.push_str(&Self::section_header("Stage 1: Individual Responses"));
        for response in &result.stage1 {
            output.push_str(&format!(
                "\n{}\n{}\n",
                format!("── {} ──", response.model).yellow().bold(),
                response.response
            ));
        }

        output.push_str(&Self::section_header("Stage 3: Final Synthesis"));
        output.push_str(&format!(
            "\n{}\n\n{}\n",
            Self::chairman_label(&result.stage3),
            result.stage3.response
        ));

        output.push_str(&Self::footer());

        output
    }

    /// Format as JSON
    pub fn format_json(question: &str, result: &SendMessageOutput) -> String {
        serde_json::to_string_pretty(&JsonReport { question, result })
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// Format synthesis only (concise output)
    pub fn format_synthesis_only(question: &str, result: &SendMessageOutput) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{}\n\n",
            "=== LLM Council Conclusion ===".cyan().bold()
        ));

        output.push_str(&format!("{} {}\n\n", "Q:".bold(), question));

        output.push_str(&format!(
            "{} {}\n\n",
            "Models consulted:".dimmed(),
            result
                .stage1
                .iter()
                .map(|r| r.model.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));

        if result.stage3.is_error() {
            output.push_str(&result.stage3.response.red().to_string());
        } else {
            output.push_str(&result.stage3.response);
        }
        output.push('\n');

        output
    }

    fn chairman_label(stage3: &StageThreeResult) -> String {
        if stage3.is_error() {
            "Chairman: unavailable".red().bold().to_string()
        } else {
            format!("Chairman: {}", stage3.model).yellow().bold().to_string()
        }
    }

    pub(crate) fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    pub(crate) fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format(&self, question: &str, result: &SendMessageOutput) -> String {
        Self::format(question, result)
    }

    fn format_json(&self, question: &str, result: &SendMessageOutput) -> String {
        Self::format_json(question, result)
    }

    fn format_synthesis_only(&self, question: &str, result: &SendMessageOutput) -> String {
        Self::format_synthesis_only(question, result)
    }
}
