//! Printer for streamed council events

use crate::output::console::ConsoleFormatter;
use colored::Colorize;
use council_domain::CouncilEvent;
use futures::{Stream, StreamExt};
use std::io::{self, Write};
use tracing::debug;

/// What a streamed turn ended with
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamSummary {
    /// Chairman text as it was printed
    pub synthesis: String,
    pub title: Option<String>,
    /// Set when the sequence ended with an `error` event
    pub error: Option<String>,
    /// True once `complete` was seen
    pub completed: bool,
}

/// Prints council events to a writer as they arrive
///
/// Stage 3 chunks are written without buffering so the synthesis appears
/// incrementally; every other event becomes a short status line.
pub struct EventPrinter {
    show_stage1: bool,
    show_status: bool,
}

impl EventPrinter {
    pub fn new() -> Self {
        Self {
            show_stage1: false,
            show_status: true,
        }
    }

    /// Print every Stage 1 answer before the synthesis
    pub fn with_stage1(mut self, show: bool) -> Self {
        self.show_stage1 = show;
        self
    }

    /// Print status lines for stage boundaries
    pub fn with_status(mut self, show: bool) -> Self {
        self.show_status = show;
        self
    }

    /// Drain `events`, writing each one to `out`.
    pub async fn print<S, W>(&self, events: S, out: &mut W) -> io::Result<StreamSummary>
    where
        S: Stream<Item = CouncilEvent>,
        W: Write,
    {
        let mut summary = StreamSummary::default();
        futures::pin_mut!(events);

        while let Some(event) = events.next().await {
            debug!(event = event.kind(), "Council event");
            self.print_event(&event, out, &mut summary)?;
            if event.is_terminal() {
                break;
            }
        }
        out.flush()?;

        Ok(summary)
    }

    fn print_event<W: Write>(
        &self,
        event: &CouncilEvent,
        out: &mut W,
        summary: &mut StreamSummary,
    ) -> io::Result<()> {
        match event {
            CouncilEvent::Context { data } => {
                if self.show_status {
                    let sources: Vec<&str> = data.iter().map(|d| d.source.as_str()).collect();
                    writeln!(out, "{} {}", "Context:".dimmed(), sources.join(", "))?;
                }
            }
            CouncilEvent::Stage1Start => {
                if self.show_status {
                    writeln!(out, "{}", "Collecting answers...".dimmed())?;
                }
            }
            CouncilEvent::Stage1Complete { data } => {
                if self.show_stage1 {
                    out.write_all(
                        ConsoleFormatter::section_header("Stage 1: Individual Responses")
                            .as_bytes(),
                    )?;
                    for result in data {
                        writeln!(
                            out,
                            "\n{}\n{}",
                            format!("── {} ──", result.model).yellow().bold(),
                            result.response
                        )?;
                    }
                } else if self.show_status {
                    writeln!(
                        out,
                        "{} {} answered",
                        "Stage 1:".dimmed(),
                        data.len()
                    )?;
                }
            }
            CouncilEvent::Stage3Start => {
                if self.show_stage1 {
                    out.write_all(
                        ConsoleFormatter::section_header("Stage 3: Final Synthesis").as_bytes(),
                    )?;
                }
                writeln!(out)?;
            }
            CouncilEvent::Stage3Chunk { chunk } => {
                out.write_all(chunk.as_bytes())?;
                out.flush()?;
                summary.synthesis.push_str(chunk);
            }
            CouncilEvent::Stage3Complete { data } => {
                if summary.synthesis.is_empty() {
                    // Nothing streamed: the result is a placeholder
                    out.write_all(data.response.as_bytes())?;
                    summary.synthesis.push_str(&data.response);
                }
                writeln!(out)?;
            }
            CouncilEvent::TitleComplete { data } => {
                if self.show_status {
                    writeln!(out, "\n{} {}", "Title:".dimmed(), data.title)?;
                }
                summary.title = Some(data.title.clone());
            }
            CouncilEvent::Complete => {
                summary.completed = true;
            }
            CouncilEvent::Error { message } => {
                writeln!(out, "\n{} {}", "Error:".red().bold(), message)?;
                summary.error = Some(message.clone());
            }
        }
        Ok(())
    }
}

impl Default for EventPrinter {
    fn default() -> Self {
        Self::new()
    }
}
