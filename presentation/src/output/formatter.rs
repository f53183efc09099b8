//! Output formatter trait

use council_application::SendMessageOutput;

/// Trait for formatting the result of one council turn
pub trait OutputFormatter {
    /// Format the complete result (Stage 1 answers and the synthesis)
    fn format(&self, question: &str, result: &SendMessageOutput) -> String;

    /// Format as JSON
    fn format_json(&self, question: &str, result: &SendMessageOutput) -> String;

    /// Format synthesis only (concise output)
    fn format_synthesis_only(&self, question: &str, result: &SendMessageOutput) -> String;
}
