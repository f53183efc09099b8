//! Conversation title cleanup

use crate::core::string::truncate_chars;

/// Title used whenever generation fails or produces nothing usable.
pub const FALLBACK_TITLE: &str = "New Conversation";

/// Longest title kept, ellipsis included.
pub const MAX_TITLE_CHARS: usize = 50;

/// Normalize a model-generated title.
///
/// Trims whitespace, strips surrounding single/double quotes and truncates
/// to [`MAX_TITLE_CHARS`] (47 characters plus `...`). Blank results fall
/// back to [`FALLBACK_TITLE`].
pub fn clean_title(raw: &str) -> String {
    let title = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    if title.is_empty() {
        return FALLBACK_TITLE.to_string();
    }
    truncate_chars(title, MAX_TITLE_CHARS)
}
