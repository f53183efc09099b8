//! String utilities for the domain layer.

/// Truncate a string to at most `max_chars` characters, replacing the tail
/// with `...` when it is cut.
///
/// Counts Unicode scalar values rather than bytes, so multi-byte text is
/// never split mid-character.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}
