//! Text processing utilities.

/// Length in Unicode scalar values, the unit context budgets are expressed in.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Truncate `s` to at most `max_len` characters, appending `"..."` if
/// truncation occurred. Used for log previews of model output.
///
/// `max_len <= 3` yields up to `max_len` dots.
pub fn truncate_with_ellipsis(s: &str, max_len: usize) -> String {
    if char_len(s) <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return ".".repeat(max_len);
    }

    let byte_offset = s
        .char_indices()
        .nth(max_len - 3)
        .map(|(i, _)| i)
        .unwrap_or(s.len());

    format!("{}...", &s[..byte_offset])
}
