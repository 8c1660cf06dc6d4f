//! Common utility functions used across modules.

/// Truncate a string to at most `max_len` bytes, adding "..." if truncated.
///
/// Never splits a multi-byte character.
///
/// # Examples
/// ```
/// use ipset_responder::utils::truncate;
/// assert_eq!(truncate("short", 10), "short");
/// assert_eq!(truncate("this is long", 10), "this is...");
/// ```
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    if max_len <= 3 {
        return "...".to_string();
    }

    let mut end = max_len - 3;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("this is a long string", 10), "this is...");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("test", 3), "...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // 'é' is two bytes; the cut must fall before it
        assert_eq!(truncate("aaaaaaé-bbbb", 10), "aaaaaa...");
        assert_eq!(truncate("ééééé", 6), "é...");
    }
}
