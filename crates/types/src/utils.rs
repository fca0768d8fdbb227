//! Utility functions and helpers

/// Encode a string as a JSON string literal, quotes included
///
/// This is the form a define-style plugin expects: the value is substituted
/// verbatim into the bundled source.
pub fn json_literal(value: &str) -> String {
    // Serializing a &str cannot fail
    serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value))
}

/// Join a dotted parent path and a key
pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

/// Truncate long values for logging
pub fn truncate_for_logging(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max_len).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_literal() {
        assert_eq!(json_literal("development"), "\"development\"");
        assert_eq!(json_literal("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "output"), "output");
        assert_eq!(join_path("module", "rules"), "module.rules");
    }

    #[test]
    fn test_truncate_for_logging() {
        assert_eq!(truncate_for_logging("short", 10), "short");
        assert_eq!(truncate_for_logging("verylongstring", 10), "verylongst...");
    }
}
