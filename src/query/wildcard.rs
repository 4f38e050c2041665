//! Wildcard pattern compilation.
//!
//! Supports the following wildcards:
//! - `*` matches zero or more characters
//! - `?` matches exactly one character
//! - `\*` and `\?` match literal `*` and `?` characters

use regex::Regex;

use crate::error::{Result, SagittaError};

/// Compile a wildcard pattern into an anchored regex.
pub fn compile_wildcard(pattern: &str) -> Result<Regex> {
    let mut regex_pattern = String::from("^");

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped @ ('*' | '?')) => {
                    regex_pattern.push('\\');
                    regex_pattern.push(escaped);
                }
                Some(other) => regex_pattern.push_str(&regex::escape(&other.to_string())),
                None => {
                    return Err(SagittaError::invalid_predicate(
                        "Wildcard pattern ends with a dangling escape",
                    ));
                }
            },
            '*' => regex_pattern.push_str(".*"),
            '?' => regex_pattern.push('.'),
            other => regex_pattern.push_str(&regex::escape(&other.to_string())),
        }
    }

    regex_pattern.push('$');

    Regex::new(&regex_pattern)
        .map_err(|e| SagittaError::invalid_predicate(format!("Invalid wildcard pattern: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_any_run() {
        let regex = compile_wildcard("香*").unwrap();
        assert!(regex.is_match("香蕉"));
        assert!(regex.is_match("香水"));
        assert!(regex.is_match("香"));
        assert!(!regex.is_match("苹果"));
    }

    #[test]
    fn test_question_mark_matches_exactly_one_char() {
        let regex = compile_wildcard("香?").unwrap();
        assert!(regex.is_match("香蕉"));
        assert!(!regex.is_match("香"));
        assert!(!regex.is_match("香蕉味"));
    }

    #[test]
    fn test_escaped_wildcards_are_literal() {
        let regex = compile_wildcard("a\\*b").unwrap();
        assert!(regex.is_match("a*b"));
        assert!(!regex.is_match("axb"));

        let regex = compile_wildcard("a\\?").unwrap();
        assert!(regex.is_match("a?"));
        assert!(!regex.is_match("ab"));
    }

    #[test]
    fn test_regex_metacharacters_are_escaped() {
        let regex = compile_wildcard("a.b").unwrap();
        assert!(regex.is_match("a.b"));
        assert!(!regex.is_match("axb"));
    }

    #[test]
    fn test_dangling_escape_is_rejected() {
        assert!(compile_wildcard("abc\\").is_err());
    }
}
