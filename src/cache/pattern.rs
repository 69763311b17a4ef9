//! Redis-style glob patterns over the key space
//!
//! Supports `*`, `?`, `[...]` character classes (with `^`/`!` negation) and
//! `\` escapes, matching the subset of `SCAN MATCH` syntax the invalidation
//! utilities rely on.

use crate::error::{CacheError, Result};
use regex::Regex;

/// Compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    /// Compile a glob pattern
    pub fn new(pattern: &str) -> Result<Self> {
        let translated = translate(pattern)?;
        let regex = Regex::new(&translated)
            .map_err(|e| CacheError::PatternError(format!("{}: {}", pattern, e)))?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// Check whether a key matches
    pub fn matches(&self, key: &str) -> bool {
        self.regex.is_match(key)
    }

    /// The original glob text
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True when the pattern contains no wildcard, i.e. names a single key
    pub fn is_literal(&self) -> bool {
        !has_wildcard(&self.source)
    }
}

/// Check whether a string contains unescaped glob metacharacters
pub fn has_wildcard(pattern: &str) -> bool {
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '*' | '?' | '[' => return true,
            _ => {}
        }
    }
    false
}

/// Escape glob metacharacters so `segment` matches only itself
pub fn escape(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn translate(pattern: &str) -> Result<String> {
    let mut out = String::with_capacity(pattern.len() * 2 + 2);
    out.push('^');

    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '\\' => match chars.next() {
                Some(escaped) => out.push_str(&regex::escape(&escaped.to_string())),
                None => out.push_str(&regex::escape("\\")),
            },
            '[' => {
                out.push('[');
                if matches!(chars.peek(), Some('^') | Some('!')) {
                    chars.next();
                    out.push('^');
                }
                let mut closed = false;
                let mut empty = true;
                while let Some(class_char) = chars.next() {
                    match class_char {
                        ']' if !empty => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            if let Some(escaped) = chars.next() {
                                out.push_str(&regex::escape(&escaped.to_string()));
                            }
                        }
                        '-' => out.push('-'),
                        other => out.push_str(&regex::escape(&other.to_string())),
                    }
                    empty = false;
                }
                if !closed {
                    return Err(CacheError::PatternError(format!(
                        "unterminated character class in '{}'",
                        pattern
                    )));
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }

    out.push('$');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_suffix() {
        let pattern = GlobPattern::new("market-trades:prediction-trades:m1:*").unwrap();
        assert!(pattern.matches("market-trades:prediction-trades:m1:10:0"));
        assert!(pattern.matches("market-trades:prediction-trades:m1:"));
        assert!(!pattern.matches("market-trades:prediction-trades:m10:10:0"));
        assert!(!pattern.matches("market-trades:prediction-trades:m2:10:0"));
    }

    #[test]
    fn test_question_mark_and_class() {
        let pattern = GlobPattern::new("balance:u?").unwrap();
        assert!(pattern.matches("balance:u1"));
        assert!(!pattern.matches("balance:u12"));

        let pattern = GlobPattern::new("positions:[ab]*").unwrap();
        assert!(pattern.matches("positions:alice"));
        assert!(pattern.matches("positions:bob"));
        assert!(!pattern.matches("positions:carol"));

        let pattern = GlobPattern::new("positions:[^a]*").unwrap();
        assert!(!pattern.matches("positions:alice"));
        assert!(pattern.matches("positions:bob"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let pattern = GlobPattern::new(r#"registry:{"limit":10}"#).unwrap();
        assert!(pattern.matches(r#"registry:{"limit":10}"#));
        assert!(pattern.is_literal());

        let pattern = GlobPattern::new("stats.v1").unwrap();
        assert!(!pattern.matches("statsXv1"));
    }

    #[test]
    fn test_escape_round_trip() {
        let id = "weird*id?";
        let pattern = GlobPattern::new(&format!("actors:{}", escape(id))).unwrap();
        assert!(pattern.is_literal());
        assert!(pattern.matches("actors:weird*id?"));
        assert!(!pattern.matches("actors:weirdXXidZ"));
    }

    #[test]
    fn test_unterminated_class_is_error() {
        assert!(GlobPattern::new("chats:[abc").is_err());
    }
}
