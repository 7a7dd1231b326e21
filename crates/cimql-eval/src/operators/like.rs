//! LIKE pattern matching
//!
//! `%` matches any run of characters, `_` exactly one, and `\` makes the next
//! character literal. Patterns compile to anchored regexes and are cached.

use crate::error::{EvalError, EvalResult};
use indexmap::IndexMap;
use parking_lot::RwLock;
use regex::Regex;

const CACHE_CAPACITY: usize = 256;

/// Translate a LIKE pattern into an anchored regex source
pub fn like_to_regex(pattern: &str) -> EvalResult<String> {
    let mut out = String::from(r"(?s)\A");
    let mut literal = String::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' | '_' => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if c == '%' { ".*" } else { "." });
            }
            '\\' => match chars.next() {
                Some(escaped) => literal.push(escaped),
                None => {
                    return Err(EvalError::InvalidPattern {
                        pattern: pattern.to_string(),
                    });
                }
            },
            _ => literal.push(c),
        }
    }
    out.push_str(&regex::escape(&literal));
    out.push_str(r"\z");
    Ok(out)
}

/// Compiled LIKE patterns keyed by source text
#[derive(Debug, Default)]
pub struct PatternCache {
    patterns: RwLock<IndexMap<String, Regex>>,
}

impl PatternCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Match `value` against a LIKE pattern
    pub fn is_match(&self, value: &str, pattern: &str) -> EvalResult<bool> {
        if let Some(regex) = self.patterns.read().get(pattern) {
            return Ok(regex.is_match(value));
        }
        let regex = Regex::new(&like_to_regex(pattern)?).map_err(|_| EvalError::InvalidPattern {
            pattern: pattern.to_string(),
        })?;
        let matched = regex.is_match(value);
        let mut patterns = self.patterns.write();
        if patterns.len() >= CACHE_CAPACITY {
            patterns.shift_remove_index(0);
        }
        patterns.insert(pattern.to_string(), regex);
        Ok(matched)
    }

    pub fn len(&self) -> usize {
        self.patterns.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
