//! Logger name matching.
//!
//! # Responsibilities
//! - Compile a rule's logger pattern once, at table build time
//! - Match logger names during dispatch without allocation
//!
//! # Design Decisions
//! - Matching is case-sensitive
//! - The common shapes (`*`, exact, `prefix*`, `*suffix`, `*contains*`) get
//!   dedicated variants; anything else with `*` or `?` falls back to a
//!   backtracking glob
//! - No regex in the hot path

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoggerNameMatcher {
    #[default]
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Glob(String),
}

impl LoggerNameMatcher {
    pub fn new(pattern: &str) -> Self {
        if pattern == "*" {
            return LoggerNameMatcher::Any;
        }
        if pattern.contains('?') {
            return LoggerNameMatcher::Glob(pattern.to_string());
        }

        let stars = pattern.matches('*').count();
        let starts = pattern.starts_with('*');
        let ends = pattern.ends_with('*');
        match (stars, starts, ends) {
            (0, _, _) => LoggerNameMatcher::Exact(pattern.to_string()),
            (1, false, true) => LoggerNameMatcher::Prefix(pattern[..pattern.len() - 1].to_string()),
            (1, true, false) => LoggerNameMatcher::Suffix(pattern[1..].to_string()),
            (2, true, true) if pattern.len() >= 2 => {
                LoggerNameMatcher::Contains(pattern[1..pattern.len() - 1].to_string())
            }
            _ => LoggerNameMatcher::Glob(pattern.to_string()),
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            LoggerNameMatcher::Any => true,
            LoggerNameMatcher::Exact(expected) => name == expected,
            LoggerNameMatcher::Prefix(prefix) => name.starts_with(prefix.as_str()),
            LoggerNameMatcher::Suffix(suffix) => name.ends_with(suffix.as_str()),
            LoggerNameMatcher::Contains(needle) => name.contains(needle.as_str()),
            LoggerNameMatcher::Glob(pattern) => glob_matches(pattern, name),
        }
    }
}

impl fmt::Display for LoggerNameMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerNameMatcher::Any => f.write_str("*"),
            LoggerNameMatcher::Exact(s) => f.write_str(s),
            LoggerNameMatcher::Prefix(s) => write!(f, "{s}*"),
            LoggerNameMatcher::Suffix(s) => write!(f, "*{s}"),
            LoggerNameMatcher::Contains(s) => write!(f, "*{s}*"),
            LoggerNameMatcher::Glob(s) => f.write_str(s),
        }
    }
}

/// `*` matches any run of characters, `?` exactly one. Offsets are byte
/// positions that always sit on char boundaries.
fn glob_matches(pattern: &str, name: &str) -> bool {
    let (mut p, mut n) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while let Some(c) = name[n..].chars().next() {
        match pattern[p..].chars().next() {
            Some('*') => {
                backtrack = Some((p, n));
                p += 1;
            }
            Some(expected) if expected == '?' || expected == c => {
                p += expected.len_utf8();
                n += c.len_utf8();
            }
            _ => match backtrack {
                Some((star, matched)) => {
                    let skipped = name[matched..].chars().next().map_or(1, char::len_utf8);
                    p = star + 1;
                    n = matched + skipped;
                    backtrack = Some((star, n));
                }
                None => return false,
            },
        }
    }

    pattern[p..].chars().all(|c| c == '*')
}
