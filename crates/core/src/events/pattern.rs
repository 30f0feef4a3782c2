// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event key pattern matching
//!
//! Every subscription key is an `EventPattern`. Keys containing `*` or `?`
//! are compiled to an anchored regex; all other keys match by equality.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Matches zero or more characters
pub const ANY_RUN: char = '*';
/// Matches exactly one character
pub const ANY_ONE: char = '?';

/// Compiled size limit for wildcard keys (256 MiB)
pub const DEFAULT_SIZE_LIMIT: usize = 256 << 20;

/// Errors building a wildcard pattern
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid event pattern '{pattern}': {source}")]
    Invalid {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Returns true if the key contains wildcard characters
pub fn is_wildcard(key: &str) -> bool {
    key.contains([ANY_RUN, ANY_ONE])
}

/// Pattern for matching event names
/// Supports:
///   - Exact: "user.login"
///   - Any run: "message.*" matches "message.sent", "message.", "message.a.b"
///   - Any one: "a.?.c" matches "a.b.c" but not "a.bb.c" or "a..c"
#[derive(Clone, Debug)]
pub struct EventPattern {
    source: String,
    matcher: Matcher,
}

#[derive(Clone, Debug)]
enum Matcher {
    Literal,
    Wildcard(Regex),
}

impl EventPattern {
    /// Compile a key. Keys without wildcards never build a regex.
    pub fn compile(pattern: impl Into<String>) -> Result<Self, PatternError> {
        Self::compile_with_limit(pattern, DEFAULT_SIZE_LIMIT)
    }

    /// Compile a key, failing if the compiled regex exceeds `size_limit` bytes
    pub fn compile_with_limit(
        pattern: impl Into<String>,
        size_limit: usize,
    ) -> Result<Self, PatternError> {
        let source = pattern.into();
        if !is_wildcard(&source) {
            return Ok(Self::literal(source));
        }

        let regex = RegexBuilder::new(&to_regex_source(&source))
            .size_limit(size_limit)
            .build()
            .map_err(|e| PatternError::Invalid {
                pattern: source.clone(),
                source: e,
            })?;

        Ok(Self {
            source,
            matcher: Matcher::Wildcard(regex),
        })
    }

    /// A pattern that only ever matches its own text, wildcards included
    pub fn literal(pattern: impl Into<String>) -> Self {
        Self {
            source: pattern.into(),
            matcher: Matcher::Literal,
        }
    }

    /// Check if this pattern matches the whole event name
    pub fn matches(&self, event_name: &str) -> bool {
        match &self.matcher {
            Matcher::Literal => self.source == event_name,
            Matcher::Wildcard(regex) => regex.is_match(event_name),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self.matcher, Matcher::Wildcard(_))
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Escape literal runs and translate wildcards, anchored at both ends.
/// `(?s)` lets wildcards cross newlines as well.
fn to_regex_source(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?s)^");

    let mut literal = String::new();
    for c in pattern.chars() {
        match c {
            ANY_RUN | ANY_ONE => {
                out.push_str(&regex::escape(&literal));
                literal.clear();
                out.push_str(if c == ANY_RUN { ".*" } else { "." });
            }
            other => literal.push(other),
        }
    }
    out.push_str(&regex::escape(&literal));

    out.push('$');
    out
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
