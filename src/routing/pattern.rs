//! Path pattern parsing and matching.
//!
//! # Responsibilities
//! - Parse `/greet/{name}` style patterns into literal and variable segments
//! - Match request paths segment by segment
//! - Rank competing matches so literal segments win
//!
//! # Design Decisions
//! - At most one variable per pattern
//! - Empty segments are ignored, so `/greet/` and `/greet` are the same path
//! - Matching is case-sensitive
//! - Literal segments compare against the raw path; variables bind the
//!   percent-decoded segment, and a segment that does not decode to UTF-8
//!   fails the match

use std::cmp::Ordering;
use std::fmt;

use percent_encoding::percent_decode_str;

use crate::http::exchange::PathParams;
use crate::routing::router::RouteError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
}

/// A compiled route path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a pattern such as `/greet/{name}`.
    pub fn parse(pattern: &str) -> Result<Self, RouteError> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if !pattern.starts_with('/') {
            return Err(invalid("must start with '/'"));
        }

        let mut segments = Vec::new();
        let mut variables = 0;
        for part in split_path(pattern) {
            if let Some(inner) = part.strip_prefix('{') {
                let name = inner
                    .strip_suffix('}')
                    .ok_or_else(|| invalid("unterminated variable"))?;
                if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                    return Err(invalid("variable name must be non-empty [A-Za-z0-9_]"));
                }
                variables += 1;
                if variables > 1 {
                    return Err(invalid("at most one path variable is allowed"));
                }
                segments.push(Segment::Variable(name.to_string()));
            } else if part.contains(['{', '}']) {
                return Err(invalid("braces must wrap a whole segment"));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: pattern.to_string(),
            segments,
        })
    }

    /// Match a request path, returning the bound (decoded) variables on success.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let mut params = PathParams::new();
        let mut parts = split_path(path);

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(expected) if expected == part => {}
                Segment::Literal(_) => return None,
                Segment::Variable(name) => {
                    let value = percent_decode_str(part).decode_utf8().ok()?;
                    params.insert(name.clone(), value.into_owned());
                }
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }

    /// Ordering between two patterns that both matched the same path.
    ///
    /// At the first position where they differ, a literal segment is more
    /// specific than a variable.
    pub fn specificity_cmp(&self, other: &Self) -> Ordering {
        let rank = |s: &Segment| matches!(s, Segment::Literal(_)) as u8;
        self.segments
            .iter()
            .map(rank)
            .cmp(other.segments.iter().map(rank))
    }

    /// True when both patterns accept exactly the same paths.
    pub fn same_shape(&self, other: &Self) -> bool {
        self.segments.len() == other.segments.len()
            && self.segments.iter().zip(&other.segments).all(|(a, b)| match (a, b) {
                (Segment::Literal(x), Segment::Literal(y)) => x == y,
                (Segment::Variable(_), Segment::Variable(_)) => true,
                _ => false,
            })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Join a mount prefix and a route pattern.
pub fn join_path(prefix: &str, pattern: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let pattern = pattern.trim_start_matches('/');
    match (prefix.is_empty(), pattern.is_empty()) {
        (true, _) => format!("/{pattern}"),
        (false, true) => prefix.to_string(),
        (false, false) => format!("{prefix}/{pattern}"),
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}
