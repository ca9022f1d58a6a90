//! Route templates: parsing `:name` captures and the terminal `*`
//! wildcard out of a literal path template, once, at registration time.
//!
//! Grounded on `original_source/router/tree.go`'s `findVarEnd` /
//! `numParams` helpers, reshaped into an immutable value built once per
//! registered pattern instead of being recomputed on every insert.

use crate::error::PatternError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The HTTP verbs this engine ever registers or dispatches on
/// (spec.md §4.8's "recognised verb set").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
    ];

    /// Stable index into a `[T; Method::ALL.len()]` handler table.
    pub fn index(self) -> usize {
        match self {
            Method::Get => 0,
            Method::Post => 1,
            Method::Put => 2,
            Method::Patch => 3,
            Method::Delete => 4,
        }
    }

    pub fn from_http(method: &http::Method) -> Option<Method> {
        match *method {
            http::Method::GET => Some(Method::Get),
            http::Method::POST => Some(Method::Post),
            http::Method::PUT => Some(Method::Put),
            http::Method::PATCH => Some(Method::Patch),
            http::Method::DELETE => Some(Method::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(s)
    }
}

/// Conventional variable name given to the terminal wildcard capture
/// when the template carries no explicit name after `*`
/// (spec.md §9 Open Questions: the source is silent here; the
/// capture-start-node invariant requires a non-empty name).
pub const WILDCARD_VAR: &str = "*";

/// One capture position recorded at pattern-construction time: the byte
/// offset of the marker (`:` or `*`) in the template, and the variable
/// name it binds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureVar {
    pub offset: usize,
    pub name: String,
    pub is_wildcard: bool,
    /// Byte offset in the template immediately past the variable name
    /// (i.e. at the next `/` or at the template's end). The trie uses
    /// this to skip the name text when walking the template a second
    /// time at insert.
    pub name_end: usize,
}

/// An immutable, parsed route template: the original string, the method
/// it applies under, and the ordered capture positions found in it.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    template: String,
    method: Method,
    captures: Vec<CaptureVar>,
}

impl RoutePattern {
    /// Parse `template` once, left to right, recording every capture
    /// position (spec.md §4.1).
    pub fn new(method: Method, template: impl Into<String>) -> Result<Self, PatternError> {
        let template = template.into();
        if template.is_empty() {
            return Err(PatternError::Empty);
        }

        let bytes = template.as_bytes();
        let len = bytes.len();
        let mut captures = Vec::new();
        let mut seen_wildcard = false;

        for i in 0..len {
            let b = bytes[i];
            if seen_wildcard {
                // a wildcard must be the last segment of the template
                return Err(PatternError::WildcardNotTerminal);
            }

            let is_marker = b == b':' || b == b'*';
            if !is_marker {
                continue;
            }

            let is_wildcard = b == b'*';

            // The terminal wildcard (no trailing name text) is the one
            // case where the marker may be the final byte of the
            // template; every other marker must have name text after it.
            if i == len - 1 {
                if is_wildcard {
                    captures.push(CaptureVar {
                        offset: i,
                        name: WILDCARD_VAR.to_string(),
                        is_wildcard: true,
                        name_end: len,
                    });
                    seen_wildcard = true;
                    continue;
                }
                return Err(PatternError::EmptyCaptureName(i));
            }
            if i == 0 {
                // a marker at position 0 has no preceding '/'; treated
                // as a literal byte rather than a capture start.
                continue;
            }

            let name_start = i + 1;
            let name_end = bytes[name_start..]
                .iter()
                .position(|&c| c == b'/')
                .map(|rel| name_start + rel)
                .unwrap_or(len);

            if name_end == name_start {
                return Err(PatternError::EmptyCaptureName(i));
            }

            let name = template[name_start..name_end].to_string();
            captures.push(CaptureVar {
                offset: i,
                name,
                is_wildcard,
                name_end,
            });
            if is_wildcard {
                seen_wildcard = true;
            }
        }

        Ok(RoutePattern {
            template,
            method,
            captures,
        })
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn captures(&self) -> &[CaptureVar] {
        &self.captures
    }

    /// The variable name recorded at a given byte offset, if any.
    pub fn name_at(&self, offset: usize) -> Option<&str> {
        self.captures
            .iter()
            .find(|c| c.offset == offset)
            .map(|c| c.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_template_has_no_captures() {
        let p = RoutePattern::new(Method::Get, "/a/b").unwrap();
        assert!(p.captures().is_empty());
    }

    #[test]
    fn named_captures_are_recorded_in_order() {
        let p = RoutePattern::new(Method::Get, "/repos/:owner/:repo/stargazers").unwrap();
        let names: Vec<&str> = p.captures().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["owner", "repo"]);
    }

    #[test]
    fn terminal_wildcard_gets_conventional_name() {
        let p = RoutePattern::new(Method::Get, "/static/*").unwrap();
        assert_eq!(p.captures().len(), 1);
        assert!(p.captures()[0].is_wildcard);
        assert_eq!(p.captures()[0].name, WILDCARD_VAR);
    }

    #[test]
    fn wildcard_must_be_terminal() {
        let err = RoutePattern::new(Method::Get, "/a/*/b").unwrap_err();
        assert_eq!(err, PatternError::WildcardNotTerminal);
    }

    #[test]
    fn empty_template_is_rejected() {
        assert_eq!(
            RoutePattern::new(Method::Get, "").unwrap_err(),
            PatternError::Empty
        );
    }
}
