//! Literal substring substitution.
//!
//! # Responsibilities
//! - Parse `pattern==replacement` lists from configuration
//! - Rewrite byte buffers (response bodies)
//! - Rewrite header maps (request and response headers)
//!
//! # Design Decisions
//! - Patterns are literal and case-sensitive, never regex
//! - Entries apply in declaration order; each entry sees the output of the
//!   previous one
//! - Within one entry, matches are leftmost and non-overlapping, and the
//!   inserted replacement is never re-scanned by that entry

use axum::http::{HeaderMap, HeaderValue};
use memchr::memmem;

/// Separator between pattern and replacement in configuration strings.
pub const PAIR_SEPARATOR: &str = "==";

/// A single literal find/replace pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionEntry {
    pub pattern: String,
    pub replacement: String,
}

/// Ordered, immutable list of substitutions with unique patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubstitutionTable {
    entries: Vec<SubstitutionEntry>,
}

impl SubstitutionTable {
    /// Parse a comma-separated list of `pattern==replacement` pairs.
    ///
    /// Segments that don't split into exactly two parts are ignored, as are
    /// segments with an empty pattern. A repeated pattern overrides the
    /// earlier replacement but keeps the earlier position.
    pub fn parse(raw: &str) -> Self {
        let mut table = Self::default();
        for segment in raw.split(',') {
            let parts: Vec<&str> = segment.split(PAIR_SEPARATOR).collect();
            let [pattern, replacement] = parts.as_slice() else {
                if !segment.is_empty() {
                    tracing::warn!(segment = %segment, "Ignoring malformed substitution");
                }
                continue;
            };
            if pattern.is_empty() {
                tracing::warn!(segment = %segment, "Ignoring substitution with empty pattern");
                continue;
            }
            table.insert(*pattern, *replacement);
        }
        table
    }

    /// Build a table from pairs, keeping first-declaration order.
    pub fn from_pairs<I, P, R>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (P, R)>,
        P: Into<String>,
        R: Into<String>,
    {
        let mut table = Self::default();
        for (pattern, replacement) in pairs {
            let pattern = pattern.into();
            if !pattern.is_empty() {
                table.insert(pattern, replacement);
            }
        }
        table
    }

    fn insert(&mut self, pattern: impl Into<String>, replacement: impl Into<String>) {
        let pattern = pattern.into();
        let replacement = replacement.into();
        match self.entries.iter_mut().find(|e| e.pattern == pattern) {
            Some(existing) => existing.replacement = replacement,
            None => self.entries.push(SubstitutionEntry {
                pattern,
                replacement,
            }),
        }
    }

    pub fn entries(&self) -> &[SubstitutionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply every entry to `input`, in order.
    pub fn apply(&self, input: &[u8]) -> Vec<u8> {
        let mut current = input.to_vec();
        for entry in &self.entries {
            current = replace_all(&current, entry.pattern.as_bytes(), entry.replacement.as_bytes());
        }
        current
    }

    /// Rewrite every value of every header in place.
    ///
    /// Multi-value headers keep their values separate and in order. A value
    /// that would become invalid after substitution keeps its original bytes.
    pub fn rewrite_headers(&self, headers: &mut HeaderMap) {
        if self.is_empty() || headers.is_empty() {
            return;
        }

        let original = std::mem::take(headers);
        let mut current_name = None;
        for (name, value) in original {
            // `None` means "same name as the previous entry".
            if let Some(name) = name {
                current_name = Some(name);
            }
            let Some(name) = current_name.clone() else {
                continue;
            };

            let rewritten = self.apply(value.as_bytes());
            let value = if rewritten.as_slice() == value.as_bytes() {
                value
            } else {
                match HeaderValue::from_bytes(&rewritten) {
                    Ok(mut new_value) => {
                        new_value.set_sensitive(value.is_sensitive());
                        new_value
                    }
                    Err(_) => {
                        tracing::warn!(header = %name, "Substitution produced an invalid header value, keeping original");
                        value
                    }
                }
            };
            headers.append(name, value);
        }
    }
}

impl std::fmt::Display for SubstitutionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:?} => {:?}", entry.pattern, entry.replacement)?;
        }
        write!(f, "}}")
    }
}

/// Replace all non-overlapping occurrences of `pattern`, scanning left to right.
fn replace_all(haystack: &[u8], pattern: &[u8], replacement: &[u8]) -> Vec<u8> {
    if pattern.is_empty() || haystack.len() < pattern.len() {
        return haystack.to_vec();
    }

    let mut out = Vec::with_capacity(haystack.len());
    let mut last = 0;
    for idx in memmem::find_iter(haystack, pattern) {
        out.extend_from_slice(&haystack[last..idx]);
        out.extend_from_slice(replacement);
        last = idx + pattern.len();
    }
    out.extend_from_slice(&haystack[last..]);
    out
}
