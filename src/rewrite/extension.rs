//! Extension-based bypass of body rewriting.

use std::collections::HashSet;

/// Extensions excluded when none are configured.
pub const DEFAULT_EXCLUDED_EXTENSIONS: &[&str] = &["jpg", "png", "webp", "jpeg", "svg", "gif"];

/// Return the extension of the final segment of `path`, without the dot.
///
/// Trailing slashes are ignored, so `/assets/app.js/` yields `js`.
/// A segment without a dot has no extension.
pub fn extension_of(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    let segment = trimmed.rsplit('/').next().unwrap_or("");
    match segment.rfind('.') {
        Some(idx) => &segment[idx + 1..],
        None => "",
    }
}

/// Set of lowercase extensions whose responses are never rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    excluded: HashSet<String>,
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_EXTENSIONS.iter().copied())
    }
}

impl ExtensionFilter {
    /// Build a filter from explicit extensions. Entries are normalized;
    /// empty ones are dropped.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = extensions
            .into_iter()
            .filter_map(|ext| normalize(ext.as_ref()))
            .collect();
        Self { excluded }
    }

    /// Parse a comma-separated list, falling back to the default set when
    /// it contains no usable entry.
    pub fn parse(raw: &str) -> Self {
        let filter = Self::new(raw.split(','));
        if filter.excluded.is_empty() {
            Self::default()
        } else {
            filter
        }
    }

    /// Whether responses for `path` skip body rewriting. Case-insensitive.
    pub fn is_excluded(&self, path: &str) -> bool {
        let ext = extension_of(path);
        !ext.is_empty() && self.excluded.contains(&ext.to_ascii_lowercase())
    }

    /// Excluded extensions, sorted for stable log output.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.excluded.iter().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

fn normalize(ext: &str) -> Option<String> {
    let ext = ext.trim().trim_start_matches('.');
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}
