//! File filtering for directory children.

use std::collections::HashSet;
use std::path::Path;

/// Decides which files found under a directory become candidates.
///
/// By default every file is tried; anything that fails to decode is
/// skipped later. Explicitly named files never pass through the filter.
#[derive(Debug, Clone, Default)]
pub struct ImageFilter {
    /// Lowercase extensions to accept (None = all)
    extensions: Option<HashSet<String>>,
    /// Whether to skip hidden files
    skip_hidden: bool,
}

impl ImageFilter {
    /// Create a filter that accepts every file
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip hidden files (starting with .)
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Only accept files with one of these extensions.
    ///
    /// Matching ignores case and a leading dot.
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = Some(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        );
        self
    }

    /// Check if a file should be included
    pub fn should_include(&self, path: &Path) -> bool {
        if self.skip_hidden && is_hidden(path) {
            return false;
        }

        match &self.extensions {
            None => true,
            Some(allowed) => path
                .extension()
                .and_then(|e| e.to_str())
                .map(|ext| allowed.contains(&ext.to_lowercase()))
                .unwrap_or(false),
        }
    }
}

/// Whether the final path component starts with a dot
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_accepts_everything() {
        let filter = ImageFilter::new();
        assert!(filter.should_include(Path::new("/photos/image.jpg")));
        assert!(filter.should_include(Path::new("/photos/notes.txt")));
        assert!(filter.should_include(Path::new("/photos/.hidden.png")));
        assert!(filter.should_include(Path::new("/photos/README")));
    }

    #[test]
    fn extension_list_restricts_files() {
        let filter = ImageFilter::new().with_extensions(["jpg", ".PNG"]);

        assert!(filter.should_include(Path::new("a.jpg")));
        assert!(filter.should_include(Path::new("a.JPG")));
        assert!(filter.should_include(Path::new("a.png")));
        assert!(!filter.should_include(Path::new("a.gif")));
        assert!(!filter.should_include(Path::new("README")));
    }

    #[test]
    fn hidden_files_can_be_skipped() {
        let filter = ImageFilter::new().with_skip_hidden(true);

        assert!(!filter.should_include(Path::new("/photos/.thumb.jpg")));
        assert!(filter.should_include(Path::new("/photos/thumb.jpg")));
    }

    #[test]
    fn is_hidden_looks_at_file_name_only() {
        assert!(is_hidden(Path::new("/a/.b")));
        assert!(!is_hidden(Path::new("/.a/b")));
    }
}
