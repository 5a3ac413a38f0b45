//! Path enumeration using walkdir.

use super::filter::{is_hidden, ImageFilter};
use super::{path_key, CandidateFile};
use crate::error::ScanError;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Configuration for the enumerator
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links inside directories
    pub follow_symlinks: bool,
    /// Whether to skip hidden files and directories
    pub skip_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Extensions to accept under directories (None = every file)
    pub extensions: Option<Vec<String>>,
}

/// Turns user-supplied paths into candidate files
pub struct ImageEnumerator {
    config: ScanConfig,
    filter: ImageFilter,
}

impl ImageEnumerator {
    /// Create a new enumerator with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_skip_hidden(config.skip_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions);
        }

        Self { config, filter }
    }

    /// Lazily enumerate candidates under `paths`, in order.
    ///
    /// A file yields itself; a directory yields every file beneath it,
    /// sorted by name within each directory. Each path is yielded at most
    /// once. Paths that are neither yield an error and enumeration goes on.
    pub fn enumerate(&self, paths: &[PathBuf]) -> Enumeration<'_> {
        Enumeration {
            enumerator: self,
            roots: paths.to_vec().into_iter(),
            walk: None,
            seen: HashSet::new(),
        }
    }

    fn walker(&self, root: &PathBuf) -> walkdir::IntoIter {
        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        walker.into_iter()
    }
}

impl Default for ImageEnumerator {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

/// Iterator returned by [`ImageEnumerator::enumerate`]
pub struct Enumeration<'a> {
    enumerator: &'a ImageEnumerator,
    roots: std::vec::IntoIter<PathBuf>,
    walk: Option<walkdir::IntoIter>,
    seen: HashSet<PathBuf>,
}

impl Enumeration<'_> {
    fn admit(seen: &mut HashSet<PathBuf>, path: PathBuf, explicit: bool) -> Option<CandidateFile> {
        if seen.insert(path_key(&path)) {
            Some(CandidateFile { path, explicit })
        } else {
            tracing::trace!(path = %path.display(), "already enumerated");
            None
        }
    }
}

impl Iterator for Enumeration<'_> {
    type Item = Result<CandidateFile, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(walk) = self.walk.as_mut() {
                match walk.next() {
                    Some(Ok(entry)) => {
                        let file_type = entry.file_type();

                        if file_type.is_dir() {
                            if entry.depth() > 0
                                && self.enumerator.config.skip_hidden
                                && is_hidden(entry.path())
                            {
                                walk.skip_current_dir();
                            }
                            continue;
                        }

                        if !self.enumerator.filter.should_include(entry.path()) {
                            continue;
                        }

                        // Unfollowed links: admit those pointing at files, never descend
                        if file_type.is_symlink() {
                            match fs::metadata(entry.path()) {
                                Ok(target) if target.is_file() => {}
                                Ok(_) => continue,
                                Err(_) => {
                                    return Some(Err(ScanError::NotFound {
                                        path: entry.into_path(),
                                    }))
                                }
                            }
                        } else if !file_type.is_file() {
                            continue;
                        }

                        if let Some(candidate) = Self::admit(&mut self.seen, entry.into_path(), false)
                        {
                            return Some(Ok(candidate));
                        }
                    }
                    Some(Err(e)) => return Some(Err(walk_error(e))),
                    None => self.walk = None,
                }
                continue;
            }

            let root = self.roots.next()?;

            match fs::metadata(&root) {
                Ok(metadata) if metadata.is_file() => {
                    if let Some(candidate) = Self::admit(&mut self.seen, root, true) {
                        return Some(Ok(candidate));
                    }
                }
                Ok(metadata) if metadata.is_dir() => {
                    tracing::debug!(path = %root.display(), "walking directory");
                    self.walk = Some(self.enumerator.walker(&root));
                }
                Ok(_) => return Some(Err(ScanError::NotFound { path: root })),
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    return Some(Err(ScanError::PermissionDenied { path: root }))
                }
                Err(_) => return Some(Err(ScanError::NotFound { path: root })),
            }
        }
    }
}

fn walk_error(e: walkdir::Error) -> ScanError {
    let path = e.path().map(|p| p.to_path_buf()).unwrap_or_default();

    if e.io_error().map(|e| e.kind()) == Some(io::ErrorKind::PermissionDenied) {
        ScanError::PermissionDenied { path }
    } else {
        ScanError::ReadDirectory {
            path,
            source: io::Error::from(e),
        }
    }
}
