//! Directory walking implementation using walkdir.

use super::{filter::EntryFilter, DiscoveredFile};
use crate::error::ScanError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Configuration for the source walker
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
        }
    }
}

/// Walks source roots in a stable order.
///
/// Entries are sorted by file name within each directory and roots are
/// visited in the order given, so a static tree always enumerates the
/// same way. The pre-scan count and the processing walk share this
/// walker and therefore see the same files.
pub struct SourceWalker {
    config: ScanConfig,
    filter: EntryFilter,
}

impl SourceWalker {
    /// Create a new walker with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = EntryFilter::new().with_hidden(config.include_hidden);
        Self { config, filter }
    }

    /// Never descend into these paths
    pub fn excluding(mut self, excluded: Vec<PathBuf>) -> Self {
        self.filter = self.filter.with_excluded(excluded);
        self
    }

    /// Lazily enumerate every file under every source root
    pub fn walk<'a>(
        &'a self,
        sources: &'a [PathBuf],
    ) -> impl Iterator<Item = Result<DiscoveredFile, ScanError>> + 'a {
        sources
            .iter()
            .enumerate()
            .flat_map(move |(index, root)| self.walk_root(index, root))
    }

    fn walk_root<'a>(
        &'a self,
        source_index: usize,
        root: &'a Path,
    ) -> impl Iterator<Item = Result<DiscoveredFile, ScanError>> + 'a {
        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        walker
            .into_iter()
            .filter_entry(move |entry| self.filter.accepts(entry.path(), entry.depth()))
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => {
                    let is_file = entry.file_type().is_file()
                        || (entry.path_is_symlink() && entry.path().is_file());
                    if !is_file {
                        return None;
                    }

                    let path = entry.into_path();
                    let relative_path = path
                        .strip_prefix(root)
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|_| PathBuf::from(path.file_name().unwrap_or_default()));

                    Some(Ok(DiscoveredFile {
                        path,
                        relative_path,
                        source_index,
                    }))
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());

                    let error = if e.io_error().map(|io| io.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path }
                    } else {
                        ScanError::Unreadable {
                            path,
                            reason: e.to_string(),
                        }
                    };

                    Some(Err(error))
                }
            })
    }
}
