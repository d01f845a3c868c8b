//! Entry filtering logic for the walker.

use std::path::{Path, PathBuf};

/// Decides which directory entries the walker visits
#[derive(Debug, Clone, Default)]
pub struct EntryFilter {
    /// Whether to include hidden files and directories
    include_hidden: bool,
    /// Subtrees never visited (e.g. a destination nested in a source)
    excluded: Vec<PathBuf>,
}

impl EntryFilter {
    pub fn new() -> Self {
        Self {
            include_hidden: true,
            excluded: Vec::new(),
        }
    }

    /// Include hidden entries (starting with .)
    pub fn with_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Never descend into these paths
    pub fn with_excluded(mut self, excluded: Vec<PathBuf>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Check whether an entry below a source root should be visited.
    ///
    /// The root itself (depth 0) is always accepted.
    pub fn accepts(&self, path: &Path, depth: usize) -> bool {
        if depth == 0 {
            return true;
        }

        if self.excluded.iter().any(|excluded| path.starts_with(excluded)) {
            return false;
        }

        if !self.include_hidden {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    return false;
                }
            }
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_always_accepted() {
        let filter = EntryFilter::new()
            .with_hidden(false)
            .with_excluded(vec![PathBuf::from("/src/.cache")]);
        assert!(filter.accepts(Path::new("/src/.cache"), 0));
    }

    #[test]
    fn hidden_entries_are_included_by_default() {
        let filter = EntryFilter::new();
        assert!(filter.accepts(Path::new("/src/.profile"), 1));
    }

    #[test]
    fn hidden_entries_can_be_skipped() {
        let filter = EntryFilter::new().with_hidden(false);
        assert!(!filter.accepts(Path::new("/src/.git"), 1));
        assert!(filter.accepts(Path::new("/src/visible.txt"), 1));
    }

    #[test]
    fn excluded_subtrees_are_pruned() {
        let filter = EntryFilter::new().with_excluded(vec![PathBuf::from("/src/sorted")]);
        assert!(!filter.accepts(Path::new("/src/sorted"), 1));
        assert!(!filter.accepts(Path::new("/src/sorted/Imagens/a.jpg"), 3));
        assert!(filter.accepts(Path::new("/src/sorted-not/a.jpg"), 2));
    }
}
