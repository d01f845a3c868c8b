//! # Scanner Module
//!
//! Enumerates the files under a set of source directories.
//!
//! The engine walks the sources twice: once to fix the total file count
//! for progress reporting, then again to process each file. Both walks
//! use the same [`SourceWalker`], which yields entries in a stable,
//! name-sorted order.
//!
//! ## Example
//! ```rust,ignore
//! use smart_file_mover::core::scanner::{ScanConfig, SourceWalker};
//!
//! let walker = SourceWalker::new(ScanConfig::default());
//! let total = walker.walk(&sources).flatten().count();
//! for file in walker.walk(&sources) { /* ... */ }
//! ```

mod filter;
mod walker;

pub use filter::EntryFilter;
pub use walker::{ScanConfig, SourceWalker};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A file discovered under one of the source roots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredFile {
    /// Absolute path to the file
    pub path: PathBuf,
    /// Path relative to its source root
    pub relative_path: PathBuf,
    /// Index of the source root in the source set
    pub source_index: usize,
}

impl DiscoveredFile {
    /// File name for display and classification
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_is_last_component() {
        let file = DiscoveredFile {
            path: PathBuf::from("/photos/2024/beach.jpg"),
            relative_path: PathBuf::from("2024/beach.jpg"),
            source_index: 0,
        };
        assert_eq!(file.file_name(), "beach.jpg");
    }
}
