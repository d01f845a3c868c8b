//! # Resolver Module
//!
//! Turns a desired destination path into one that is free to write.
//!
//! On a name collision the existing file is hashed: identical content
//! means the incoming file is a duplicate and is skipped, different
//! content means a numeric suffix is appended before the extension
//! (`name_1.ext`, `name_2.ext`, ...) until a free name is found. Every
//! candidate along that chain is also checked for identical content, so
//! organising the same sources twice produces no new copies.
//!
//! An incoming file can carry more than one digest: the source bytes and,
//! when the file is re-encoded, the bytes that would be written. A match
//! on any of them is a duplicate.
//!
//! The resolver also remembers which paths it handed out and which
//! digests were written to each folder during the run. A path is never
//! handed out twice, and a file whose content was already written to
//! the same folder under another name is reported as a duplicate.

use crate::core::hasher::{ContentDigest, ContentHasher};
use crate::error::HashError;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Outcome of resolving a destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Write the file here
    Available(PathBuf),
    /// Identical content already exists at this path; do not copy
    Duplicate { existing: PathBuf },
}

/// Resolves destination collisions for one run
#[derive(Debug, Default)]
pub struct PathResolver {
    /// Paths handed out this run, written or not
    claimed: HashSet<PathBuf>,
    /// Content written this run, per destination folder
    written: HashMap<(PathBuf, ContentDigest), PathBuf>,
}

impl PathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `desired` for a file whose content hashes to any of `digests`.
    ///
    /// Fails only when an existing file could not be hashed; the caller
    /// must treat that as "cannot confirm duplicate", never as a match.
    pub fn resolve(
        &mut self,
        desired: &Path,
        digests: &[ContentDigest],
        hasher: &dyn ContentHasher,
    ) -> Result<Resolution, HashError> {
        let folder = desired.parent().map(Path::to_path_buf).unwrap_or_default();

        for digest in digests {
            if let Some(existing) = self.written.get(&(folder.clone(), *digest)) {
                debug!(?desired, ?existing, "content already written to this folder");
                return Ok(Resolution::Duplicate {
                    existing: existing.clone(),
                });
            }
        }

        let mut counter = 0usize;
        let mut candidate = desired.to_path_buf();

        loop {
            let on_disk = candidate.exists();

            if on_disk && digests.contains(&hasher.hash_file(&candidate)?) {
                return Ok(Resolution::Duplicate {
                    existing: candidate,
                });
            }

            if !on_disk && !self.claimed.contains(&candidate) {
                self.claimed.insert(candidate.clone());
                if counter > 0 {
                    debug!(?desired, resolved = ?candidate, "name collision resolved");
                }
                return Ok(Resolution::Available(candidate));
            }

            counter += 1;
            candidate = suffixed_path(desired, counter);
        }
    }

    /// Remember that `digest` now lives at `path`
    pub fn record_written(&mut self, path: &Path, digest: ContentDigest) {
        let folder = path.parent().map(Path::to_path_buf).unwrap_or_default();
        self.written
            .entry((folder, digest))
            .or_insert_with(|| path.to_path_buf());
    }

    /// Whether a path was handed out during this run
    pub fn is_claimed(&self, path: &Path) -> bool {
        self.claimed.contains(path)
    }
}

/// `dir/name.ext` -> `dir/name_<n>.ext`
pub fn suffixed_path(path: &Path, n: usize) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "file".to_string());
    let parent = path.parent().unwrap_or(Path::new(""));

    let new_name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
        None => format!("{}_{}", stem, n),
    };

    parent.join(new_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hasher::Sha256Hasher;
    use std::fs;
    use tempfile::TempDir;

    fn digest_of(bytes: &[u8]) -> ContentDigest {
        Sha256Hasher::new()
            .hash_reader(bytes, Path::new("inline"))
            .unwrap()
    }

    #[test]
    fn free_path_is_returned_unchanged() {
        let dir = TempDir::new().unwrap();
        let desired = dir.path().join("notes.txt");
        let mut resolver = PathResolver::new();

        let resolution = resolver
            .resolve(&desired, &[digest_of(b"a")], &Sha256Hasher::new())
            .unwrap();
        assert_eq!(resolution, Resolution::Available(desired));
    }

    #[test]
    fn identical_existing_file_is_a_duplicate() {
        let dir = TempDir::new().unwrap();
        let desired = dir.path().join("notes.txt");
        fs::write(&desired, b"same").unwrap();

        let mut resolver = PathResolver::new();
        let resolution = resolver
            .resolve(&desired, &[digest_of(b"same")], &Sha256Hasher::new())
            .unwrap();
        assert_eq!(resolution, Resolution::Duplicate { existing: desired });
    }

    #[test]
    fn different_existing_file_gets_smallest_free_suffix() {
        let dir = TempDir::new().unwrap();
        let desired = dir.path().join("photo.jpg");
        fs::write(&desired, b"original").unwrap();
        fs::write(dir.path().join("photo_1.jpg"), b"other").unwrap();

        let mut resolver = PathResolver::new();
        let resolution = resolver
            .resolve(&desired, &[digest_of(b"incoming")], &Sha256Hasher::new())
            .unwrap();
        assert_eq!(
            resolution,
            Resolution::Available(dir.path().join("photo_2.jpg"))
        );
    }

    #[test]
    fn duplicate_further_down_the_chain_is_detected() {
        let dir = TempDir::new().unwrap();
        let desired = dir.path().join("photo.jpg");
        fs::write(&desired, b"original").unwrap();
        fs::write(dir.path().join("photo_1.jpg"), b"incoming").unwrap();

        let mut resolver = PathResolver::new();
        let resolution = resolver
            .resolve(&desired, &[digest_of(b"incoming")], &Sha256Hasher::new())
            .unwrap();
        assert_eq!(
            resolution,
            Resolution::Duplicate {
                existing: dir.path().join("photo_1.jpg")
            }
        );
    }

    #[test]
    fn existing_file_matching_the_reencoded_output_is_a_duplicate() {
        let dir = TempDir::new().unwrap();
        let desired = dir.path().join("photo.jpg");
        fs::write(&desired, b"smaller jpeg").unwrap();

        let mut resolver = PathResolver::new();
        let resolution = resolver
            .resolve(
                &desired,
                &[digest_of(b"full size jpeg"), digest_of(b"smaller jpeg")],
                &Sha256Hasher::new(),
            )
            .unwrap();
        assert_eq!(resolution, Resolution::Duplicate { existing: desired });
    }

    #[test]
    fn claimed_paths_are_never_handed_out_twice() {
        let dir = TempDir::new().unwrap();
        let desired = dir.path().join("a.txt");
        let mut resolver = PathResolver::new();
        let hasher = Sha256Hasher::new();

        let first = resolver.resolve(&desired, &[digest_of(b"1")], &hasher).unwrap();
        let second = resolver.resolve(&desired, &[digest_of(b"2")], &hasher).unwrap();

        assert_eq!(first, Resolution::Available(desired.clone()));
        assert_eq!(second, Resolution::Available(dir.path().join("a_1.txt")));
        assert!(resolver.is_claimed(&desired));
    }

    #[test]
    fn same_content_under_another_name_in_same_folder_is_duplicate() {
        let dir = TempDir::new().unwrap();
        let hasher = Sha256Hasher::new();
        let mut resolver = PathResolver::new();
        let digest = digest_of(b"shared");

        let first = dir.path().join("a.txt");
        assert_eq!(
            resolver.resolve(&first, &[digest], &hasher).unwrap(),
            Resolution::Available(first.clone())
        );
        resolver.record_written(&first, digest);

        let second = dir.path().join("b.txt");
        assert_eq!(
            resolver.resolve(&second, &[digest], &hasher).unwrap(),
            Resolution::Duplicate { existing: first }
        );
    }

    #[test]
    fn same_content_in_another_folder_is_not_duplicate() {
        let dir = TempDir::new().unwrap();
        let hasher = Sha256Hasher::new();
        let mut resolver = PathResolver::new();
        let digest = digest_of(b"shared");

        let first = dir.path().join("Docs/a.txt");
        resolver.resolve(&first, &[digest], &hasher).unwrap();
        resolver.record_written(&first, digest);

        let other = dir.path().join("Outros/a.txt");
        assert_eq!(
            resolver.resolve(&other, &[digest], &hasher).unwrap(),
            Resolution::Available(other)
        );
    }

    #[test]
    fn suffix_goes_before_extension() {
        assert_eq!(
            suffixed_path(Path::new("/dest/report.final.pdf"), 3),
            PathBuf::from("/dest/report.final_3.pdf")
        );
        assert_eq!(
            suffixed_path(Path::new("/dest/README"), 1),
            PathBuf::from("/dest/README_1")
        );
    }
}
