//! # Progress Module
//!
//! Durable record of how far a run got, so an interrupted run can resume.
//!
//! ## Backends
//! - `JsonProgressStore`: a JSON file, replaced atomically on each save
//! - `InMemoryProgressStore`: for tests
//!
//! The record is saved after every completed file and when a run is
//! cancelled. A run that completes clears it.

mod json;
mod memory;
mod traits;

pub use json::JsonProgressStore;
pub use memory::InMemoryProgressStore;
pub use traits::ProgressStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Saved state of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProgress {
    pub run_id: Uuid,
    /// Files with a recorded outcome, counted in enumeration order
    pub completed: usize,
    /// Files found by the pre-scan of the run that saved this record
    pub total: usize,
    pub sources: Vec<PathBuf>,
    pub destination: PathBuf,
    /// Source path of the last file with a recorded outcome
    pub last_completed: Option<PathBuf>,
    /// File being processed when the record was saved
    pub current_source: Option<PathBuf>,
    pub current_destination: Option<PathBuf>,
    pub saved_at: DateTime<Utc>,
}

impl RunProgress {
    pub fn new(sources: Vec<PathBuf>, destination: PathBuf, total: usize) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            completed: 0,
            total,
            sources,
            destination,
            last_completed: None,
            current_source: None,
            current_destination: None,
            saved_at: Utc::now(),
        }
    }

    /// Floor percentage of completed files
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed.min(self.total) * 100) / self.total) as u8
    }

    /// Record one more completed file
    pub fn advance(&mut self, source: &Path) {
        self.completed += 1;
        self.last_completed = Some(source.to_path_buf());
        self.current_source = None;
        self.current_destination = None;
        self.saved_at = Utc::now();
    }

    /// Check that this record belongs to a run over the same folders.
    /// Returns the reason on mismatch.
    pub fn check_matches(&self, sources: &[PathBuf], destination: &Path) -> Result<(), String> {
        if self.destination != destination {
            return Err(format!(
                "saved destination is {}, requested {}",
                self.destination.display(),
                destination.display()
            ));
        }
        if self.sources != sources {
            return Err("saved source folders differ from the requested ones".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(total: usize) -> RunProgress {
        RunProgress::new(vec![PathBuf::from("/src")], PathBuf::from("/dest"), total)
    }

    #[test]
    fn percent_is_floored() {
        let mut p = progress(3);
        assert_eq!(p.percent(), 0);
        p.advance(Path::new("/src/a"));
        assert_eq!(p.percent(), 33);
        p.advance(Path::new("/src/b"));
        assert_eq!(p.percent(), 66);
        p.advance(Path::new("/src/c"));
        assert_eq!(p.percent(), 100);
    }

    #[test]
    fn empty_total_is_zero_percent() {
        assert_eq!(progress(0).percent(), 0);
    }

    #[test]
    fn advance_tracks_last_path() {
        let mut p = progress(2);
        p.current_source = Some(PathBuf::from("/src/a"));
        p.advance(Path::new("/src/a"));

        assert_eq!(p.completed, 1);
        assert_eq!(p.last_completed, Some(PathBuf::from("/src/a")));
        assert_eq!(p.current_source, None);
    }

    #[test]
    fn mismatched_destination_is_rejected() {
        let p = progress(2);
        assert!(p.check_matches(&[PathBuf::from("/src")], Path::new("/dest")).is_ok());
        assert!(p.check_matches(&[PathBuf::from("/src")], Path::new("/other")).is_err());
        assert!(p.check_matches(&[PathBuf::from("/elsewhere")], Path::new("/dest")).is_err());
    }
}
