//! Progress store trait definition.

use super::RunProgress;
use crate::error::ProgressStoreError;

/// Durable home for the progress of an interrupted run
pub trait ProgressStore: Send + Sync {
    /// Load the saved record, if any
    fn load(&self) -> Result<Option<RunProgress>, ProgressStoreError>;

    /// Replace the saved record
    fn save(&self, progress: &RunProgress) -> Result<(), ProgressStoreError>;

    /// Forget the saved record. Not an error if none exists.
    fn clear(&self) -> Result<(), ProgressStoreError>;
}
