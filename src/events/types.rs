//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the engine, in emission order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// The engine moved to a new phase
    PhaseChanged { phase: EnginePhase },
    /// Overall progress after a file's outcome is known
    Progress { percent: u8, file_name: String },
    /// Outcome of one file
    FileResult {
        file_name: String,
        outcome: OutcomeKind,
        message: String,
    },
    /// Free-form status line for the presentation layer
    StatusText { message: String },
    /// A fatal setup error, or a non-file problem during the walk
    Error { message: String },
    /// The run reached a terminal state
    Finished { summary: RunSummary },
}

/// Phases of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    Scanning,
    Running,
}

/// Kind of outcome recorded for a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Skipped,
    Error,
    Cancelled,
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Completed,
    Cancelled,
    Fatal,
}

/// Summary of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// How the run ended (None only for the default value)
    pub state: Option<RunState>,
    /// Files found by the pre-scan
    pub total_files: usize,
    /// Files skipped because a previous run already handled them
    pub resumed_from: usize,
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Bytes written to the destination
    pub bytes_written: u64,
    /// Destination root of the run
    pub destination: PathBuf,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl RunSummary {
    /// Number of files that produced an outcome in this run
    pub fn outcomes(&self) -> usize {
        self.succeeded + self.skipped + self.failed + self.cancelled
    }
}

impl std::fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnginePhase::Scanning => write!(f, "Scanning"),
            EnginePhase::Running => write!(f, "Organizing"),
        }
    }
}

impl std::fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutcomeKind::Success => write!(f, "SUCCESS"),
            OutcomeKind::Skipped => write!(f, "SKIPPED"),
            OutcomeKind::Error => write!(f, "ERROR"),
            OutcomeKind::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Completed => write!(f, "completed"),
            RunState::Cancelled => write!(f, "cancelled"),
            RunState::Fatal => write!(f, "failed"),
        }
    }
}
