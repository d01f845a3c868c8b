//! # Audit Module
//!
//! Append-only text log of every file outcome, one line per event:
//!
//! ```text
//! 2026-10-17T09:12:44.120+00:00 SUCCESS IMG_0001.jpg copied to /dest/Imagens/IMG_0001.jpg
//! ```
//!
//! The log is an event consumer. It never drives the engine.

use crate::events::Event;
use chrono::{SecondsFormat, Utc};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Appends run events to a plain text file
pub struct AuditLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl AuditLog {
    /// Open (or create) the log for appending
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// `<data_local_dir>/smart-file-mover/moves.log`
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("smart-file-mover")
            .join("moves.log")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the line for an event. Progress and phase events are not logged.
    pub fn record(&mut self, event: &Event) -> io::Result<()> {
        let Some((kind, file, message)) = Self::line_parts(event) else {
            return Ok(());
        };

        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false);
        writeln!(self.writer, "{} {} {} {}", timestamp, kind, file, message)?;
        self.writer.flush()
    }

    fn line_parts(event: &Event) -> Option<(String, String, String)> {
        match event {
            Event::FileResult {
                file_name,
                outcome,
                message,
            } => Some((outcome.to_string(), file_name.clone(), message.clone())),
            Event::Error { message } => Some(("ERROR".into(), "-".into(), message.clone())),
            Event::Finished { summary } => {
                let state = summary
                    .state
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                Some((
                    "RUN".into(),
                    "-".into(),
                    format!(
                        "{}: {} succeeded, {} skipped, {} failed, {} cancelled",
                        state, summary.succeeded, summary.skipped, summary.failed, summary.cancelled
                    ),
                ))
            }
            _ => None,
        }
    }
}
