//! # Error Module
//!
//! User-friendly error types for the file mover.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Setup errors are fatal**, per-file errors are recorded and the run continues
//! - **Recovery hints** - suggest how to fix when possible

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MoverError {
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    #[error("Progress store error: {0}")]
    Progress(#[from] ProgressStoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that abort a run before any file is touched
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("No source directories were given")]
    NoSources,

    #[error("Source directory not found: {path}")]
    SourceNotFound { path: PathBuf },

    #[error("Source is not a directory: {path}")]
    SourceNotDirectory { path: PathBuf },

    #[error("Destination {path} cannot be used: {source}")]
    DestinationUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Destination {path} is the same directory as a source")]
    DestinationIsSource { path: PathBuf },

    #[error("Invalid structure model: {reason}")]
    InvalidStructureModel { reason: String },

    #[error("No files found in {}", format_paths(.sources))]
    NoFilesFound { sources: Vec<PathBuf> },

    #[error("Saved progress belongs to a different run ({reason}). Run `file-mover discard` to start over.")]
    ResumeMismatch { reason: String },
}

/// Errors met while walking a source tree. Reported and skipped.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Errors that occur while hashing file content
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read {path} for hashing: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the content transform hook
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to resize image {path}: {reason}")]
    Resize { path: PathBuf, reason: String },

    #[error("Failed to encode image {path}: {reason}")]
    Encode { path: PathBuf, reason: String },

    #[error("Failed to read image file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors local to a single file. Recorded as an Error outcome; the run continues.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("could not confirm duplicate: {0}")]
    Hash(#[from] HashError),

    #[error("image recompression failed: {0}")]
    Transform(#[from] TransformError),

    #[error("could not create folder {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("copy to {dest} failed: {source}")]
    Copy {
        dest: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{dest} was created by another program before it could be written")]
    DestinationTaken { dest: PathBuf },

    #[error("copied, but the original could not be removed: {source}")]
    Remove {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors reading or writing the saved progress record
#[derive(Error, Debug)]
pub enum ProgressStoreError {
    #[error("Failed to access progress file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Progress file {path} is corrupted ({reason}). Delete this file and try again.")]
    Corrupted { path: PathBuf, reason: String },
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MoverError>;
