//! # Smart File Mover
//!
//! Organizes files from one or more source folders into a destination
//! tree, one folder per kind of file.
//!
//! ## Core Philosophy
//! - **Never overwrite** - A name collision gets a numeric suffix
//! - **Never copy twice** - Identical content is detected and skipped
//! - **Never lose your place** - A cancelled run resumes where it stopped
//!
//! ## Architecture
//! The library is split into a core engine (GUI-agnostic) and presentation layers:
//! - `core` - The classification and move engine
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{MoverError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `default_level`
/// applies when `RUST_LOG` is not set.
pub fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
