//! # Core Module
//!
//! The GUI-agnostic classification and move engine.
//!
//! ## Modules
//! - `scanner` - Walks source roots in a stable order
//! - `classifier` - Picks the destination folder for a file
//! - `hasher` - Content digests for duplicate detection
//! - `resolver` - Free destination paths and duplicate checks
//! - `transform` - Image recompression before writing
//! - `progress` - Saved progress for resuming a run
//! - `audit` - Append-only log of file outcomes
//! - `engine` - Orchestrates the full workflow

pub mod audit;
pub mod classifier;
pub mod engine;
pub mod hasher;
pub mod progress;
pub mod resolver;
pub mod scanner;
pub mod transform;

// Re-export commonly used types
pub use classifier::{Classification, Classifier, FileKind, StructureModel};
pub use engine::{CancellationToken, Engine, EngineBuilder, LayoutMode, OperationMode, RunConfig};
pub use hasher::{ContentDigest, ContentHasher, Sha256Hasher};
pub use progress::{JsonProgressStore, ProgressStore, RunProgress};
pub use scanner::DiscoveredFile;
