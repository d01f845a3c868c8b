//! # Engine Module
//!
//! Orchestrates a run from setup to a terminal state.
//!
//! ## States
//! 1. **Scanning** - Validate the inputs and count every file once
//! 2. **Running** - Walk the sources again; for each file classify, check
//!    for duplicates, transform and write it, then report the outcome
//! 3. **Completed / Cancelled / Fatal** - Terminal
//!
//! Files are handled one at a time on a single worker. Events flow out
//! through an [`EventSender`](crate::events::EventSender); cancellation
//! flows in through a [`CancellationToken`], polled once per file.

mod cancel;
mod config;
mod executor;
mod writer;

pub use cancel::CancellationToken;
pub use config::{EngineBuilder, LayoutMode, OperationMode, RunConfig};
pub use executor::Engine;
pub use writer::{FileWriter, WriteReport};
