//! # Events Module
//!
//! Typed event stream between the engine and any presentation layer.
//!
//! ## Design
//! The engine runs on one worker thread and is the single writer of
//! events. Consumers (CLI progress bar, audit log, a future GUI) read
//! them from the receiver side of an [`EventChannel`].
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         match event {
//!             Event::Progress { percent, file_name } => println!("{percent}% {file_name}"),
//!             Event::FileResult { file_name, outcome, .. } => println!("{outcome} {file_name}"),
//!             _ => {}
//!         }
//!     }
//! });
//!
//! engine.run_with_events(&sender, &CancellationToken::new())?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
