//! Core research components
//!
//! This module contains the turn pipeline and the pure text processing it
//! relies on, plus durable storage and feedback capture.

pub mod decode;
pub mod feedback;
pub mod format;
pub mod memory;
pub mod offline;
pub mod pipeline;
pub mod prompt;
pub mod references;

pub use feedback::{FeedbackError, FeedbackInput, FeedbackService};
pub use memory::{ChatSummary, FeedbackRecord, MemoryStore};
pub use offline::OfflineResponder;
pub use pipeline::{ResearchPipeline, TurnOutcome};
