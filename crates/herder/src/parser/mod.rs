//! Log parsing engine.
//!
//! Converts raw CI harness logs into structured, deterministic artifacts
//! ready for submission to a results service.
//!
//! # Architecture
//!
//! - `classify.rs`: regex tagging of raw lines into semantic categories
//! - `errors.rs`: failure-line accumulation inside an open section
//! - `step.rs`: stateful section parser (start/end markers, durations)
//! - `cursor.rs`: single-line pushback over an in-memory log
//! - `steeplechase.rs`: fixed-phase protocol parser for paired-client logs
//! - `summary.rs`: text-log-summary artifact assembly
//! - `verdict.rs`: pure result classification for parsed artifacts
//! - `model.rs`: artifact data structures and parse errors
//!
//! All parsing is single-threaded and single-pass: every parse run owns its
//! own state, so independent logs can be parsed concurrently.

pub mod classify;
pub mod cursor;
pub mod errors;
pub mod model;
pub mod steeplechase;
pub mod step;
pub mod summary;
pub mod verdict;

// Re-export commonly used types
pub use model::{ParseError, Verdict};

// Constants
pub const MAX_LINE_LENGTH: usize = 500; // chars kept before pattern matching
pub const MAX_STEP_ERROR_LINES: usize = 100; // errors retained per step
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
