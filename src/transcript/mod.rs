//! Streaming transcript handling
//!
//! Converts recognizer output into stable candidate utterances.

mod buffer;

pub use buffer::{FragmentDecision, TranscriptBuffer, TranscriptFragment};
