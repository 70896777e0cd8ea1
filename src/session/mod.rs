//! Interview session management
//!
//! This module provides the `InterviewSession` abstraction that manages:
//! - Call lifecycle (idle → connecting → active → finished)
//! - Microphone capture and the live transcription connection
//! - Turn taking between the candidate and the AI interviewer
//! - Teardown and the single feedback submission

mod collaborators;
mod config;
mod controller;
mod events;
mod session;
mod state;
mod stats;

pub use collaborators::Collaborators;
pub use config::SessionConfig;
pub use events::{EndReason, SessionEvent, SessionNotice};
pub use session::InterviewSession;
pub use state::SessionState;
pub use stats::{SessionOutcome, SessionSnapshot, SessionStats};
