//! Error taxonomy for interview sessions
//!
//! Collaborators (question generation, speech synthesis, transcription,
//! feedback) report `CollaboratorError`. The session controller wraps those
//! into `SessionError`, which is always fatal to the session.

use serde::Serialize;

/// Failure reported by an external collaborator
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// The request could not be delivered or no reply arrived
    #[error("request failed: {0}")]
    Request(String),
    /// A reply arrived but did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The collaborator answered with an explicit failure
    #[error("service reported failure: {0}")]
    Service(String),
}

impl From<serde_json::Error> for CollaboratorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Fatal session error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("microphone unavailable: {0}")]
    Microphone(String),
    #[error("transcription connection failed: {0}")]
    Transcription(CollaboratorError),
    #[error("failed to fetch interview turn: {0}")]
    AiTurn(CollaboratorError),
    #[error("failed to synthesize speech: {0}")]
    Synthesis(CollaboratorError),
    #[error("feedback generation failed: {0}")]
    Feedback(CollaboratorError),
}

impl SessionError {
    pub fn category(&self) -> FailureCategory {
        match self {
            SessionError::Microphone(_) => FailureCategory::Microphone,
            SessionError::Transcription(_) => FailureCategory::Transcription,
            SessionError::AiTurn(_) => FailureCategory::AiTurn,
            SessionError::Synthesis(_) => FailureCategory::Synthesis,
            SessionError::Feedback(_) => FailureCategory::Feedback,
        }
    }
}

/// Category used to de-duplicate user-visible notices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    Microphone,
    Transcription,
    AiTurn,
    Synthesis,
    Feedback,
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
