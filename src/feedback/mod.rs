//! Feedback-generation collaborator contract
//!
//! Invoked exactly once when a session finishes. Its reply is only used to
//! decide where the candidate goes next.

use serde::{Deserialize, Serialize};

use crate::conversation::Utterance;
use crate::error::CollaboratorError;

/// Submission made when the interview ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub conversation_log: Vec<Utterance>,
    pub interview_id: String,
    pub user_name: String,
    /// Existing feedback record to overwrite, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub success: bool,
    #[serde(default)]
    pub feedback_id: Option<String>,
}

#[async_trait::async_trait]
pub trait FeedbackGenerator: Send + Sync {
    async fn generate(&self, request: &FeedbackRequest)
        -> Result<FeedbackResponse, CollaboratorError>;
}

/// Where the candidate should be sent after the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Redirect {
    /// The feedback page for this interview
    Feedback { interview_id: String },
    /// Safe fallback
    Home,
}

impl Redirect {
    /// Navigation target for a feedback reply
    pub fn for_response(interview_id: &str, response: Option<&FeedbackResponse>) -> Self {
        match response {
            Some(FeedbackResponse {
                success: true,
                feedback_id: Some(_),
            }) => Redirect::Feedback {
                interview_id: interview_id.to_string(),
            },
            _ => Redirect::Home,
        }
    }
}
