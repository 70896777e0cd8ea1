use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::conversation::{Role, Utterance};
use crate::error::{CollaboratorError, SessionError, SessionResult};
use crate::turn::AiTurn;

/// Default cap on interviewer utterances per interview
pub const DEFAULT_MAX_AI_TURNS: usize = 6;

/// Request sent to the question-generation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionRequest {
    pub conversation_log: Vec<Utterance>,
    pub job_description: String,
    pub resume_summary: String,
    pub prior_ai_turn_count: usize,
}

/// Structured reply from the question-generation collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub role: Role,
    pub content: String,
    pub end_interview: bool,
}

/// Text-generation collaborator producing the next interviewer utterance
#[async_trait::async_trait]
pub trait QuestionGenerator: Send + Sync {
    async fn next_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionResponse, CollaboratorError>;
}

/// Static context for the whole interview
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterviewContext {
    pub job_description: String,
    pub resume_summary: String,
}

/// Stateless request/response wrapper around the question generator
pub struct AiTurnClient {
    generator: Arc<dyn QuestionGenerator>,
    context: InterviewContext,
    max_ai_turns: usize,
}

impl AiTurnClient {
    pub fn new(
        generator: Arc<dyn QuestionGenerator>,
        context: InterviewContext,
        max_ai_turns: usize,
    ) -> Self {
        Self {
            generator,
            context,
            max_ai_turns,
        }
    }

    pub fn max_ai_turns(&self) -> usize {
        self.max_ai_turns
    }

    /// Fetch the next interviewer turn for `conversation`
    ///
    /// No retries: any collaborator failure is returned as a fatal
    /// `SessionError::AiTurn`.
    pub async fn next_turn(&self, conversation: &[Utterance]) -> SessionResult<AiTurn> {
        let prior_ai_turn_count = conversation
            .iter()
            .filter(|u| u.role == Role::Interviewer)
            .count();

        let request = QuestionRequest {
            conversation_log: conversation.to_vec(),
            job_description: self.context.job_description.clone(),
            resume_summary: self.context.resume_summary.clone(),
            prior_ai_turn_count,
        };

        info!(
            "Requesting interviewer turn (history={}, prior_turns={})",
            conversation.len(),
            prior_ai_turn_count
        );

        let response = self
            .generator
            .next_question(&request)
            .await
            .map_err(SessionError::AiTurn)?;

        let turn = self.validate(response, prior_ai_turn_count)?;
        info!(
            "Interviewer turn received (end_interview={}): {}",
            turn.end_interview, turn.utterance
        );
        Ok(turn)
    }

    fn validate(&self, response: QuestionResponse, prior: usize) -> SessionResult<AiTurn> {
        if response.role != Role::Interviewer {
            return Err(SessionError::AiTurn(CollaboratorError::Malformed(format!(
                "expected assistant role, got {:?}",
                response.role
            ))));
        }

        let utterance = response.content.trim().to_string();
        if utterance.is_empty() {
            return Err(SessionError::AiTurn(CollaboratorError::Malformed(
                "empty interviewer utterance".to_string(),
            )));
        }

        let mut end_interview = response.end_interview;
        if prior >= self.max_ai_turns && !end_interview {
            warn!(
                "Turn cap reached ({} prior turns), forcing end of interview",
                prior
            );
            end_interview = true;
        }

        Ok(AiTurn {
            utterance,
            end_interview,
        })
    }
}
