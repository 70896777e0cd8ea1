// Tests for the AI turn client: request shape, validation and the turn cap

use loqa_interviews::ai::{
    AiTurnClient, InterviewContext, QuestionGenerator, QuestionRequest, QuestionResponse,
    DEFAULT_MAX_AI_TURNS,
};
use loqa_interviews::conversation::{Role, Utterance};
use loqa_interviews::error::{CollaboratorError, FailureCategory, SessionError};
use std::sync::{Arc, Mutex};

/// Generator that always answers with the same response
struct FixedGenerator {
    response: Result<QuestionResponse, CollaboratorError>,
    seen: Mutex<Vec<QuestionRequest>>,
}

impl FixedGenerator {
    fn replying(role: Role, content: &str, end_interview: bool) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(QuestionResponse {
                role,
                content: content.to_string(),
                end_interview,
            }),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(err: CollaboratorError) -> Arc<Self> {
        Arc::new(Self {
            response: Err(err),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait::async_trait]
impl QuestionGenerator for FixedGenerator {
    async fn next_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionResponse, CollaboratorError> {
        self.seen.lock().unwrap().push(request.clone());
        self.response.clone()
    }
}

fn context() -> InterviewContext {
    InterviewContext {
        job_description: "Backend engineer".to_string(),
        resume_summary: "Built payment systems".to_string(),
    }
}

/// Conversation with `turns` interviewer/candidate exchanges
fn conversation(turns: usize) -> Vec<Utterance> {
    (0..turns)
        .flat_map(|i| {
            [
                Utterance::interviewer(format!("Question {}", i + 1)),
                Utterance::candidate(format!("Answer {}", i + 1)),
            ]
        })
        .collect()
}

#[tokio::test]
async fn test_request_carries_context_and_prior_turns() {
    let generator = FixedGenerator::replying(Role::Interviewer, "Why this role?", false);
    let client = AiTurnClient::new(generator.clone(), context(), DEFAULT_MAX_AI_TURNS);

    let turn = client.next_turn(&conversation(2)).await.unwrap();

    assert_eq!(turn.utterance, "Why this role?");
    assert!(!turn.end_interview);

    let seen = generator.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].conversation_log.len(), 4);
    assert_eq!(seen[0].prior_ai_turn_count, 2);
    assert_eq!(seen[0].job_description, "Backend engineer");
    assert_eq!(seen[0].resume_summary, "Built payment systems");
}

#[tokio::test]
async fn test_opening_request_has_empty_history() {
    let generator = FixedGenerator::replying(Role::Interviewer, "Welcome!", false);
    let client = AiTurnClient::new(generator.clone(), context(), DEFAULT_MAX_AI_TURNS);

    client.next_turn(&[]).await.unwrap();

    let seen = generator.seen.lock().unwrap();
    assert!(seen[0].conversation_log.is_empty());
    assert_eq!(seen[0].prior_ai_turn_count, 0);
}

#[tokio::test]
async fn test_turn_cap_forces_end_of_interview() {
    let generator = FixedGenerator::replying(Role::Interviewer, "Another question?", false);
    let client = AiTurnClient::new(generator, context(), 6);

    let turn = client.next_turn(&conversation(6)).await.unwrap();

    assert!(turn.end_interview, "Six prior turns must end the interview");
    assert_eq!(turn.utterance, "Another question?");
}

#[tokio::test]
async fn test_below_cap_respects_generator_flag() {
    let generator = FixedGenerator::replying(Role::Interviewer, "Next question.", false);
    let client = AiTurnClient::new(generator, context(), 6);

    let turn = client.next_turn(&conversation(5)).await.unwrap();

    assert!(!turn.end_interview);
}

#[tokio::test]
async fn test_generator_may_end_early() {
    let generator = FixedGenerator::replying(Role::Interviewer, "That's all, thank you.", true);
    let client = AiTurnClient::new(generator, context(), 6);

    let turn = client.next_turn(&conversation(1)).await.unwrap();

    assert!(turn.end_interview);
}

#[tokio::test]
async fn test_wrong_role_is_malformed() {
    let generator = FixedGenerator::replying(Role::Candidate, "I am the candidate", false);
    let client = AiTurnClient::new(generator, context(), 6);

    let err = client.next_turn(&[]).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::AiTurn(CollaboratorError::Malformed(_))
    ));
    assert_eq!(err.category(), FailureCategory::AiTurn);
}

#[tokio::test]
async fn test_blank_content_is_malformed() {
    let generator = FixedGenerator::replying(Role::Interviewer, "   ", false);
    let client = AiTurnClient::new(generator, context(), 6);

    let err = client.next_turn(&[]).await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::AiTurn(CollaboratorError::Malformed(_))
    ));
}

#[tokio::test]
async fn test_collaborator_failure_is_not_retried() {
    let generator = FixedGenerator::failing(CollaboratorError::Request("timeout".to_string()));
    let client = AiTurnClient::new(generator.clone(), context(), 6);

    let err = client.next_turn(&conversation(1)).await.unwrap_err();

    assert_eq!(
        err,
        SessionError::AiTurn(CollaboratorError::Request("timeout".to_string()))
    );
    assert_eq!(generator.seen.lock().unwrap().len(), 1);
}

#[test]
fn test_question_wire_format_is_camel_case() {
    let request = QuestionRequest {
        conversation_log: vec![Utterance::candidate("Hi")],
        job_description: "JD".to_string(),
        resume_summary: "CV".to_string(),
        prior_ai_turn_count: 3,
    };
    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["conversationLog"][0]["role"], "user");
    assert_eq!(json["jobDescription"], "JD");
    assert_eq!(json["resumeSummary"], "CV");
    assert_eq!(json["priorAiTurnCount"], 3);

    let response: QuestionResponse = serde_json::from_str(
        r#"{"role": "assistant", "content": "Welcome!", "endInterview": true}"#,
    )
    .unwrap();
    assert_eq!(response.role, Role::Interviewer);
    assert!(response.end_interview);
}
