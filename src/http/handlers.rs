use super::state::AppState;
use crate::audio::{AudioBackendConfig, AudioBackendFactory};
use crate::nats::{self, NatsClient};
use crate::session::{InterviewSession, SessionConfig, SessionOutcome};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    /// Optional interview ID (if not provided, generate UUID)
    pub interview_id: Option<String>,

    pub user_name: String,

    pub job_description: String,

    pub resume_summary: String,

    /// Existing feedback record to overwrite
    pub feedback_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub interview_id: String,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> axum::response::Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn not_found(interview_id: &str) -> axum::response::Response {
    error_response(
        StatusCode::NOT_FOUND,
        format!("Interview {} not found", interview_id),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /interviews/start
/// Create an interview session and start the call
pub async fn start_interview(
    State(state): State<AppState>,
    Json(req): Json<StartInterviewRequest>,
) -> impl IntoResponse {
    let defaults = state.interview.session_config();
    let config = SessionConfig {
        session_id: req.interview_id.unwrap_or(defaults.session_id.clone()),
        user_name: req.user_name,
        feedback_id: req.feedback_id,
        job_description: req.job_description,
        resume_summary: req.resume_summary,
        ..defaults
    };
    let interview_id = config.session_id.clone();

    info!("Starting interview: {}", interview_id);

    let client = match NatsClient::connect(&state.nats.url, interview_id.clone()).await {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to connect collaborators: {}", e);
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Failed to connect collaborators: {}", e),
            );
        }
    };

    let source = state.interview.microphone.source(Arc::clone(&client));
    let microphone = match AudioBackendFactory::create(source, AudioBackendConfig::default()) {
        Ok(microphone) => microphone,
        Err(e) => {
            error!("Failed to open microphone: {}", e);
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Failed to open microphone: {}", e),
            );
        }
    };

    let session = Arc::new(InterviewSession::new(
        config,
        nats::collaborators(client, microphone),
    ));

    if !state.try_register(Arc::clone(&session)).await {
        return error_response(
            StatusCode::CONFLICT,
            format!("Interview {} is already running", interview_id),
        );
    }

    if let Err(e) = session.start() {
        error!("Failed to start interview: {}", e);
        state.sessions.write().await.remove(&interview_id);
        return error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to start interview: {}", e),
        );
    }

    (
        StatusCode::OK,
        Json(StartInterviewResponse {
            interview_id: interview_id.clone(),
            status: "connecting".to_string(),
            message: format!("Interview {} started", interview_id),
        }),
    )
        .into_response()
}

/// POST /interviews/:interview_id/end
/// End an interview, wait for feedback, and return the outcome
pub async fn end_interview(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    info!("Ending interview: {}", interview_id);

    let session = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&interview_id)
    };

    let Some(session) = session else {
        return not_found(&interview_id);
    };

    match session.stop().await {
        Ok(outcome) => (StatusCode::OK, Json::<SessionOutcome>(outcome)).into_response(),
        Err(e) => {
            error!("Failed to end interview: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to end interview: {}", e),
            )
        }
    }
}

/// GET /interviews/:interview_id/status
pub async fn get_interview_status(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&interview_id) {
        Some(session) => (StatusCode::OK, Json(session.stats())).into_response(),
        None => not_found(&interview_id),
    }
}

/// GET /interviews/:interview_id/conversation
/// Conversation accumulated so far
pub async fn get_interview_conversation(
    State(state): State<AppState>,
    Path(interview_id): Path<String>,
) -> impl IntoResponse {
    let sessions = state.sessions.read().await;

    match sessions.get(&interview_id) {
        Some(session) => (StatusCode::OK, Json(session.conversation())).into_response(),
        None => not_found(&interview_id),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
