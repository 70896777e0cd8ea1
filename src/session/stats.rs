use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

use super::events::EndReason;
use super::state::SessionState;
use crate::conversation::ConversationLog;
use crate::feedback::{FeedbackResponse, Redirect};

/// Statistics about an interview session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// Current lifecycle state
    pub state: SessionState,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Interviewer utterances so far
    pub ai_turns: usize,

    /// Candidate utterances so far
    pub candidate_utterances: usize,

    /// Transcript fragments that never reached the log
    pub fragments_discarded: usize,

    /// Audio chunks forwarded to the transcriber
    pub audio_chunks_sent: usize,

    /// Keep-alives sent on the transcription connection
    pub keep_alives_sent: usize,
}

/// Live view of a running session, published after every event
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub state: SessionState,
    pub speaking: bool,
    pub conversation: Arc<ConversationLog>,
    pub fragments_discarded: usize,
    pub audio_chunks_sent: usize,
    pub keep_alives_sent: usize,
    /// AI requests issued (including ones still outstanding)
    pub ai_requests: usize,
    /// Idle and keep-alive timers currently registered
    pub active_timers: usize,
    /// Whether the microphone is streaming
    pub microphone_active: bool,
}

impl SessionSnapshot {
    pub fn initial() -> Self {
        Self {
            state: SessionState::Idle,
            speaking: false,
            conversation: Arc::new(ConversationLog::new()),
            fragments_discarded: 0,
            audio_chunks_sent: 0,
            keep_alives_sent: 0,
            ai_requests: 0,
            active_timers: 0,
            microphone_active: false,
        }
    }

    pub fn stats(&self, started_at: DateTime<Utc>) -> SessionStats {
        let duration = Utc::now().signed_duration_since(started_at);
        SessionStats {
            state: self.state,
            started_at,
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            ai_turns: self.conversation.interviewer_turns(),
            candidate_utterances: self.conversation.candidate_turns(),
            fragments_discarded: self.fragments_discarded,
            audio_chunks_sent: self.audio_chunks_sent,
            keep_alives_sent: self.keep_alives_sent,
        }
    }
}

/// Final result of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionOutcome {
    pub session_id: String,
    pub reason: EndReason,
    pub stats: SessionStats,
    pub conversation: ConversationLog,
    /// Feedback collaborator reply; `None` if skipped or failed
    pub feedback: Option<FeedbackResponse>,
    pub redirect: Redirect,
}
