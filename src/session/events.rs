use serde::Serialize;

use crate::error::{FailureCategory, SessionResult};
use crate::speech::PlaybackEvent;
use crate::transcription::TranscriberEvent;
use crate::turn::{AiTurn, TimerSlot};

/// Everything that can happen to a session, delivered in arrival order
#[derive(Debug)]
pub enum SessionEvent {
    /// Operator started the call
    Start,
    /// Operator ended the call
    End,
    /// Operator muted the microphone
    PauseMicrophone,
    /// Operator unmuted the microphone
    ResumeMicrophone,
    Transcriber(TranscriberEvent),
    /// Raw audio captured by the microphone
    AudioChunk { capture_id: u64, bytes: Vec<u8> },
    /// The microphone stream ran dry
    MicrophoneEnded { capture_id: u64 },
    TimerFired { slot: TimerSlot, generation: u64 },
    AiTurn(SessionResult<AiTurn>),
    Playback(PlaybackEvent),
}

/// User-visible notification, published at most once per category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionNotice {
    pub category: FailureCategory,
    pub message: String,
}

/// Why a session finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EndReason {
    /// The interviewer closed the interview and the remark was heard
    InterviewComplete,
    /// The operator ended the call
    OperatorEnded,
    /// A collaborator failed
    Failed {
        category: FailureCategory,
        message: String,
    },
}
