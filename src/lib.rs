pub mod ai;
pub mod audio;
pub mod config;
pub mod conversation;
pub mod error;
pub mod feedback;
pub mod http;
pub mod nats;
pub mod session;
pub mod speech;
pub mod transcript;
pub mod transcription;
pub mod turn;

pub use ai::{AiTurnClient, InterviewContext, QuestionGenerator, QuestionRequest, QuestionResponse};
pub use audio::{
    AudioBackend, AudioBackendConfig, AudioBackendFactory, AudioFile, AudioFrame, AudioSource,
    FileMicrophone,
};
pub use config::Config;
pub use conversation::{ConversationLog, Role, Utterance};
pub use error::{CollaboratorError, FailureCategory, SessionError};
pub use feedback::{FeedbackGenerator, FeedbackRequest, FeedbackResponse, Redirect};
pub use http::{create_router, AppState};
pub use nats::{AudioFrameMessage, NatsClient, TranscriptMessage};
pub use session::{
    Collaborators, EndReason, InterviewSession, SessionConfig, SessionNotice, SessionOutcome,
    SessionState, SessionStats,
};
pub use speech::{AudioSink, PacedSink, PlaybackController, SpeechSynthesizer, SynthesizedAudio};
pub use transcript::{TranscriptBuffer, TranscriptFragment};
pub use transcription::{LiveTranscriber, TranscriberEvent};
pub use turn::{TimerRegistry, TimerSlot, TurnScheduler};
