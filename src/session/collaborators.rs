use std::sync::Arc;

use crate::ai::QuestionGenerator;
use crate::audio::AudioBackend;
use crate::feedback::FeedbackGenerator;
use crate::speech::{AudioSink, SpeechSynthesizer};
use crate::transcription::LiveTranscriber;

/// External services a session drives
///
/// The microphone and transcriber are owned by the session for its whole
/// lifetime; the rest are shared request/response services.
pub struct Collaborators {
    pub microphone: Box<dyn AudioBackend>,
    pub transcriber: Box<dyn LiveTranscriber>,
    pub questions: Arc<dyn QuestionGenerator>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub sink: Arc<dyn AudioSink>,
    pub feedback: Arc<dyn FeedbackGenerator>,
}
