pub mod client;
pub mod collaborators;
pub mod messages;

use std::sync::Arc;

pub use client::NatsClient;
pub use collaborators::{
    NatsAudioSink, NatsFeedbackGenerator, NatsMicrophone, NatsQuestionGenerator,
    NatsSpeechSynthesizer, NatsTranscriber,
};
pub use messages::{AudioFrameMessage, ServiceReply, TranscriptMessage};

use crate::audio::AudioBackend;
use crate::session::Collaborators;

/// Wire the collaborators of one interview to a shared NATS connection
pub fn collaborators(client: Arc<NatsClient>, microphone: Box<dyn AudioBackend>) -> Collaborators {
    Collaborators {
        microphone,
        transcriber: Box::new(NatsTranscriber::new(Arc::clone(&client))),
        questions: Arc::new(NatsQuestionGenerator::new(Arc::clone(&client))),
        synthesizer: Arc::new(NatsSpeechSynthesizer::new(Arc::clone(&client))),
        sink: Arc::new(NatsAudioSink::new(Arc::clone(&client))),
        feedback: Arc::new(NatsFeedbackGenerator::new(client)),
    }
}
