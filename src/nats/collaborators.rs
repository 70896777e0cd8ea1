//! NATS-backed implementations of the interview collaborators

use anyhow::Result;
use futures::stream::StreamExt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::client::{NatsClient, FEEDBACK_SUBJECT, QUESTION_SUBJECT, SYNTHESIS_SUBJECT};
use super::messages::{
    AudioFrameMessage, ServiceReply, SpeakRequest, SpeechPayload, TranscriptMessage,
};
use crate::ai::{QuestionGenerator, QuestionRequest, QuestionResponse};
use crate::audio::{AudioBackend, AudioBackendConfig, AudioFrame};
use crate::error::CollaboratorError;
use crate::feedback::{FeedbackGenerator, FeedbackRequest, FeedbackResponse};
use crate::speech::{AudioSink, PacedSink, SpeechSynthesizer, SynthesizedAudio};
use crate::transcription::{LiveTranscriber, TranscriberCallback, TranscriberEvent};

/// Live transcription over the STT service's NATS subjects
pub struct NatsTranscriber {
    client: Arc<NatsClient>,
    sequence: AtomicU32,
    listener: Option<JoinHandle<()>>,
}

impl NatsTranscriber {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self {
            client,
            sequence: AtomicU32::new(0),
            listener: None,
        }
    }
}

#[async_trait::async_trait]
impl LiveTranscriber for NatsTranscriber {
    async fn connect(&mut self, on_event: TranscriberCallback) -> Result<(), CollaboratorError> {
        let mut subscriber = self
            .client
            .subscribe_transcripts()
            .await
            .map_err(|e| CollaboratorError::Request(e.to_string()))?;

        let session_id = self.client.interview_id().to_string();
        on_event(TranscriberEvent::Open);

        self.listener = Some(tokio::spawn(async move {
            info!("Transcript receiving task started");

            while let Some(msg) = subscriber.next().await {
                match serde_json::from_slice::<TranscriptMessage>(&msg.payload) {
                    Ok(transcript) => {
                        if let Some(fragment) = transcript.fragment_for(&session_id) {
                            on_event(TranscriberEvent::Transcript(fragment));
                        }
                    }
                    Err(e) => {
                        warn!("Failed to parse transcript message: {}", e);
                    }
                }
            }

            info!("Transcript receiving task stopped");
            on_event(TranscriberEvent::Close);
        }));

        Ok(())
    }

    async fn send_audio(&self, chunk: &[u8]) -> Result<(), CollaboratorError> {
        // A zero-length frame terminates some STT streams
        if chunk.is_empty() {
            return Ok(());
        }

        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.client
            .publish_audio_frame(chunk, 16000, 1, seq)
            .await
            .map_err(|e| CollaboratorError::Request(e.to_string()))
    }

    async fn keep_alive(&self) -> Result<(), CollaboratorError> {
        self.client
            .publish_keep_alive()
            .await
            .map_err(|e| CollaboratorError::Request(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), CollaboratorError> {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            info!("Transcription connection closed");
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Question generation via `interview.question` request/reply
pub struct NatsQuestionGenerator {
    client: Arc<NatsClient>,
}

impl NatsQuestionGenerator {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl QuestionGenerator for NatsQuestionGenerator {
    async fn next_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionResponse, CollaboratorError> {
        let reply: ServiceReply<QuestionResponse> =
            self.client.request_json(QUESTION_SUBJECT, request).await?;
        reply.into_result()
    }
}

/// Speech synthesis via `tts.synthesize` request/reply
pub struct NatsSpeechSynthesizer {
    client: Arc<NatsClient>,
}

impl NatsSpeechSynthesizer {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for NatsSpeechSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, CollaboratorError> {
        let request = SpeakRequest {
            session_id: self.client.interview_id().to_string(),
            text: text.to_string(),
        };
        let reply: ServiceReply<SpeechPayload> =
            self.client.request_json(SYNTHESIS_SUBJECT, &request).await?;
        reply.into_result()?.decode()
    }
}

/// Feedback generation via `interview.feedback` request/reply
pub struct NatsFeedbackGenerator {
    client: Arc<NatsClient>,
}

impl NatsFeedbackGenerator {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl FeedbackGenerator for NatsFeedbackGenerator {
    async fn generate(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackResponse, CollaboratorError> {
        self.client.request_json(FEEDBACK_SUBJECT, request).await
    }
}

/// Forwards synthesized speech to the candidate's client and waits out its duration
pub struct NatsAudioSink {
    client: Arc<NatsClient>,
    pacing: PacedSink,
}

impl NatsAudioSink {
    pub fn new(client: Arc<NatsClient>) -> Self {
        Self {
            client,
            pacing: PacedSink::new(),
        }
    }
}

#[async_trait::async_trait]
impl AudioSink for NatsAudioSink {
    async fn play(&self, audio: SynthesizedAudio) -> Result<()> {
        self.client.publish_tts_audio(&audio.wav_bytes).await?;
        self.pacing.play(audio).await
    }

    fn stop(&self) {
        self.pacing.stop();
    }
}

/// Microphone frames published by the candidate's client
///
/// Frames whose format differs from the configured target are dropped.
pub struct NatsMicrophone {
    client: Arc<NatsClient>,
    config: AudioBackendConfig,
    task: Option<JoinHandle<()>>,
}

impl NatsMicrophone {
    pub fn new(client: Arc<NatsClient>, config: AudioBackendConfig) -> Self {
        Self {
            client,
            config,
            task: None,
        }
    }
}

#[async_trait::async_trait]
impl AudioBackend for NatsMicrophone {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.is_capturing() {
            anyhow::bail!("NATS microphone is already capturing");
        }

        let mut subscriber = self.client.subscribe_microphone().await?;
        let (tx, rx) = mpsc::channel(100);
        let config = self.config.clone();

        self.task = Some(tokio::spawn(async move {
            while let Some(msg) = subscriber.next().await {
                let frame = match serde_json::from_slice::<AudioFrameMessage>(&msg.payload)
                    .map_err(CollaboratorError::from)
                    .and_then(|message| message.decode())
                {
                    Ok(frame) => frame,
                    Err(e) => {
                        warn!("Dropping microphone frame: {}", e);
                        continue;
                    }
                };

                if !config.accepts(&frame) {
                    warn!(
                        "Dropping {}Hz/{}ch microphone frame, expected {}Hz/{}ch",
                        frame.sample_rate,
                        frame.channels,
                        config.target_sample_rate,
                        config.target_channels
                    );
                    continue;
                }

                if let Err(e) = tx.send(frame).await {
                    error!("Failed to forward microphone frame: {}", e);
                    break;
                }
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("NATS microphone stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn name(&self) -> &str {
        "nats"
    }
}
