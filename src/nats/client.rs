use anyhow::{Context, Result};
use async_nats::Client;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use super::messages::{AudioFrameMessage, KeepAliveMessage, TtsAudioMessage};
use crate::error::CollaboratorError;

/// Subject for question generation requests
pub const QUESTION_SUBJECT: &str = "interview.question";
/// Subject for speech synthesis requests
pub const SYNTHESIS_SUBJECT: &str = "tts.synthesize";
/// Subject for feedback generation requests
pub const FEEDBACK_SUBJECT: &str = "interview.feedback";

#[derive(Debug)]
pub struct NatsClient {
    client: Client,
    interview_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, interview_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self {
            client,
            interview_id,
        })
    }

    pub fn interview_id(&self) -> &str {
        &self.interview_id
    }

    /// Publish audio frame to NATS
    pub async fn publish_audio_frame(
        &self,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
        sequence: u32,
    ) -> Result<()> {
        let subject = format!("audio.frame.interview-{}", self.interview_id);

        let message = AudioFrameMessage {
            session_id: self.interview_id.clone(),
            sequence,
            pcm: base64::engine::general_purpose::STANDARD.encode(pcm_bytes),
            sample_rate,
            channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish audio frame")?;

        debug!(
            "Published audio frame to {} (seq={}, bytes={})",
            subject,
            sequence,
            pcm_bytes.len()
        );

        Ok(())
    }

    /// Publish a keep-alive for the transcription stream
    pub async fn publish_keep_alive(&self) -> Result<()> {
        let subject = format!("stt.keepalive.interview-{}", self.interview_id);
        let message = KeepAliveMessage {
            session_id: self.interview_id.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        self.client
            .publish(subject, serde_json::to_vec(&message)?.into())
            .await
            .context("Failed to publish keep-alive")?;

        debug!("Published keep-alive for {}", self.interview_id);
        Ok(())
    }

    /// Publish synthesized speech for the candidate's client to play
    pub async fn publish_tts_audio(&self, wav_bytes: &[u8]) -> Result<()> {
        let subject = format!("tts.audio.interview-{}", self.interview_id);
        let message = TtsAudioMessage {
            session_id: self.interview_id.clone(),
            audio: base64::engine::general_purpose::STANDARD.encode(wav_bytes),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        self.client
            .publish(subject, serde_json::to_vec(&message)?.into())
            .await
            .context("Failed to publish TTS audio")?;

        Ok(())
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        // The STT service publishes to stt.text.partial and stt.text.final;
        // messages are filtered by session_id in the payload
        let subject = "stt.text.>";

        info!("Subscribing to transcripts on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(subscriber)
    }

    /// Subscribe to microphone audio sent by the candidate's client
    pub async fn subscribe_microphone(&self) -> Result<async_nats::Subscriber> {
        let subject = format!("audio.mic.interview-{}", self.interview_id);

        info!("Subscribing to microphone audio on {}", subject);

        let subscriber = self
            .client
            .subscribe(subject)
            .await
            .context("Failed to subscribe to microphone audio")?;

        Ok(subscriber)
    }

    /// JSON request/reply against a collaborator service
    pub async fn request_json<Req, Resp>(
        &self,
        subject: &'static str,
        request: &Req,
    ) -> Result<Resp, CollaboratorError>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_vec(request)?;

        debug!("Requesting {} ({} bytes)", subject, payload.len());

        let reply = self
            .client
            .request(subject, payload.into())
            .await
            .map_err(|e| CollaboratorError::Request(format!("{}: {}", subject, e)))?;

        Ok(serde_json::from_slice(&reply.payload)?)
    }
}
