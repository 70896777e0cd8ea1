use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::audio::AudioFrame;
use crate::error::CollaboratorError;
use crate::speech::SynthesizedAudio;
use crate::transcript::TranscriptFragment;

/// Audio frame message published to NATS
#[derive(Debug, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub timestamp: String, // RFC3339 timestamp
}

impl AudioFrameMessage {
    /// Decode the base64 little-endian PCM payload into samples
    pub fn decode(&self) -> Result<AudioFrame, CollaboratorError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.pcm)
            .map_err(|e| {
                CollaboratorError::Malformed(format!(
                    "frame {} is not base64: {}",
                    self.sequence, e
                ))
            })?;

        if bytes.len() % 2 != 0 {
            return Err(CollaboratorError::Malformed(format!(
                "frame {} has an odd byte count ({})",
                self.sequence,
                bytes.len()
            )));
        }

        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(AudioFrame {
            samples,
            sample_rate: self.sample_rate,
            channels: self.channels,
            timestamp_ms: 0,
        })
    }
}

/// Transcript message received from STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub is_final: bool,
    pub speech_final: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

impl TranscriptMessage {
    /// The fragment carried by this message, if it belongs to `session_id`
    pub fn fragment_for(self, session_id: &str) -> Option<TranscriptFragment> {
        if self.session_id != session_id {
            return None;
        }
        Some(TranscriptFragment::new(
            self.text,
            self.is_final,
            self.speech_final,
        ))
    }
}

/// Keeps an idle STT stream open
#[derive(Debug, Serialize, Deserialize)]
pub struct KeepAliveMessage {
    pub session_id: String,
    pub timestamp: String,
}

/// Speech synthesis request
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeakRequest {
    pub session_id: String,
    pub text: String,
}

/// Synthesized speech carried in a reply
#[derive(Debug, Serialize, Deserialize)]
pub struct SpeechPayload {
    pub audio: String, // Base64-encoded WAV
}

impl SpeechPayload {
    /// Decode the base64 WAV; empty audio is an error
    pub fn decode(self) -> Result<SynthesizedAudio, CollaboratorError> {
        let wav_bytes = base64::engine::general_purpose::STANDARD
            .decode(self.audio)
            .map_err(|e| CollaboratorError::Malformed(format!("audio is not base64: {}", e)))?;

        if wav_bytes.is_empty() {
            return Err(CollaboratorError::Malformed("empty audio".to_string()));
        }

        Ok(SynthesizedAudio { wav_bytes })
    }
}

/// Synthesized speech forwarded to the candidate's client
#[derive(Debug, Serialize, Deserialize)]
pub struct TtsAudioMessage {
    pub session_id: String,
    pub audio: String, // Base64-encoded WAV
    pub timestamp: String,
}

/// Envelope used by request/reply services: `{success, object}` or `{success: false, error}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceReply<T> {
    pub success: bool,
    pub object: Option<T>,
    pub error: Option<String>,
}

impl<T> ServiceReply<T> {
    pub fn into_result(self) -> Result<T, CollaboratorError> {
        match (self.success, self.object) {
            (true, Some(object)) => Ok(object),
            (true, None) => Err(CollaboratorError::Malformed(
                "reply marked success without an object".to_string(),
            )),
            (false, _) => Err(CollaboratorError::Service(
                self.error.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}
