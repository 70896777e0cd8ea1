//! Live transcription collaborator contract

use std::sync::Arc;

use crate::error::CollaboratorError;
use crate::transcript::TranscriptFragment;

/// Lifecycle and recognition events from a live transcription connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriberEvent {
    /// Connection is ready to receive audio
    Open,
    /// A recognition result
    Transcript(TranscriptFragment),
    /// Connection closed by the remote side
    Close,
    /// Unrecoverable connection error
    Error(String),
}

/// Callback receiving transcriber events
pub type TranscriberCallback = Arc<dyn Fn(TranscriberEvent) + Send + Sync>;

/// Bidirectional streaming speech-to-text connection
#[async_trait::async_trait]
pub trait LiveTranscriber: Send + Sync {
    /// Open the connection; `on_event` receives `Open` once it is ready
    async fn connect(&mut self, on_event: TranscriberCallback) -> Result<(), CollaboratorError>;

    /// Send a non-empty chunk of raw audio
    async fn send_audio(&self, chunk: &[u8]) -> Result<(), CollaboratorError>;

    /// Keep an idle connection from timing out
    async fn keep_alive(&self) -> Result<(), CollaboratorError>;

    /// Close the connection; idempotent
    async fn close(&mut self) -> Result<(), CollaboratorError>;

    /// Name for logging
    fn name(&self) -> &str;
}
