use anyhow::Result;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::CollaboratorError;

/// Synthesized speech (linear16 PCM in a WAV container)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub wav_bytes: Vec<u8>,
}

/// Text-to-speech collaborator
#[async_trait::async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, CollaboratorError>;
}

/// Audio output device or stream
#[async_trait::async_trait]
pub trait AudioSink: Send + Sync {
    /// Play `audio`, returning once playback has ended
    async fn play(&self, audio: SynthesizedAudio) -> Result<()>;

    /// Stop any playback in progress. Must not fail.
    fn stop(&self);
}

/// How a playback request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Audio played to the end
    Completed,
    /// Audio was fetched but the sink failed; treated as completion
    SinkError(String),
    /// The synthesis collaborator failed; fatal to the session
    SynthesisFailed(CollaboratorError),
}

/// Completion notice for one playback request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackEvent {
    pub playback_id: u64,
    pub outcome: PlaybackOutcome,
}

/// Requests synthesized audio for an utterance and plays it
///
/// `is_speaking()` is true from the moment `speak` is called until the
/// matching `finish` (or `cancel`).
pub struct PlaybackController {
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    current: Option<(u64, JoinHandle<()>)>,
    next_id: u64,
    speaking_tx: watch::Sender<bool>,
}

impl PlaybackController {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesizer>, sink: Arc<dyn AudioSink>) -> Self {
        let (speaking_tx, _) = watch::channel(false);
        Self {
            synthesizer,
            sink,
            current: None,
            next_id: 0,
            speaking_tx,
        }
    }

    /// Start speaking `text`; `notify` receives exactly one completion event
    /// unless the playback is cancelled first.
    pub fn speak<F>(&mut self, text: String, notify: F) -> u64
    where
        F: FnOnce(PlaybackEvent) + Send + 'static,
    {
        if self.current.is_some() {
            warn!("New playback requested while speaking, cancelling previous");
            self.cancel();
        }

        self.next_id += 1;
        let playback_id = self.next_id;
        let synthesizer = Arc::clone(&self.synthesizer);
        let sink = Arc::clone(&self.sink);

        self.set_speaking(true);
        info!("Playback {} started ({} chars)", playback_id, text.len());

        let handle = tokio::spawn(async move {
            let outcome = match synthesizer.synthesize(&text).await {
                Err(e) => PlaybackOutcome::SynthesisFailed(e),
                Ok(audio) => match sink.play(audio).await {
                    Ok(()) => PlaybackOutcome::Completed,
                    Err(e) => PlaybackOutcome::SinkError(e.to_string()),
                },
            };
            notify(PlaybackEvent {
                playback_id,
                outcome,
            });
        });

        self.current = Some((playback_id, handle));
        playback_id
    }

    /// Record that `playback_id` ended; false for stale or unknown ids
    pub fn finish(&mut self, playback_id: u64) -> bool {
        match &self.current {
            Some((id, _)) if *id == playback_id => {
                self.current = None;
                self.set_speaking(false);
                debug!("Playback {} finished", playback_id);
                true
            }
            _ => {
                debug!("Ignoring completion of stale playback {}", playback_id);
                false
            }
        }
    }

    /// Abort the in-flight request or playback without reporting an error
    pub fn cancel(&mut self) {
        if let Some((id, handle)) = self.current.take() {
            handle.abort();
            self.sink.stop();
            info!("Playback {} cancelled", id);
        }
        self.set_speaking(false);
    }

    pub fn is_speaking(&self) -> bool {
        *self.speaking_tx.borrow()
    }

    /// Observe the speaking signal
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.speaking_tx.subscribe()
    }

    fn set_speaking(&self, speaking: bool) {
        self.speaking_tx.send_replace(speaking);
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some((_, handle)) = self.current.take() {
            handle.abort();
        }
    }
}
