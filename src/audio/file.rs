use anyhow::{Context, Result};
use hound::WavReader;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{AudioBackend, AudioBackendConfig, AudioFrame};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Samples per buffer of `buffer_ms`
    fn samples_per_buffer(&self, buffer_ms: u64) -> usize {
        let per_ms = self.sample_rate as u64 * self.channels as u64;
        ((per_ms * buffer_ms) / 1000).max(1) as usize
    }
}

/// Replays a WAV file in real time as if it were a microphone
///
/// Stopping and starting again resumes where playback left off.
pub struct FileMicrophone {
    audio: Arc<AudioFile>,
    config: AudioBackendConfig,
    position: Arc<AtomicUsize>,
    task: Option<JoinHandle<()>>,
}

impl FileMicrophone {
    pub fn open(path: impl AsRef<Path>, config: AudioBackendConfig) -> Result<Self> {
        let audio = AudioFile::open(path)?;
        Self::from_audio(audio, config)
    }

    /// Fails unless the file is already in the target format
    pub fn from_audio(audio: AudioFile, config: AudioBackendConfig) -> Result<Self> {
        if audio.sample_rate != config.target_sample_rate
            || audio.channels != config.target_channels
        {
            anyhow::bail!(
                "{} is {}Hz/{}ch, expected {}Hz/{}ch",
                audio.path,
                audio.sample_rate,
                audio.channels,
                config.target_sample_rate,
                config.target_channels
            );
        }

        Ok(Self {
            audio: Arc::new(audio),
            config,
            position: Arc::new(AtomicUsize::new(0)),
            task: None,
        })
    }
}

#[async_trait::async_trait]
impl AudioBackend for FileMicrophone {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.is_capturing() {
            anyhow::bail!("File microphone is already capturing");
        }

        let (tx, rx) = mpsc::channel(32);
        let audio = Arc::clone(&self.audio);
        let position = Arc::clone(&self.position);
        let buffer_ms = self.config.buffer_duration_ms;
        let chunk = audio.samples_per_buffer(buffer_ms);

        info!("File microphone started: {}", audio.path);

        self.task = Some(tokio::spawn(async move {
            loop {
                let start = position.load(Ordering::SeqCst);
                if start >= audio.samples.len() {
                    debug!("File microphone reached end of {}", audio.path);
                    break;
                }
                let end = (start + chunk).min(audio.samples.len());
                let per_ms = (audio.sample_rate as u64 * audio.channels as u64).max(1);

                let frame = AudioFrame {
                    samples: audio.samples[start..end].to_vec(),
                    sample_rate: audio.sample_rate,
                    channels: audio.channels,
                    timestamp_ms: start as u64 * 1000 / per_ms,
                };

                if tx.send(frame).await.is_err() {
                    break;
                }
                position.store(end, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(buffer_ms)).await;
            }
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.abort();
            info!("File microphone stopped: {}", self.audio.path);
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn name(&self) -> &str {
        "file"
    }
}
