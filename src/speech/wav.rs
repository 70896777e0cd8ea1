use anyhow::{Context, Result};
use hound::WavReader;
use std::io::Cursor;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::{debug, info};

use super::playback::{AudioSink, SynthesizedAudio};

/// Playback length of a WAV buffer
pub fn wav_duration(wav_bytes: &[u8]) -> Result<Duration> {
    let reader = WavReader::new(Cursor::new(wav_bytes)).context("Failed to parse WAV audio")?;
    let spec = reader.spec();

    if spec.sample_rate == 0 {
        anyhow::bail!("WAV audio has a zero sample rate");
    }

    // duration() counts frames (samples per channel)
    let frames = reader.duration() as f64;
    Ok(Duration::from_secs_f64(frames / spec.sample_rate as f64))
}

/// Sink that holds the playback slot for the audio's real duration
///
/// Used when the audio itself is rendered elsewhere (the candidate's client)
/// or not at all, so turn-taking still waits for the remark to be heard.
#[derive(Default)]
pub struct PacedSink {
    stopped: Notify,
}

impl PacedSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl AudioSink for PacedSink {
    async fn play(&self, audio: SynthesizedAudio) -> Result<()> {
        let duration = wav_duration(&audio.wav_bytes)?;
        info!("Pacing playback for {:.2}s", duration.as_secs_f64());

        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.stopped.notified() => {
                debug!("Paced playback stopped early");
            }
        }
        Ok(())
    }

    fn stop(&self) {
        self.stopped.notify_waiters();
    }
}
