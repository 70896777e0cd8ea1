// Tests for speech playback: WAV pacing, completion events and cancellation

mod common;

use common::wav_of;
use loqa_interviews::error::CollaboratorError;
use loqa_interviews::speech::{
    wav_duration, AudioSink, PacedSink, PlaybackController, PlaybackEvent, PlaybackOutcome,
    SpeechSynthesizer, SynthesizedAudio,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

struct ToneSynthesizer {
    speech_ms: u64,
    fail: bool,
}

#[async_trait::async_trait]
impl SpeechSynthesizer for ToneSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<SynthesizedAudio, CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Service("no voice".to_string()));
        }
        Ok(SynthesizedAudio {
            wav_bytes: wav_of(self.speech_ms),
        })
    }
}

/// Sink that fails every playback
#[derive(Default)]
struct BrokenSink {
    stops: Mutex<usize>,
}

#[async_trait::async_trait]
impl AudioSink for BrokenSink {
    async fn play(&self, _audio: SynthesizedAudio) -> anyhow::Result<()> {
        anyhow::bail!("device unplugged")
    }

    fn stop(&self) {
        *self.stops.lock().unwrap() += 1;
    }
}

fn controller(speech_ms: u64, fail: bool) -> PlaybackController {
    PlaybackController::new(
        Arc::new(ToneSynthesizer { speech_ms, fail }),
        Arc::new(PacedSink::new()),
    )
}

fn channel_notifier() -> (
    mpsc::UnboundedReceiver<PlaybackEvent>,
    impl Fn() -> Box<dyn FnOnce(PlaybackEvent) + Send>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let make = move || {
        let tx = tx.clone();
        Box::new(move |event| {
            let _ = tx.send(event);
        }) as Box<dyn FnOnce(PlaybackEvent) + Send>
    };
    (rx, make)
}

#[test]
fn test_wav_duration_from_header() {
    let duration = wav_duration(&wav_of(1500)).unwrap();
    assert_eq!(duration, Duration::from_millis(1500));
}

#[test]
fn test_wav_duration_rejects_garbage() {
    assert!(wav_duration(b"definitely not RIFF").is_err());
    assert!(wav_duration(&[]).is_err());
}

#[tokio::test(start_paused = true)]
async fn test_paced_sink_waits_for_audio_length() {
    let sink = PacedSink::new();
    let started = tokio::time::Instant::now();

    sink.play(SynthesizedAudio {
        wav_bytes: wav_of(2000),
    })
    .await
    .unwrap();

    assert_eq!(started.elapsed(), Duration::from_millis(2000));
}

#[tokio::test(start_paused = true)]
async fn test_speaking_until_finished() {
    let mut playback = controller(1000, false);
    let (mut events, notifier) = channel_notifier();

    let id = playback.speak("Hello".to_string(), notifier());
    assert!(playback.is_speaking());

    let event = events.recv().await.unwrap();
    assert_eq!(event.playback_id, id);
    assert_eq!(event.outcome, PlaybackOutcome::Completed);
    assert!(playback.is_speaking(), "Signal clears only when the owner finishes");

    assert!(playback.finish(id));
    assert!(!playback.is_speaking());
    assert!(!playback.finish(id), "Second finish is stale");
}

#[tokio::test(start_paused = true)]
async fn test_synthesis_failure_is_reported() {
    let mut playback = controller(1000, true);
    let (mut events, notifier) = channel_notifier();

    let id = playback.speak("Hello".to_string(), notifier());
    let event = events.recv().await.unwrap();

    assert_eq!(event.playback_id, id);
    assert_eq!(
        event.outcome,
        PlaybackOutcome::SynthesisFailed(CollaboratorError::Service("no voice".to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_sink_failure_is_reported_as_sink_error() {
    let mut playback = PlaybackController::new(
        Arc::new(ToneSynthesizer {
            speech_ms: 100,
            fail: false,
        }),
        Arc::new(BrokenSink::default()),
    );
    let (mut events, notifier) = channel_notifier();

    playback.speak("Hello".to_string(), notifier());
    let event = events.recv().await.unwrap();

    assert!(matches!(event.outcome, PlaybackOutcome::SinkError(_)));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_stops_without_event() {
    let sink = Arc::new(BrokenSink::default());
    let mut playback = PlaybackController::new(
        Arc::new(ToneSynthesizer {
            speech_ms: 100,
            fail: false,
        }),
        sink.clone(),
    );
    let (mut events, notifier) = channel_notifier();

    playback.speak("Hello".to_string(), notifier());
    playback.cancel();

    assert!(!playback.is_speaking());
    assert_eq!(*sink.stops.lock().unwrap(), 1);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(events.try_recv().is_err(), "Cancelled playback reports nothing");

    // Cancelling when idle is harmless
    playback.cancel();
    assert_eq!(*sink.stops.lock().unwrap(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_new_speech_supersedes_current() {
    let mut playback = controller(5000, false);
    let (mut events, notifier) = channel_notifier();

    let first = playback.speak("First".to_string(), notifier());
    let second = playback.speak("Second".to_string(), notifier());
    assert_ne!(first, second);

    let event = events.recv().await.unwrap();
    assert_eq!(event.playback_id, second);
    assert!(!playback.finish(first));
    assert!(playback.finish(second));
}

#[tokio::test(start_paused = true)]
async fn test_speaking_signal_is_observable() {
    let mut playback = controller(500, false);
    let mut speaking = playback.subscribe();
    let (mut events, notifier) = channel_notifier();

    let id = playback.speak("Hello".to_string(), notifier());
    speaking.changed().await.unwrap();
    assert!(*speaking.borrow_and_update());

    events.recv().await.unwrap();
    playback.finish(id);
    speaking.changed().await.unwrap();
    assert!(!*speaking.borrow());
}
