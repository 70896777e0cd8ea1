//! Interviewer speech output
//!
//! This module provides:
//! - `SpeechSynthesizer`: text-to-speech collaborator returning WAV audio
//! - `AudioSink`: where synthesized audio is played
//! - `PlaybackController`: the speaking signal, completion events and cancellation

mod playback;
mod wav;

pub use playback::{
    AudioSink, PlaybackController, PlaybackEvent, PlaybackOutcome, SpeechSynthesizer,
    SynthesizedAudio,
};
pub use wav::{wav_duration, PacedSink};
