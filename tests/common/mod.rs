// Shared in-memory collaborators for session tests
//
// Every mock records what the session asked of it so tests can assert call
// counts and payloads.

#![allow(dead_code)]

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use loqa_interviews::ai::{QuestionGenerator, QuestionRequest, QuestionResponse};
use loqa_interviews::audio::{AudioBackend, AudioFrame};
use loqa_interviews::conversation::Role;
use loqa_interviews::error::CollaboratorError;
use loqa_interviews::feedback::{FeedbackGenerator, FeedbackRequest, FeedbackResponse};
use loqa_interviews::session::{Collaborators, InterviewSession, SessionConfig, SessionSnapshot};
use loqa_interviews::speech::{PacedSink, SpeechSynthesizer, SynthesizedAudio};
use loqa_interviews::transcript::TranscriptFragment;
use loqa_interviews::transcription::{LiveTranscriber, TranscriberCallback, TranscriberEvent};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

/// WAV bytes (16kHz mono linear16) lasting `duration_ms`
pub fn wav_of(duration_ms: u64) -> Vec<u8> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..(16 * duration_ms) {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        session_id: "interview-test".to_string(),
        user_name: "Ada".to_string(),
        feedback_id: None,
        job_description: "Senior Rust engineer".to_string(),
        resume_summary: "Seven years of systems programming".to_string(),
        idle_timeout: IDLE_TIMEOUT,
        keep_alive_interval: Duration::from_secs(30),
        max_ai_turns: 6,
    }
}

// ============================================================================
// Microphone
// ============================================================================

#[derive(Default)]
pub struct MicRecorder {
    frames_tx: Mutex<Option<mpsc::Sender<AudioFrame>>>,
    starts: Mutex<usize>,
    stops: Mutex<usize>,
    pub fail_start: bool,
}

impl MicRecorder {
    pub async fn send_samples(&self, samples: Vec<i16>) {
        let tx = self.frames_tx.lock().unwrap().clone();
        if let Some(tx) = tx {
            tx.send(AudioFrame {
                samples,
                sample_rate: 16000,
                channels: 1,
                timestamp_ms: 0,
            })
            .await
            .unwrap();
        }
    }

    /// Close the frame stream as if the device went away
    pub fn end_stream(&self) {
        self.frames_tx.lock().unwrap().take();
    }

    pub fn starts(&self) -> usize {
        *self.starts.lock().unwrap()
    }

    pub fn stops(&self) -> usize {
        *self.stops.lock().unwrap()
    }

    pub fn capturing(&self) -> bool {
        self.frames_tx.lock().unwrap().is_some()
    }
}

pub struct MockMicrophone {
    recorder: Arc<MicRecorder>,
}

#[async_trait::async_trait]
impl AudioBackend for MockMicrophone {
    async fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.recorder.fail_start {
            anyhow::bail!("no input device");
        }
        let (tx, rx) = mpsc::channel(16);
        *self.recorder.frames_tx.lock().unwrap() = Some(tx);
        *self.recorder.starts.lock().unwrap() += 1;
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.recorder.frames_tx.lock().unwrap().take();
        *self.recorder.stops.lock().unwrap() += 1;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.recorder.capturing()
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Transcriber
// ============================================================================

#[derive(Default)]
pub struct TranscriberRecorder {
    callback: Mutex<Option<TranscriberCallback>>,
    chunks: Mutex<Vec<Vec<u8>>>,
    keep_alives: Mutex<usize>,
    closes: Mutex<usize>,
    pub auto_open: bool,
    pub fail_connect: bool,
}

impl TranscriberRecorder {
    pub fn emit(&self, event: TranscriberEvent) {
        let callback = self.callback.lock().unwrap().clone();
        let callback = callback.expect("transcriber not connected");
        callback(event);
    }

    pub fn say(&self, text: &str) {
        self.emit(TranscriberEvent::Transcript(TranscriptFragment::final_segment(
            text,
        )));
    }

    pub fn chunks(&self) -> Vec<Vec<u8>> {
        self.chunks.lock().unwrap().clone()
    }

    pub fn keep_alives(&self) -> usize {
        *self.keep_alives.lock().unwrap()
    }

    pub fn closes(&self) -> usize {
        *self.closes.lock().unwrap()
    }

    pub fn connected(&self) -> bool {
        self.callback.lock().unwrap().is_some()
    }
}

pub struct MockTranscriber {
    recorder: Arc<TranscriberRecorder>,
}

#[async_trait::async_trait]
impl LiveTranscriber for MockTranscriber {
    async fn connect(&mut self, on_event: TranscriberCallback) -> Result<(), CollaboratorError> {
        if self.recorder.fail_connect {
            return Err(CollaboratorError::Request("connection refused".to_string()));
        }
        *self.recorder.callback.lock().unwrap() = Some(Arc::clone(&on_event));
        if self.recorder.auto_open {
            on_event(TranscriberEvent::Open);
        }
        Ok(())
    }

    async fn send_audio(&self, chunk: &[u8]) -> Result<(), CollaboratorError> {
        self.recorder.chunks.lock().unwrap().push(chunk.to_vec());
        Ok(())
    }

    async fn keep_alive(&self) -> Result<(), CollaboratorError> {
        *self.recorder.keep_alives.lock().unwrap() += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), CollaboratorError> {
        *self.recorder.closes.lock().unwrap() += 1;
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Question generation
// ============================================================================

pub enum Scripted {
    Reply {
        content: String,
        end_interview: bool,
        delay: Duration,
    },
    Fail(CollaboratorError),
}

impl Scripted {
    pub fn ask(content: &str) -> Self {
        Scripted::Reply {
            content: content.to_string(),
            end_interview: false,
            delay: Duration::ZERO,
        }
    }

    pub fn close(content: &str) -> Self {
        Scripted::Reply {
            content: content.to_string(),
            end_interview: true,
            delay: Duration::ZERO,
        }
    }

    pub fn slow(content: &str, delay: Duration) -> Self {
        Scripted::Reply {
            content: content.to_string(),
            end_interview: false,
            delay,
        }
    }
}

#[derive(Default)]
pub struct ScriptedQuestions {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<QuestionRequest>>,
}

impl ScriptedQuestions {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<QuestionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl QuestionGenerator for ScriptedQuestions {
    async fn next_question(
        &self,
        request: &QuestionRequest,
    ) -> Result<QuestionResponse, CollaboratorError> {
        self.requests.lock().unwrap().push(request.clone());
        let next = self.script.lock().unwrap().pop_front();

        match next {
            Some(Scripted::Reply {
                content,
                end_interview,
                delay,
            }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(QuestionResponse {
                    role: Role::Interviewer,
                    content,
                    end_interview,
                })
            }
            Some(Scripted::Fail(e)) => Err(e),
            None => Ok(QuestionResponse {
                role: Role::Interviewer,
                content: "Tell me more.".to_string(),
                end_interview: false,
            }),
        }
    }
}

// ============================================================================
// Speech synthesis
// ============================================================================

#[derive(Default)]
pub struct MockSynthesizer {
    pub speech_ms: u64,
    pub fail: bool,
    texts: Mutex<Vec<String>>,
}

impl MockSynthesizer {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<SynthesizedAudio, CollaboratorError> {
        self.texts.lock().unwrap().push(text.to_string());
        if self.fail {
            return Err(CollaboratorError::Service("voice unavailable".to_string()));
        }
        Ok(SynthesizedAudio {
            wav_bytes: wav_of(self.speech_ms),
        })
    }
}

// ============================================================================
// Feedback
// ============================================================================

#[derive(Default)]
pub struct MockFeedback {
    requests: Mutex<Vec<FeedbackRequest>>,
    pub fail: bool,
}

impl MockFeedback {
    pub fn requests(&self) -> Vec<FeedbackRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl FeedbackGenerator for MockFeedback {
    async fn generate(
        &self,
        request: &FeedbackRequest,
    ) -> Result<FeedbackResponse, CollaboratorError> {
        self.requests.lock().unwrap().push(request.clone());
        if self.fail {
            return Err(CollaboratorError::Request("timeout".to_string()));
        }
        Ok(FeedbackResponse {
            success: true,
            feedback_id: Some("feedback-1".to_string()),
        })
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct HarnessOptions {
    pub script: Vec<Scripted>,
    pub speech_ms: u64,
    pub synth_fails: bool,
    pub connect_fails: bool,
    pub auto_open: bool,
    pub mic_fails: bool,
    pub feedback_fails: bool,
    pub config: SessionConfig,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            script: vec![Scripted::ask("Welcome! Tell me about yourself.")],
            speech_ms: 1000,
            synth_fails: false,
            connect_fails: false,
            auto_open: true,
            mic_fails: false,
            feedback_fails: false,
            config: test_config(),
        }
    }
}

pub struct Harness {
    pub session: InterviewSession,
    pub mic: Arc<MicRecorder>,
    pub stt: Arc<TranscriberRecorder>,
    pub questions: Arc<ScriptedQuestions>,
    pub synth: Arc<MockSynthesizer>,
    pub feedback: Arc<MockFeedback>,
}

impl Harness {
    pub fn new(options: HarnessOptions) -> Self {
        let mic = Arc::new(MicRecorder {
            fail_start: options.mic_fails,
            ..MicRecorder::default()
        });
        let stt = Arc::new(TranscriberRecorder {
            auto_open: options.auto_open,
            fail_connect: options.connect_fails,
            ..TranscriberRecorder::default()
        });
        let questions = Arc::new(ScriptedQuestions::new(options.script));
        let synth = Arc::new(MockSynthesizer {
            speech_ms: options.speech_ms,
            fail: options.synth_fails,
            ..MockSynthesizer::default()
        });
        let feedback = Arc::new(MockFeedback {
            fail: options.feedback_fails,
            ..MockFeedback::default()
        });

        let collaborators = Collaborators {
            microphone: Box::new(MockMicrophone {
                recorder: Arc::clone(&mic),
            }),
            transcriber: Box::new(MockTranscriber {
                recorder: Arc::clone(&stt),
            }),
            questions: questions.clone(),
            synthesizer: synth.clone(),
            sink: Arc::new(PacedSink::new()),
            feedback: feedback.clone(),
        };

        Self {
            session: InterviewSession::new(options.config, collaborators),
            mic,
            stt,
            questions,
            synth,
            feedback,
        }
    }

    pub fn started(options: HarnessOptions) -> Self {
        let harness = Self::new(options);
        harness.session.start().unwrap();
        harness
    }

    /// Wait for a published snapshot satisfying `cond`
    pub async fn wait_for<F>(&self, cond: F) -> SessionSnapshot
    where
        F: Fn(&SessionSnapshot) -> bool,
    {
        let mut rx = self.session.watch();
        let waited = tokio::time::timeout(Duration::from_secs(3600), async {
            loop {
                {
                    let snapshot = rx.borrow_and_update();
                    if cond(&snapshot) {
                        return snapshot.clone();
                    }
                }
                if rx.changed().await.is_err() {
                    let snapshot = rx.borrow().clone();
                    assert!(cond(&snapshot), "session stopped before condition was met");
                    return snapshot;
                }
            }
        })
        .await;
        waited.expect("condition not reached")
    }

    /// Wait until the opening question has been spoken in full
    pub async fn wait_for_greeting(&self) -> SessionSnapshot {
        self.wait_for(|s| s.conversation.len() == 1 && !s.speaking)
            .await
    }
}
