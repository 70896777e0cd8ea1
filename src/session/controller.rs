use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::collaborators::Collaborators;
use super::config::SessionConfig;
use super::events::{EndReason, SessionEvent, SessionNotice};
use super::state::SessionState;
use super::stats::{SessionOutcome, SessionSnapshot};
use crate::ai::AiTurnClient;
use crate::audio::AudioBackend;
use crate::conversation::ConversationLog;
use crate::error::{CollaboratorError, FailureCategory, SessionError, SessionResult};
use crate::feedback::{FeedbackGenerator, FeedbackRequest, FeedbackResponse, Redirect};
use crate::speech::{PlaybackController, PlaybackEvent, PlaybackOutcome};
use crate::transcript::TranscriptBuffer;
use crate::transcription::{LiveTranscriber, TranscriberCallback, TranscriberEvent};
use crate::turn::{AiTurn, TimerRegistry, TimerSlot, TurnAction, TurnScheduler};

/// Single-writer owner of all session state
///
/// Runs as one task consuming `SessionEvent`s in arrival order. Collaborator
/// calls that take time (AI turns, synthesis, playback, timers) run in
/// spawned tasks that post their result back onto the same queue, so no two
/// handlers ever touch the state concurrently.
pub(super) struct SessionController {
    config: SessionConfig,
    started_at: DateTime<Utc>,
    state: SessionState,

    /// Shared with published snapshots; copied only when it changes
    log: Arc<ConversationLog>,
    buffer: TranscriptBuffer,
    scheduler: TurnScheduler,
    timers: TimerRegistry,
    playback: PlaybackController,
    ai: Arc<AiTurnClient>,
    ai_task: Option<JoinHandle<()>>,

    microphone: Box<dyn AudioBackend>,
    capture_task: Option<JoinHandle<()>>,
    capture_id: u64,
    mic_streaming: bool,

    transcriber: Box<dyn LiveTranscriber>,
    connection_open: bool,

    feedback: Arc<dyn FeedbackGenerator>,

    events_tx: mpsc::UnboundedSender<SessionEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    notices_tx: broadcast::Sender<SessionNotice>,
    notified: HashSet<FailureCategory>,

    audio_chunks_sent: usize,
    keep_alives_sent: usize,
    outcome: Option<SessionOutcome>,
}

impl SessionController {
    pub(super) fn new(
        config: SessionConfig,
        collaborators: Collaborators,
        started_at: DateTime<Utc>,
        events_tx: mpsc::UnboundedSender<SessionEvent>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
        notices_tx: broadcast::Sender<SessionNotice>,
    ) -> Self {
        let ai = Arc::new(AiTurnClient::new(
            collaborators.questions,
            config.context(),
            config.max_ai_turns,
        ));
        let playback = PlaybackController::new(collaborators.synthesizer, collaborators.sink);

        Self {
            config,
            started_at,
            state: SessionState::Idle,
            log: Arc::new(ConversationLog::new()),
            buffer: TranscriptBuffer::new(),
            scheduler: TurnScheduler::new(),
            timers: TimerRegistry::new(),
            playback,
            ai,
            ai_task: None,
            microphone: collaborators.microphone,
            capture_task: None,
            capture_id: 0,
            mic_streaming: false,
            transcriber: collaborators.transcriber,
            connection_open: false,
            feedback: collaborators.feedback,
            events_tx,
            snapshot_tx,
            notices_tx,
            notified: HashSet::new(),
            audio_chunks_sent: 0,
            keep_alives_sent: 0,
            outcome: None,
        }
    }

    /// Process events until the session reaches `Finished`
    pub(super) async fn run(
        mut self,
        mut events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    ) -> SessionOutcome {
        info!("Session controller started: {}", self.config.session_id);

        while let Some(event) = events_rx.recv().await {
            self.handle(event).await;
            self.publish();

            if self.state.is_terminal() {
                break;
            }
        }

        if !self.state.is_terminal() {
            // Every sender is gone; nobody can drive the session further
            self.finish(EndReason::OperatorEnded).await;
            self.publish();
        }

        info!("Session controller stopped: {}", self.config.session_id);

        match self.outcome.take() {
            Some(outcome) => outcome,
            None => self.build_outcome(EndReason::OperatorEnded, None),
        }
    }

    async fn handle(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Start => self.on_start().await,
            SessionEvent::End => {
                info!("Operator ended session {}", self.config.session_id);
                self.finish(EndReason::OperatorEnded).await;
            }
            SessionEvent::PauseMicrophone => self.on_pause_microphone().await,
            SessionEvent::ResumeMicrophone => self.on_resume_microphone().await,
            SessionEvent::Transcriber(event) => self.on_transcriber_event(event).await,
            SessionEvent::AudioChunk { capture_id, bytes } => {
                self.on_audio_chunk(capture_id, bytes).await
            }
            SessionEvent::MicrophoneEnded { capture_id } => {
                self.on_microphone_ended(capture_id).await
            }
            SessionEvent::TimerFired { slot, generation } => {
                self.on_timer_fired(slot, generation).await
            }
            SessionEvent::AiTurn(result) => self.on_ai_turn(result).await,
            SessionEvent::Playback(event) => self.on_playback(event).await,
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    async fn on_start(&mut self) {
        if !self.transition(SessionState::Connecting) {
            return;
        }

        let events_tx = self.events_tx.clone();
        let on_event: TranscriberCallback = Arc::new(move |event| {
            let _ = events_tx.send(SessionEvent::Transcriber(event));
        });

        info!(
            "Opening {} transcription connection for {}",
            self.transcriber.name(),
            self.config.session_id
        );

        if let Err(e) = self.transcriber.connect(on_event).await {
            self.fail(SessionError::Transcription(e)).await;
        }
    }

    async fn on_transcriber_event(&mut self, event: TranscriberEvent) {
        match event {
            TranscriberEvent::Open => self.on_connection_open().await,
            TranscriberEvent::Transcript(fragment) => {
                if self.state != SessionState::Active {
                    debug!("Transcript fragment ignored in state {:?}", self.state);
                    return;
                }
                let speaking = self.playback.is_speaking();
                let decision =
                    self.buffer
                        .offer(&fragment, Arc::make_mut(&mut self.log), speaking);
                if decision.mutated_log() {
                    let action = self.scheduler.on_candidate_committed();
                    self.apply(action).await;
                }
            }
            TranscriberEvent::Close => {
                self.connection_open = false;
                if !self.state.is_terminal() {
                    self.fail(SessionError::Transcription(CollaboratorError::Request(
                        "connection closed".to_string(),
                    )))
                    .await;
                }
            }
            TranscriberEvent::Error(message) => {
                if !self.state.is_terminal() {
                    self.fail(SessionError::Transcription(CollaboratorError::Request(
                        message,
                    )))
                    .await;
                }
            }
        }
    }

    async fn on_connection_open(&mut self) {
        if !self.transition(SessionState::Active) {
            return;
        }
        self.connection_open = true;

        if let Err(e) = self.start_capture().await {
            self.fail(e).await;
            return;
        }
        self.update_keep_alive().await;

        let action = self.scheduler.on_activated();
        self.apply(action).await;
    }

    /// Enter `Finished`: release everything and submit feedback exactly once
    async fn finish(&mut self, reason: EndReason) {
        if !self.transition(SessionState::Finished) {
            return;
        }

        self.timers.cancel_all();
        self.playback.cancel();
        if let Some(task) = self.ai_task.take() {
            task.abort();
        }
        self.stop_capture().await;

        if let Err(e) = self.transcriber.close().await {
            warn!("Failed to close transcription connection: {}", e);
        }
        self.connection_open = false;

        let feedback = self.submit_feedback().await;
        self.outcome = Some(self.build_outcome(reason, feedback));
    }

    async fn submit_feedback(&mut self) -> Option<FeedbackResponse> {
        if self.log.is_empty() {
            info!("No conversation recorded, skipping feedback");
            return None;
        }

        let request = FeedbackRequest {
            conversation_log: self.log.snapshot(),
            interview_id: self.config.session_id.clone(),
            user_name: self.config.user_name.clone(),
            feedback_id: self.config.feedback_id.clone(),
        };

        info!(
            "Submitting {} utterances for feedback on {}",
            request.conversation_log.len(),
            request.interview_id
        );

        match self.feedback.generate(&request).await {
            Ok(response) => {
                if !response.success {
                    warn!("Feedback collaborator reported failure");
                }
                Some(response)
            }
            Err(e) => {
                self.notify(&SessionError::Feedback(e));
                None
            }
        }
    }

    async fn fail(&mut self, err: SessionError) {
        self.notify(&err);
        self.finish(EndReason::Failed {
            category: err.category(),
            message: err.to_string(),
        })
        .await;
    }

    fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(next) {
            debug!("Ignoring transition {:?} -> {:?}", self.state, next);
            return false;
        }
        info!(
            "Session {}: {:?} -> {:?}",
            self.config.session_id, self.state, next
        );
        self.state = next;
        true
    }

    // ------------------------------------------------------------------
    // Turn taking
    // ------------------------------------------------------------------

    async fn apply(&mut self, action: Option<TurnAction>) {
        let Some(action) = action else {
            return;
        };

        match action {
            TurnAction::ArmIdleTimer => {
                let events_tx = self.events_tx.clone();
                self.timers
                    .start_once(TimerSlot::Idle, self.config.idle_timeout, move |slot, generation| {
                        let _ = events_tx.send(SessionEvent::TimerFired { slot, generation });
                    });
            }
            TurnAction::InvokeAi => self.invoke_ai(),
            TurnAction::Speak(utterance) => {
                self.timers.cancel(TimerSlot::Idle);
                Arc::make_mut(&mut self.log).append_interviewer(utterance.clone());

                let events_tx = self.events_tx.clone();
                self.playback.speak(utterance, move |event| {
                    let _ = events_tx.send(SessionEvent::Playback(event));
                });
            }
            TurnAction::Terminate => self.finish(EndReason::InterviewComplete).await,
        }
    }

    fn invoke_ai(&mut self) {
        let conversation = self.log.snapshot();
        let ai = Arc::clone(&self.ai);
        let events_tx = self.events_tx.clone();

        self.ai_task = Some(tokio::spawn(async move {
            let result = ai.next_turn(&conversation).await;
            let _ = events_tx.send(SessionEvent::AiTurn(result));
        }));
    }

    async fn on_ai_turn(&mut self, result: SessionResult<AiTurn>) {
        self.ai_task = None;
        if self.state != SessionState::Active {
            return;
        }

        match result {
            Ok(turn) => {
                let action = self.scheduler.on_ai_response(turn);
                self.apply(Some(action)).await;
            }
            Err(e) => {
                self.scheduler.on_ai_failed();
                self.fail(e).await;
            }
        }
    }

    async fn on_playback(&mut self, event: PlaybackEvent) {
        if !self.playback.finish(event.playback_id) {
            return;
        }

        match event.outcome {
            PlaybackOutcome::Completed => {}
            PlaybackOutcome::SinkError(message) => {
                warn!("Playback error, treating as finished: {}", message);
            }
            PlaybackOutcome::SynthesisFailed(e) => {
                self.fail(SessionError::Synthesis(e)).await;
                return;
            }
        }

        let action = self.scheduler.on_playback_finished(&self.log);
        self.apply(action).await;
    }

    async fn on_timer_fired(&mut self, slot: TimerSlot, generation: u64) {
        match slot {
            TimerSlot::Idle => {
                if !self.timers.complete(slot, generation) {
                    debug!("Stale idle timer (gen={}) ignored", generation);
                    return;
                }
                let action = self
                    .scheduler
                    .on_idle_timeout(&self.log, self.playback.is_speaking());
                self.apply(action).await;
            }
            TimerSlot::KeepAlive => {
                if self.timers.is_current(slot, generation) {
                    self.send_keep_alive().await;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Microphone and transcription stream
    // ------------------------------------------------------------------

    async fn start_capture(&mut self) -> SessionResult<()> {
        let mut frames = self
            .microphone
            .start()
            .await
            .map_err(|e| SessionError::Microphone(e.to_string()))?;

        self.capture_id += 1;
        let capture_id = self.capture_id;
        let events_tx = self.events_tx.clone();

        self.capture_task = Some(tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                let bytes = frame.to_pcm_bytes();
                if events_tx
                    .send(SessionEvent::AudioChunk { capture_id, bytes })
                    .is_err()
                {
                    return;
                }
            }
            let _ = events_tx.send(SessionEvent::MicrophoneEnded { capture_id });
        }));

        self.mic_streaming = true;
        info!("Microphone streaming via {} backend", self.microphone.name());
        Ok(())
    }

    async fn stop_capture(&mut self) {
        if let Some(task) = self.capture_task.take() {
            task.abort();
        }
        if let Err(e) = self.microphone.stop().await {
            error!("Failed to stop microphone: {}", e);
        }
        self.mic_streaming = false;
    }

    async fn on_pause_microphone(&mut self) {
        if self.state != SessionState::Active || !self.mic_streaming {
            return;
        }
        info!("Pausing microphone");
        self.stop_capture().await;
        self.update_keep_alive().await;
    }

    async fn on_resume_microphone(&mut self) {
        if self.state != SessionState::Active || self.mic_streaming {
            return;
        }
        info!("Resuming microphone");
        if let Err(e) = self.start_capture().await {
            self.fail(e).await;
            return;
        }
        self.update_keep_alive().await;
    }

    async fn on_microphone_ended(&mut self, capture_id: u64) {
        if capture_id != self.capture_id || !self.mic_streaming {
            return;
        }
        info!("Microphone stream ended");
        self.capture_task = None;
        self.mic_streaming = false;
        self.update_keep_alive().await;
    }

    async fn on_audio_chunk(&mut self, capture_id: u64, bytes: Vec<u8>) {
        if capture_id != self.capture_id || !self.connection_open {
            return;
        }
        if bytes.is_empty() {
            debug!("Dropping zero-byte audio chunk");
            return;
        }

        match self.transcriber.send_audio(&bytes).await {
            Ok(()) => self.audio_chunks_sent += 1,
            Err(e) => warn!("Failed to send audio chunk: {}", e),
        }
    }

    /// Run the keep-alive slot exactly while the connection is open and idle
    async fn update_keep_alive(&mut self) {
        let needed = self.connection_open && !self.mic_streaming && !self.state.is_terminal();

        if needed && !self.timers.is_armed(TimerSlot::KeepAlive) {
            self.send_keep_alive().await;

            let events_tx = self.events_tx.clone();
            self.timers.start_interval(
                TimerSlot::KeepAlive,
                self.config.keep_alive_interval,
                move |slot, generation| {
                    let _ = events_tx.send(SessionEvent::TimerFired { slot, generation });
                },
            );
        } else if !needed {
            self.timers.cancel(TimerSlot::KeepAlive);
        }
    }

    async fn send_keep_alive(&mut self) {
        match self.transcriber.keep_alive().await {
            Ok(()) => {
                self.keep_alives_sent += 1;
                debug!("Keep-alive sent ({})", self.keep_alives_sent);
            }
            Err(e) => warn!("Keep-alive failed: {}", e),
        }
    }

    // ------------------------------------------------------------------
    // Reporting
    // ------------------------------------------------------------------

    fn notify(&mut self, err: &SessionError) {
        let category = err.category();
        error!("Session {} failure: {}", self.config.session_id, err);

        if self.notified.insert(category) {
            let _ = self.notices_tx.send(SessionNotice {
                category,
                message: err.to_string(),
            });
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            speaking: self.playback.is_speaking(),
            conversation: Arc::clone(&self.log),
            fragments_discarded: self.buffer.discarded(),
            audio_chunks_sent: self.audio_chunks_sent,
            keep_alives_sent: self.keep_alives_sent,
            ai_requests: self.scheduler.invocations(),
            active_timers: self.timers.active_count(),
            microphone_active: self.mic_streaming,
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn build_outcome(
        &self,
        reason: EndReason,
        feedback: Option<FeedbackResponse>,
    ) -> SessionOutcome {
        let redirect = Redirect::for_response(&self.config.session_id, feedback.as_ref());
        SessionOutcome {
            session_id: self.config.session_id.clone(),
            reason,
            stats: self.snapshot().stats(self.started_at),
            conversation: ConversationLog::clone(&self.log),
            feedback,
            redirect,
        }
    }
}
