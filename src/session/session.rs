use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::collaborators::Collaborators;
use super::config::SessionConfig;
use super::controller::SessionController;
use super::events::{SessionEvent, SessionNotice};
use super::state::SessionState;
use super::stats::{SessionOutcome, SessionSnapshot, SessionStats};
use crate::conversation::ConversationLog;

enum Completion {
    Running(JoinHandle<SessionOutcome>),
    Done(SessionOutcome),
}

/// A live interview: the handle operators and the HTTP API talk to
///
/// Creating a session spawns its controller task on the current tokio
/// runtime. Dropping the handle ends the session.
pub struct InterviewSession {
    /// Session configuration
    config: SessionConfig,

    /// When the session was created
    started_at: DateTime<Utc>,

    /// Queue feeding the controller
    events_tx: mpsc::UnboundedSender<SessionEvent>,

    /// Latest published state
    snapshot_rx: watch::Receiver<SessionSnapshot>,

    /// User-visible failure notices
    notices_tx: broadcast::Sender<SessionNotice>,

    /// Controller task, then its result
    completion: Mutex<Completion>,
}

impl InterviewSession {
    /// Create a new interview session in the `Idle` state
    pub fn new(config: SessionConfig, collaborators: Collaborators) -> Self {
        info!("Creating interview session: {}", config.session_id);

        let started_at = Utc::now();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::initial());
        let (notices_tx, _) = broadcast::channel(16);

        let controller = SessionController::new(
            config.clone(),
            collaborators,
            started_at,
            events_tx.clone(),
            snapshot_tx,
            notices_tx.clone(),
        );
        let task = tokio::spawn(controller.run(events_rx));

        Self {
            config,
            started_at,
            events_tx,
            snapshot_rx,
            notices_tx,
            completion: Mutex::new(Completion::Running(task)),
        }
    }

    pub fn id(&self) -> &str {
        &self.config.session_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start the call: acquire the microphone and open transcription
    pub fn start(&self) -> Result<()> {
        self.send(SessionEvent::Start)
            .context("Session has already finished")
    }

    /// Ask the session to end; returns immediately
    pub fn end(&self) {
        if self.send(SessionEvent::End).is_err() {
            warn!("Session {} already finished", self.config.session_id);
        }
    }

    pub fn pause_microphone(&self) -> Result<()> {
        self.send(SessionEvent::PauseMicrophone)
            .context("Session has already finished")
    }

    pub fn resume_microphone(&self) -> Result<()> {
        self.send(SessionEvent::ResumeMicrophone)
            .context("Session has already finished")
    }

    /// End the session and wait for teardown and feedback to complete
    pub async fn stop(&self) -> Result<SessionOutcome> {
        info!("Stopping interview session: {}", self.config.session_id);
        self.end();
        self.wait().await
    }

    /// Wait until the session finishes on its own
    pub async fn wait(&self) -> Result<SessionOutcome> {
        let mut completion = self.completion.lock().await;

        if let Completion::Running(task) = &mut *completion {
            let outcome = task.await.context("Session controller panicked")?;
            *completion = Completion::Done(outcome);
        }

        match &*completion {
            Completion::Done(outcome) => Ok(outcome.clone()),
            Completion::Running(_) => anyhow::bail!("Session controller did not complete"),
        }
    }

    pub fn state(&self) -> SessionState {
        self.snapshot_rx.borrow().state
    }

    /// Whether the interviewer is currently speaking
    pub fn is_speaking(&self) -> bool {
        self.snapshot_rx.borrow().speaking
    }

    /// Get current session statistics
    pub fn stats(&self) -> SessionStats {
        self.snapshot_rx.borrow().stats(self.started_at)
    }

    /// Get the conversation so far
    pub fn conversation(&self) -> ConversationLog {
        ConversationLog::clone(&self.snapshot_rx.borrow().conversation)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Observe every published snapshot
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe_notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notices_tx.subscribe()
    }

    fn send(&self, event: SessionEvent) -> Result<()> {
        self.events_tx
            .send(event)
            .map_err(|_| anyhow::anyhow!("session controller has stopped"))
    }
}

impl Drop for InterviewSession {
    fn drop(&mut self) {
        let _ = self.events_tx.send(SessionEvent::End);
    }
}
