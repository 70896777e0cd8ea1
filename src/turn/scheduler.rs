use tracing::{debug, info};

use crate::conversation::ConversationLog;

/// Observable phase of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Nothing pending; waiting for the candidate to say something
    WaitingForCandidate,
    /// The idle timer is running after a candidate utterance
    Armed,
    /// An AI turn request is outstanding
    Invoking,
}

/// Side effect the session controller must carry out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAction {
    /// (Re)start the idle timer
    ArmIdleTimer,
    /// Request the next AI turn
    InvokeAi,
    /// Append this interviewer utterance to the log and play it
    Speak(String),
    /// The closing remark has been heard; finish the session
    Terminate,
}

/// A completed AI turn as seen by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiTurn {
    pub utterance: String,
    pub end_interview: bool,
}

/// Decides when the candidate's turn is over and the AI may speak
///
/// Pure state machine: it never performs I/O, it only returns the action
/// the controller should take.
#[derive(Debug, Default)]
pub struct TurnScheduler {
    in_flight: bool,
    armed: bool,
    pending_termination: bool,
    invocations: usize,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> TurnPhase {
        if self.in_flight {
            TurnPhase::Invoking
        } else if self.armed {
            TurnPhase::Armed
        } else {
            TurnPhase::WaitingForCandidate
        }
    }

    /// Session became active: the interviewer opens the conversation
    pub fn on_activated(&mut self) -> Option<TurnAction> {
        info!("Session active, requesting opening question");
        self.try_invoke()
    }

    /// The transcript buffer changed the log with candidate text
    pub fn on_candidate_committed(&mut self) -> Option<TurnAction> {
        if self.pending_termination {
            return None;
        }
        self.armed = true;
        Some(TurnAction::ArmIdleTimer)
    }

    /// The idle timer fired
    pub fn on_idle_timeout(
        &mut self,
        log: &ConversationLog,
        ai_speaking: bool,
    ) -> Option<TurnAction> {
        self.armed = false;

        if !log.ends_with_candidate() {
            debug!("Idle timeout ignored: interviewer already responded");
            return None;
        }
        if ai_speaking {
            debug!("Idle timeout ignored: interviewer is speaking");
            return None;
        }
        if self.pending_termination {
            debug!("Idle timeout ignored: interview is ending");
            return None;
        }

        self.try_invoke()
    }

    /// The AI turn request returned successfully
    pub fn on_ai_response(&mut self, turn: AiTurn) -> TurnAction {
        // Speaking cancels the idle timer
        self.in_flight = false;
        self.armed = false;
        if turn.end_interview {
            info!("Interviewer signalled end of interview");
            self.pending_termination = true;
        }
        TurnAction::Speak(turn.utterance)
    }

    /// The AI turn request failed; the session is about to end
    pub fn on_ai_failed(&mut self) {
        self.in_flight = false;
    }

    /// Playback of the last interviewer utterance finished (or errored)
    pub fn on_playback_finished(&mut self, log: &ConversationLog) -> Option<TurnAction> {
        if self.pending_termination {
            if self.in_flight {
                return None;
            }
            return Some(TurnAction::Terminate);
        }

        // Candidate text that landed just before playback started still
        // deserves an answer.
        if log.ends_with_candidate() && !self.in_flight {
            self.armed = true;
            return Some(TurnAction::ArmIdleTimer);
        }

        None
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn pending_termination(&self) -> bool {
        self.pending_termination
    }

    /// AI requests issued over the life of the session
    pub fn invocations(&self) -> usize {
        self.invocations
    }

    fn try_invoke(&mut self) -> Option<TurnAction> {
        if self.in_flight {
            debug!("AI invocation suppressed: a request is already in flight");
            return None;
        }
        self.in_flight = true;
        self.invocations += 1;
        Some(TurnAction::InvokeAi)
    }
}
