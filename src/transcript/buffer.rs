use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conversation::{CandidateAppend, ConversationLog};

/// A unit of streamed recognition output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptFragment {
    pub text: String,
    /// The recognizer will not revise this segment
    pub is_final: bool,
    /// The recognizer detected the end of speech for this segment
    pub speech_final: bool,
}

impl TranscriptFragment {
    pub fn new(text: impl Into<String>, is_final: bool, speech_final: bool) -> Self {
        Self {
            text: text.into(),
            is_final,
            speech_final,
        }
    }

    /// Shorthand for a segment-final fragment
    pub fn final_segment(text: impl Into<String>) -> Self {
        Self::new(text, true, true)
    }

    fn is_segment_final(&self) -> bool {
        self.is_final && self.speech_final
    }
}

/// Outcome of offering a fragment to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentDecision {
    /// AI playback was in progress
    DiscardedWhileSpeaking,
    /// Nothing left after trimming
    DiscardedEmpty,
    /// Interim result
    DiscardedInterim,
    /// Accepted and applied to the log
    Committed(CandidateAppend),
}

impl FragmentDecision {
    /// Whether the conversation log changed
    pub fn mutated_log(self) -> bool {
        matches!(self, FragmentDecision::Committed(append) if append.is_mutation())
    }
}

/// Filters recognizer fragments and commits segment-final text to the log
#[derive(Debug, Default)]
pub struct TranscriptBuffer {
    discarded: usize,
    committed: usize,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer one fragment; only final, non-empty text heard while the
    /// interviewer is silent reaches the log.
    pub fn offer(
        &mut self,
        fragment: &TranscriptFragment,
        log: &mut ConversationLog,
        ai_speaking: bool,
    ) -> FragmentDecision {
        let text = fragment.text.trim();

        let decision = if ai_speaking {
            FragmentDecision::DiscardedWhileSpeaking
        } else if text.is_empty() {
            FragmentDecision::DiscardedEmpty
        } else if !fragment.is_segment_final() {
            FragmentDecision::DiscardedInterim
        } else {
            FragmentDecision::Committed(log.append_candidate(text))
        };

        match decision {
            FragmentDecision::Committed(append) => {
                debug!("Transcript fragment committed ({:?}): {}", append, text);
                if append.is_mutation() {
                    self.committed += 1;
                }
            }
            other => {
                debug!("Transcript fragment discarded ({:?})", other);
                self.discarded += 1;
            }
        }

        decision
    }

    /// Fragments dropped so far (interim, empty, or heard during playback)
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Fragments that changed the log
    pub fn committed(&self) -> usize {
        self.committed
    }
}
