use serde::{Deserialize, Serialize};

/// Who produced an utterance
///
/// Serialized with the chat-style names the collaborators expect
/// (`"user"` for the candidate, `"assistant"` for the interviewer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "user")]
    Candidate,
    #[serde(rename = "assistant")]
    Interviewer,
}

/// One turn of spoken content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub role: Role,
    pub content: String,
}

impl Utterance {
    pub fn candidate(content: impl Into<String>) -> Self {
        Self {
            role: Role::Candidate,
            content: content.into(),
        }
    }

    pub fn interviewer(content: impl Into<String>) -> Self {
        Self {
            role: Role::Interviewer,
            content: content.into(),
        }
    }
}

/// What happened when candidate text was offered to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateAppend {
    /// A new candidate utterance was pushed
    Pushed,
    /// The text was appended to the trailing candidate utterance
    Merged,
    /// The trailing candidate utterance already contains the text
    Duplicate,
}

impl CandidateAppend {
    /// Whether the log was mutated
    pub fn is_mutation(self) -> bool {
        !matches!(self, CandidateAppend::Duplicate)
    }
}

/// Ordered, append-only conversation
///
/// The only in-place edit is merging consecutive candidate fragments into the
/// trailing candidate utterance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationLog {
    entries: Vec<Utterance>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add finalized candidate text, merging into a trailing candidate entry
    pub fn append_candidate(&mut self, text: &str) -> CandidateAppend {
        match self.entries.last_mut() {
            Some(last) if last.role == Role::Candidate => {
                if last.content.contains(text) {
                    CandidateAppend::Duplicate
                } else {
                    last.content.push(' ');
                    last.content.push_str(text);
                    CandidateAppend::Merged
                }
            }
            _ => {
                self.entries.push(Utterance::candidate(text));
                CandidateAppend::Pushed
            }
        }
    }

    /// Push an interviewer utterance
    pub fn append_interviewer(&mut self, content: impl Into<String>) {
        self.entries.push(Utterance::interviewer(content));
    }

    pub fn last(&self) -> Option<&Utterance> {
        self.entries.last()
    }

    /// True when the most recent entry was spoken by the candidate
    pub fn ends_with_candidate(&self) -> bool {
        matches!(self.last(), Some(u) if u.role == Role::Candidate)
    }

    /// Number of interviewer utterances so far
    pub fn interviewer_turns(&self) -> usize {
        self.count(Role::Interviewer)
    }

    pub fn candidate_turns(&self) -> usize {
        self.count(Role::Candidate)
    }

    fn count(&self, role: Role) -> usize {
        self.entries.iter().filter(|u| u.role == role).count()
    }

    pub fn entries(&self) -> &[Utterance] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owned copy for consumers running outside the session timeline
    pub fn snapshot(&self) -> Vec<Utterance> {
        self.entries.clone()
    }
}

impl From<Vec<Utterance>> for ConversationLog {
    fn from(entries: Vec<Utterance>) -> Self {
        Self { entries }
    }
}
