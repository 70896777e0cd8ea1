//! Conversation log shared between the candidate and the AI interviewer

mod log;

pub use log::{CandidateAppend, ConversationLog, Role, Utterance};
