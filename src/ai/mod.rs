//! AI interviewer turns
//!
//! `QuestionGenerator` is the external text-generation collaborator.
//! `AiTurnClient` wraps it with the interview context and the turn cap.

mod client;

pub use client::{
    AiTurnClient, InterviewContext, QuestionGenerator, QuestionRequest, QuestionResponse,
    DEFAULT_MAX_AI_TURNS,
};
