use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::{InterviewContext, DEFAULT_MAX_AI_TURNS};

/// Configuration for an interview session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Unique interview identifier (e.g., "interview-3f1c...")
    pub session_id: String,

    /// Candidate name, passed to feedback generation
    pub user_name: String,

    /// Existing feedback record to overwrite, if any
    pub feedback_id: Option<String>,

    /// Job description the questions are based on
    pub job_description: String,

    /// Summary of the candidate's resume
    pub resume_summary: String,

    /// Candidate silence after which the AI takes its turn
    /// Default: 10 seconds
    pub idle_timeout: Duration,

    /// Keep-alive period while the transcription stream carries no audio
    /// Default: 30 seconds
    pub keep_alive_interval: Duration,

    /// Maximum interviewer utterances before the interview is forced to end
    pub max_ai_turns: usize,
}

impl SessionConfig {
    pub fn context(&self) -> InterviewContext {
        InterviewContext {
            job_description: self.job_description.clone(),
            resume_summary: self.resume_summary.clone(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_id: format!("interview-{}", uuid::Uuid::new_v4()),
            user_name: String::new(),
            feedback_id: None,
            job_description: String::new(),
            resume_summary: String::new(),
            idle_timeout: Duration::from_secs(10),
            keep_alive_interval: Duration::from_secs(30),
            max_ai_turns: DEFAULT_MAX_AI_TURNS,
        }
    }
}
