use serde::{Deserialize, Serialize};

/// Call lifecycle of an interview session
///
/// Transitions only move forward; `Finished` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Connecting,
    Active,
    Finished,
}

impl SessionState {
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle, Connecting) | (Connecting, Active) | (Idle | Connecting | Active, Finished)
        )
    }

    pub fn is_terminal(self) -> bool {
        self == SessionState::Finished
    }
}
