//! Turn-taking between candidate and interviewer
//!
//! - `TurnScheduler` decides when the AI may speak
//! - `TimerRegistry` owns the idle and keep-alive timers

mod scheduler;
mod timers;

pub use scheduler::{AiTurn, TurnAction, TurnPhase, TurnScheduler};
pub use timers::{TimerRegistry, TimerSlot};
