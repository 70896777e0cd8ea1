//! HTTP API server for operator control
//!
//! This module provides a REST API for controlling interview sessions:
//! - POST /interviews/start - Start a new interview
//! - POST /interviews/:id/end - End an interview and collect the outcome
//! - GET /interviews/:id/status - Query session statistics
//! - GET /interviews/:id/conversation - Get the conversation so far
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
