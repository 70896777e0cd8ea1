use crate::config::{InterviewConfig, NatsConfig};
use crate::session::InterviewSession;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

type SessionMap = Arc<RwLock<HashMap<String, Arc<InterviewSession>>>>;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Interview sessions (interview_id → session)
    pub sessions: SessionMap,

    /// Collaborator transport
    pub nats: NatsConfig,

    /// Defaults for new sessions
    pub interview: InterviewConfig,
}

impl AppState {
    pub fn new(nats: NatsConfig, interview: InterviewConfig) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            nats,
            interview,
        }
    }

    /// Track `session` under its id; false if that id is already running
    ///
    /// The entry is dropped again once the session finishes on its own.
    pub async fn try_register(&self, session: Arc<InterviewSession>) -> bool {
        let id = session.id().to_string();
        {
            let mut sessions = self.sessions.write().await;
            match sessions.entry(id.clone()) {
                Entry::Occupied(_) => return false,
                Entry::Vacant(slot) => {
                    slot.insert(Arc::clone(&session));
                }
            }
        }

        let sessions = Arc::clone(&self.sessions);
        tokio::spawn(async move {
            match session.wait().await {
                Ok(outcome) => info!(
                    "Interview {} finished ({:?}, redirect {:?})",
                    id, outcome.reason, outcome.redirect
                ),
                Err(e) => warn!("Interview {} ended abnormally: {}", id, e),
            }

            let mut sessions = sessions.write().await;
            if sessions
                .get(&id)
                .is_some_and(|current| Arc::ptr_eq(current, &session))
            {
                sessions.remove(&id);
            }
        });

        true
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(NatsConfig::default(), InterviewConfig::default())
    }
}
