//! Live session registry.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use textlift_extractor::SharedSession;

pub type SessionId = String;

/// Sessions keyed by opaque id. Removing a session drops its state, which
/// releases any preview it holds.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<SessionId, SharedSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> (SessionId, SharedSession) {
        let id = Uuid::new_v4().to_string();
        let session = SharedSession::new();
        self.sessions
            .write()
            .await
            .insert(id.clone(), session.clone());
        debug!(session_id = %id, "Session created");
        (id, session)
    }

    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        self.sessions.read().await.get(id).cloned()
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            debug!(session_id = %id, "Session removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
