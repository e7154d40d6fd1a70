//! Shared server state and the per-session registry.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::conversation::{ChatSession, ConversationEngine};
use crate::feedback::FeedbackStore;

/// A session guarded by its own lock so sessions never contend with each other.
pub type SharedSession = Arc<Mutex<ChatSession>>;

/// Live chat sessions keyed by id.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
}

impl SessionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a session.
    pub async fn get(&self, id: Uuid) -> Option<SharedSession> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Return the session for `id`, creating it when absent or when no id is given.
    pub async fn get_or_create(&self, id: Option<Uuid>) -> (Uuid, SharedSession) {
        if let Some(id) = id {
            if let Some(session) = self.get(id).await {
                return (id, session);
            }
        }

        let id = id.unwrap_or_else(Uuid::new_v4);
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(id)
            .or_insert_with(|| {
                tracing::debug!(session_id = %id, "Created chat session");
                Arc::new(Mutex::new(ChatSession::with_id(id)))
            })
            .clone();
        (id, session)
    }

    /// Drop a session, returning it if it existed.
    pub async fn remove(&self, id: Uuid) -> Option<SharedSession> {
        let removed = self.sessions.write().await.remove(&id);
        if removed.is_some() {
            tracing::debug!(session_id = %id, "Removed chat session");
        }
        removed
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<ConversationEngine>,
    pub feedback: Arc<FeedbackStore>,
    pub sessions: Arc<SessionRegistry>,
    /// Directory feedback exports are written to.
    pub export_dir: PathBuf,
    /// Cancellation token for graceful shutdown.
    pub cancel: CancellationToken,
}

impl AppState {
    #[must_use]
    pub fn new(
        engine: ConversationEngine,
        feedback: FeedbackStore,
        export_dir: PathBuf,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            feedback: Arc::new(feedback),
            sessions: Arc::new(SessionRegistry::new()),
            export_dir,
            cancel,
        }
    }
}
