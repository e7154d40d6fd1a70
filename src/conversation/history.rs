//! Bounded rolling conversation history.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ConversationContext;

/// Maximum number of turns kept per conversation.
pub const MAX_HISTORY: usize = 10;

/// One user/assistant exchange with the context as it was when answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub timestamp: DateTime<Utc>,
    pub user_message: String,
    pub ai_response: String,
    pub context: ConversationContext,
}

/// FIFO history holding at most `capacity` turns.
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(MAX_HISTORY)
    }

    /// History bounded to `capacity` turns (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            turns: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a turn stamped with the current time, evicting the oldest at capacity.
    pub fn record(
        &mut self,
        user_message: impl Into<String>,
        ai_response: impl Into<String>,
        context: ConversationContext,
    ) {
        self.push(ConversationTurn {
            timestamp: Utc::now(),
            user_message: user_message.into(),
            ai_response: ai_response.into(),
            context,
        });
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.back()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }

    /// Oldest-first copy of the turns, for export.
    #[must_use]
    pub fn to_vec(&self) -> Vec<ConversationTurn> {
        self.turns.iter().cloned().collect()
    }

    /// Write the turns to `path` as pretty-printed JSON, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error naming the path if a directory or the file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<(), HistoryExportError> {
        let json = serde_json::to_string_pretty(&self.to_vec())?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent).await.map_err(|source| {
                    HistoryExportError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    }
                })?;
            }
        }

        tokio::fs::write(path, json)
            .await
            .map_err(|source| HistoryExportError::Write {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %path.display(), turns = self.len(), "Saved conversation history");
        Ok(())
    }
}

/// Errors from writing a history export.
#[derive(thiserror::Error, Debug)]
pub enum HistoryExportError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
