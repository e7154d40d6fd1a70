//! Per-session conversation context.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Phase;

/// Mutable state carried across the turns of a single conversation.
///
/// `current_phase` is sticky: it only changes when a message matches a phase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub current_phase: Option<Phase>,
    pub project_info: BTreeMap<String, String>,
    pub user_preferences: BTreeMap<String, String>,
    pub active_tasks: Vec<String>,
}

impl ConversationContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_project_info(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.project_info.insert(key.into(), value.into());
    }

    pub fn set_preference(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.user_preferences.insert(key.into(), value.into());
    }

    /// Add a task identifier unless it is already active.
    pub fn add_task(&mut self, task: impl Into<String>) {
        let task = task.into();
        if !self.active_tasks.contains(&task) {
            self.active_tasks.push(task);
        }
    }

    /// Remove a task identifier. Returns whether it was active.
    pub fn complete_task(&mut self, task: &str) -> bool {
        let before = self.active_tasks.len();
        self.active_tasks.retain(|t| t != task);
        self.active_tasks.len() != before
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
