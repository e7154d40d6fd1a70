//! Response generation over a completion service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::prompt::{build_completion_prompt, build_system_prompt, extract_response, truncate_chars};
use super::{ConversationContext, ConversationHistory, ConversationTurn, Phase, PhaseCatalog};
use crate::ai::{AiError, CompletionService};
use crate::config::GenerationParams;

/// Fixed reply shown whenever the completion service fails.
pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I encountered an error while generating a response. Please try again.";

/// Responses shorter than this get the phase's first suggestion appended.
pub const SHORT_RESPONSE_CHARS: usize = 100;

/// Prefix placed before an appended suggestion.
pub const SUGGESTION_MARKER: &str = "\n\n💡 Suggestion: ";

/// Characters of the prompt kept in failure logs.
const LOGGED_PROMPT_CHARS: usize = 200;

/// State of one conversation: its context and rolling history.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub context: ConversationContext,
    pub history: ConversationHistory,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    #[must_use]
    pub fn with_id(id: Uuid) -> Self {
        Self {
            id,
            created_at: Utc::now(),
            context: ConversationContext::new(),
            history: ConversationHistory::new(),
        }
    }

    /// Drop all turns and reset the context.
    pub fn clear(&mut self) {
        tracing::debug!(session_id = %self.id, "Clearing conversation");
        self.history.clear();
        self.context.clear();
    }

    /// History as a JSON-serializable list, oldest first.
    #[must_use]
    pub fn export_history(&self) -> Vec<ConversationTurn> {
        self.history.to_vec()
    }
}

/// Result of submitting a message: the cleared input box and the new history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatUpdate {
    pub session_id: Uuid,
    pub input: String,
    pub response: Option<String>,
    pub history: Vec<ConversationTurn>,
}

/// Phase-aware assistant shared by all sessions.
///
/// Holds no per-conversation state; every call receives its `ChatSession`.
#[derive(Clone)]
pub struct ConversationEngine {
    completion: Arc<dyn CompletionService>,
    catalog: Arc<PhaseCatalog>,
    params: GenerationParams,
}

impl std::fmt::Debug for ConversationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl ConversationEngine {
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionService>, params: GenerationParams) -> Self {
        Self {
            completion,
            catalog: Arc::new(PhaseCatalog::new()),
            params,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &PhaseCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Detect the phase of a message.
    #[must_use]
    pub fn detect_phase(&self, message: &str) -> Option<Phase> {
        self.catalog.detect(message)
    }

    /// Generate a reply to `message`, updating the session context.
    ///
    /// Never fails: completion errors are logged and replaced by
    /// [`APOLOGY_MESSAGE`].
    pub async fn respond(&self, session: &mut ChatSession, message: &str) -> String {
        let phase = self.catalog.detect(message);
        if let Some(phase) = phase {
            session.context.current_phase = Some(phase);
        }

        let system_prompt = build_system_prompt(phase, &session.context);
        let prompt = build_completion_prompt(&system_prompt, message);

        let mut response = match self.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(
                    session_id = %session.id,
                    error = %e,
                    prompt = %truncate_chars(&prompt, LOGGED_PROMPT_CHARS),
                    "Completion failed"
                );
                return APOLOGY_MESSAGE.to_string();
            }
        };

        if let Some(phase) = phase {
            if response.chars().count() < SHORT_RESPONSE_CHARS {
                if let Some(suggestion) = self.catalog.get(phase).and_then(|i| i.first_suggestion())
                {
                    response.push_str(SUGGESTION_MARKER);
                    response.push_str(suggestion);
                }
            }
        }

        tracing::info!(
            session_id = %session.id,
            phase = ?phase,
            response_len = response.len(),
            "Generated response"
        );
        response
    }

    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let generated = self.completion.complete(prompt, &self.params).await?;
        let extracted = extract_response(&generated);
        if extracted.is_empty() {
            return Err(AiError::ParseError("Empty completion".to_string()));
        }
        Ok(extracted.to_string())
    }

    /// Respond to a message and record the turn in the session history.
    ///
    /// Blank messages leave the session untouched and skip the model call.
    pub async fn submit(&self, session: &mut ChatSession, message: &str) -> ChatUpdate {
        let message = message.trim();
        if message.is_empty() {
            return ChatUpdate {
                session_id: session.id,
                input: String::new(),
                response: None,
                history: session.export_history(),
            };
        }

        let response = self.respond(session, message).await;
        session
            .history
            .record(message, response.clone(), session.context.clone());

        ChatUpdate {
            session_id: session.id,
            input: String::new(),
            response: Some(response),
            history: session.export_history(),
        }
    }

    /// Formatted suggestion list for a phase button.
    #[must_use]
    pub fn phase_suggestions(&self, phase: Phase) -> String {
        self.catalog.format_suggestions(phase)
    }
}
