//! Request and response types for the HTTP endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::{ConversationContext, ConversationTurn, Phase};

/// Body for POST /api/chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Existing session to continue; a new session is created when absent.
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub message: String,
}

/// Response for session history endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub session_id: Uuid,
    pub history: Vec<ConversationTurn>,
}

/// Body for PUT /api/sessions/{id}/project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectInfoRequest {
    #[serde(default)]
    pub project_info: BTreeMap<String, String>,
    #[serde(default)]
    pub preferences: BTreeMap<String, String>,
}

/// Response for PUT /api/sessions/{id}/project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextResponse {
    pub session_id: Uuid,
    pub context: ConversationContext,
}

/// One entry of GET /api/phases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub phase: Phase,
    pub title: String,
    pub suggestions: Vec<String>,
}

/// Response for GET /api/phases/{phase}/suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    pub phase: Phase,
    /// Markdown list as shown by the phase buttons.
    pub text: String,
}

/// Body for POST /api/exports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportRequest {
    /// Module to export; every module when absent.
    #[serde(default)]
    pub module_name: Option<String>,
}

/// Response for POST /api/exports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub path: String,
}

/// Response for GET /api/health.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions: usize,
    pub feedback_count: u64,
}

/// Error body for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Fields that failed validation, if any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
}
