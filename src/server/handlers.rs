//! HTTP handlers for the assistant API.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;

use super::api::{
    ChatRequest, ContextResponse, ExportRequest, ExportResponse, HealthResponse, HistoryResponse,
    PhaseSummary, ProjectInfoRequest, SuggestionsResponse,
};
use super::error::ApiError;
use super::extract::Json;
use super::state::{AppState, SharedSession};
use crate::conversation::{ChatUpdate, Phase};
use crate::feedback::{FeedbackRecord, ModuleAnalytics, NewFeedback};

async fn existing_session(state: &AppState, id: Uuid) -> Result<SharedSession, ApiError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or(ApiError::SessionNotFound(id))
}

/// POST /api/chat - Submit a message and return the updated history.
pub async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatUpdate> {
    if request.message.trim().is_empty() {
        // Blank input never creates a session.
        let existing = match request.session_id {
            Some(id) => state.sessions.get(id).await,
            None => None,
        };
        let Some(session) = existing else {
            return Json(ChatUpdate {
                session_id: request.session_id.unwrap_or_else(Uuid::nil),
                input: String::new(),
                response: None,
                history: Vec::new(),
            });
        };
        let mut session = session.lock().await;
        return Json(state.engine.submit(&mut session, &request.message).await);
    }

    let (_, session) = state.sessions.get_or_create(request.session_id).await;
    let mut session = session.lock().await;
    Json(state.engine.submit(&mut session, &request.message).await)
}

/// POST /api/sessions/:id/clear - Drop a session's history and context.
pub async fn post_clear(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = existing_session(&state, id).await?;
    let mut session = session.lock().await;
    session.clear();
    Ok(Json(HistoryResponse {
        session_id: id,
        history: session.export_history(),
    }))
}

/// DELETE /api/sessions/:id - Forget a session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .sessions
        .remove(id)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(ApiError::SessionNotFound(id))
}

/// GET /api/sessions/:id/history - Export a session's history, oldest first.
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let session = existing_session(&state, id).await?;
    let session = session.lock().await;
    Ok(Json(HistoryResponse {
        session_id: id,
        history: session.export_history(),
    }))
}

/// PUT /api/sessions/:id/project - Merge project info and preferences into the context.
pub async fn put_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<ProjectInfoRequest>,
) -> Result<Json<ContextResponse>, ApiError> {
    let session = existing_session(&state, id).await?;
    let mut session = session.lock().await;
    for (key, value) in request.project_info {
        session.context.set_project_info(key, value);
    }
    for (key, value) in request.preferences {
        session.context.set_preference(key, value);
    }
    Ok(Json(ContextResponse {
        session_id: id,
        context: session.context.clone(),
    }))
}

/// GET /api/phases - List the phases with their suggestions.
pub async fn get_phases(State(state): State<AppState>) -> Json<Vec<PhaseSummary>> {
    let phases = state
        .engine
        .catalog()
        .phases()
        .iter()
        .map(|info| PhaseSummary {
            phase: info.phase,
            title: info.phase.title().to_string(),
            suggestions: info.suggestions.iter().map(ToString::to_string).collect(),
        })
        .collect();
    Json(phases)
}

/// GET /api/phases/:phase/suggestions - Formatted suggestion list for a phase button.
pub async fn get_phase_suggestions(
    State(state): State<AppState>,
    Path(phase): Path<String>,
) -> Result<Json<SuggestionsResponse>, ApiError> {
    let phase: Phase = phase.parse()?;
    Ok(Json(SuggestionsResponse {
        phase,
        text: state.engine.phase_suggestions(phase),
    }))
}

/// POST /api/feedback - Validate and store feedback.
pub async fn post_feedback(
    State(state): State<AppState>,
    Json(feedback): Json<NewFeedback>,
) -> Result<(StatusCode, Json<FeedbackRecord>), ApiError> {
    let record = state.feedback.record(feedback).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/feedback/:module - Feedback for a module, newest first.
pub async fn get_module_feedback(
    State(state): State<AppState>,
    Path(module): Path<String>,
) -> Result<Json<Vec<FeedbackRecord>>, ApiError> {
    Ok(Json(state.feedback.query_by_module(&module).await?))
}

/// GET /api/analytics - Analytics for every module.
pub async fn get_all_analytics(
    State(state): State<AppState>,
) -> Result<Json<Vec<ModuleAnalytics>>, ApiError> {
    Ok(Json(state.feedback.list_analytics().await?))
}

/// GET /api/analytics/:module - Analytics for one module.
pub async fn get_module_analytics(
    State(state): State<AppState>,
    Path(module): Path<String>,
) -> Result<Json<ModuleAnalytics>, ApiError> {
    state
        .feedback
        .get_analytics(&module)
        .await?
        .map(Json)
        .ok_or(ApiError::NoAnalytics(module))
}

/// POST /api/exports - Write an export file into the export directory.
pub async fn post_export(
    State(state): State<AppState>,
    Json(request): Json<ExportRequest>,
) -> Result<Json<ExportResponse>, ApiError> {
    let module = request
        .module_name
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty());
    let path = state.feedback.export(module, &state.export_dir).await?;
    Ok(Json(ExportResponse {
        path: path.display().to_string(),
    }))
}

/// GET /api/health - Liveness and basic counters.
pub async fn get_health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: state.sessions.len().await,
        feedback_count: state.feedback.count_feedback().await?,
    }))
}
