//! HTTP API for chat sessions, phase suggestions, and feedback.

mod api;
mod app;
mod error;
mod extract;
mod handlers;
mod state;

pub use api::{
    ChatRequest, ContextResponse, ErrorResponse, ExportRequest, ExportResponse, HealthResponse,
    HistoryResponse, PhaseSummary, ProjectInfoRequest, SuggestionsResponse,
};
pub use app::AssistantServer;
pub use error::{ApiError, ServerError};
pub use extract::Json;
pub use state::{AppState, SessionRegistry, SharedSession};
