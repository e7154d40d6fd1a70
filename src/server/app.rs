//! Assistant HTTP server with axum router and graceful shutdown.

use axum::routing::{delete, get, post, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::error::ServerError;
use super::handlers::{
    delete_session, get_all_analytics, get_health, get_history, get_module_analytics,
    get_module_feedback, get_phase_suggestions, get_phases, post_chat, post_clear, post_export,
    post_feedback, put_project,
};
use super::state::AppState;
use crate::config::ServerConfig;

/// HTTP front end for chat sessions and the feedback store.
pub struct AssistantServer {
    config: ServerConfig,
    state: AppState,
}

impl AssistantServer {
    /// Create a server with default configuration.
    #[must_use]
    pub fn new(state: AppState) -> Self {
        Self {
            config: ServerConfig::default(),
            state,
        }
    }

    /// Set the server configuration (builder pattern).
    #[must_use]
    pub fn with_config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the configured address as a string.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Build the axum router with all routes and middleware.
    pub fn build_router(&self) -> Router {
        let router = Router::new()
            .route("/api/health", get(get_health))
            .route("/api/chat", post(post_chat))
            .route("/api/sessions/:id", delete(delete_session))
            .route("/api/sessions/:id/clear", post(post_clear))
            .route("/api/sessions/:id/history", get(get_history))
            .route("/api/sessions/:id/project", put(put_project))
            .route("/api/phases", get(get_phases))
            .route("/api/phases/:phase/suggestions", get(get_phase_suggestions))
            .route("/api/feedback", post(post_feedback))
            .route("/api/feedback/:module", get(get_module_feedback))
            .route("/api/analytics", get(get_all_analytics))
            .route("/api/analytics/:module", get(get_module_analytics))
            .route("/api/exports", post(post_export))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http());

        if self.config.cors_permissive {
            router.layer(CorsLayer::permissive())
        } else {
            router
        }
    }

    /// Run the server, binding to the configured address.
    ///
    /// The server will run until the cancellation token is triggered,
    /// at which point it will perform a graceful shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind or serve.
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.address();
        let cancel = self.state.cancel.clone();
        let app = self.build_router();

        tracing::info!(address = %addr, "Starting assistant server");

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::BindError {
                address: addr.clone(),
                source,
            })?;

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("Assistant server shutting down gracefully");
            })
            .await
            .map_err(ServerError::Serve)
    }
}
