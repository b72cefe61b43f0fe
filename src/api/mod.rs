//! HTTP API server for the voice-chat gateway

pub mod conversation;
mod error;
pub mod health;
pub mod profile;
pub mod rate_limit;
pub mod voice;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, Request, header};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::conversation::Conversation;

pub use error::{ApiError, FailureBody};

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub conversation: Arc<Conversation>,
    pub rate_limiter: Option<rate_limit::SharedLimiter>,
}

/// Configuration for building an API server
pub struct ApiServerBuilder {
    conversation: Arc<Conversation>,
    port: u16,
    cors_origin: Option<String>,
    static_dir: Option<PathBuf>,
    rate_limit_per_minute: Option<u32>,
}

impl ApiServerBuilder {
    /// Create a new API server builder
    #[must_use]
    pub const fn new(conversation: Arc<Conversation>, port: u16) -> Self {
        Self {
            conversation,
            port,
            cors_origin: None,
            static_dir: None,
            rate_limit_per_minute: None,
        }
    }

    /// Restrict CORS to a single origin
    #[must_use]
    pub fn cors_origin(mut self, origin: Option<String>) -> Self {
        self.cors_origin = origin;
        self
    }

    /// Serve the web client from `dir`
    #[must_use]
    pub fn static_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.static_dir = dir;
        self
    }

    /// Cap the total request rate
    #[must_use]
    pub const fn rate_limit(mut self, requests_per_minute: Option<u32>) -> Self {
        self.rate_limit_per_minute = requests_per_minute;
        self
    }

    /// Build the API server
    #[must_use]
    pub fn build(self) -> ApiServer {
        let rate_limiter = self.rate_limit_per_minute.map(rate_limit::create_limiter);

        let state = Arc::new(ApiState {
            conversation: self.conversation,
            rate_limiter,
        });

        ApiServer {
            state,
            port: self.port,
            cors_origin: self.cors_origin,
            static_dir: self.static_dir,
        }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
    cors_origin: Option<String>,
    static_dir: Option<PathBuf>,
}

impl ApiServer {
    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        let mut router = Router::new()
            .nest("/api/conversation", conversation::router(self.state.clone()))
            .nest("/api/profile", profile::router(self.state.clone()))
            .nest("/api/voices", voice::router(self.state.clone()))
            .merge(health::router(self.state.clone()));

        // Serve static files if configured
        if let Some(static_dir) = &self.static_dir {
            let index_file = static_dir.join("index.html");
            let serve_dir = ServeDir::new(static_dir).fallback(ServeFile::new(&index_file));

            router = router.fallback_service(serve_dir);
            tracing::info!(path = %static_dir.display(), "serving static files");
        }

        // Rate limiting (only when configured)
        let router = router.layer(axum::middleware::from_fn_with_state(
            self.state.clone(),
            rate_limit::rate_limit_middleware,
        ));

        router.layer(self.cors()).layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %uuid::Uuid::new_v4(),
                )
            }),
        )
    }

    /// CORS layer for cross-origin requests from the web client
    fn cors(&self) -> CorsLayer {
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE])
            .expose_headers([HeaderName::from_static(conversation::CONVERSATION_ID_HEADER)]);

        match self.cors_origin.as_deref().map(HeaderValue::from_str) {
            Some(Ok(origin)) => cors.allow_origin(origin),
            Some(Err(e)) => {
                tracing::warn!(error = %e, "invalid CORS origin, allowing any");
                cors.allow_origin(Any)
            }
            None => cors.allow_origin(Any),
        }
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(
            port = self.port,
            model = %self.state.conversation.model(),
            voice = self.state.conversation.voices().is_some(),
            "API server listening"
        );

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

/// Resolve on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
