//! # Recital HTTP API Module
//!
//! This module implements the HTTP JSON API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /api/poems` - List titles, newest first
//! - `GET /api/poem/{title}` - Get one poem
//! - `POST /api/poem` - Add a poem
//! - `DELETE /api/poem/{title}` - Delete a poem
//! - `POST /api/poem/{title}/study` - Mark a poem as being studied
//! - `GET /api/random?count=N` - Weighted-random practice set
//! - `GET /api/settings` - Read settings
//! - `POST /api/settings` - Update settings
//!
//! Any other path is served from the configured public directory, if set.
//!
//! ## Environment
//!
//! - `RECITAL_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)

mod handlers;
mod middleware;
mod types;

pub use middleware::{GlobalRateLimiter, create_rate_limiter};
pub use types::{
    AddPoemRequest, ApiError, ErrorResponse, ExcerptJson, HealthResponse, MessageResponse,
    PoemResponse, RandomQuery, SettingsResponse, stringify_settings,
};

use crate::backend::{self, Backend};
use crate::config::AppConfig;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use recital_core::{Library, RecitalError};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state containing the library.
#[derive(Clone)]
pub struct AppState {
    /// The library, behind one lock so draws and their increments serialize.
    pub library: Arc<RwLock<Library>>,
    /// Snapshot file to rewrite after changes (file backend only).
    snapshot: Option<Arc<PathBuf>>,
}

impl AppState {
    /// Create app state around a library that persists itself.
    #[must_use]
    pub fn new(library: Library) -> Self {
        Self {
            library: Arc::new(RwLock::new(library)),
            snapshot: None,
        }
    }

    /// Create app state that writes a JSON snapshot after every change.
    #[must_use]
    pub fn with_snapshot(library: Library, path: PathBuf) -> Self {
        Self {
            library: Arc::new(RwLock::new(library)),
            snapshot: Some(Arc::new(path)),
        }
    }

    /// Persist the library as it stands. A no-op unless snapshotting.
    pub fn persist(&self, library: &Library) -> Result<(), RecitalError> {
        match &self.snapshot {
            Some(path) => backend::save_library(library, path),
            None => Ok(()),
        }
    }

    /// Apply `change` to the library.
    ///
    /// When snapshotting, the change runs on a copy that replaces the live
    /// library only after the snapshot is written, so a failed change or a
    /// failed write leaves the library as it was.
    pub fn commit<T>(
        &self,
        library: &mut Library,
        change: impl FnOnce(&mut Library) -> Result<T, RecitalError>,
    ) -> Result<T, RecitalError> {
        let Some(path) = &self.snapshot else {
            return change(library);
        };
        let Some(store) = library.memory_opt().cloned() else {
            return change(library);
        };

        let mut staged = Library::with_memory(store);
        let value = change(&mut staged)?;
        backend::save_library(&staged, path)?;
        *library = staged;
        Ok(value)
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `RECITAL_CORS_ORIGINS`.
///
/// - "*": allows all origins
/// - unset: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("RECITAL_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!("CORS: Allowing ALL origins (RECITAL_CORS_ORIGINS=*)");
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in RECITAL_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                with_api_methods(CorsLayer::new().allow_origin(allowed_origins))
            }
        }
        None => build_localhost_cors(),
    }
}

/// Build a restrictive CORS layer that only allows localhost origins.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:5000",
        "http://localhost:3000",
        "http://127.0.0.1:5000",
        "http://127.0.0.1:3000",
    ]
    .into_iter()
    .filter_map(|o| o.parse::<HeaderValue>().ok())
    .collect();

    with_api_methods(CorsLayer::new().allow_origin(origins))
}

fn with_api_methods(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Router construction options.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// Requests per second; 0 disables rate limiting.
    pub rate_limit: u32,
    /// Static front-end served for every non-API path.
    pub public_dir: Option<PathBuf>,
}

impl From<&AppConfig> for RouterOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            rate_limit: config.rate_limit,
            public_dir: config.public_dir.clone(),
        }
    }
}

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Body limit
/// 4. Rate Limiting (if enabled)
pub fn create_router(state: AppState, options: &RouterOptions) -> Router {
    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/api/poems", get(handlers::list_poems_handler))
        .route("/api/poem", post(handlers::add_poem_handler))
        .route(
            "/api/poem/{title}",
            get(handlers::get_poem_handler).delete(handlers::delete_poem_handler),
        )
        .route("/api/poem/{title}/study", post(handlers::study_poem_handler))
        .route("/api/random", get(handlers::random_handler))
        .route(
            "/api/settings",
            get(handlers::get_settings_handler).post(handlers::update_settings_handler),
        )
        .with_state(state);

    if let Some(dir) = &options.public_dir {
        router = with_static_files(router, dir);
    }

    if options.rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", options.rate_limit);
        router = router.layer(axum_middleware::from_fn_with_state(
            create_rate_limiter(options.rate_limit),
            middleware::rate_limit_middleware,
        ));
    } else {
        tracing::info!("Rate limiting disabled");
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(build_cors_layer())
            .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024)),
    )
}

/// Serve `dir` for every path no API route matched; `/` maps to `index.html`.
fn with_static_files(router: Router, dir: &Path) -> Router {
    tracing::info!("Serving static files from {}", dir.display());
    router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Build the app state for a library opened with `config`.
#[must_use]
pub fn state_for(library: Library, config: &AppConfig) -> AppState {
    match config.backend {
        Backend::File => AppState::with_snapshot(library, config.database.clone()),
        Backend::Redb => AppState::new(library),
    }
}

/// Start the HTTP server.
pub async fn run_server(config: &AppConfig, library: Library) -> Result<(), RecitalError> {
    let router = create_router(state_for(library, config), &RouterOptions::from(config));
    let addr = config.bind_addr();

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| RecitalError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Recital HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| RecitalError::IoError(format!("Server error: {}", e)))
}

/// Resolve on Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}
