//! Router assembly and the HTTP server loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument};

use textlift_core::{ImageIngestor, PreviewStore};
use textlift_extractor::{ExtractionClient, SharedSession};

use crate::api;
use crate::control_ui;
use crate::error::{ApiError, ApiResult};
use crate::health_api;
use crate::preview;
use crate::session_registry::SessionRegistry;

/// Room for multipart framing on top of the largest accepted upload.
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

/// Application state shared across routes.
#[derive(Clone)]
pub struct GatewayState {
    pub sessions: SessionRegistry,
    pub ingestor: ImageIngestor,
    pub client: ExtractionClient,
    pub started_at: Instant,
}

impl GatewayState {
    pub fn new(ingestor: ImageIngestor, client: ExtractionClient) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            ingestor,
            client,
            started_at: Instant::now(),
        }
    }

    pub fn previews(&self) -> &Arc<dyn PreviewStore> {
        self.ingestor.previews()
    }

    pub(crate) async fn session(&self, id: &str) -> ApiResult<SharedSession> {
        self.sessions
            .get(id)
            .await
            .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
    }
}

/// Build the full router.
///
/// The body limit is set above the upload limit so that oversize images
/// reach the ingestor and get its size message.
pub fn build_router(state: GatewayState) -> Router {
    let body_limit = usize::try_from(state.ingestor.max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(BODY_LIMIT_HEADROOM);

    Router::new()
        .route("/", get(control_ui::index))
        .route("/api/health", get(health_api::get_health))
        .route("/api/sessions", post(api::create_session))
        .route(
            "/api/sessions/:id",
            get(api::get_session).delete(api::delete_session),
        )
        .route(
            "/api/sessions/:id/file",
            put(api::upload_file).delete(api::clear_file),
        )
        .route("/api/sessions/:id/settings", put(api::update_settings))
        .route("/api/sessions/:id/extract", post(api::start_extraction))
        .route("/api/sessions/:id/result", get(api::get_result))
        .route("/api/sessions/:id/export", get(api::export_result))
        .route("/api/sessions/:id/preview", get(preview::serve_preview))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState) -> Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("Gateway HTTP server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down gateway");
        })
        .await?;

    Ok(())
}
