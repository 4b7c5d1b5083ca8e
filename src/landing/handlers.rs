use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Extension, Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::middleware::RequestStart;
use super::render::render_page;
use super::view::{ResolutionState, ResolutionView};
use crate::store::QrStore;

pub struct LandingState {
    pub store: Arc<dyn QrStore>,
}

/// Resolve a scanned short id and show its links.
pub async fn landing_page(
    State(state): State<Arc<LandingState>>,
    Path(short_id): Path<String>,
    Extension(start): Extension<RequestStart>,
) -> impl IntoResponse {
    let mut view = ResolutionView::new();
    let resolved = view.load(state.store.as_ref(), &short_id).await;

    let status = match resolved {
        ResolutionState::Resolved(_) => StatusCode::OK,
        ResolutionState::Loading | ResolutionState::NotFound(_) => StatusCode::NOT_FOUND,
    };
    let html = render_page(resolved);

    info!(
        short_id = %short_id,
        status = status.as_u16(),
        elapsed_ms = start.elapsed_ms(),
        "resolved landing page"
    );

    // Scans must reach the store every time.
    (status, [(header::CACHE_CONTROL, "no-store")], Html(html))
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}
