use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::store::QrStore;

use super::handlers::{health_check, landing_page, LandingState};
use super::middleware::time_request;

pub fn create_landing_router(store: Arc<dyn QrStore>) -> Router {
    let state = Arc::new(LandingState { store });

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/landing/{short_id}", get(landing_page))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(time_request)),
        )
        .with_state(state)
}
