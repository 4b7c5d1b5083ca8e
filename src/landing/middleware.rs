use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use std::time::Instant;

pub const TIMING_HEADER: HeaderName = HeaderName::from_static("x-qrverse-timing-total-ms");

/// When the landing request entered the router.
#[derive(Copy, Clone)]
pub struct RequestStart(pub Instant);

impl RequestStart {
    pub fn elapsed_ms(&self) -> u64 {
        self.0.elapsed().as_millis() as u64
    }
}

/// Stamp every request with its start time and every response with the
/// total time spent in the router.
pub async fn time_request(mut request: Request<Body>, next: Next) -> Response {
    let start = RequestStart(Instant::now());
    request.extensions_mut().insert(start);

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(TIMING_HEADER, HeaderValue::from(start.elapsed_ms()));
    response
}
