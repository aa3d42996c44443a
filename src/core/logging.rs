//! Log di ogni richiesta HTTP in ingresso e della relativa risposta

use axum::{body::Body, extract::Request, http::Response, middleware::Next};
use std::time::Instant;
use tracing::info;

pub async fn log_requests(req: Request, next: Next) -> Response<Body> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    info!("[REQ] {} {}", method, path);
    let response = next.run(req).await;
    info!(
        "[RES] {} {} {} {}ms",
        method,
        path,
        response.status().as_u16(),
        started.elapsed().as_millis()
    );

    response
}
