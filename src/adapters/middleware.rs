//! Axum middleware shared by every route.
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

use crate::tracing_setup::create_request_span;

/// Header carrying the per-request id in both directions.
pub static REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Tag the request with an id and run it inside a `request` span.
///
/// An id supplied by an upstream proxy is kept; otherwise a UUID v4 is
/// generated. The id is forwarded to the fallback and echoed on the response.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty() && v.len() <= 128)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let span = create_request_span(req.method().as_str(), req.uri().path(), &request_id);

    let header_value = HeaderValue::from_str(&request_id).ok();
    if let Some(value) = &header_value {
        req.headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value.clone());
    }

    let mut response = next.run(req).instrument(span.clone()).await;
    span.record("http.status_code", response.status().as_u16());

    if let Some(value) = header_value {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER.clone(), value);
    }

    response
}
