use std::{sync::Arc, time::Instant};

use axum::{
    Router,
    body::Body as AxumBody,
    extract::Request,
    http::{StatusCode, header},
    middleware,
    routing::{any, get},
};
use eyre::{Result, WrapErr};
use hyper::Response;
use tower_http::trace::TraceLayer;

use crate::{
    adapters::middleware::request_id_middleware,
    core::redirect::RedirectHandler,
    ports::request_handler::{HandlerError, RequestHandler},
};

/// Liveness endpoint, answered before any redirect logic runs.
pub const HEALTH_PATH: &str = "/-/health";

/// HTTP front of the redirect service
pub struct HttpHandler<F> {
    redirect: RedirectHandler<F>,
    started_at: Instant,
}

impl<F: RequestHandler> HttpHandler<F> {
    pub fn new(redirect: RedirectHandler<F>) -> Self {
        Self {
            redirect,
            started_at: Instant::now(),
        }
    }

    /// Run the redirect handler, turning its errors into plain status responses.
    pub async fn handle_request(&self, req: Request) -> Response<AxumBody> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        match self.redirect.handle(req).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Request handling error for {} {}: {}", method, path, e);
                Self::error_response(&e)
            }
        }
    }

    fn error_response(error: &HandlerError) -> Response<AxumBody> {
        let status = error.status_code();
        let mut response = Response::new(AxumBody::from(
            status.canonical_reason().unwrap_or("Error"),
        ));
        *response.status_mut() = status;
        response
    }

    /// Handle health check endpoint
    async fn handle_health_check(&self) -> Result<Response<AxumBody>> {
        let settings = self.redirect.settings();
        let health_data = serde_json::json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "legacy_host": settings.legacy_host,
            "successor_host": settings.mapper.successor_host(),
            "uptime_secs": self.started_at.elapsed().as_secs(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        });

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .body(AxumBody::from(health_data.to_string()))
            .wrap_err("Failed to build health check response")
    }
}

/// Build the service router: health endpoint, catch-all redirect route,
/// request id and trace layers.
pub fn build_router<F: RequestHandler>(handler: Arc<HttpHandler<F>>) -> Router {
    let make_request_route = |handler: Arc<HttpHandler<F>>| {
        any(move |req: Request| {
            let handler = handler.clone();
            async move { handler.handle_request(req).await }
        })
    };

    let health_handler = handler.clone();
    let health_route = get(move || {
        let handler = health_handler.clone();
        async move {
            handler.handle_health_check().await.unwrap_or_else(|e| {
                tracing::error!("Health check error: {:?}", e);
                HttpHandler::<F>::error_response(&HandlerError::InternalError(e.to_string()))
            })
        }
    });

    Router::new()
        .route(HEALTH_PATH, health_route)
        .route("/{*path}", make_request_route(handler.clone()))
        .route("/", make_request_route(handler))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(request_id_middleware))
}
