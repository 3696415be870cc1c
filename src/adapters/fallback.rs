//! Handlers answering requests the redirect handler decides to serve locally.

use std::sync::Arc;

use axum::{
    body::Body as AxumBody,
    http::{HeaderValue, StatusCode, Uri, header},
};
use eyre::{Result, WrapErr};
use hyper::{Request, Response};

use crate::{
    adapters::http_client::HttpClientAdapter,
    config::models::FallbackConfig,
    ports::{
        http_client::{HttpClient, HttpClientError},
        request_handler::{HandlerError, RequestHandler},
    },
};

/// Answers every request with the same body.
#[derive(Debug, Clone)]
pub struct StaticFallback {
    body: String,
    content_type: HeaderValue,
}

impl StaticFallback {
    pub fn new(body: impl Into<String>, content_type: &str) -> Result<Self> {
        let content_type = HeaderValue::from_str(content_type)
            .wrap_err_with(|| format!("Invalid content type '{content_type}'"))?;
        Ok(Self {
            body: body.into(),
            content_type,
        })
    }
}

impl RequestHandler for StaticFallback {
    async fn handle_request(
        &self,
        _req: Request<AxumBody>,
    ) -> Result<Response<AxumBody>, HandlerError> {
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, self.content_type.clone())
            .body(AxumBody::from(self.body.clone()))
            .map_err(|e| HandlerError::InternalError(e.to_string()))
    }
}

/// Forwards requests to the legacy godoc.org origin.
pub struct ProxyFallback {
    target: Uri,
    client: Arc<dyn HttpClient>,
}

impl ProxyFallback {
    pub fn new(target: &str, client: Arc<dyn HttpClient>) -> Result<Self> {
        let target: Uri = target
            .parse()
            .wrap_err_with(|| format!("Invalid proxy target '{target}'"))?;
        if target.scheme().is_none() || target.authority().is_none() {
            eyre::bail!("Proxy target '{target}' must be an absolute http(s) URL");
        }
        Ok(Self { target, client })
    }

    /// Build the origin URI: target scheme and authority, target path prefix,
    /// then the request path and query.
    fn upstream_uri(&self, original: &Uri) -> Result<Uri, HandlerError> {
        let prefix = self.target.path().trim_end_matches('/');
        let path_and_query = original.path_and_query().map_or("/", |pq| pq.as_str());

        Uri::builder()
            .scheme(self.target.scheme_str().unwrap_or("http"))
            .authority(self.target.authority().map_or("", |a| a.as_str()))
            .path_and_query(format!("{prefix}{path_and_query}"))
            .build()
            .map_err(|e| HandlerError::InternalError(format!("Failed to build origin URI: {e}")))
    }
}

impl RequestHandler for ProxyFallback {
    async fn handle_request(
        &self,
        req: Request<AxumBody>,
    ) -> Result<Response<AxumBody>, HandlerError> {
        let (mut parts, body) = req.into_parts();

        // Keep the public host visible to the origin before Host is rewritten.
        let public_host = parts
            .uri
            .authority()
            .map(|a| a.as_str().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
            });
        if let Some(value) = public_host.and_then(|h| HeaderValue::from_str(&h).ok()) {
            parts.headers.insert("x-forwarded-host", value);
        }

        parts.uri = self.upstream_uri(&parts.uri)?;

        self.client
            .send_request(Request::from_parts(parts, body))
            .await
            .map_err(|e| match e {
                HttpClientError::Timeout(secs) => {
                    HandlerError::GatewayTimeout(format!("Origin timed out after {secs}s"))
                }
                other => HandlerError::BadGateway(other.to_string()),
            })
    }
}

/// Fallback selected by configuration.
pub enum Fallback {
    Static(StaticFallback),
    Proxy(ProxyFallback),
}

impl Fallback {
    pub fn from_config(config: &FallbackConfig) -> Result<Self> {
        match config {
            FallbackConfig::Static { body, content_type } => {
                Ok(Fallback::Static(StaticFallback::new(body.clone(), content_type)?))
            }
            FallbackConfig::Proxy {
                target,
                timeout_secs,
            } => {
                let client = HttpClientAdapter::new(*timeout_secs)
                    .wrap_err("Failed to create origin HTTP client")?;
                Ok(Fallback::Proxy(ProxyFallback::new(target, Arc::new(client))?))
            }
        }
    }
}

impl RequestHandler for Fallback {
    async fn handle_request(
        &self,
        req: Request<AxumBody>,
    ) -> Result<Response<AxumBody>, HandlerError> {
        match self {
            Fallback::Static(handler) => handler.handle_request(req).await,
            Fallback::Proxy(handler) => handler.handle_request(req).await,
        }
    }
}
