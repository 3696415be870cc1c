use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response, Version, header, header::HeaderValue};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;
use tokio::time::timeout;
use tracing::Instrument;

use crate::ports::http_client::{HttpClient, HttpClientError, HttpClientResult};

/// HTTP client adapter forwarding requests to the legacy origin, built on
/// Hyper with Rustls (HTTP/1.1 over plain TCP or TLS).
///
/// Requests are streamed both ways; each call is bounded by the configured
/// timeout.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, AxumBody>,
    timeout_secs: u64,
}

impl HttpClientAdapter {
    /// Create a new HTTP client adapter.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false);

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
            tracing::debug!("Loaded {} native root certificates.", root_cert_store.len());
        }

        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(https_connector);

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    /// Point the `Host` header at the origin named in the URI.
    fn set_host_header(req: &mut Request<AxumBody>) -> HttpClientResult<()> {
        let Some(authority) = req.uri().authority() else {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(
                "Outgoing URI has no host".to_string(),
            ));
        };
        let value = HeaderValue::from_str(authority.as_str())
            .map_err(|e| HttpClientError::InvalidRequest(e.to_string()))?;
        req.headers_mut().insert(header::HOST, value);
        Ok(())
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
    ) -> HttpClientResult<Response<AxumBody>> {
        Self::set_host_header(&mut req)?;

        let (mut parts, body) = req.into_parts();
        parts.version = Version::HTTP_11;

        let span = tracing::info_span!(
            "origin_request",
            http.method = %parts.method,
            http.uri = %parts.uri,
            http.status_code = tracing::field::Empty,
        );
        span.in_scope(|| tracing::debug!("Outgoing request headers: {:?}", parts.headers));

        let method = parts.method.clone();
        let uri = parts.uri.clone();
        let outgoing_request = Request::from_parts(parts, body);

        let result = timeout(
            Duration::from_secs(self.timeout_secs),
            self.client.request(outgoing_request),
        )
        .instrument(span.clone())
        .await;

        let _enter = span.enter();

        match result {
            Ok(Ok(response)) => {
                span.record("http.status_code", response.status().as_u16());

                let (mut parts, hyper_body) = response.into_parts();
                // Axum re-frames the streamed body.
                parts.headers.remove(header::TRANSFER_ENCODING);

                Ok(Response::from_parts(parts, AxumBody::new(hyper_body)))
            }
            Ok(Err(e)) => {
                span.record("http.status_code", 599u16);
                tracing::error!("Error forwarding {} {} to origin: {}", method, uri, e);
                Err(HttpClientError::ConnectionError(format!(
                    "Request to {method} {uri} failed: {e}"
                )))
            }
            Err(_) => {
                tracing::warn!(
                    "Origin did not answer {} {} within {}s",
                    method,
                    uri,
                    self.timeout_secs
                );
                Err(HttpClientError::Timeout(self.timeout_secs))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_client_creation() {
        let client = HttpClientAdapter::new(5);
        assert!(client.is_ok());
    }

    #[test]
    fn test_host_header_follows_uri() {
        let mut req = Request::builder()
            .uri("http://legacy:8080/net/http")
            .header(header::HOST, "godoc.org")
            .body(AxumBody::empty())
            .unwrap();
        HttpClientAdapter::set_host_header(&mut req).unwrap();
        assert_eq!(req.headers()[header::HOST], "legacy:8080");
    }

    #[tokio::test]
    async fn test_origin_form_uri_is_rejected() {
        let client = HttpClientAdapter::new(5).unwrap();
        let req = Request::builder()
            .uri("/net/http")
            .body(AxumBody::empty())
            .unwrap();
        let err = client.send_request(req).await.unwrap_err();
        assert!(matches!(err, HttpClientError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_unreachable_origin_is_connection_error() {
        let client = HttpClientAdapter::new(5).unwrap();
        let req = Request::builder()
            .uri("http://127.0.0.1:1/net/http")
            .body(AxumBody::empty())
            .unwrap();
        let err = client.send_request(req).await.unwrap_err();
        assert!(matches!(err, HttpClientError::ConnectionError(_)));
    }
}
