use axum::{body::Body as AxumBody, http::StatusCode};
use hyper::{Request, Response};
use thiserror::Error;

/// Error type for request handler operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HandlerError {
    /// The handler could not process the request
    #[error("Request handling error: {0}")]
    RequestError(String),
    #[error("Internal server error: {0}")]
    InternalError(String),
    /// The legacy origin behind the fallback failed
    #[error("Bad gateway: {0}")]
    BadGateway(String),
    #[error("Gateway timeout: {0}")]
    GatewayTimeout(String),
}

impl HandlerError {
    /// Status code reported to the client when the error reaches the server edge.
    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::RequestError(_) => StatusCode::BAD_REQUEST,
            HandlerError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            HandlerError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            HandlerError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// RequestHandler is the port for anything that can answer an HTTP request.
///
/// The redirect handler wraps one of these as its fallback and hands it the
/// request whenever it decides not to redirect.
pub trait RequestHandler: Send + Sync + 'static {
    /// Handle an incoming HTTP request
    ///
    /// # Arguments
    /// * `req` - The HTTP request to handle
    ///
    /// # Returns
    /// A future that resolves to an HTTP response or an error
    fn handle_request(
        &self,
        req: Request<AxumBody>,
    ) -> impl std::future::Future<Output = Result<Response<AxumBody>, HandlerError>> + Send;
}
