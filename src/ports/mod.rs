pub mod event_sink;
pub mod http_client;
pub mod request_handler;

pub use event_sink::EventSink;
pub use http_client::{HttpClient, HttpClientError, HttpClientResult};
pub use request_handler::{HandlerError, RequestHandler};
