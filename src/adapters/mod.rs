pub mod event_sinks;
pub mod fallback;
pub mod http_client;
pub mod http_handler;
pub mod middleware;

/// Re-export commonly used types from adapters
pub use event_sinks::{HttpEventSink, LogEventSink, NullEventSink, build_event_sink};
pub use fallback::{Fallback, ProxyFallback, StaticFallback};
pub use http_client::HttpClientAdapter;
pub use http_handler::{HEALTH_PATH, HttpHandler, build_router};
pub use middleware::request_id_middleware;
