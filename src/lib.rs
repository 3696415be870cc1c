//! gddo-redirect - edge service moving godoc.org traffic to pkg.go.dev.
//!
//! Every request to the legacy documentation host passes through a
//! [`RedirectHandler`]. It either answers with a `302` to the matching
//! pkg.go.dev page or hands the request to a fallback (a fixed response or
//! the legacy origin). Which one happens is decided per request from the
//! `redirect=on|off` query parameter, the `pkggodev-redirect` cookie that
//! remembers the choice, and the `utm_source=backtogodoc` marker carried by
//! links from pkg.go.dev back to godoc.org. A telemetry event describing the
//! request is emitted exactly once whichever way it goes.
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use gddo_redirect::{
//!     adapters::{HttpHandler, LogEventSink, StaticFallback, build_router},
//!     core::{RedirectHandler, RedirectSettings},
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let fallback = StaticFallback::new("served by godoc.org", "text/plain")?;
//! let redirect = RedirectHandler::new(
//!     fallback,
//!     Arc::new(LogEventSink),
//!     RedirectSettings::default(),
//! );
//! let app = build_router(Arc::new(HttpHandler::new(redirect)));
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations)
//! while keeping the decision logic inside `core`. The URL mapper and the
//! robot classifier are pure functions and can be used on their own:
//!
//! ```
//! use gddo_redirect::core::{is_robot, map_url_str};
//!
//! let mapped = map_url_str("https://godoc.org/net/http?imports").unwrap();
//! assert_eq!(
//!     mapped.as_str(),
//!     "https://pkg.go.dev/net/http?tab=imports&utm_source=godoc"
//! );
//! assert!(is_robot("Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)"));
//! ```
//!
//! # Error Handling
//! Ports expose `thiserror` enums ([`HandlerError`], [`HttpClientError`]);
//! startup and configuration paths return `eyre::Result<T>` with context
//! attached through `WrapErr`.
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{Fallback, HttpHandler, build_event_sink, build_router},
    core::{RedirectHandler, RedirectSettings, is_robot, map_url},
    ports::{
        event_sink::EventSink,
        http_client::{HttpClient, HttpClientError},
        request_handler::{HandlerError, RequestHandler},
    },
    utils::GracefulShutdown,
};
