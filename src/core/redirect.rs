//! Redirect decision handler.
//!
//! Wraps a fallback [`RequestHandler`]. Each request either gets a `302` to
//! the successor site, written here, or is handed to the fallback untouched
//! apart from an optional `Set-Cookie`. A telemetry event is emitted for
//! every request whichever way it goes.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body as AxumBody,
    http::{HeaderValue, StatusCode, header},
};
use hyper::{Request, Response};
use url::Url;

use super::{
    event::{EventGuard, new_gddo_event},
    mapper::{MapError, UrlMapper},
    request::LegacyRequest,
    robot::RobotClassifier,
    toggle::{self, REDIRECT_COOKIE, REDIRECT_PARAM, ToggleSource, ToggleState},
};
use crate::{
    config::models::RedirectConfig,
    ports::{
        event_sink::EventSink,
        request_handler::{HandlerError, RequestHandler},
    },
};

/// Default legacy host, used when a request names no host at all.
pub const GODOC_HOST: &str = "godoc.org";
/// `utm_source` value pkg.go.dev puts on links back to godoc.org.
pub const BACK_TO_GODOC: &str = "backtogodoc";

/// Cookie mutation attached to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CookieAction {
    Keep,
    Enable,
    Clear,
}

/// Outcome of the redirect state machine for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Redirect { location: Url, cookie: CookieAction },
    PassThrough { cookie: CookieAction },
}

/// Knobs of the redirect decision.
#[derive(Debug, Clone)]
pub struct RedirectSettings {
    pub mapper: UrlMapper,
    pub legacy_host: String,
    pub cookie_name: String,
    pub return_marker: String,
    /// Hosts starting with one of these are never redirected (API traffic).
    pub exempt_host_prefixes: Vec<String>,
}

impl Default for RedirectSettings {
    fn default() -> Self {
        Self {
            mapper: UrlMapper::default(),
            legacy_host: GODOC_HOST.to_string(),
            cookie_name: REDIRECT_COOKIE.to_string(),
            return_marker: BACK_TO_GODOC.to_string(),
            exempt_host_prefixes: vec!["api.".to_string()],
        }
    }
}

impl TryFrom<&RedirectConfig> for RedirectSettings {
    type Error = MapError;

    fn try_from(config: &RedirectConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            mapper: UrlMapper::new(&config.successor_host, config.attribution_source.clone())?,
            legacy_host: config.legacy_host.clone(),
            cookie_name: config.cookie_name.clone(),
            return_marker: config.return_marker.clone(),
            exempt_host_prefixes: config.exempt_host_prefixes.clone(),
        })
    }
}

/// Decides between redirecting to the successor site and serving locally.
pub struct RedirectHandler<F> {
    fallback: F,
    sink: Arc<dyn EventSink>,
    settings: RedirectSettings,
    classifier: RobotClassifier,
}

impl<F: RequestHandler> RedirectHandler<F> {
    pub fn new(fallback: F, sink: Arc<dyn EventSink>, settings: RedirectSettings) -> Self {
        Self {
            fallback,
            sink,
            settings,
            classifier: RobotClassifier,
        }
    }

    pub fn settings(&self) -> &RedirectSettings {
        &self.settings
    }

    /// Run the state machine for `req` without side effects.
    pub fn decide(&self, req: &LegacyRequest<'_>) -> Decision {
        let host = req.host();
        if self
            .settings
            .exempt_host_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && host.starts_with(prefix.as_str()))
        {
            return Decision::PassThrough {
                cookie: CookieAction::Keep,
            };
        }

        // Users coming back from the successor site must not bounce straight
        // back to it.
        if req.query_value("utm_source").as_deref() == Some(self.settings.return_marker.as_str()) {
            return Decision::PassThrough {
                cookie: CookieAction::Keep,
            };
        }

        let query = req.query_value(REDIRECT_PARAM);
        let cookie = req.cookie(&self.settings.cookie_name);
        let (state, source) = toggle::resolve(query.as_deref(), cookie);

        match state {
            ToggleState::On => {
                let cookie = if source == ToggleSource::Query {
                    CookieAction::Enable
                } else {
                    CookieAction::Keep
                };
                match req.parsed_url(&self.settings.legacy_host) {
                    Ok(legacy) => Decision::Redirect {
                        location: self.settings.mapper.map(&legacy),
                        cookie,
                    },
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            path = req.path(),
                            "Unmappable request URL, serving locally"
                        );
                        Decision::PassThrough { cookie }
                    }
                }
            }
            ToggleState::Off => Decision::PassThrough {
                cookie: CookieAction::Clear,
            },
            ToggleState::Unset => Decision::PassThrough {
                cookie: CookieAction::Keep,
            },
        }
    }

    /// Handle a legacy request, delegating to the fallback when not redirecting.
    ///
    /// Errors from the fallback are returned unchanged.
    pub async fn handle(
        &self,
        req: Request<AxumBody>,
    ) -> Result<Response<AxumBody>, HandlerError> {
        let (parts, body) = req.into_parts();
        let legacy = LegacyRequest::new(&parts.uri, &parts.headers);

        let event = new_gddo_event(
            &legacy,
            legacy.absolute_url(&self.settings.legacy_host),
            Duration::ZERO,
            self.classifier.classify(&parts.headers),
            &self.settings.mapper.successor_origin(),
        );
        let _event_guard = EventGuard::arm(self.sink.as_ref(), event);

        let decision = self.decide(&legacy);
        tracing::debug!(path = legacy.path(), ?decision, "Redirect decision");

        match decision {
            Decision::Redirect { location, cookie } => {
                let mut builder = Response::builder()
                    .status(StatusCode::FOUND)
                    .header(header::LOCATION, location.as_str());
                if let Some(value) = self.cookie_header(cookie) {
                    builder = builder.header(header::SET_COOKIE, value);
                }
                builder
                    .body(AxumBody::empty())
                    .map_err(|e| HandlerError::InternalError(e.to_string()))
            }
            Decision::PassThrough { cookie } => {
                let mut response = self
                    .fallback
                    .handle_request(Request::from_parts(parts, body))
                    .await?;
                if let Some(value) = self.cookie_header(cookie) {
                    response.headers_mut().append(header::SET_COOKIE, value);
                }
                Ok(response)
            }
        }
    }

    fn cookie_header(&self, action: CookieAction) -> Option<HeaderValue> {
        match action {
            CookieAction::Keep => None,
            CookieAction::Enable => toggle::enable_cookie(&self.settings.cookie_name),
            CookieAction::Clear => toggle::clear_cookie(&self.settings.cookie_name),
        }
    }
}

impl<F: RequestHandler> RequestHandler for RedirectHandler<F> {
    async fn handle_request(
        &self,
        req: Request<AxumBody>,
    ) -> Result<Response<AxumBody>, HandlerError> {
        self.handle(req).await
    }
}
