//! Per-client redirect preference.
//!
//! The preference lives entirely on the client: a `redirect=on|off` query
//! parameter sets it, the `pkggodev-redirect` cookie remembers it. Nothing is
//! stored server side, so the state is recomputed from each request.

use http::{HeaderMap, HeaderValue, header};

/// Query parameter that flips the preference.
pub const REDIRECT_PARAM: &str = "redirect";
/// Cookie remembering the preference.
pub const REDIRECT_COOKIE: &str = "pkggodev-redirect";

const ON: &str = "on";
const OFF: &str = "off";

/// Redirect preference derived from a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToggleState {
    #[default]
    Unset,
    On,
    Off,
}

/// Where a [`ToggleState`] was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleSource {
    Query,
    Cookie,
    None,
}

impl ToggleState {
    /// Parse a query or cookie value. Anything but `on`/`off` is `Unset`.
    pub fn parse(value: &str) -> Self {
        match value {
            ON => ToggleState::On,
            OFF => ToggleState::Off,
            _ => ToggleState::Unset,
        }
    }
}

/// Resolve the preference: a recognized query value wins over a recognized
/// cookie value; otherwise the preference is unset.
pub fn toggle_state(query: Option<&str>, cookie: Option<&str>) -> ToggleState {
    resolve(query, cookie).0
}

/// Like [`toggle_state`] but also reports which input decided it.
pub fn resolve(query: Option<&str>, cookie: Option<&str>) -> (ToggleState, ToggleSource) {
    match query.map(ToggleState::parse) {
        Some(state @ (ToggleState::On | ToggleState::Off)) => (state, ToggleSource::Query),
        _ => match cookie.map(ToggleState::parse) {
            Some(state @ (ToggleState::On | ToggleState::Off)) => (state, ToggleSource::Cookie),
            _ => (ToggleState::Unset, ToggleSource::None),
        },
    }
}

/// Value of the first cookie called `name` across all `Cookie` headers.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|line| line.split(';'))
        .find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key.trim() == name).then(|| value.trim().trim_matches('"'))
        })
}

/// `Set-Cookie` value persisting an opt-in for the whole site.
pub fn enable_cookie(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}={ON}; Path=/")).ok()
}

/// `Set-Cookie` value expiring the preference immediately.
pub fn clear_cookie(name: &str) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{name}=; Path=/; Max-Age=0")).ok()
}
