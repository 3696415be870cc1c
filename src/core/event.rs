//! Telemetry events describing each redirect decision.
//!
//! An [`EventGuard`] is armed as soon as a request enters the redirect
//! handler and emits on `Drop`, so every exit path (redirect, pass-through,
//! fallback error, early return) produces exactly one event.

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use http::HeaderMap;
use serde::{Serialize, Serializer};

use super::request::LegacyRequest;
use crate::ports::event_sink::EventSink;

/// One request's worth of redirect telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GddoEvent {
    /// Request host without port
    pub host: String,
    /// Request path, query excluded
    pub path: String,
    /// Full URL as requested
    pub url: String,
    pub header: BTreeMap<String, Vec<String>>,
    #[serde(rename = "latency_ms", serialize_with = "serialize_millis")]
    pub latency: Duration,
    pub is_robot: bool,
    /// Origin of the successor site, e.g. `https://pkg.go.dev`
    pub redirect_host: String,
}

fn serialize_millis<S: Serializer>(latency: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(latency.as_micros() as f64 / 1000.0)
}

/// Build the event for `req`.
pub fn new_gddo_event(
    req: &LegacyRequest<'_>,
    url: String,
    latency: Duration,
    is_robot: bool,
    redirect_host: &str,
) -> GddoEvent {
    GddoEvent {
        host: req.host(),
        path: req.path().to_string(),
        url,
        header: header_map(req.headers()),
        latency,
        is_robot,
        redirect_host: redirect_host.to_string(),
    }
}

/// Lower-cased header names to their values in arrival order.
fn header_map(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
    let mut map: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Emits its event to the sink when dropped, with the latency measured from
/// [`EventGuard::arm`].
pub struct EventGuard<'s> {
    sink: &'s dyn EventSink,
    event: Option<GddoEvent>,
    start: Instant,
}

impl<'s> EventGuard<'s> {
    /// Start timing. The event's latency field is overwritten on drop.
    pub fn arm(sink: &'s dyn EventSink, event: GddoEvent) -> Self {
        Self {
            sink,
            event: Some(event),
            start: Instant::now(),
        }
    }
}

impl Drop for EventGuard<'_> {
    fn drop(&mut self) {
        if let Some(mut event) = self.event.take() {
            event.latency = self.start.elapsed();
            self.sink.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::{HeaderValue, Uri, header};

    use super::*;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<GddoEvent>>);

    impl EventSink for Recorder {
        fn emit(&self, event: GddoEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn event_for(url: &str) -> GddoEvent {
        let uri: Uri = url.parse().unwrap();
        let headers = HeaderMap::new();
        let req = LegacyRequest::new(&uri, &headers);
        new_gddo_event(
            &req,
            url.to_string(),
            Duration::from_millis(100),
            true,
            "https://pkg.go.dev",
        )
    }

    #[test]
    fn test_event_host_and_path() {
        let cases = [
            ("https://godoc.org", "godoc.org", "/"),
            ("https://godoc.org/-/about", "godoc.org", "/-/about"),
            ("https://godoc.org/?q=test", "godoc.org", "/"),
            ("https://godoc.org/net/http", "godoc.org", "/net/http"),
            (
                "https://api.godoc.org/imports/net/http",
                "api.godoc.org",
                "/imports/net/http",
            ),
        ];
        for (url, host, path) in cases {
            let want = GddoEvent {
                host: host.to_string(),
                path: path.to_string(),
                url: url.to_string(),
                header: BTreeMap::new(),
                latency: Duration::from_millis(100),
                is_robot: true,
                redirect_host: "https://pkg.go.dev".to_string(),
            };
            assert_eq!(event_for(url), want, "{url}");
        }
    }

    #[test]
    fn test_headers_keep_every_value() {
        let uri: Uri = "/net/http".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("godoc.org"));
        headers.append(header::ACCEPT, HeaderValue::from_static("text/html"));
        headers.append(header::ACCEPT, HeaderValue::from_static("*/*"));
        let req = LegacyRequest::new(&uri, &headers);

        let event = new_gddo_event(&req, String::new(), Duration::ZERO, false, "");
        assert_eq!(event.header["accept"], vec!["text/html", "*/*"]);
        assert_eq!(event.header["host"], vec!["godoc.org"]);
    }

    #[test]
    fn test_latency_serialized_as_millis() {
        let event = event_for("https://godoc.org/net/http");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["latency_ms"], 100.0);
        assert_eq!(json["host"], "godoc.org");
        assert_eq!(json["is_robot"], true);
    }

    #[test]
    fn test_guard_emits_once_on_drop() {
        let recorder = Recorder::default();
        {
            let _guard = EventGuard::arm(&recorder, event_for("https://godoc.org/"));
            assert!(recorder.0.lock().unwrap().is_empty());
        }
        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(events[0].latency < Duration::from_millis(100));
    }
}
