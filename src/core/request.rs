//! Read-only view over the parts of an inbound request the redirect logic uses.

use http::{HeaderMap, Uri, header, uri::Authority};
use url::Url;

use super::toggle::cookie_value;

/// Borrowed view of a legacy-host request.
///
/// Servers usually see origin-form URIs (`/net/http?imports`), so the host
/// comes from the URI authority when present and from the `Host` header
/// otherwise.
#[derive(Debug, Clone, Copy)]
pub struct LegacyRequest<'a> {
    uri: &'a Uri,
    headers: &'a HeaderMap,
}

impl<'a> LegacyRequest<'a> {
    pub fn new(uri: &'a Uri, headers: &'a HeaderMap) -> Self {
        Self { uri, headers }
    }

    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }

    /// Authority as sent by the client, port included.
    fn authority(&self) -> Option<&'a str> {
        self.uri.authority().map(Authority::as_str).or_else(|| {
            self.headers
                .get(header::HOST)
                .and_then(|v| v.to_str().ok())
                .filter(|h| !h.is_empty())
        })
    }

    /// Host name without port.
    pub fn host(&self) -> String {
        match self.authority() {
            Some(authority) => authority
                .parse::<Authority>()
                .map(|a| a.host().to_string())
                .unwrap_or_else(|_| authority.to_string()),
            None => String::new(),
        }
    }

    /// Request path, query excluded.
    pub fn path(&self) -> &'a str {
        self.uri.path()
    }

    /// First value of a query parameter, percent-decoded.
    pub fn query_value(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn cookie(&self, name: &str) -> Option<&'a str> {
        cookie_value(self.headers, name)
    }

    pub fn user_agent(&self) -> &'a str {
        self.headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Full URL of the request as the client addressed it. `default_host` is
    /// used when neither the URI nor the `Host` header name one.
    pub fn absolute_url(&self, default_host: &str) -> String {
        if self.uri.scheme().is_some() {
            return self.uri.to_string();
        }
        let scheme = match self
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
        {
            Some(proto) if proto.eq_ignore_ascii_case("https") => "https",
            _ => "http",
        };
        let authority = self.authority().unwrap_or(default_host);
        let path_and_query = self.uri.path_and_query().map_or("/", |pq| pq.as_str());
        format!("{scheme}://{authority}{path_and_query}")
    }

    /// Parsed form of [`absolute_url`](Self::absolute_url).
    pub fn parsed_url(&self, default_host: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.absolute_url(default_host))
    }
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn test_absolute_uri() {
        let uri: Uri = "https://godoc.org:443/net/http?imports".parse().unwrap();
        let headers = HeaderMap::new();
        let req = LegacyRequest::new(&uri, &headers);

        assert_eq!(req.host(), "godoc.org");
        assert_eq!(req.path(), "/net/http");
        assert_eq!(
            req.absolute_url("unused"),
            "https://godoc.org:443/net/http?imports"
        );
    }

    #[test]
    fn test_origin_form_uses_host_header() {
        let uri: Uri = "/-/about?redirect=on".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("godoc.org:8080"));
        let req = LegacyRequest::new(&uri, &headers);

        assert_eq!(req.host(), "godoc.org");
        assert_eq!(req.query_value("redirect").as_deref(), Some("on"));
        assert_eq!(
            req.absolute_url("unused"),
            "http://godoc.org:8080/-/about?redirect=on"
        );
    }

    #[test]
    fn test_forwarded_proto_and_default_host() {
        let uri: Uri = "/net/http".parse().unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-proto", HeaderValue::from_static("https"));
        let req = LegacyRequest::new(&uri, &headers);

        assert_eq!(req.host(), "");
        assert_eq!(req.absolute_url("godoc.org"), "https://godoc.org/net/http");
        assert_eq!(
            req.parsed_url("godoc.org").unwrap().as_str(),
            "https://godoc.org/net/http"
        );
    }

    #[test]
    fn test_query_value_decodes() {
        let uri: Uri = "/?q=http%20client&q=second".parse().unwrap();
        let headers = HeaderMap::new();
        let req = LegacyRequest::new(&uri, &headers);
        assert_eq!(req.query_value("q").as_deref(), Some("http client"));
        assert_eq!(req.query_value("missing"), None);
    }
}
