//! godoc.org → pkg.go.dev URL translation.
//!
//! Mapping is a pure function of the legacy URL: no lookups, no I/O. The
//! rules are checked in order and the first match wins; any path that is not
//! one of the fixed special cases is treated as an import path.

use thiserror::Error;
use url::Url;

/// Default successor documentation host.
pub const PKG_GO_DEV_HOST: &str = "pkg.go.dev";
/// Default value of the `utm_source` attribution parameter.
pub const DEFAULT_ATTRIBUTION_SOURCE: &str = "godoc";

const ATTRIBUTION_PARAM: &str = "utm_source";

/// Error returned when a legacy URL cannot be mapped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Translates legacy URLs to the successor host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMapper {
    origin: Url,
    attribution_source: String,
}

impl Default for UrlMapper {
    fn default() -> Self {
        Self::new(PKG_GO_DEV_HOST, DEFAULT_ATTRIBUTION_SOURCE)
            .expect("default successor host is a valid host")
    }
}

impl UrlMapper {
    /// Build a mapper targeting `https://<successor_host>`.
    pub fn new(
        successor_host: &str,
        attribution_source: impl Into<String>,
    ) -> Result<Self, MapError> {
        let origin_str = format!("https://{successor_host}/");
        let origin = Url::parse(&origin_str).map_err(|e| MapError::InvalidUrl {
            url: origin_str.clone(),
            reason: e.to_string(),
        })?;
        if origin.host_str() != Some(successor_host) || origin.port().is_some() {
            return Err(MapError::InvalidUrl {
                url: origin_str,
                reason: "successor host must be a bare host name".to_string(),
            });
        }
        Ok(Self {
            origin,
            attribution_source: attribution_source.into(),
        })
    }

    pub fn successor_host(&self) -> &str {
        self.origin.host_str().unwrap_or(PKG_GO_DEV_HOST)
    }

    /// Origin of the successor site, e.g. `https://pkg.go.dev`.
    pub fn successor_origin(&self) -> String {
        format!("https://{}", self.successor_host())
    }

    /// Map a legacy URL onto the successor host.
    ///
    /// The result always carries the attribution parameter exactly once, as
    /// the last query pair. Running the mapper on its own output is not
    /// meaningful; it is meant to run once per legacy request.
    pub fn map(&self, legacy: &Url) -> Url {
        let (path, params) = translate(legacy);

        let mut mapped = self.origin.clone();
        mapped.set_path(&path);
        {
            let mut query = mapped.query_pairs_mut();
            for (key, value) in &params {
                query.append_pair(key, value);
            }
            query.append_pair(ATTRIBUTION_PARAM, &self.attribution_source);
        }
        mapped
    }

    /// Parse `legacy` and map it. Unparseable input is rejected outright.
    pub fn map_str(&self, legacy: &str) -> Result<Url, MapError> {
        let parsed = Url::parse(legacy).map_err(|e| MapError::InvalidUrl {
            url: legacy.to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.map(&parsed))
    }
}

/// Successor path plus the rule-specific query pairs (attribution excluded).
fn translate(legacy: &Url) -> (String, Vec<(&'static str, String)>) {
    let path = legacy.path();

    match path {
        "/-/about" => ("/about".to_string(), Vec::new()),
        "/-/go" => ("/std".to_string(), vec![("tab", "packages".to_string())]),
        "/" | "" => match query_value(legacy, "q").filter(|q| !q.is_empty()) {
            Some(q) => ("/search".to_string(), vec![("q", q)]),
            None => ("/".to_string(), Vec::new()),
        },
        import_path => {
            let tab = if has_param(legacy, "importers") {
                "importedby"
            } else if has_param(legacy, "imports") {
                "imports"
            } else {
                "doc"
            };
            (import_path.to_string(), vec![("tab", tab.to_string())])
        }
    }
}

/// First value of `key` in the query string.
fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

/// Whether `key` appears in the query string, with or without a value.
fn has_param(url: &Url, key: &str) -> bool {
    url.query_pairs().any(|(k, _)| k == key)
}

/// Map with the default successor host and attribution.
pub fn map_url(legacy: &Url) -> Url {
    UrlMapper::default().map(legacy)
}

/// Parse and map with the default successor host and attribution.
pub fn map_url_str(legacy: &str) -> Result<Url, MapError> {
    UrlMapper::default().map_str(legacy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapped(from: &str) -> String {
        map_url_str(from).expect("valid url").to_string()
    }

    #[test]
    fn test_about_page() {
        assert_eq!(
            mapped("https://godoc.org/-/about"),
            "https://pkg.go.dev/about?utm_source=godoc"
        );
    }

    #[test]
    fn test_standard_library_index() {
        assert_eq!(
            mapped("https://godoc.org/-/go"),
            "https://pkg.go.dev/std?tab=packages&utm_source=godoc"
        );
    }

    #[test]
    fn test_search_keeps_query() {
        assert_eq!(
            mapped("https://godoc.org/?q=foo"),
            "https://pkg.go.dev/search?q=foo&utm_source=godoc"
        );
    }

    #[test]
    fn test_search_term_is_reencoded() {
        assert_eq!(
            mapped("https://godoc.org/?q=http%20client"),
            "https://pkg.go.dev/search?q=http+client&utm_source=godoc"
        );
    }

    #[test]
    fn test_root_without_search_term() {
        assert_eq!(mapped("https://godoc.org/"), "https://pkg.go.dev/?utm_source=godoc");
        assert_eq!(mapped("https://godoc.org/?q="), "https://pkg.go.dev/?utm_source=godoc");
    }

    #[test]
    fn test_import_path_defaults_to_doc_tab() {
        assert_eq!(
            mapped("https://godoc.org/cloud.google.com/go/storage"),
            "https://pkg.go.dev/cloud.google.com/go/storage?tab=doc&utm_source=godoc"
        );
    }

    #[test]
    fn test_imports_tab() {
        assert_eq!(
            mapped("https://godoc.org/cloud.google.com/go/storage?imports"),
            "https://pkg.go.dev/cloud.google.com/go/storage?tab=imports&utm_source=godoc"
        );
    }

    #[test]
    fn test_importers_tab() {
        assert_eq!(
            mapped("https://godoc.org/cloud.google.com/go/storage?importers"),
            "https://pkg.go.dev/cloud.google.com/go/storage?tab=importedby&utm_source=godoc"
        );
    }

    #[test]
    fn test_importers_wins_over_imports() {
        assert_eq!(
            mapped("https://godoc.org/net/http?imports&importers"),
            "https://pkg.go.dev/net/http?tab=importedby&utm_source=godoc"
        );
    }

    #[test]
    fn test_unrelated_params_are_dropped() {
        assert_eq!(
            mapped("http://godoc.org/net/http?redirect=on&utm_source=twitter"),
            "https://pkg.go.dev/net/http?tab=doc&utm_source=godoc"
        );
    }

    #[test]
    fn test_subdomain_maps_to_successor_host() {
        assert_eq!(
            mapped("https://talks.godoc.org/github.com/golang/talks"),
            "https://pkg.go.dev/github.com/golang/talks?tab=doc&utm_source=godoc"
        );
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let legacy = Url::parse("https://godoc.org/golang.org/x/net/html?imports").unwrap();
        assert_eq!(map_url(&legacy).as_str(), map_url(&legacy).as_str());
    }

    #[test]
    fn test_custom_successor() {
        let mapper = UrlMapper::new("docs.example.dev", "legacy").unwrap();
        let legacy = Url::parse("http://godoc.org/-/about").unwrap();
        assert_eq!(
            mapper.map(&legacy).as_str(),
            "https://docs.example.dev/about?utm_source=legacy"
        );
        assert_eq!(mapper.successor_origin(), "https://docs.example.dev");
    }

    #[test]
    fn test_successor_host_must_be_bare() {
        assert!(UrlMapper::new("pkg.go.dev/path", "godoc").is_err());
        assert!(UrlMapper::new("pkg.go.dev:8443", "godoc").is_err());
        assert!(UrlMapper::new("", "godoc").is_err());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = map_url_str("not a url").unwrap_err();
        assert!(matches!(err, MapError::InvalidUrl { .. }));
    }
}
