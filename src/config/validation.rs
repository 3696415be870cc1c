use std::net::SocketAddr;

use url::Url;

use crate::{
    config::models::{FallbackConfig, RedirectConfig, ServerConfig, TelemetryConfig},
    core::mapper::UrlMapper,
};

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validation error types
#[derive(Debug, thiserror::Error, Clone)]
pub enum ValidationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid field '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Invalid listen address '{address}': {reason}")]
    InvalidListenAddress { address: String, reason: String },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },
}

/// Server configuration validator
pub struct ServerConfigValidator;

impl ServerConfigValidator {
    /// Validate the entire server configuration, reporting every problem found
    pub fn validate(config: &ServerConfig) -> ValidationResult<()> {
        let mut errors = Vec::new();

        if let Err(e) = Self::validate_listen_address(&config.listen_addr) {
            errors.push(e);
        }
        errors.extend(Self::validate_redirect(&config.redirect));
        errors.extend(Self::validate_fallback(&config.fallback));
        errors.extend(Self::validate_telemetry(&config.telemetry));

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError::ValidationFailed {
                message: Self::format_multiple_errors(errors),
            })
        }
    }

    /// Validate listen address format
    fn validate_listen_address(address: &str) -> ValidationResult<()> {
        if address.parse::<SocketAddr>().is_err() {
            return Err(ValidationError::InvalidListenAddress {
                address: address.to_string(),
                reason: "Must be in format 'IP:PORT' (e.g., '127.0.0.1:3000' or '0.0.0.0:8080')"
                    .to_string(),
            });
        }
        Ok(())
    }

    fn validate_redirect(config: &RedirectConfig) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (field, value) in [
            ("redirect.legacy_host", &config.legacy_host),
            ("redirect.cookie_name", &config.cookie_name),
            ("redirect.return_marker", &config.return_marker),
            ("redirect.attribution_source", &config.attribution_source),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError::MissingField {
                    field: field.to_string(),
                });
            }
        }

        if config
            .cookie_name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | ',' | '='))
        {
            errors.push(ValidationError::InvalidField {
                field: "redirect.cookie_name".to_string(),
                message: format!(
                    "Cookie name '{}' contains whitespace, ';', ',' or '='",
                    config.cookie_name
                ),
            });
        }

        if let Err(e) = UrlMapper::new(&config.successor_host, config.attribution_source.clone())
        {
            errors.push(ValidationError::InvalidField {
                field: "redirect.successor_host".to_string(),
                message: e.to_string(),
            });
        }

        if config.exempt_host_prefixes.iter().any(|p| p.is_empty()) {
            errors.push(ValidationError::InvalidField {
                field: "redirect.exempt_host_prefixes".to_string(),
                message: "Empty prefix would exempt every host".to_string(),
            });
        }

        errors
    }

    fn validate_fallback(config: &FallbackConfig) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        match config {
            FallbackConfig::Static { content_type, .. } => {
                if content_type.parse::<axum::http::HeaderValue>().is_err() {
                    errors.push(ValidationError::InvalidField {
                        field: "fallback.content_type".to_string(),
                        message: format!("Not a valid header value: '{content_type}'"),
                    });
                }
            }
            FallbackConfig::Proxy {
                target,
                timeout_secs,
            } => {
                if let Err(e) = Self::validate_url(target, "fallback.target") {
                    errors.push(e);
                }
                if *timeout_secs == 0 {
                    errors.push(ValidationError::InvalidField {
                        field: "fallback.timeout_secs".to_string(),
                        message: "Timeout must be greater than 0".to_string(),
                    });
                }
            }
        }
        errors
    }

    fn validate_telemetry(config: &TelemetryConfig) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if let TelemetryConfig::Http {
            endpoint,
            buffer_size,
            batch_size,
            flush_interval_ms,
        } = config
        {
            if let Err(e) = Self::validate_url(endpoint, "telemetry.endpoint") {
                errors.push(e);
            }
            for (field, value) in [
                ("telemetry.buffer_size", *buffer_size as u64),
                ("telemetry.batch_size", *batch_size as u64),
                ("telemetry.flush_interval_ms", *flush_interval_ms),
            ] {
                if value == 0 {
                    errors.push(ValidationError::InvalidField {
                        field: field.to_string(),
                        message: "Must be greater than 0".to_string(),
                    });
                }
            }
        }
        errors
    }

    /// Validate an http(s) URL
    fn validate_url(url_str: &str, context: &str) -> ValidationResult<()> {
        if url_str.is_empty() {
            return Err(ValidationError::MissingField {
                field: context.to_string(),
            });
        }

        let url = Url::parse(url_str).map_err(|e| ValidationError::InvalidField {
            field: context.to_string(),
            message: format!("Invalid URL '{url_str}': {e}"),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidField {
                field: context.to_string(),
                message: format!("URL must use http or https scheme, got '{}'", url.scheme()),
            });
        }

        if url.host_str().is_none() {
            return Err(ValidationError::InvalidField {
                field: context.to_string(),
                message: format!("URL '{url_str}' has no host"),
            });
        }

        Ok(())
    }

    /// Format multiple validation errors into a single message
    fn format_multiple_errors(errors: Vec<ValidationError>) -> String {
        if errors.is_empty() {
            return "No errors".to_string();
        }

        if errors.len() == 1 {
            return errors[0].to_string();
        }

        let mut message = format!("Found {} validation errors:\n", errors.len());
        for (i, error) in errors.iter().enumerate() {
            message.push_str(&format!("  {}. {}\n", i + 1, error));
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(config: &ServerConfig) -> String {
        match ServerConfigValidator::validate(config) {
            Err(ValidationError::ValidationFailed { message }) => message,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(ServerConfigValidator::validate(&ServerConfig::default()).is_ok());
    }

    #[test]
    fn validate_accepts_proxy_and_http_telemetry() {
        let config = ServerConfig::builder()
            .proxy_fallback("http://legacy:8080")
            .telemetry(TelemetryConfig::Http {
                endpoint: "https://collector.example.com/events".to_string(),
                buffer_size: 16,
                batch_size: 4,
                flush_interval_ms: 250,
            })
            .build();
        assert!(ServerConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn validate_rejects_bad_listen_address() {
        let config = ServerConfig::builder().listen_addr("localhost").build();
        assert!(message(&config).contains("Invalid listen address 'localhost'"));
    }

    #[test]
    fn validate_rejects_successor_with_scheme() {
        let mut config = ServerConfig::default();
        config.redirect.successor_host = "https://pkg.go.dev".to_string();
        assert!(message(&config).contains("redirect.successor_host"));
    }

    #[test]
    fn validate_rejects_bad_cookie_name() {
        let mut config = ServerConfig::default();
        config.redirect.cookie_name = "pkg redirect".to_string();
        assert!(message(&config).contains("redirect.cookie_name"));

        config.redirect.cookie_name = String::new();
        assert!(message(&config).contains("Missing required field: redirect.cookie_name"));
    }

    #[test]
    fn validate_rejects_empty_exempt_prefix() {
        let mut config = ServerConfig::default();
        config.redirect.exempt_host_prefixes.push(String::new());
        assert!(message(&config).contains("redirect.exempt_host_prefixes"));
    }

    #[test]
    fn validate_rejects_non_http_proxy_target() {
        let config = ServerConfig::builder()
            .proxy_fallback("ftp://legacy")
            .build();
        assert!(message(&config).contains("http or https"));
    }

    #[test]
    fn validate_collects_every_error() {
        let config = ServerConfig::builder()
            .listen_addr("nope")
            .proxy_fallback("")
            .telemetry(TelemetryConfig::Http {
                endpoint: "http://collector".to_string(),
                buffer_size: 0,
                batch_size: 0,
                flush_interval_ms: 0,
            })
            .build();
        let msg = message(&config);
        assert!(msg.starts_with("Found 5 validation errors"), "{msg}");
        assert!(msg.contains("fallback.target"));
        assert!(msg.contains("telemetry.batch_size"));
    }
}
