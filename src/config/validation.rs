//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Returns all validation errors, not just the first.

use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Config field path, e.g. "upstream.base_url".
    pub field: String,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn err(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a configuration, returning every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(err(
            "listener.bind_address",
            format!("not a valid socket address: {:?}", config.listener.bind_address),
        ));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(err(
                    "upstream.base_url",
                    format!("scheme must be http or https, got {:?}", url.scheme()),
                ));
            }
            if url.host_str().map_or(true, str::is_empty) {
                errors.push(err("upstream.base_url", "host must be non-empty"));
            }
        }
        Err(e) => {
            errors.push(err("upstream.base_url", format!("not an absolute URL: {e}")));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(err("timeouts.connect_secs", "must be non-zero"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(err("timeouts.upstream_secs", "must be non-zero"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(err("timeouts.request_secs", "must be non-zero"));
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(err("limits.max_body_bytes", "must be non-zero"));
    }
    if config.limits.max_download_bytes == 0 {
        errors.push(err("limits.max_download_bytes", "must be non-zero"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(err(
            "observability.metrics_address",
            format!("not a valid socket address: {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn rejects_relative_base_url() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "/patients".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "upstream.base_url"));
    }

    #[test]
    fn rejects_non_http_scheme() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "ftp://backend:21".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = GatewayConfig::default();
        config.upstream.base_url = "nonsense".to_string();
        config.timeouts.connect_secs = 0;
        config.timeouts.upstream_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 3);
    }
}
