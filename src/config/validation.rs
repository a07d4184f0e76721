//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check document roots and MIME mappings are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;
use crate::routing::RootLocator;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: String,
    pub reason: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", config.observability.metrics_address),
        ));
    }

    let extension = &config.components.extension;
    if extension.is_empty() || extension.contains('.') || extension.contains('/') {
        errors.push(ValidationError::new(
            "components.extension",
            format!("{extension:?} must be a bare extension without dots"),
        ));
    }
    if !is_mime_type(&config.components.mime_type) {
        errors.push(ValidationError::new(
            "components.mime_type",
            format!("{:?} is not a MIME type", config.components.mime_type),
        ));
    }
    for (ext, mime) in &config.mime {
        if !is_mime_type(mime) {
            errors.push(ValidationError::new(
                format!("mime.{ext}"),
                format!("{mime:?} is not a MIME type"),
            ));
        }
    }

    if config.components.pending_timeout_secs == 0 {
        errors.push(ValidationError::new("components.pending_timeout_secs", "must be > 0"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be > 0"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be > 0"));
    }

    for (host, value) in &config.contents {
        if let Err(e) = RootLocator::parse(host, value, &config.base_dir) {
            errors.push(ValidationError::new(format!("contents.{host}"), e.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_mime_type(value: &str) -> bool {
    match value.split_once('/') {
        Some((kind, subtype)) => {
            !kind.is_empty() && !subtype.is_empty() && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&ServerConfig::default()), Ok(()));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ServerConfig::default();
        config.listener.bind_address = "localhost".into();
        config.components.extension = ".cmp".into();
        config.components.mime_type = "component".into();
        config.mime.insert("md".into(), "text markdown".into());
        config.timeouts.request_secs = 0;
        config.contents.insert("*".into(), "".into());
        config.contents.insert("api".into(), "http://".into());

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "listener.bind_address",
                "components.extension",
                "components.mime_type",
                "mime.md",
                "timeouts.request_secs",
                "contents.*",
                "contents.api",
            ]
        );
    }
}
