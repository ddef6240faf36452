//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, thresholds > 0)
//! - Check addresses parse and attach endpoints are well-formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: HostConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::HostConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `health_check.interval_secs`.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn error(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &HostConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.status.enabled && config.status.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(error(
            "status.bind_address",
            format!("'{}' is not a valid socket address", config.status.bind_address),
        ));
    }

    if config.health_check.interval_secs == 0 {
        errors.push(error("health_check.interval_secs", "must be greater than 0"));
    }
    if config.health_check.timeout_secs == 0 {
        errors.push(error("health_check.timeout_secs", "must be greater than 0"));
    }
    if config.health_check.unhealthy_threshold == 0 {
        errors.push(error("health_check.unhealthy_threshold", "must be greater than 0"));
    }
    if config.health_check.healthy_threshold == 0 {
        errors.push(error("health_check.healthy_threshold", "must be greater than 0"));
    }

    if config.timeouts.startup_secs == 0 {
        errors.push(error("timeouts.startup_secs", "must be greater than 0"));
    }

    if config.ports.base == 0 {
        errors.push(error("ports.base", "must be greater than 0"));
    }

    if config.restart.base_delay_ms > config.restart.max_delay_ms {
        errors.push(error(
            "restart.base_delay_ms",
            "must not exceed restart.max_delay_ms",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(error(
            "observability.metrics_address",
            format!(
                "'{}' is not a valid socket address",
                config.observability.metrics_address
            ),
        ));
    }

    for (name, overrides) in &config.resources {
        if name.is_empty() {
            errors.push(error("resources", "resource override key must not be empty"));
        }
        if let Some(attach) = &overrides.attach {
            if attach.parse::<SocketAddr>().is_err() {
                errors.push(error(
                    &format!("resources.{}.attach", name),
                    format!("'{}' is not a valid socket address", attach),
                ));
            }
            if overrides.command.is_some() {
                errors.push(error(
                    &format!("resources.{}", name),
                    "attach and command are mutually exclusive",
                ));
            }
        }
        if let Some(command) = &overrides.command {
            if command.is_empty() {
                errors.push(error(
                    &format!("resources.{}.command", name),
                    "must not be empty",
                ));
            }
        }
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
    use crate::config::schema::ResourceOverride;

    #[test]
    fn test_default_config_valid() {
        assert!(validate_config(&HostConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = HostConfig::default();
        config.health_check.interval_secs = 0;
        config.health_check.timeout_secs = 0;
        config.ports.base = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_attach_must_parse() {
        let mut config = HostConfig::default();
        config.resources.insert(
            "cache".to_string(),
            ResourceOverride {
                attach: Some("not-an-address".to_string()),
                ..Default::default()
            },
        );

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "resources.cache.attach");
    }

    #[test]
    fn test_attach_excludes_command() {
        let mut config = HostConfig::default();
        config.resources.insert(
            "cache".to_string(),
            ResourceOverride {
                attach: Some("127.0.0.1:6379".to_string()),
                command: Some("redis-server".to_string()),
                ..Default::default()
            },
        );

        assert!(validate_config(&config).is_err());
    }
}
