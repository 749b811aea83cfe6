//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that configured steps have the config they depend on
//! - Validate value ranges
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function over the parsed config
//! - Runs before the config is accepted into the system

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// One semantic problem found in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("subscriber_id is required when step '{0}' is configured")]
    SubscriberIdRequired(String),

    #[error("routing.rules_path is required when step 'addRoute' is configured")]
    RulesPathRequired,

    #[error("signing.ttl_secs must be greater than zero")]
    ZeroSigningTtl,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
}

/// Validate the full configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }
    for step in ["sign", "validateSign"] {
        if config.steps.iter().any(|s| s == step) && config.subscriber_id.is_empty() {
            errors.push(ValidationError::SubscriberIdRequired(step.to_string()));
        }
    }
    if config.steps.iter().any(|s| s == "addRoute") && config.routing.rules_path.is_none() {
        errors.push(ValidationError::RulesPathRequired);
    }
    if config.signing.ttl_secs == 0 {
        errors.push(ValidationError::ZeroSigningTtl);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
