//! Domain/version/endpoint routing subsystem.
//!
//! # Data Flow
//! ```text
//! Rule Loading (at startup):
//!     routing-rules YAML
//!     → rules.rs (deserialize, validate every rule, fail fast)
//!     → table.rs (compile targets, freeze as immutable RoutingTable)
//!
//! Request Resolution:
//!     request path + JSON body
//!     → extract context.domain / context.version from the body
//!     → scan rules in file order, first (domain, version) rule that
//!       also lists the endpoint wins
//!     → Return: Route (url or msgq target) or a distinct error
//! ```
//!
//! # Design Decisions
//! - Rules are loaded once and read-only thereafter; lookups need no locks
//! - Deterministic: same (domain, version, endpoint) always resolves the
//!   same way
//! - First match wins; endpoint sets for a given (domain, version) are
//!   disjoint by convention
//! - "Endpoint not supported" is a distinct error from "no matching rule"

pub mod rules;
pub mod table;

pub use rules::{RoutingRule, RoutingType, RuleSet};
pub use table::{Route, Router, RoutingTable};

use thiserror::Error;

/// Errors produced while loading rules or resolving a route.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("error reading routing config at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("error parsing routing config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid routing rule #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },

    #[error("error parsing request body: {0}")]
    MalformedBody(serde_json::Error),

    #[error("no routing rules found for domain {domain} and version {version}")]
    NoMatchingRule { domain: String, version: String },

    #[error("endpoint '{endpoint}' is not supported for domain {domain} and version {version}")]
    UnsupportedEndpoint {
        endpoint: String,
        domain: String,
        version: String,
    },
}
