//! Route lookup over a loaded rule set.
//!
//! # Responsibilities
//! - Compile validated rules into an immutable table at startup
//! - Resolve (domain, version, endpoint) to a dispatch target per request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Rules are scanned in file order; the first rule matching the body's
//!   (domain, version) that also lists the request endpoint wins
//! - Endpoint comparison uses the last path segment, case-insensitive
//! - A (domain, version) hit with no endpoint hit anywhere is the distinct
//!   "endpoint not supported" error, not a generic not-found

use std::path::Path;

use serde::Deserialize;

use crate::routing::rules::{RoutingRule, RoutingType, RuleSet};
use crate::routing::RoutingError;

/// The resolved dispatch target for a message. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Reverse-proxy to this URL.
    Url(url::Url),
    /// Publish to this broker topic.
    Msgq(String),
}

/// Resolves an inbound message to a dispatch target.
///
/// The seam the routing step depends on; the production implementation is
/// [`RoutingTable`], tests substitute their own.
pub trait Router: Send + Sync {
    fn route(&self, request_path: &str, body: &[u8]) -> Result<Route, RoutingError>;
}

struct CompiledRule {
    domain: String,
    version: String,
    // lowercased at load time for case-insensitive endpoint matching
    endpoints: Vec<String>,
    route: Route,
}

/// One-time-loaded routing table; stateless lookups thereafter.
pub struct RoutingTable {
    rules: Vec<CompiledRule>,
}

#[derive(Deserialize, Default)]
struct MessageContext {
    #[serde(default)]
    domain: String,
    #[serde(default)]
    version: String,
}

#[derive(Deserialize, Default)]
struct MessageBody {
    #[serde(default)]
    context: MessageContext,
}

impl RoutingTable {
    /// Loads and compiles the rule file. Any invalid rule fails the whole
    /// load.
    pub fn load(path: &Path) -> Result<Self, RoutingError> {
        let contents = std::fs::read_to_string(path).map_err(|source| RoutingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&contents)
    }

    /// Builds a table from YAML contents.
    pub fn from_yaml(contents: &str) -> Result<Self, RoutingError> {
        Self::from_rules(RuleSet::from_yaml(contents)?.routing_rules)
    }

    /// Builds a table from already-parsed rules, revalidating targets.
    pub fn from_rules(rules: Vec<RoutingRule>) -> Result<Self, RoutingError> {
        let mut compiled = Vec::with_capacity(rules.len());
        for (index, rule) in rules.into_iter().enumerate() {
            let route = match rule.routing_type {
                RoutingType::Url => {
                    let raw = rule.target.url.as_deref().unwrap_or_default();
                    let parsed =
                        url::Url::parse(raw).map_err(|e| RoutingError::InvalidRule {
                            index,
                            reason: format!("invalid url '{raw}': {e}"),
                        })?;
                    Route::Url(parsed)
                }
                RoutingType::Msgq => {
                    let topic = rule
                        .target
                        .topic_id
                        .as_deref()
                        .filter(|t| !t.is_empty())
                        .ok_or(RoutingError::InvalidRule {
                            index,
                            reason: "topic_id is required for routing_type 'msgq'".to_string(),
                        })?;
                    Route::Msgq(topic.to_string())
                }
            };
            compiled.push(CompiledRule {
                domain: rule.domain,
                version: rule.version,
                endpoints: rule
                    .endpoints
                    .iter()
                    .map(|e| e.to_ascii_lowercase())
                    .collect(),
                route,
            });
        }
        Ok(Self { rules: compiled })
    }

    /// The action endpoint is the last path segment of the request URL.
    fn endpoint_of(request_path: &str) -> String {
        request_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase()
    }
}

impl Router for RoutingTable {
    fn route(&self, request_path: &str, body: &[u8]) -> Result<Route, RoutingError> {
        let parsed: MessageBody =
            serde_json::from_slice(body).map_err(RoutingError::MalformedBody)?;
        let domain = parsed.context.domain;
        let version = parsed.context.version;
        let endpoint = Self::endpoint_of(request_path);

        let mut domain_version_matched = false;
        for rule in &self.rules {
            if rule.domain != domain || rule.version != version {
                continue;
            }
            domain_version_matched = true;
            if rule.endpoints.iter().any(|e| *e == endpoint) {
                return Ok(rule.route.clone());
            }
        }

        if domain_version_matched {
            Err(RoutingError::UnsupportedEndpoint {
                endpoint,
                domain,
                version,
            })
        } else {
            Err(RoutingError::NoMatchingRule { domain, version })
        }
    }
}
