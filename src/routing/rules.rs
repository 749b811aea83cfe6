//! Routing-rule file schema and validation.
//!
//! # Responsibilities
//! - Deserialize the `routing_rules:` YAML document
//! - Validate every rule before the table is built (fail the whole load
//!   on the first invalid rule: misconfiguration surfaces at startup,
//!   never at request time)
//!
//! # Design Decisions
//! - Serde handles syntactic checks (missing keys, bad routing_type);
//!   semantic checks (empty strings, target consistency) live here

use serde::Deserialize;

use crate::routing::RoutingError;

/// Root of the routing-rules file.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSet {
    pub routing_rules: Vec<RoutingRule>,
}

/// A single routing rule. Order in the file is load-bearing: the first
/// matching rule wins.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingRule {
    pub domain: String,
    pub version: String,
    pub routing_type: RoutingType,
    #[serde(default)]
    pub target: Target,
    #[serde(default)]
    pub endpoints: Vec<String>,
}

/// How a matched message is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingType {
    /// Reverse-proxy to a URL.
    Url,
    /// Hand off to the message-broker publisher.
    Msgq,
}

/// Destination details; which field is meaningful depends on the
/// routing type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Target {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub topic_id: Option<String>,
}

impl RuleSet {
    /// Parses a rule set from YAML and validates every rule.
    pub fn from_yaml(contents: &str) -> Result<Self, RoutingError> {
        let set: RuleSet = serde_yaml::from_str(contents)?;
        set.validate()?;
        Ok(set)
    }

    fn validate(&self) -> Result<(), RoutingError> {
        for (index, rule) in self.routing_rules.iter().enumerate() {
            rule.validate()
                .map_err(|reason| RoutingError::InvalidRule { index, reason })?;
        }
        Ok(())
    }
}

impl RoutingRule {
    fn validate(&self) -> Result<(), String> {
        if self.domain.is_empty() || self.version.is_empty() {
            return Err("domain and version are required".to_string());
        }
        match self.routing_type {
            RoutingType::Url => {
                let raw = self
                    .target
                    .url
                    .as_deref()
                    .filter(|u| !u.is_empty())
                    .ok_or("url is required for routing_type 'url'")?;
                url::Url::parse(raw).map_err(|e| format!("invalid url '{raw}': {e}"))?;
            }
            RoutingType::Msgq => {
                self.target
                    .topic_id
                    .as_deref()
                    .filter(|t| !t.is_empty())
                    .ok_or("topic_id is required for routing_type 'msgq'")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_rules_parse() {
        let set = RuleSet::from_yaml(
            r#"
routing_rules:
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "url"
    target:
      url: "https://backend/trv/v1"
    endpoints: [select, init, confirm, status]
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "msgq"
    target:
      topic_id: "trv_topic_id1"
    endpoints: [search]
"#,
        )
        .unwrap();
        assert_eq!(set.routing_rules.len(), 2);
        assert_eq!(set.routing_rules[0].routing_type, RoutingType::Url);
        assert_eq!(set.routing_rules[1].routing_type, RoutingType::Msgq);
    }

    #[test]
    fn missing_domain_fails_load() {
        let err = RuleSet::from_yaml(
            r#"
routing_rules:
  - version: "2.0.0"
    routing_type: "url"
    target:
      url: "https://backend"
    endpoints: [select]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RoutingError::Parse(_)));
    }

    #[test]
    fn empty_version_fails_load() {
        let err = RuleSet::from_yaml(
            r#"
routing_rules:
  - domain: "ONDC:TRV11"
    version: ""
    routing_type: "url"
    target:
      url: "https://backend"
    endpoints: [select]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RoutingError::InvalidRule { index: 0, .. }));
    }

    #[test]
    fn unknown_routing_type_fails_load() {
        let err = RuleSet::from_yaml(
            r#"
routing_rules:
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "carrier-pigeon"
    endpoints: [select]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RoutingError::Parse(_)));
    }

    #[test]
    fn url_rule_without_url_fails_load() {
        let err = RuleSet::from_yaml(
            r#"
routing_rules:
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "url"
    endpoints: [select]
"#,
        )
        .unwrap_err();
        let RoutingError::InvalidRule { index, reason } = err else {
            panic!("expected InvalidRule");
        };
        assert_eq!(index, 0);
        assert!(reason.contains("url is required"));
    }

    #[test]
    fn msgq_rule_without_topic_fails_load() {
        let err = RuleSet::from_yaml(
            r#"
routing_rules:
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "msgq"
    target:
      url: "https://backend"
    endpoints: [search]
"#,
        )
        .unwrap_err();
        let RoutingError::InvalidRule { reason, .. } = err else {
            panic!("expected InvalidRule");
        };
        assert!(reason.contains("topic_id is required"));
    }

    #[test]
    fn second_invalid_rule_still_fails_load() {
        let err = RuleSet::from_yaml(
            r#"
routing_rules:
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "url"
    target:
      url: "https://backend"
    endpoints: [select]
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "url"
    target:
      url: "::not a url::"
    endpoints: [init]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RoutingError::InvalidRule { index: 1, .. }));
    }
}
