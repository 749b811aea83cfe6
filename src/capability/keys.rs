//! Config-fed in-memory key manager.
//!
//! Holds key material loaded from the gateway configuration. Production
//! deployments that keep keys in a vault or secret manager supply their own
//! [`KeyManager`] implementation instead.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::capability::{CapabilityError, KeyManager, Keyset};

/// One subscriber's key material as it appears in the gateway config.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriberKeyConfig {
    pub subscriber_id: String,
    pub unique_key_id: String,
    pub signing_private_key: String,
    pub signing_public_key: String,
}

/// Key manager over a fixed, config-supplied key table.
pub struct InMemoryKeyManager {
    keysets: HashMap<String, Keyset>,
}

impl InMemoryKeyManager {
    pub fn new(entries: &[SubscriberKeyConfig]) -> Self {
        let keysets = entries
            .iter()
            .map(|e| {
                (
                    e.subscriber_id.clone(),
                    Keyset {
                        unique_key_id: e.unique_key_id.clone(),
                        signing_private: e.signing_private_key.clone(),
                        signing_public: e.signing_public_key.clone(),
                    },
                )
            })
            .collect();
        Self { keysets }
    }
}

#[async_trait]
impl KeyManager for InMemoryKeyManager {
    async fn signing_keyset(&self, subscriber_id: &str) -> Result<Keyset, CapabilityError> {
        self.keysets
            .get(subscriber_id)
            .cloned()
            .ok_or_else(|| {
                CapabilityError::NotFound(format!("no keyset for subscriber {subscriber_id}"))
            })
    }

    async fn signing_public_key(
        &self,
        subscriber_id: &str,
        unique_key_id: &str,
    ) -> Result<String, CapabilityError> {
        match self.keysets.get(subscriber_id) {
            Some(keyset) if keyset.unique_key_id == unique_key_id => {
                Ok(keyset.signing_public.clone())
            }
            _ => Err(CapabilityError::NotFound(format!(
                "no signing key for subscriber {subscriber_id} key {unique_key_id}"
            ))),
        }
    }
}
