//! Collaborator contracts consumed by the pipeline.
//!
//! # Design Decisions
//! - Every named capability (Signer, SignValidator, SchemaValidator,
//!   Publisher, KeyManager) resolves to a concrete implementation behind a
//!   stable trait at process start; the pipeline depends only on the traits
//! - Implementations are built once per handler and shared read-only across
//!   requests; any internal caching is their own responsibility
//! - Concrete backends (Vault/secret-manager key stores, broker clients,
//!   JSON-schema compilers) live outside this crate; the built-ins here are
//!   the Ed25519 codec adapters and a config-fed key store

pub mod ed25519;
pub mod keys;

use async_trait::async_trait;
use thiserror::Error;

pub use ed25519::{Ed25519SignValidator, Ed25519Signer};
pub use keys::InMemoryKeyManager;

use crate::signing::SigningError;

/// Errors surfaced by collaborator implementations.
#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Signing(#[from] SigningError),

    #[error("{0}")]
    Unavailable(String),
}

/// Signs a message body for a validity window.
#[async_trait]
pub trait Signer: Send + Sync {
    async fn sign(
        &self,
        body: &[u8],
        private_key_b64: &str,
        created: i64,
        expires: i64,
    ) -> Result<String, CapabilityError>;
}

/// Verifies an inbound signature header against a message body.
#[async_trait]
pub trait SignValidator: Send + Sync {
    async fn validate(
        &self,
        body: &[u8],
        header: &str,
        public_key_b64: &str,
    ) -> Result<(), CapabilityError>;
}

/// Validates a message body against the schema selected by the request URL.
#[async_trait]
pub trait SchemaValidator: Send + Sync {
    async fn validate(&self, request_path: &str, body: &[u8]) -> Result<(), CapabilityError>;
}

/// Hands a message off to the message broker.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, topic_id: &str, body: &[u8]) -> Result<(), CapabilityError>;
}

/// Signing/verification key material for one subscriber key pair.
/// Opaque credential supplied by the key manager; never persisted here.
#[derive(Debug, Clone)]
pub struct Keyset {
    pub unique_key_id: String,
    pub signing_private: String,
    pub signing_public: String,
}

/// Supplies key material for subscriber / key ids.
#[async_trait]
pub trait KeyManager: Send + Sync {
    /// The gateway's own signing keyset, for outbound signing.
    async fn signing_keyset(&self, subscriber_id: &str) -> Result<Keyset, CapabilityError>;

    /// A network participant's signing public key, for inbound verification.
    async fn signing_public_key(
        &self,
        subscriber_id: &str,
        unique_key_id: &str,
    ) -> Result<String, CapabilityError>;
}
