//! The `Signature ...` authorization header protocol.
//!
//! Wire format:
//! ```text
//! Signature keyId="{subscriberID}|{uniqueKeyID}|ed25519",algorithm="ed25519",
//!   created="{createdAt}",expires="{expiresAt}",
//!   headers="(created) (expires) digest",signature="{signatureB64}"
//! ```
//!
//! # Design Decisions
//! - The `"Signature "` prefix is optional on parse
//! - Segments may appear in any order; unknown keys are ignored
//! - `created`, `expires` (integers) and a non-empty `signature` are
//!   required; anything else missing is tolerated
//! - Header names are lowercase constants so they can be used directly
//!   with `HeaderMap`

use thiserror::Error;

/// Inbound subscriber authorization header.
pub const SUBSCRIBER_AUTH_HEADER: &str = "authorization";
/// Inbound gateway authorization header.
pub const GATEWAY_AUTH_HEADER: &str = "x-gateway-authorization";
/// Challenge header set when subscriber signature validation fails.
pub const SUBSCRIBER_CHALLENGE_HEADER: &str = "www-authenticate";
/// Challenge header set when gateway signature validation fails.
pub const GATEWAY_CHALLENGE_HEADER: &str = "proxy-authenticate";

/// Errors produced while parsing a signature header.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("invalid created timestamp")]
    InvalidCreated,

    #[error("invalid expires timestamp")]
    InvalidExpires,

    #[error("signature missing in header")]
    MissingSignature,

    #[error("keyId parameter has incorrect format, expected 3 components separated by '|'")]
    InvalidKeyId,
}

/// The parsed `keyId="{subscriberID}|{uniqueKeyID}|{algorithm}"` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureKeyId {
    pub subscriber_id: String,
    pub unique_key_id: String,
    pub algorithm: String,
}

impl SignatureKeyId {
    fn parse(value: &str) -> Result<Self, HeaderError> {
        let mut parts = value.split('|');
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(sub), Some(key), Some(alg), None) => Ok(Self {
                subscriber_id: sub.trim().to_string(),
                unique_key_id: key.trim().to_string(),
                algorithm: alg.trim().to_string(),
            }),
            _ => Err(HeaderError::InvalidKeyId),
        }
    }
}

/// A parsed signature header. Transient, constructed per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Sender identity, when the header carried a `keyId` parameter.
    pub key_id: Option<SignatureKeyId>,
    /// Window start, unix seconds.
    pub created: i64,
    /// Window end, unix seconds.
    pub expires: i64,
    /// Base64 Ed25519 signature over the canonical signing string.
    pub signature: String,
}

impl SignatureHeader {
    /// Parses a signature header value.
    pub fn parse(value: &str) -> Result<Self, HeaderError> {
        let value = value
            .trim()
            .strip_prefix("Signature ")
            .unwrap_or(value.trim());

        let mut created = None;
        let mut expires = None;
        let mut signature = None;
        let mut key_id = None;

        for segment in value.split(',') {
            let Some((key, raw)) = segment.split_once('=') else {
                continue;
            };
            let key = key.trim();
            let raw = raw.trim().trim_matches('"');
            match key {
                "created" => created = Some(raw.parse().map_err(|_| HeaderError::InvalidCreated)?),
                "expires" => expires = Some(raw.parse().map_err(|_| HeaderError::InvalidExpires)?),
                "signature" => signature = Some(raw.to_string()),
                "keyId" => key_id = Some(SignatureKeyId::parse(raw)?),
                // algorithm, headers, and anything unknown are ignored
                _ => {}
            }
        }

        let created = created.ok_or(HeaderError::InvalidCreated)?;
        let expires = expires.ok_or(HeaderError::InvalidExpires)?;
        let signature = signature.filter(|s| !s.is_empty()).ok_or(HeaderError::MissingSignature)?;

        Ok(Self {
            key_id,
            created,
            expires,
            signature,
        })
    }
}

/// Serializes the outbound signature header value.
pub fn signature_header_value(
    subscriber_id: &str,
    unique_key_id: &str,
    created: i64,
    expires: i64,
    signature_b64: &str,
) -> String {
    format!(
        "Signature keyId=\"{subscriber_id}|{unique_key_id}|ed25519\",algorithm=\"ed25519\",\
         created=\"{created}\",expires=\"{expires}\",\
         headers=\"(created) (expires) digest\",signature=\"{signature_b64}\""
    )
}

/// Serializes the challenge value returned on validation failure.
pub fn challenge_header_value(subscriber_id: &str) -> String {
    format!("Signature realm=\"{subscriber_id}\",headers=\"(created) (expires) digest\"")
}
