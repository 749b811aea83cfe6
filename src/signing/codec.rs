//! Canonical digest construction and Ed25519 sign/verify.
//!
//! # Responsibilities
//! - Build the canonical signing string from (body, created, expires)
//! - Sign the string with an Ed25519 private key (base64, 64-byte keypair)
//! - Verify a parsed signature header against the sender's public key
//!
//! # Design Decisions
//! - BLAKE2b-512 digest of the body, base64-encoded, labelled `BLAKE-512=`
//!   (the network's wire convention)
//! - Private keys are 64-byte keypair blobs (seed followed by public key);
//!   the decoded length and seed/public consistency are both checked
//! - Verification enforces `created <= now <= expires`, not just expiry

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use blake2::{Blake2b512, Digest};
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier as _, VerifyingKey};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::signing::header::SignatureHeader;

/// Errors produced while signing or verifying a message.
#[derive(Debug, Error)]
pub enum SigningError {
    #[error("error decoding private key: {0}")]
    PrivateKeyDecode(base64::DecodeError),

    #[error("invalid private key length: expected {expected} bytes, got {actual}")]
    PrivateKeyLength { expected: usize, actual: usize },

    #[error("invalid private key: seed and public half do not match")]
    PrivateKeyMismatch,

    #[error("error decoding public key: {0}")]
    PublicKeyDecode(base64::DecodeError),

    #[error("invalid public key")]
    InvalidPublicKey,

    #[error("error decoding signature: {0}")]
    SignatureDecode(base64::DecodeError),

    #[error("invalid signature length: expected {expected} bytes, got {actual}")]
    SignatureLength { expected: usize, actual: usize },

    #[error("signature is expired or not yet valid")]
    OutsideValidityWindow,

    #[error("signature verification failed")]
    VerificationFailed,
}

/// Builds the canonical signing string shared by sign and verify.
///
/// The string is a pure function of its inputs, so a sign → verify
/// round-trip over the same body and window is always consistent.
pub fn signing_string(body: &[u8], created: i64, expires: i64) -> String {
    let mut hasher = Blake2b512::new();
    hasher.update(body);
    let digest = BASE64.encode(hasher.finalize());
    format!("(created): {created}\n(expires): {expires}\ndigest: BLAKE-512={digest}")
}

/// Signs `body` for the validity window, returning the base64 signature.
pub fn sign(
    body: &[u8],
    private_key_b64: &str,
    created: i64,
    expires: i64,
) -> Result<String, SigningError> {
    let key_bytes = BASE64
        .decode(private_key_b64)
        .map_err(SigningError::PrivateKeyDecode)?;
    let key_bytes: [u8; ed25519_dalek::KEYPAIR_LENGTH] =
        key_bytes
            .as_slice()
            .try_into()
            .map_err(|_| SigningError::PrivateKeyLength {
                expected: ed25519_dalek::KEYPAIR_LENGTH,
                actual: key_bytes.len(),
            })?;
    let signing_key =
        SigningKey::from_keypair_bytes(&key_bytes).map_err(|_| SigningError::PrivateKeyMismatch)?;

    let message = signing_string(body, created, expires);
    let signature = signing_key.sign(message.as_bytes());
    Ok(BASE64.encode(signature.to_bytes()))
}

/// Verifies a parsed signature header against `body` and the sender's
/// base64 public key, using the current wall-clock time.
pub fn verify(
    body: &[u8],
    header: &SignatureHeader,
    public_key_b64: &str,
) -> Result<(), SigningError> {
    verify_at(body, header, public_key_b64, unix_now())
}

/// Verification with an explicit `now`, for deterministic window tests.
pub fn verify_at(
    body: &[u8],
    header: &SignatureHeader,
    public_key_b64: &str,
    now: i64,
) -> Result<(), SigningError> {
    let signature_bytes = BASE64
        .decode(&header.signature)
        .map_err(SigningError::SignatureDecode)?;
    let signature_bytes: [u8; ed25519_dalek::SIGNATURE_LENGTH] = signature_bytes
        .as_slice()
        .try_into()
        .map_err(|_| SigningError::SignatureLength {
            expected: ed25519_dalek::SIGNATURE_LENGTH,
            actual: signature_bytes.len(),
        })?;

    if header.created > now || now > header.expires {
        return Err(SigningError::OutsideValidityWindow);
    }

    let key_bytes = BASE64
        .decode(public_key_b64)
        .map_err(SigningError::PublicKeyDecode)?;
    let key_bytes: [u8; ed25519_dalek::PUBLIC_KEY_LENGTH] = key_bytes
        .as_slice()
        .try_into()
        .map_err(|_| SigningError::InvalidPublicKey)?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|_| SigningError::InvalidPublicKey)?;

    let message = signing_string(body, header.created, header.expires);
    verifying_key
        .verify(message.as_bytes(), &Signature::from_bytes(&signature_bytes))
        .map_err(|_| SigningError::VerificationFailed)
}

/// Current unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
