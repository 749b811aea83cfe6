//! Built-in Signer / SignValidator over the signing codec.

use async_trait::async_trait;

use crate::capability::{CapabilityError, SignValidator, Signer};
use crate::signing::{codec, SignatureHeader};

/// Ed25519 signer backed by the canonical digest codec.
#[derive(Debug, Default)]
pub struct Ed25519Signer;

#[async_trait]
impl Signer for Ed25519Signer {
    async fn sign(
        &self,
        body: &[u8],
        private_key_b64: &str,
        created: i64,
        expires: i64,
    ) -> Result<String, CapabilityError> {
        Ok(codec::sign(body, private_key_b64, created, expires)?)
    }
}

/// Ed25519 verifier backed by the canonical digest codec.
#[derive(Debug, Default)]
pub struct Ed25519SignValidator;

#[async_trait]
impl SignValidator for Ed25519SignValidator {
    async fn validate(
        &self,
        body: &[u8],
        header: &str,
        public_key_b64: &str,
    ) -> Result<(), CapabilityError> {
        let parsed = SignatureHeader::parse(header)
            .map_err(|e| CapabilityError::Unavailable(format!("failed to parse header: {e}")))?;
        Ok(codec::verify(body, &parsed, public_key_b64)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::codec::unix_now;
    use crate::signing::header::signature_header_value;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use ed25519_dalek::SigningKey;

    #[tokio::test]
    async fn signer_output_verifies() {
        let key = SigningKey::generate(&mut rand::thread_rng());
        let private = BASE64.encode(key.to_keypair_bytes());
        let public = BASE64.encode(key.verifying_key().to_bytes());
        let body = br#"{"context":{"domain":"ONDC:TRV11","version":"2.0.0"}}"#;
        let now = unix_now();

        let signature = Ed25519Signer
            .sign(body, &private, now, now + 300)
            .await
            .unwrap();
        let header = signature_header_value("bap.example.com", "key-1", now, now + 300, &signature);

        Ed25519SignValidator
            .validate(body, &header, &public)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn garbage_header_rejected() {
        let err = Ed25519SignValidator
            .validate(b"body", "Signature created=\"soon\"", "cHVi")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to parse header"));
    }
}
