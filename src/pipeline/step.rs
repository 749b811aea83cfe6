//! The step contract and the built-in pipeline steps.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderValue;
use thiserror::Error;

use crate::capability::{KeyManager, SchemaValidator, SignValidator, Signer};
use crate::pipeline::context::{Role, StepContext};
use crate::routing::{Router, RoutingError};
use crate::signing::codec::unix_now;
use crate::signing::header::{
    challenge_header_value, signature_header_value, SignatureHeader, GATEWAY_AUTH_HEADER,
    GATEWAY_CHALLENGE_HEADER, SUBSCRIBER_AUTH_HEADER, SUBSCRIBER_CHALLENGE_HEADER,
};

/// A step failure. The executor short-circuits on the first of these
/// without inspecting internals; the variant carries the client-facing
/// classification so the response layer can render a protocol NACK.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("signature validation failed: {0}")]
    SignValidation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl From<RoutingError> for StepError {
    fn from(err: RoutingError) -> Self {
        match err {
            RoutingError::MalformedBody(_) => StepError::BadRequest(err.to_string()),
            RoutingError::NoMatchingRule { .. } | RoutingError::UnsupportedEndpoint { .. } => {
                StepError::NotFound(err.to_string())
            }
            other => StepError::Internal(other.to_string()),
        }
    }
}

/// One unit of pipeline work over the per-request [`StepContext`].
///
/// Implementations may read and mutate the context but must not retain it
/// past the call, and must tolerate many concurrent instances across
/// different requests.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &str;
    async fn run(&self, ctx: &mut StepContext) -> Result<(), StepError>;
}

/// Signs the outbound message and writes the authorization header.
pub struct SignStep {
    signer: Arc<dyn Signer>,
    key_manager: Arc<dyn KeyManager>,
    ttl: Duration,
}

impl SignStep {
    pub fn new(signer: Arc<dyn Signer>, key_manager: Arc<dyn KeyManager>, ttl: Duration) -> Self {
        Self {
            signer,
            key_manager,
            ttl,
        }
    }
}

#[async_trait]
impl Step for SignStep {
    fn name(&self) -> &str {
        "sign"
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<(), StepError> {
        if ctx.subscriber_id.is_empty() {
            return Err(StepError::BadRequest("subscriberID not set".to_string()));
        }
        let keyset = self
            .key_manager
            .signing_keyset(&ctx.subscriber_id)
            .await
            .map_err(|e| StepError::Internal(format!("failed to get signing key: {e}")))?;

        let created = unix_now();
        let expires = created + self.ttl.as_secs() as i64;
        let signature = self
            .signer
            .sign(&ctx.body, &keyset.signing_private, created, expires)
            .await
            .map_err(|e| StepError::Internal(format!("failed to sign request: {e}")))?;

        let value = signature_header_value(
            &ctx.subscriber_id,
            &keyset.unique_key_id,
            created,
            expires,
            &signature,
        );
        let header = match ctx.role {
            Role::Gateway => GATEWAY_AUTH_HEADER,
            _ => SUBSCRIBER_AUTH_HEADER,
        };
        let value = HeaderValue::from_str(&value)
            .map_err(|e| StepError::Internal(format!("invalid auth header value: {e}")))?;
        tracing::debug!(subscriber_id = %ctx.subscriber_id, "signature generated");
        ctx.headers.insert(header, value);
        Ok(())
    }
}

/// Verifies the inbound authorization header(s) against the sender's
/// registered public key.
pub struct ValidateSignStep {
    validator: Arc<dyn SignValidator>,
    key_manager: Arc<dyn KeyManager>,
}

impl ValidateSignStep {
    pub fn new(validator: Arc<dyn SignValidator>, key_manager: Arc<dyn KeyManager>) -> Self {
        Self {
            validator,
            key_manager,
        }
    }

    async fn validate_header(&self, ctx: &StepContext, raw: &str) -> Result<(), StepError> {
        let parsed = SignatureHeader::parse(raw)
            .map_err(|e| StepError::SignValidation(format!("failed to parse header: {e}")))?;
        let key_id = parsed.key_id.ok_or_else(|| {
            StepError::SignValidation("keyId parameter not found in authorization header".to_string())
        })?;
        tracing::debug!(subscriber_id = %key_id.subscriber_id, "validating signature");
        let public_key = self
            .key_manager
            .signing_public_key(&key_id.subscriber_id, &key_id.unique_key_id)
            .await
            .map_err(|e| StepError::SignValidation(format!("failed to get validation key: {e}")))?;
        self.validator
            .validate(&ctx.body, raw, &public_key)
            .await
            .map_err(|e| StepError::SignValidation(format!("sign validation failed: {e}")))
    }

    fn challenge(ctx: &mut StepContext, header: &'static str) {
        if let Ok(value) = HeaderValue::from_str(&challenge_header_value(&ctx.subscriber_id)) {
            ctx.response_headers.insert(header, value);
        }
    }
}

#[async_trait]
impl Step for ValidateSignStep {
    fn name(&self) -> &str {
        "validateSign"
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<(), StepError> {
        // Gateway-forwarded requests carry a second signature; verify it
        // when present.
        if let Some(value) = ctx.headers.get(GATEWAY_AUTH_HEADER) {
            let raw = value
                .to_str()
                .map_err(|_| StepError::SignValidation("malformed gateway header".to_string()))?
                .to_string();
            if let Err(err) = self.validate_header(ctx, &raw).await {
                Self::challenge(ctx, GATEWAY_CHALLENGE_HEADER);
                return Err(err);
            }
        }

        let Some(value) = ctx.headers.get(SUBSCRIBER_AUTH_HEADER) else {
            Self::challenge(ctx, SUBSCRIBER_CHALLENGE_HEADER);
            return Err(StepError::SignValidation(
                "authorization header missing".to_string(),
            ));
        };
        let raw = value
            .to_str()
            .map_err(|_| StepError::SignValidation("malformed authorization header".to_string()))?
            .to_string();
        if let Err(err) = self.validate_header(ctx, &raw).await {
            Self::challenge(ctx, SUBSCRIBER_CHALLENGE_HEADER);
            return Err(err);
        }
        Ok(())
    }
}

/// Validates the body against the schema selected by the request URL.
pub struct ValidateSchemaStep {
    validator: Arc<dyn SchemaValidator>,
}

impl ValidateSchemaStep {
    pub fn new(validator: Arc<dyn SchemaValidator>) -> Self {
        Self { validator }
    }
}

#[async_trait]
impl Step for ValidateSchemaStep {
    fn name(&self) -> &str {
        "validateSchema"
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<(), StepError> {
        self.validator
            .validate(ctx.uri.path(), &ctx.body)
            .await
            .map_err(|e| StepError::SchemaValidation(e.to_string()))
    }
}

/// Resolves the dispatch target and stores it on the context.
pub struct AddRouteStep {
    router: Arc<dyn Router>,
}

impl AddRouteStep {
    pub fn new(router: Arc<dyn Router>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl Step for AddRouteStep {
    fn name(&self) -> &str {
        "addRoute"
    }

    async fn run(&self, ctx: &mut StepContext) -> Result<(), StepError> {
        let route = self.router.route(ctx.uri.path(), &ctx.body)?;
        ctx.route = Some(route);
        Ok(())
    }
}
