//! Handler construction.
//!
//! # Responsibilities
//! - Collect collaborators and custom steps for one endpoint configuration
//! - Resolve the configured step-name list into the immutable step sequence
//! - Fail construction on any unknown step name or missing collaborator
//!
//! # Design Decisions
//! - Built-in step names are a closed set; anything else must have been
//!   registered as a custom step beforehand
//! - Every requirement is checked here so misconfiguration can never
//!   surface as an intermittent runtime failure

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use thiserror::Error;

use crate::capability::{KeyManager, Publisher, SchemaValidator, SignValidator, Signer};
use crate::pipeline::context::{Role, StepContext};
use crate::pipeline::executor::PipelineHandler;
use crate::pipeline::step::{
    AddRouteStep, SignStep, Step, StepError, ValidateSchemaStep, ValidateSignStep,
};
use crate::routing::Router;

/// Construction-time failures. Fatal: the handler must not come up.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("unrecognized step: {0}")]
    UnknownStep(String),

    #[error("invalid config: {collaborator} not configured for step '{step}'")]
    MissingCollaborator {
        step: &'static str,
        collaborator: &'static str,
    },
}

/// The closed set of pipeline steps, fixed at construction.
pub enum PipelineStep {
    Sign(SignStep),
    ValidateSign(ValidateSignStep),
    ValidateSchema(ValidateSchemaStep),
    AddRoute(AddRouteStep),
    /// Reserved extension point; currently a no-op.
    Broadcast,
    Custom(Arc<dyn Step>),
}

impl PipelineStep {
    pub fn name(&self) -> &str {
        match self {
            PipelineStep::Sign(s) => s.name(),
            PipelineStep::ValidateSign(s) => s.name(),
            PipelineStep::ValidateSchema(s) => s.name(),
            PipelineStep::AddRoute(s) => s.name(),
            PipelineStep::Broadcast => "broadcast",
            PipelineStep::Custom(s) => s.name(),
        }
    }

    pub async fn run(&self, ctx: &mut StepContext) -> Result<(), StepError> {
        match self {
            PipelineStep::Sign(s) => s.run(ctx).await,
            PipelineStep::ValidateSign(s) => s.run(ctx).await,
            PipelineStep::ValidateSchema(s) => s.run(ctx).await,
            PipelineStep::AddRoute(s) => s.run(ctx).await,
            PipelineStep::Broadcast => {
                tracing::debug!("broadcast step is a reserved no-op");
                Ok(())
            }
            PipelineStep::Custom(s) => s.run(ctx).await,
        }
    }
}

/// Assembles a [`PipelineHandler`], validating that every configured step
/// has its collaborator before producing the immutable handler value.
pub struct HandlerBuilder {
    subscriber_id: String,
    role: Role,
    signing_ttl: Duration,
    max_body_bytes: usize,
    signer: Option<Arc<dyn Signer>>,
    sign_validator: Option<Arc<dyn SignValidator>>,
    schema_validator: Option<Arc<dyn SchemaValidator>>,
    key_manager: Option<Arc<dyn KeyManager>>,
    router: Option<Arc<dyn Router>>,
    publisher: Option<Arc<dyn Publisher>>,
    custom_steps: HashMap<String, Arc<dyn Step>>,
}

impl HandlerBuilder {
    pub fn new(subscriber_id: impl Into<String>, role: Role) -> Self {
        Self {
            subscriber_id: subscriber_id.into(),
            role,
            signing_ttl: Duration::from_secs(300),
            max_body_bytes: 2 * 1024 * 1024,
            signer: None,
            sign_validator: None,
            schema_validator: None,
            key_manager: None,
            router: None,
            publisher: None,
            custom_steps: HashMap::new(),
        }
    }

    pub fn signing_ttl(mut self, ttl: Duration) -> Self {
        self.signing_ttl = ttl;
        self
    }

    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn signer(mut self, signer: Arc<dyn Signer>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn sign_validator(mut self, validator: Arc<dyn SignValidator>) -> Self {
        self.sign_validator = Some(validator);
        self
    }

    pub fn schema_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.schema_validator = Some(validator);
        self
    }

    pub fn key_manager(mut self, key_manager: Arc<dyn KeyManager>) -> Self {
        self.key_manager = Some(key_manager);
        self
    }

    pub fn router(mut self, router: Arc<dyn Router>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Registers a plugin-provided step under its configured id.
    pub fn register_step(mut self, id: impl Into<String>, step: Arc<dyn Step>) -> Self {
        self.custom_steps.insert(id.into(), step);
        self
    }

    /// Resolves `step_names` into the ordered, immutable step sequence and
    /// produces the handler.
    pub fn build(self, step_names: &[String]) -> Result<PipelineHandler, BuildError> {
        let mut steps = Vec::with_capacity(step_names.len());
        for name in step_names {
            let step = match name.as_str() {
                "sign" => PipelineStep::Sign(SignStep::new(
                    require(&self.signer, "sign", "Signer")?,
                    require(&self.key_manager, "sign", "KeyManager")?,
                    self.signing_ttl,
                )),
                "validateSign" => PipelineStep::ValidateSign(ValidateSignStep::new(
                    require(&self.sign_validator, "validateSign", "SignValidator")?,
                    require(&self.key_manager, "validateSign", "KeyManager")?,
                )),
                "validateSchema" => PipelineStep::ValidateSchema(ValidateSchemaStep::new(require(
                    &self.schema_validator,
                    "validateSchema",
                    "SchemaValidator",
                )?)),
                "addRoute" => PipelineStep::AddRoute(AddRouteStep::new(require(
                    &self.router,
                    "addRoute",
                    "Router",
                )?)),
                "broadcast" => PipelineStep::Broadcast,
                other => match self.custom_steps.get(other) {
                    Some(step) => PipelineStep::Custom(step.clone()),
                    None => return Err(BuildError::UnknownStep(other.to_string())),
                },
            };
            steps.push(step);
        }

        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Ok(PipelineHandler::new(
            steps,
            self.publisher,
            self.subscriber_id,
            self.role,
            client,
            self.max_body_bytes,
        ))
    }
}

fn require<T: ?Sized>(
    slot: &Option<Arc<T>>,
    step: &'static str,
    collaborator: &'static str,
) -> Result<Arc<T>, BuildError> {
    slot.clone()
        .ok_or(BuildError::MissingCollaborator { step, collaborator })
}

// Keep the client type alias close to where it is built.
pub(crate) type ProxyClient = Client<HttpConnector, Body>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{Ed25519SignValidator, Ed25519Signer, InMemoryKeyManager};
    use async_trait::async_trait;

    struct NoopStep;

    #[async_trait]
    impl Step for NoopStep {
        fn name(&self) -> &str {
            "noop"
        }

        async fn run(&self, _ctx: &mut StepContext) -> Result<(), StepError> {
            Ok(())
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_step_fails_construction() {
        let err = HandlerBuilder::new("bap.example.com", Role::Bap)
            .build(&names(&["Sign"]))
            .unwrap_err();
        assert!(matches!(err, BuildError::UnknownStep(name) if name == "Sign"));
    }

    #[test]
    fn sign_without_key_manager_fails_construction() {
        let err = HandlerBuilder::new("bap.example.com", Role::Bap)
            .signer(Arc::new(Ed25519Signer))
            .build(&names(&["sign"]))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingCollaborator {
                step: "sign",
                collaborator: "KeyManager"
            }
        ));
    }

    #[test]
    fn validate_sign_without_validator_fails_construction() {
        let err = HandlerBuilder::new("bap.example.com", Role::Bap)
            .key_manager(Arc::new(InMemoryKeyManager::new(&[])))
            .build(&names(&["validateSign"]))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingCollaborator {
                step: "validateSign",
                collaborator: "SignValidator"
            }
        ));
    }

    #[test]
    fn add_route_without_router_fails_construction() {
        let err = HandlerBuilder::new("bap.example.com", Role::Bap)
            .build(&names(&["addRoute"]))
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::MissingCollaborator {
                step: "addRoute",
                collaborator: "Router"
            }
        ));
    }

    #[test]
    fn full_pipeline_builds() {
        let keys = Arc::new(InMemoryKeyManager::new(&[]));
        let table = crate::routing::RoutingTable::from_yaml("routing_rules: []").unwrap();
        let handler = HandlerBuilder::new("bap.example.com", Role::Bap)
            .signer(Arc::new(Ed25519Signer))
            .sign_validator(Arc::new(Ed25519SignValidator))
            .key_manager(keys)
            .router(Arc::new(table))
            .register_step("noop", Arc::new(NoopStep))
            .build(&names(&["validateSign", "addRoute", "noop", "broadcast", "sign"]));
        assert!(handler.is_ok());
    }
}
