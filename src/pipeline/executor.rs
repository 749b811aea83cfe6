//! Pipeline execution and dispatch.
//!
//! # Responsibilities
//! - Buffer the request body once into a StepContext
//! - Run the configured steps strictly in order, short-circuiting on the
//!   first failure
//! - Dispatch on success: reverse-proxy (url route), publish (msgq route),
//!   or bare ACK when no route was set
//!
//! # Design Decisions
//! - One pipeline execution per inbound request on its own task; no
//!   coordination between concurrent requests
//! - Steps are never reordered or parallelized; later steps depend on
//!   earlier side effects
//! - Step failures respond with a protocol NACK; internal detail is logged,
//!   never leaked to the client

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{HeaderValue, Request, StatusCode, Uri};
use axum::response::Response;

use crate::capability::Publisher;
use crate::http::response::{ack_response, nack_response};
use crate::pipeline::builder::{PipelineStep, ProxyClient};
use crate::pipeline::context::{Role, StepContext};
use crate::pipeline::step::StepError;
use crate::routing::Route;

/// The immutable, fully-validated pipeline for one endpoint configuration.
/// Shared read-only across all requests on that endpoint.
pub struct PipelineHandler {
    steps: Vec<PipelineStep>,
    publisher: Option<Arc<dyn Publisher>>,
    subscriber_id: String,
    role: Role,
    client: ProxyClient,
    max_body_bytes: usize,
}

impl std::fmt::Debug for PipelineHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineHandler")
            .field("subscriber_id", &self.subscriber_id)
            .finish_non_exhaustive()
    }
}

impl PipelineHandler {
    pub(crate) fn new(
        steps: Vec<PipelineStep>,
        publisher: Option<Arc<dyn Publisher>>,
        subscriber_id: String,
        role: Role,
        client: ProxyClient,
        max_body_bytes: usize,
    ) -> Self {
        Self {
            steps,
            publisher,
            subscriber_id,
            role,
            client,
            max_body_bytes,
        }
    }

    /// Processes one inbound request through the step chain and dispatches
    /// the result.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let (parts, body) = request.into_parts();
        let body = match to_bytes(body, self.max_body_bytes).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(request_id = %request_id, error = %err, "failed to read request body");
                return nack_response(
                    &StepError::BadRequest("failed to read request body".to_string()),
                    Default::default(),
                );
            }
        };

        let mut ctx = StepContext {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            route: None,
            subscriber_id: self.subscriber_id.clone(),
            role: self.role,
            response_headers: Default::default(),
            request_id: request_id.clone(),
        };

        tracing::debug!(
            request_id = %request_id,
            method = %ctx.method,
            path = %ctx.uri.path(),
            subscriber_id = %ctx.subscriber_id,
            body_bytes = ctx.body.len(),
            "processing message"
        );

        for step in &self.steps {
            if let Err(err) = step.run(&mut ctx).await {
                tracing::error!(
                    request_id = %request_id,
                    step = step.name(),
                    subscriber_id = %ctx.subscriber_id,
                    error = %err,
                    "pipeline step failed"
                );
                return nack_response(&err, ctx.response_headers);
            }
        }

        match ctx.route.clone() {
            None => ack_response(ctx.response_headers),
            Some(Route::Url(target)) => self.proxy(ctx, &target).await,
            Some(Route::Msgq(topic_id)) => self.publish(ctx, &topic_id).await,
        }
    }

    /// Reverse-proxies the buffered request to the resolved target URL.
    async fn proxy(&self, ctx: StepContext, target: &url::Url) -> Response {
        tracing::info!(request_id = %ctx.request_id, target = %target, "forwarding request");
        let request = match self.proxy_request(&ctx, target) {
            Ok(request) => request,
            Err(reason) => {
                tracing::error!(request_id = %ctx.request_id, target = %target, error = %reason, "failed to build proxy request");
                return nack_response(&StepError::Internal(reason), ctx.response_headers);
            }
        };

        match self.client.request(request).await {
            Ok(response) => {
                let (mut parts, body) = response.into_parts();
                parts.headers.extend(ctx.response_headers);
                Response::from_parts(parts, Body::new(body))
            }
            Err(err) => {
                tracing::error!(request_id = %ctx.request_id, target = %target, error = %err, "upstream request failed");
                nack_response(
                    &StepError::Internal("upstream request failed".to_string()),
                    ctx.response_headers,
                )
            }
        }
    }

    /// Rewrites scheme/host/path to the target, preserving the query, and
    /// carries the original host in `X-Forwarded-Host`.
    fn proxy_request(&self, ctx: &StepContext, target: &url::Url) -> Result<Request<Body>, String> {
        let scheme =
            Scheme::try_from(target.scheme()).map_err(|_| "unsupported target scheme")?;
        let host = target.host_str().ok_or("target url has no host")?;
        let authority = match target.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };
        let authority: Authority = authority.parse().map_err(|_| "invalid target authority")?;

        let mut path_and_query = target.path().to_string();
        if let Some(query) = ctx.uri.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }
        let path_and_query: PathAndQuery =
            path_and_query.parse().map_err(|_| "invalid target path")?;

        let uri = Uri::builder()
            .scheme(scheme)
            .authority(authority)
            .path_and_query(path_and_query)
            .build()
            .map_err(|e| format!("failed to build target uri: {e}"))?;

        let forwarded_host = ctx
            .headers
            .get("host")
            .cloned()
            .or_else(|| ctx.uri.host().and_then(|h| HeaderValue::from_str(h).ok()));

        let mut request = Request::builder()
            .method(ctx.method.clone())
            .uri(uri)
            .body(Body::from(ctx.body.clone()))
            .map_err(|e| format!("failed to build proxy request: {e}"))?;
        *request.headers_mut() = ctx.headers.clone();
        request.headers_mut().remove("host");
        if let Some(host) = forwarded_host {
            request.headers_mut().insert("x-forwarded-host", host);
        }
        if let Ok(id) = HeaderValue::from_str(&ctx.request_id) {
            request.headers_mut().insert("x-request-id", id);
        }
        Ok(request)
    }

    /// Hands the buffered body to the publisher for the resolved topic.
    async fn publish(&self, ctx: StepContext, topic_id: &str) -> Response {
        let Some(publisher) = &self.publisher else {
            // A msgq route without a publisher is a configuration error,
            // never a silent drop.
            tracing::error!(
                request_id = %ctx.request_id,
                topic_id = %topic_id,
                "msgq route resolved but no publisher is configured"
            );
            return nack_response(
                &StepError::Internal("publisher not configured".to_string()),
                ctx.response_headers,
            );
        };

        tracing::info!(request_id = %ctx.request_id, topic_id = %topic_id, "publishing message");
        match publisher.publish(topic_id, &ctx.body).await {
            Ok(()) => ack_response(ctx.response_headers),
            Err(err) => {
                tracing::error!(
                    request_id = %ctx.request_id,
                    topic_id = %topic_id,
                    error = %err,
                    "failed to publish message"
                );
                nack_response(
                    &StepError::Internal("failed to publish message".to_string()),
                    ctx.response_headers,
                )
            }
        }
    }
}

// Used by the NACK renderer; kept here so the status mapping lives next to
// the taxonomy it reflects.
impl StepError {
    pub fn status(&self) -> StatusCode {
        match self {
            StepError::BadRequest(_) => StatusCode::BAD_REQUEST,
            StepError::SchemaValidation(_) => StatusCode::BAD_REQUEST,
            StepError::SignValidation(_) => StatusCode::UNAUTHORIZED,
            StepError::NotFound(_) => StatusCode::NOT_FOUND,
            StepError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
