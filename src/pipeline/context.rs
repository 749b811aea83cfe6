//! Per-request pipeline state.

use axum::http::{HeaderMap, Method, Uri};
use bytes::Bytes;
use serde::Deserialize;

use crate::routing::Route;

/// The participant role this gateway acts as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Buyer-side network participant.
    Bap,
    /// Seller-side network participant.
    Bpp,
    /// Discovery-broadcast participant.
    Gateway,
}

impl Default for Role {
    fn default() -> Self {
        Role::Bap
    }
}

/// Mutable state for one request's pipeline execution.
///
/// Created once at pipeline entry, owned exclusively by that execution,
/// and discarded after the response is written. Never shared across
/// requests. Subscriber id and role are explicit fields, not an ambient
/// key-value bag.
pub struct StepContext {
    pub method: Method,
    pub uri: Uri,
    /// Inbound request headers; the sign step writes the outbound
    /// authorization header here so dispatch forwards it.
    pub headers: HeaderMap,
    /// The buffered request body; steps and dispatch share this one copy.
    pub body: Bytes,
    /// Dispatch decision; set by the routing step, immutable afterward.
    pub route: Option<Route>,
    pub subscriber_id: String,
    pub role: Role,
    /// Headers to attach to the gateway's own response (e.g. signature
    /// challenges).
    pub response_headers: HeaderMap,
    pub request_id: String,
}
