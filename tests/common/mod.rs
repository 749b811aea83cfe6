//! Shared fixtures for integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, Uri};
use axum::response::IntoResponse;
use axum::routing::any;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::SigningKey;
use tokio::net::TcpListener;

use beckn_gateway::capability::keys::SubscriberKeyConfig;
use beckn_gateway::capability::{CapabilityError, Publisher};
use beckn_gateway::{GatewayServer, PipelineHandler};

/// One request observed by the mock backend.
pub struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

#[derive(Clone, Default)]
pub struct CaptureState {
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

async fn capture(
    State(state): State<CaptureState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.requests.lock().unwrap().push(CapturedRequest {
        method,
        path: uri.path().to_string(),
        headers,
        body: body.to_vec(),
    });
    "backend-ok"
}

/// Start a mock backend that records every request it receives.
pub async fn start_capture_backend() -> (SocketAddr, CaptureState) {
    let state = CaptureState::default();
    let app = Router::new()
        .route("/{*path}", any(capture))
        .route("/", any(capture))
        .with_state(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    (addr, state)
}

/// Start a gateway serving the given handler on an ephemeral port.
pub async fn start_gateway(handler: Arc<PipelineHandler>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = GatewayServer::new(handler, Duration::from_secs(5));
    tokio::spawn(async move {
        server.run(listener).await.unwrap();
    });
    addr
}

/// Publisher that records (topic, body) pairs instead of talking to a
/// broker.
#[derive(Default)]
pub struct CapturingPublisher {
    pub published: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl Publisher for CapturingPublisher {
    async fn publish(&self, topic_id: &str, body: &[u8]) -> Result<(), CapabilityError> {
        self.published
            .lock()
            .unwrap()
            .push((topic_id.to_string(), body.to_vec()));
        Ok(())
    }
}

/// Generate key material for a subscriber as it would appear in config.
pub fn subscriber_keys(subscriber_id: &str, unique_key_id: &str) -> SubscriberKeyConfig {
    let key = SigningKey::generate(&mut rand::thread_rng());
    SubscriberKeyConfig {
        subscriber_id: subscriber_id.to_string(),
        unique_key_id: unique_key_id.to_string(),
        signing_private_key: BASE64.encode(key.to_keypair_bytes()),
        signing_public_key: BASE64.encode(key.verifying_key().to_bytes()),
    }
}
