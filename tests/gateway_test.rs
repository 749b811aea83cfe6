//! End-to-end tests for the gateway pipeline over real sockets.

use std::sync::Arc;

use beckn_gateway::capability::{Ed25519SignValidator, Ed25519Signer, InMemoryKeyManager};
use beckn_gateway::pipeline::Role;
use beckn_gateway::routing::RoutingTable;
use beckn_gateway::HandlerBuilder;

mod common;

fn trv_body() -> String {
    r#"{"context":{"domain":"ONDC:TRV11","version":"2.0.0"}}"#.to_string()
}

fn url_rules(backend: &std::net::SocketAddr) -> RoutingTable {
    RoutingTable::from_yaml(&format!(
        r#"
routing_rules:
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "url"
    target:
      url: "http://{backend}/trv/v1"
    endpoints: [select, init]
"#
    ))
    .unwrap()
}

#[tokio::test]
async fn url_route_is_proxied_to_the_exact_target() {
    let (backend_addr, backend) = common::start_capture_backend().await;
    let handler = HandlerBuilder::new("bap.example.com", Role::Bap)
        .router(Arc::new(url_rules(&backend_addr)))
        .build(&["addRoute".to_string()])
        .unwrap();
    let gateway = common::start_gateway(Arc::new(handler)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{gateway}/beckn/select"))
        .body(trv_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "backend-ok");

    let requests = backend.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    // scheme/host/path rewritten to the configured target
    assert_eq!(requests[0].path, "/trv/v1");
    assert_eq!(requests[0].body, trv_body().into_bytes());
    assert!(requests[0].headers.contains_key("x-forwarded-host"));
    assert!(requests[0].headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn msgq_route_reaches_the_publisher() {
    let publisher = Arc::new(common::CapturingPublisher::default());
    let table = RoutingTable::from_yaml(
        r#"
routing_rules:
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "msgq"
    target:
      topic_id: "trv_topic_id1"
    endpoints: [search]
"#,
    )
    .unwrap();
    let handler = HandlerBuilder::new("bap.example.com", Role::Bap)
        .router(Arc::new(table))
        .publisher(publisher.clone())
        .build(&["addRoute".to_string()])
        .unwrap();
    let gateway = common::start_gateway(Arc::new(handler)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{gateway}/beckn/search"))
        .body(trv_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let envelope: serde_json::Value = response.json().await.unwrap();
    assert_eq!(envelope["message"]["ack"]["status"], "ACK");

    let published = publisher.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "trv_topic_id1");
    assert_eq!(published[0].1, trv_body().into_bytes());
}

#[tokio::test]
async fn no_route_responds_with_bare_ack() {
    let handler = HandlerBuilder::new("bap.example.com", Role::Bap)
        .build(&[])
        .unwrap();
    let gateway = common::start_gateway(Arc::new(handler)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{gateway}/beckn/on_status"))
        .body("{}")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let envelope: serde_json::Value = response.json().await.unwrap();
    assert_eq!(envelope["message"]["ack"]["status"], "ACK");
}

#[tokio::test]
async fn unsupported_endpoint_returns_nack_not_proxy() {
    let (backend_addr, backend) = common::start_capture_backend().await;
    let handler = HandlerBuilder::new("bap.example.com", Role::Bap)
        .router(Arc::new(url_rules(&backend_addr)))
        .build(&["addRoute".to_string()])
        .unwrap();
    let gateway = common::start_gateway(Arc::new(handler)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{gateway}/beckn/unsupported"))
        .body(trv_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
    let envelope: serde_json::Value = response.json().await.unwrap();
    assert_eq!(envelope["message"]["ack"]["status"], "NACK");
    assert!(envelope["message"]["error"]["message"]
        .as_str()
        .unwrap()
        .contains("endpoint 'unsupported' is not supported for domain ONDC:TRV11 and version 2.0.0"));
    assert!(backend.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unsigned_request_is_rejected_with_challenge() {
    let keys = common::subscriber_keys("bap.example.com", "key-1");
    let handler = HandlerBuilder::new("bpp.example.com", Role::Bpp)
        .sign_validator(Arc::new(Ed25519SignValidator))
        .key_manager(Arc::new(InMemoryKeyManager::new(&[keys])))
        .build(&["validateSign".to_string()])
        .unwrap();
    let gateway = common::start_gateway(Arc::new(handler)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{gateway}/beckn/select"))
        .body(trv_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let challenge = response.headers().get("www-authenticate").unwrap();
    assert!(challenge
        .to_str()
        .unwrap()
        .contains("realm=\"bpp.example.com\""));
    let envelope: serde_json::Value = response.json().await.unwrap();
    assert_eq!(envelope["message"]["ack"]["status"], "NACK");
}

#[tokio::test]
async fn signed_egress_verifies_on_receiving_gateway() {
    // Receiving side: validates the inbound signature, then acks.
    let keys = common::subscriber_keys("bap.example.com", "key-1");
    let key_manager = Arc::new(InMemoryKeyManager::new(&[keys]));
    let receiver = HandlerBuilder::new("bpp.example.com", Role::Bpp)
        .sign_validator(Arc::new(Ed25519SignValidator))
        .key_manager(key_manager.clone())
        .build(&["validateSign".to_string()])
        .unwrap();
    let receiver_addr = common::start_gateway(Arc::new(receiver)).await;

    // Sending side: signs and proxies to the receiver.
    let table = RoutingTable::from_yaml(&format!(
        r#"
routing_rules:
  - domain: "ONDC:TRV11"
    version: "2.0.0"
    routing_type: "url"
    target:
      url: "http://{receiver_addr}/bpp/select"
    endpoints: [select]
"#
    ))
    .unwrap();
    let sender = HandlerBuilder::new("bap.example.com", Role::Bap)
        .signer(Arc::new(Ed25519Signer))
        .key_manager(key_manager)
        .router(Arc::new(table))
        .build(&["sign".to_string(), "addRoute".to_string()])
        .unwrap();
    let sender_addr = common::start_gateway(Arc::new(sender)).await;

    let response = reqwest::Client::new()
        .post(format!("http://{sender_addr}/bap/select"))
        .body(trv_body())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let envelope: serde_json::Value = response.json().await.unwrap();
    assert_eq!(envelope["message"]["ack"]["status"], "ACK");
}
