//! Beckn ACK/NACK response envelope.
//!
//! # Responsibilities
//! - Serialize the protocol's standard success/failure shapes
//! - Map the step-error taxonomy onto HTTP statuses
//! - Never leak internal error detail for server-side failures

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use serde::{Deserialize, Serialize};

use crate::pipeline::step::StepError;

/// Acknowledgment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    ACK,
    NACK,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Ack {
    pub status: Status,
}

/// Structured error detail carried in a NACK.
#[derive(Debug, Serialize, Deserialize)]
pub struct NackError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub ack: Ack,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<NackError>,
}

/// The response envelope: `{"message":{"ack":{"status":...},"error":...}}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Envelope {
    pub message: Message,
}

impl Envelope {
    pub fn ack() -> Self {
        Self {
            message: Message {
                ack: Ack {
                    status: Status::ACK,
                },
                error: None,
            },
        }
    }

    pub fn nack(code: Option<String>, message: String) -> Self {
        Self {
            message: Message {
                ack: Ack {
                    status: Status::NACK,
                },
                error: Some(NackError { code, message }),
            },
        }
    }
}

/// A 200 ACK with any accumulated response headers attached.
pub fn ack_response(extra_headers: HeaderMap) -> Response {
    render(StatusCode::OK, &Envelope::ack(), extra_headers)
}

/// A NACK for a failed step. Client-correctable failures carry the step's
/// message; internal failures carry a generic one.
pub fn nack_response(err: &StepError, extra_headers: HeaderMap) -> Response {
    let status = err.status();
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "Internal server error".to_string()
    } else {
        err.to_string()
    };
    let envelope = Envelope::nack(Some(status.as_u16().to_string()), message);
    render(status, &envelope, extra_headers)
}

fn render(status: StatusCode, envelope: &Envelope, extra_headers: HeaderMap) -> Response {
    let body = serde_json::to_vec(envelope).unwrap_or_else(|_| b"{}".to_vec());
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response.headers_mut().extend(extra_headers);
    response
}
