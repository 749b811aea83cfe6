//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → server.rs (axum router, timeout + trace layers)
//!     → pipeline executor (step chain + dispatch)
//!     → response.rs (ACK / NACK envelope, proxied response passthrough)
//! ```
//!
//! # Design Decisions
//! - Any method, any path: endpoint semantics come from the step
//!   configuration, not the HTTP route table
//! - Clients always receive a syntactically valid ack/nack body except at
//!   the transport level

pub mod response;
pub mod server;

pub use server::GatewayServer;
