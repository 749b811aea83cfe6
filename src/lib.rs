//! Beckn network protocol gateway.
//!
//! Receives HTTP messages from network participants (buyer apps, seller
//! apps, gateways), authenticates the sender, validates the message shape,
//! decides where the message goes next, and delivers it.
//!
//! # Architecture Overview
//!
//! ```text
//!   Participant request
//!       │
//!       ▼
//!   ┌──────────┐   ┌───────────────────────────────────────────┐
//!   │   http   │──▶│              pipeline                      │
//!   │  server  │   │  buffer body → steps in configured order   │
//!   └──────────┘   │  (validateSign → validateSchema →          │
//!                  │   addRoute → sign → ...)                   │
//!                  └──────────────┬────────────────────────────┘
//!                                 │
//!            ┌────────────────────┼────────────────────┐
//!            ▼                    ▼                    ▼
//!     reverse-proxy to      publish to broker      bare ACK
//!     the url target        topic (msgq target)   (no route)
//!
//!   Cross-cutting: config (YAML), signing (BLAKE2b-512 + Ed25519),
//!   routing (domain/version/endpoint table), capability traits for
//!   external collaborators.
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod pipeline;
pub mod routing;
pub mod signing;

// Collaborator contracts and built-ins
pub mod capability;

pub use config::GatewayConfig;
pub use http::GatewayServer;
pub use pipeline::{HandlerBuilder, PipelineHandler};
