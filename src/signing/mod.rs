//! Message-signature subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound:  body + keyset
//!     → codec.rs (canonical signing string, Ed25519 sign)
//!     → header.rs (serialize `Signature keyId=...` header value)
//!
//! Inbound:   Authorization header + body
//!     → header.rs (parse header, extract keyId / created / expires)
//!     → codec.rs (recompute signing string, enforce validity window,
//!                 Ed25519 verify against sender's public key)
//! ```
//!
//! # Design Decisions
//! - The canonical signing string is a pure function of
//!   (body, created, expires), shared by sign and verify
//! - Both validity bounds are enforced: `created <= now <= expires`
//! - Key/signature decode failures are terminal, never retried
//! - Expiry failures are a distinct error from cryptographic mismatch

pub mod codec;
pub mod header;

pub use codec::{sign, verify, SigningError};
pub use header::{SignatureHeader, SignatureKeyId};
