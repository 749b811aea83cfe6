//! The message processing pipeline.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → executor.rs (buffer body once into a StepContext)
//!     → step.rs (run configured steps strictly in order;
//!                first failure aborts the chain)
//!     → dispatch: Route::Url  → reverse-proxy to the target
//!                 Route::Msgq → hand off to the Publisher
//!                 no Route    → bare ACK
//! ```
//!
//! # Design Decisions
//! - The step sequence is assembled once at handler construction as an
//!   immutable list of a tagged enum (built-in kinds + custom variant);
//!   no per-request string dispatch
//! - Misconfiguration (unknown step name, step without its collaborator)
//!   fails handler construction, never a request
//! - The StepContext is exclusively owned by one request's execution;
//!   the pipeline needs no synchronization of its own

pub mod builder;
pub mod context;
pub mod executor;
pub mod step;

pub use builder::{BuildError, HandlerBuilder};
pub use context::{Role, StepContext};
pub use executor::PipelineHandler;
pub use step::{Step, StepError};
