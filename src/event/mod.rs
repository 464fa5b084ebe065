//! Target-group event codec.
//!
//! # Data Flow
//! ```text
//! HTTP request
//!     → request.rs (InvocationEvent, JSON payload)
//!     → [function invocation]
//!     → response.rs (classify, then decode into InvocationResponse)
//!     → http::response (write onto the client response)
//! ```
//!
//! # Design Decisions
//! - Both types are built per exchange and dropped after the response
//! - Field names follow the load balancer's Lambda target schema exactly
//! - Non-JSON payloads degrade to a synthesized response, never an error

pub mod request;
pub mod response;

pub use request::{encode_request, InvocationEvent, MultiValueMap};
pub use response::{Decoded, InvocationResponse};

/// Failure to turn a request into an event.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("failed to read request body: {0}")]
    BodyRead(axum::Error),
}

/// A payload that looked like a JSON object but did not decode.
#[derive(Debug, thiserror::Error)]
#[error("malformed invocation response: {0}")]
pub struct DecodeError(#[from] serde_json::Error);
