//! Function invocation.
//!
//! The dispatcher only sees the [`Invoker`] trait; `lambda.rs` provides the
//! AWS Lambda implementation. Each request invokes exactly once. Timeouts
//! belong to the invoker, retries to nobody.

pub mod lambda;

use async_trait::async_trait;
use bytes::Bytes;

pub use lambda::LambdaInvoker;

/// Failure to obtain a payload from the function.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The invoke API call itself failed (network, throttling, permissions).
    #[error("invoke request failed: {0}")]
    Request(String),
    /// The function ran and reported an unhandled error.
    #[error("function error ({kind}): {payload}")]
    Function { kind: String, payload: String },
    #[error("invocation timed out after {0:?}")]
    Timeout(std::time::Duration),
}

/// Sends a payload to a function and returns its raw output.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, function: &str, payload: Bytes) -> Result<Bytes, InvokeError>;
}
