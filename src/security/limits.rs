//! Request body limits.
//!
//! Bodies are fully buffered before encoding, so the ceiling is enforced
//! while reading. Exceeding it is a body read failure like any other.

use axum::body::{Body, Bytes};

/// Read a request body to completion, failing once more than `limit` bytes
/// have arrived.
pub async fn buffer_body(body: Body, limit: usize) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(body, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_within_limit() {
        let bytes = buffer_body(Body::from("hello"), 5).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn rejects_oversized_body() {
        assert!(buffer_body(Body::from("hello!"), 5).await.is_err());
    }
}
