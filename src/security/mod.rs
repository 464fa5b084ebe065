//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → limits.rs (body size ceiling)
//!     → headers.rs (overwrite host + X-Forwarded-*)
//!     → Event encoding
//! ```
//!
//! # Design Decisions
//! - No trust in client-supplied forwarding headers
//! - Oversized bodies rejected before the function is invoked

pub mod headers;
pub mod limits;

pub use headers::ForwardedHeaders;
