//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → tls.rs (optional TLS handshake, via axum-server)
//!     → client_ip.rs (resolve the client address for forwarding headers)
//!     → Hand off to HTTP layer
//! ```

pub mod client_ip;
pub mod tls;

pub use client_ip::ClientIpResolver;
