//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, route + client address)
//!     → dispatch.rs (header_up → encode → invoke → decode)
//!     → response.rs (headers, status, body; header_down)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod response;
pub mod rules;
pub mod server;

pub use dispatch::{DispatchError, FunctionTarget};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
