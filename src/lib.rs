//! HTTP front end for Lambda functions, speaking the load balancer
//! target-group event format.

pub mod config;
pub mod event;
pub mod http;
pub mod invoke;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::schema::ProxyConfig;
pub use event::{InvocationEvent, InvocationResponse};
pub use http::HttpServer;
pub use invoke::{InvokeError, Invoker};
pub use lifecycle::Shutdown;
