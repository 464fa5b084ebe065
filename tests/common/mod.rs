//! Shared utilities for integration tests.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use alb_lambda_proxy::config::{FunctionConfig, ProxyConfig};
use alb_lambda_proxy::{InvocationEvent, InvokeError, Invoker};
use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::Request;
use bytes::Bytes;

type Reply = Box<
    dyn Fn(Bytes) -> Pin<Box<dyn Future<Output = Result<Bytes, InvokeError>> + Send>>
        + Send
        + Sync,
>;

/// An invoker that records every call and answers with a programmable reply.
pub struct MockInvoker {
    calls: Mutex<Vec<(String, Bytes)>>,
    reply: Reply,
}

impl MockInvoker {
    pub fn new<F, Fut>(reply: F) -> Arc<Self>
    where
        F: Fn(Bytes) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bytes, InvokeError>> + Send + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            reply: Box::new(move |payload| Box::pin(reply(payload))),
        })
    }

    /// Always answers with `response`.
    pub fn fixed(response: &'static str) -> Arc<Self> {
        Self::new(move |_| async move { Ok(Bytes::from_static(response.as_bytes())) })
    }

    /// Always fails the invoke call.
    pub fn failing() -> Arc<Self> {
        Self::new(|_| async { Err(InvokeError::Request("connection refused".into())) })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Name of the function invoked by the most recent call.
    pub fn last_function(&self) -> String {
        self.calls.lock().unwrap().last().expect("no invocations").0.clone()
    }

    /// The event decoded from the most recent call.
    pub fn last_event(&self) -> InvocationEvent {
        let calls = self.calls.lock().unwrap();
        let (_, payload) = calls.last().expect("no invocations");
        serde_json::from_slice(payload).expect("payload is an invocation event")
    }
}

#[async_trait]
impl Invoker for MockInvoker {
    async fn invoke(&self, function: &str, payload: Bytes) -> Result<Bytes, InvokeError> {
        self.calls
            .lock()
            .unwrap()
            .push((function.to_string(), payload.clone()));
        (self.reply)(payload).await
    }
}

/// A configuration with a single catch-all function named `name`.
pub fn config_for(name: &str) -> ProxyConfig {
    ProxyConfig {
        functions: vec![FunctionConfig::new(name)],
        ..ProxyConfig::default()
    }
}

/// Attach a peer address the way `into_make_service_with_connect_info` does.
pub fn from_peer(mut request: Request<Body>, peer: &str) -> Request<Body> {
    let addr: SocketAddr = peer.parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));
    request
}
