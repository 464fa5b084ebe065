//! Per-request orchestration: encode, invoke, decode, write.
//!
//! # Status mapping
//! | failure                         | status |
//! |---------------------------------|--------|
//! | body read / encode              | 400    |
//! | event marshal                   | 500    |
//! | invocation                      | 502    |
//! | malformed JSON payload          | 500    |
//! | response write                  | 500    |
//!
//! Configured `header_up` rules run before the forwarding headers are
//! synthesized, so they can never override `host` or `x-forwarded-*`.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::config::FunctionConfig;
use crate::event::request::request_host;
use crate::event::{encode_request, DecodeError, EncodeError, InvocationResponse};
use crate::http::response::{write_response, WriteError};
use crate::http::rules::{HeaderRules, RuleError};
use crate::invoke::{InvokeError, Invoker};
use crate::observability::metrics::{self, InvocationOutcome};
use crate::security::headers::ForwardedHeaders;

/// Everything needed to serve requests routed to one function.
pub struct FunctionTarget {
    pub name: String,
    pub target_group_arn: String,
    pub header_up: HeaderRules,
    pub header_down: HeaderRules,
    pub invoker: Arc<dyn Invoker>,
}

impl FunctionTarget {
    pub fn from_config(config: &FunctionConfig, invoker: Arc<dyn Invoker>) -> Result<Self, RuleError> {
        Ok(Self {
            name: config.name.clone(),
            target_group_arn: config.target_group_arn.clone(),
            header_up: HeaderRules::compile(&config.header_up)?,
            header_down: HeaderRules::compile(&config.header_down)?,
            invoker,
        })
    }
}

impl std::fmt::Debug for FunctionTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTarget")
            .field("name", &self.name)
            .field("target_group_arn", &self.target_group_arn)
            .finish_non_exhaustive()
    }
}

/// Connection facts resolved before dispatch.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    /// Resolved client address, with or without port.
    pub client_addr: String,
    /// Whether the client connection is TLS-terminated here.
    pub tls: bool,
    pub max_body_bytes: usize,
}

/// A failed exchange, mapped to exactly one status code.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("failed to marshal invocation event: {0}")]
    Marshal(serde_json::Error),
    #[error(transparent)]
    Invoke(#[from] InvokeError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("failed to write response: {0}")]
    Write(#[from] WriteError),
}

impl DispatchError {
    pub fn status(&self) -> StatusCode {
        match self {
            DispatchError::Encode(_) => StatusCode::BAD_REQUEST,
            DispatchError::Invoke(_) => StatusCode::BAD_GATEWAY,
            DispatchError::Marshal(_) | DispatchError::Decode(_) | DispatchError::Write(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for DispatchError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, status.canonical_reason().unwrap_or_default()).into_response()
    }
}

/// Serve one request through `target`.
pub async fn dispatch(
    request: Request<Body>,
    ctx: &DispatchContext,
    target: &FunctionTarget,
) -> Result<Response, DispatchError> {
    let (mut parts, body) = request.into_parts();
    target.header_up.apply(&mut parts.headers);

    let forwarded = ForwardedHeaders::new(&ctx.client_addr, ctx.tls, request_host(&parts));
    let event = encode_request(
        Request::from_parts(parts, body),
        &forwarded,
        &target.target_group_arn,
        ctx.max_body_bytes,
    )
    .await?;
    let payload = event.to_payload().map_err(DispatchError::Marshal)?;

    tracing::debug!(
        function = %target.name,
        method = %event.method,
        path = %event.path,
        client_ip = %forwarded.client_ip(),
        proto = forwarded.proto(),
        payload_bytes = payload.len(),
        "Invoking function"
    );

    let raw = invoke_once(target, Bytes::from(payload)).await?;

    let decoded = InvocationResponse::decode_payload(&raw)?;
    if decoded.is_fallback() {
        tracing::warn!(
            function = %target.name,
            payload_bytes = raw.len(),
            "Function returned a non-JSON payload"
        );
        metrics::record_fallback(&target.name);
    }

    Ok(write_response(decoded.into_response(), &target.header_down)?)
}

/// Invoke on a detached task. Dropping the request future (client
/// disconnect, request timeout) does not cancel the invocation; it ends on
/// the invoker's own timeout.
async fn invoke_once(target: &FunctionTarget, payload: Bytes) -> Result<Bytes, InvokeError> {
    let invoker = Arc::clone(&target.invoker);
    let function = target.name.clone();

    let task = tokio::spawn(async move {
        let start = Instant::now();
        let result = invoker.invoke(&function, payload).await;
        let outcome = match &result {
            Ok(_) => InvocationOutcome::Success,
            Err(InvokeError::Function { .. }) => InvocationOutcome::FunctionError,
            Err(InvokeError::Timeout(_)) => InvocationOutcome::Timeout,
            Err(InvokeError::Request(_)) => InvocationOutcome::Failed,
        };
        metrics::record_invocation(&function, outcome, start);
        result
    });

    task.await
        .map_err(|e| InvokeError::Request(format!("invocation task failed: {e}")))?
}
