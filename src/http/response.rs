//! Writing a decoded invocation response onto the client response.
//!
//! Everything that can fail (status validation, base64 decoding) runs before
//! the `Response` value exists, so a failure never leaves a half-built
//! response behind.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::event::InvocationResponse;
use crate::http::rules::HeaderRules;

/// Content type used when the function does not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Failure to turn an invocation response into an HTTP response.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("invalid status code {0}")]
    InvalidStatus(i64),
    #[error("invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Build the client response for `response`.
///
/// Single-value headers are appended before multi-value ones, so a name
/// present in both maps carries all values, single-value first. Configured
/// `rules` run after the content-type default.
pub fn write_response(
    response: InvocationResponse,
    rules: &HeaderRules,
) -> Result<Response, WriteError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &response.headers {
        append_header(&mut headers, name, value);
    }
    for (name, values) in &response.multi_value_headers {
        for value in values {
            append_header(&mut headers, name, value);
        }
    }
    if !headers.contains_key(header::CONTENT_TYPE) {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
    }
    rules.apply(&mut headers);

    let status = effective_status(response.status_code)?;

    let body = if status == StatusCode::NO_CONTENT {
        Body::empty()
    } else if response.is_base64_encoded && !response.body.is_empty() {
        Body::from(STANDARD.decode(response.body.as_bytes())?)
    } else {
        Body::from(response.body)
    };

    let mut out = Response::new(body);
    *out.status_mut() = status;
    *out.headers_mut() = headers;
    Ok(out)
}

/// Non-positive codes mean "not set" and become 200.
pub fn effective_status(code: i64) -> Result<StatusCode, WriteError> {
    if code <= 0 {
        return Ok(StatusCode::OK);
    }
    u16::try_from(code)
        .ok()
        .and_then(|code| StatusCode::from_u16(code).ok())
        .ok_or(WriteError::InvalidStatus(code))
}

fn append_header(headers: &mut HeaderMap, name: &str, value: &str) {
    match (
        HeaderName::from_bytes(name.as_bytes()),
        HeaderValue::from_str(value),
    ) {
        (Ok(name), Ok(value)) => {
            headers.append(name, value);
        }
        _ => tracing::warn!(header = %name, "Dropping invalid response header from function"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::config::HeaderRulesConfig;

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn write(response: InvocationResponse) -> Result<Response, WriteError> {
        write_response(response, &HeaderRules::default())
    }

    #[tokio::test]
    async fn no_content_suppresses_body() {
        let decoded = InvocationResponse::decode(br#"{"statusCode":204,"body":"ignored"}"#).unwrap();
        let response = write(decoded).unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn base64_body_is_decoded() {
        let decoded = InvocationResponse::decode(
            br#"{"statusCode":200,"isBase64Encoded":true,"body":"aGVsbG8="}"#,
        )
        .unwrap();
        let response = write(decoded).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"hello");
    }

    #[tokio::test]
    async fn empty_base64_body_is_empty() {
        let decoded = InvocationResponse {
            is_base64_encoded: true,
            ..InvocationResponse::default()
        };
        let response = write(decoded).unwrap();
        assert!(body_bytes(response).await.is_empty());
    }

    #[test]
    fn invalid_base64_is_an_error() {
        let decoded = InvocationResponse {
            is_base64_encoded: true,
            body: "***".into(),
            ..InvocationResponse::default()
        };
        assert!(matches!(write(decoded), Err(WriteError::Base64(_))));
    }

    #[test]
    fn status_defaults_and_validation() {
        assert_eq!(effective_status(0).unwrap(), StatusCode::OK);
        assert_eq!(effective_status(-5).unwrap(), StatusCode::OK);
        assert_eq!(effective_status(418).unwrap(), StatusCode::IM_A_TEAPOT);
        assert!(matches!(effective_status(42), Err(WriteError::InvalidStatus(42))));
        assert!(matches!(effective_status(70_000), Err(WriteError::InvalidStatus(70_000))));
    }

    #[tokio::test]
    async fn headers_merge_single_then_multi() {
        let decoded = InvocationResponse {
            status_code: 201,
            headers: BTreeMap::from([
                ("Set-Cookie".into(), "first=1".into()),
                ("Content-Type".into(), "text/plain".into()),
            ]),
            multi_value_headers: BTreeMap::from([(
                "set-cookie".into(),
                vec!["second=2".into(), "third=3".into()],
            )]),
            body: "created".into(),
            ..InvocationResponse::default()
        };
        let response = write(decoded).unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let cookies: Vec<_> = response.headers().get_all("set-cookie").iter().collect();
        assert_eq!(cookies, vec!["first=1", "second=2", "third=3"]);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert_eq!(body_bytes(response).await, b"created");
    }

    #[test]
    fn content_type_defaults_to_json() {
        let response = write(InvocationResponse::default()).unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn invalid_function_headers_are_dropped() {
        let decoded = InvocationResponse {
            headers: BTreeMap::from([
                ("bad name".into(), "x".into()),
                ("x-good".into(), "y".into()),
            ]),
            ..InvocationResponse::default()
        };
        let response = write(decoded).unwrap();
        assert_eq!(response.headers().len(), 2);
        assert_eq!(response.headers()["x-good"], "y");
    }

    #[test]
    fn header_down_rules_run_after_defaults() {
        let mut config = HeaderRulesConfig::default();
        config.set.insert("content-type".into(), "text/html".into());
        config.delete.push("x-powered-by".into());
        let rules = HeaderRules::compile(&config).unwrap();

        let decoded = InvocationResponse {
            headers: BTreeMap::from([("X-Powered-By".into(), "lambda".into())]),
            ..InvocationResponse::default()
        };
        let response = write_response(decoded, &rules).unwrap();
        assert_eq!(response.headers()["content-type"], "text/html");
        assert!(response.headers().get("x-powered-by").is_none());
    }

    #[tokio::test]
    async fn fallback_response_is_written_verbatim() {
        let decoded = InvocationResponse::decode(b"Task timed out").unwrap();
        let response = write(decoded).unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_bytes(response).await, b"Task timed out");
    }
}
