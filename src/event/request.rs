//! Request-to-event encoding.
//!
//! Produces the load balancer target-group request shape:
//!
//! ```json
//! {
//!   "httpMethod": "GET",
//!   "path": "/users",
//!   "multiValueHeaders": { "host": ["example.com"], ... },
//!   "multiValueQueryStringParameters": { "page": ["2"] },
//!   "requestContext": { "elb": { "targetGroupArn": "" } },
//!   "isBase64Encoded": false,
//!   "body": ""
//! }
//! ```

use std::collections::BTreeMap;

use axum::body::Body;
use axum::http::{header, request::Parts, HeaderMap, Request};
use serde::{Deserialize, Serialize};

use crate::event::EncodeError;
use crate::security::headers::ForwardedHeaders;
use crate::security::limits::buffer_body;

/// Multi-value map keyed by header or parameter name.
pub type MultiValueMap = BTreeMap<String, Vec<String>>;

/// The event sent to the function for one HTTP request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationEvent {
    #[serde(rename = "httpMethod")]
    pub method: String,

    pub path: String,

    /// Lower-cased header names; values keep their arrival order.
    #[serde(rename = "multiValueHeaders")]
    pub headers: MultiValueMap,

    #[serde(rename = "multiValueQueryStringParameters")]
    pub query_parameters: MultiValueMap,

    #[serde(rename = "requestContext")]
    pub request_context: RequestContext,

    #[serde(rename = "isBase64Encoded")]
    pub is_base64_encoded: bool,

    pub body: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub elb: ElbContext,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElbContext {
    #[serde(rename = "targetGroupArn")]
    pub target_group_arn: String,
}

impl InvocationEvent {
    /// Encode already-buffered request parts.
    ///
    /// `forwarded` is overlaid after the request's own headers are copied, so
    /// its four keys always win.
    pub fn from_parts(
        parts: &Parts,
        body: &[u8],
        forwarded: &ForwardedHeaders,
        target_group_arn: &str,
    ) -> Self {
        let mut headers = multi_value_headers(&parts.headers);
        forwarded.apply(&mut headers);

        Self {
            method: parts.method.as_str().to_string(),
            path: parts.uri.path().to_string(),
            headers,
            query_parameters: parse_query(parts.uri.query().unwrap_or_default()),
            request_context: RequestContext {
                elb: ElbContext {
                    target_group_arn: target_group_arn.to_string(),
                },
            },
            is_base64_encoded: false,
            body: String::from_utf8_lossy(body).into_owned(),
        }
    }

    /// Serialize to the invocation payload.
    pub fn to_payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Buffer the body of `request` and encode it.
///
/// A body read failure (including exceeding `max_body_bytes`) produces no
/// event at all.
pub async fn encode_request(
    request: Request<Body>,
    forwarded: &ForwardedHeaders,
    target_group_arn: &str,
    max_body_bytes: usize,
) -> Result<InvocationEvent, EncodeError> {
    let (parts, body) = request.into_parts();
    let body = buffer_body(body, max_body_bytes)
        .await
        .map_err(EncodeError::BodyRead)?;
    Ok(InvocationEvent::from_parts(&parts, &body, forwarded, target_group_arn))
}

/// The host the client addressed: the `Host` header, or the URI authority
/// for HTTP/2 requests that carry none.
pub fn request_host(parts: &Parts) -> String {
    parts
        .headers
        .get(header::HOST)
        .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
        .or_else(|| parts.uri.authority().map(|a| a.as_str().to_string()))
        .unwrap_or_default()
}

/// Copy headers into a multi-value map with lower-case names.
pub fn multi_value_headers(headers: &HeaderMap) -> MultiValueMap {
    let mut map = MultiValueMap::new();
    for (name, value) in headers {
        map.entry(name.as_str().to_ascii_lowercase())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }
    map
}

/// Split a raw query string on `&`, then on the first `=` of each segment.
///
/// No percent-decoding is performed. Segments with an empty key are dropped,
/// a segment without `=` maps to an empty value, and repeated keys append.
pub fn parse_query(query: &str) -> MultiValueMap {
    let mut params = MultiValueMap::new();
    for segment in query.split('&') {
        let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
        if key.is_empty() {
            continue;
        }
        params.entry(key.to_string()).or_default().push(value.to_string());
    }
    params
}
