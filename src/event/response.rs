//! Invocation result decoding.
//!
//! Payloads are classified before they are parsed. Anything whose first byte
//! is not `{` becomes a synthesized 500 response carrying the raw payload,
//! which keeps plain-text function output and runtime crash messages visible
//! to the client. Only payloads that look like an object but fail to parse
//! are decode errors.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::event::DecodeError;

/// Description carried by the synthesized fallback response.
pub const FALLBACK_DESCRIPTION: &str = "Can't decode Lambda response";

/// The function's answer in load balancer target-group response shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InvocationResponse {
    #[serde(deserialize_with = "null_as_default")]
    pub status_code: i64,

    #[serde(deserialize_with = "null_as_default")]
    pub status_description: String,

    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "BTreeMap::is_empty")]
    pub multi_value_headers: BTreeMap<String, Vec<String>>,

    #[serde(deserialize_with = "null_as_default")]
    pub body: String,

    #[serde(deserialize_with = "null_as_default")]
    pub is_base64_encoded: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A decoded payload, tagged with the path the decoder took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// The payload was a JSON object.
    Object(InvocationResponse),
    /// The payload was not an object; a 500 carrying it was synthesized.
    Fallback(InvocationResponse),
}

impl Decoded {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Decoded::Fallback(_))
    }

    pub fn into_response(self) -> InvocationResponse {
        match self {
            Decoded::Object(response) | Decoded::Fallback(response) => response,
        }
    }
}

impl InvocationResponse {
    /// Classify and decode a raw invocation payload.
    pub fn decode_payload(payload: &[u8]) -> Result<Decoded, DecodeError> {
        if !looks_like_object(payload) {
            return Ok(Decoded::Fallback(Self::fallback(payload)));
        }
        Ok(Decoded::Object(serde_json::from_slice(payload)?))
    }

    /// Decode a raw invocation payload, discarding how it was classified.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_payload(payload).map(Decoded::into_response)
    }

    /// The response used when a payload is not a JSON object.
    pub fn fallback(payload: &[u8]) -> Self {
        Self {
            status_code: 500,
            status_description: FALLBACK_DESCRIPTION.to_string(),
            headers: BTreeMap::new(),
            multi_value_headers: BTreeMap::new(),
            body: String::from_utf8_lossy(payload).into_owned(),
            is_base64_encoded: false,
        }
    }
}

/// A payload is parsed only when its very first byte opens an object.
pub fn looks_like_object(payload: &[u8]) -> bool {
    payload.first() == Some(&b'{')
}
