//! Envelope decoder for the warranty backend.
//!
//! # Design
//! The backend wraps every payload in one of three shapes that accumulated
//! over its lifetime:
//!
//! - `{"result":"success","data":...,"message","errorCode",...}`
//! - `{"code":"SS004","messages":{"vn":"...","en":"..."}}`
//! - `{"result":"error","message":"...","errorCode":"..."}`
//!
//! `decode` classifies a parsed body into a closed `Decoded` enum. It is a
//! pure function of its input and never panics; anything it cannot classify
//! becomes `Decoded::Malformed` carrying the offending body.
//!
//! The `code` + `messages` check runs before the `result` check, so a body
//! that satisfies both the fail and the success tests is a failure.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{NormalizedError, FALLBACK_MESSAGE, MALFORMED_MESSAGE};

/// Locale consulted first when picking a message out of `messages`.
const PRIMARY_LOCALE: &str = "vn";
/// Locale consulted after the top-level `message` field.
const SECONDARY_LOCALE: &str = "en";

/// Outcome of classifying one response body.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// `result == "success"`; `None` when the envelope carried no `data`.
    Success(Option<Value>),
    /// A well-formed failure envelope, new or old style.
    Fail(NormalizedError),
    /// The body matched no known envelope.
    Malformed(NormalizedError),
}

impl Decoded {
    pub fn into_result(self) -> Result<Option<Value>, NormalizedError> {
        match self {
            Decoded::Success(data) => Ok(data),
            Decoded::Fail(err) | Decoded::Malformed(err) => Err(err),
        }
    }
}

/// Success envelope as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEnvelope<T> {
    #[serde(default)]
    pub time_stamp: String,
    #[serde(default)]
    pub security_version: String,
    pub result: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> SuccessEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            time_stamp: String::new(),
            security_version: String::new(),
            result: "success".to_string(),
            message: String::new(),
            error_code: String::new(),
            data: Some(data),
        }
    }

    /// Old-style failure: success-shaped with `result: "error"`.
    pub fn error(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            time_stamp: String::new(),
            security_version: String::new(),
            result: "error".to_string(),
            message: message.into(),
            error_code: error_code.into(),
            data: None,
        }
    }
}

/// New-style failure envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailEnvelope {
    pub code: String,
    pub messages: BTreeMap<String, String>,
}

impl FailEnvelope {
    pub fn new(code: impl Into<String>, vn: impl Into<String>, en: impl Into<String>) -> Self {
        let mut messages = BTreeMap::new();
        messages.insert(PRIMARY_LOCALE.to_string(), vn.into());
        messages.insert(SECONDARY_LOCALE.to_string(), en.into());
        Self {
            code: code.into(),
            messages,
        }
    }
}

/// Classify a parsed response body.
pub fn decode(body: &Value) -> Decoded {
    let Some(obj) = body.as_object() else {
        return Decoded::Malformed(NormalizedError::malformed(MALFORMED_MESSAGE, body.clone()));
    };

    if let (Some(Value::String(code)), Some(Value::Object(messages))) =
        (obj.get("code"), obj.get("messages"))
    {
        return Decoded::Fail(NormalizedError::business(
            Some(code.clone()),
            Some(string_entries(messages)),
            resolve_message(obj),
            body.clone(),
        ));
    }

    match obj.get("result").and_then(Value::as_str) {
        Some("success") => Decoded::Success(obj.get("data").cloned()),
        Some("error") => {
            let code = non_empty_str(obj.get("code"))
                .or_else(|| non_empty_str(obj.get("errorCode")))
                .map(str::to_string);
            let messages = obj
                .get("messages")
                .and_then(Value::as_object)
                .map(string_entries);
            Decoded::Fail(NormalizedError::business(
                code,
                messages,
                resolve_message(obj),
                body.clone(),
            ))
        }
        _ => Decoded::Malformed(NormalizedError::malformed(MALFORMED_MESSAGE, body.clone())),
    }
}

/// Decode and deserialize the success payload into `T`.
///
/// An absent payload is offered to `T` as JSON `null`, so `()` and
/// `Option<_>` accept it.
pub fn decode_as<T: DeserializeOwned>(body: &Value) -> Result<T, NormalizedError> {
    let data = decode(body).into_result()?.unwrap_or(Value::Null);
    serde_json::from_value(data).map_err(|e| {
        NormalizedError::malformed(
            format!("response payload does not match the expected type: {e}"),
            body.clone(),
        )
    })
}

/// Pick the human-readable text for a failure body.
///
/// Order: `messages.vn`, top-level `message`, `messages.en`, any other
/// string in `messages`, then the fallback.
fn resolve_message(obj: &Map<String, Value>) -> String {
    let messages = obj.get("messages").and_then(Value::as_object);

    localized(messages, PRIMARY_LOCALE)
        .or_else(|| non_empty_str(obj.get("message")))
        .or_else(|| localized(messages, SECONDARY_LOCALE))
        .or_else(|| messages.and_then(|m| m.values().find_map(|v| non_empty_str(Some(v)))))
        .unwrap_or(FALLBACK_MESSAGE)
        .to_string()
}

fn localized<'a>(messages: Option<&'a Map<String, Value>>, locale: &str) -> Option<&'a str> {
    messages.and_then(|m| non_empty_str(m.get(locale)))
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

fn string_entries(messages: &Map<String, Value>) -> BTreeMap<String, String> {
    messages
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect()
}
