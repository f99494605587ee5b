//! Helpers for the `{success, message, ...}` envelope wrapped around every service response.

use crate::remote::types::{Failure, IndexId};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

const DEFAULT_REJECTION: &str = "request rejected by service";

/// Read a response body and return it when the envelope reports success.
pub(crate) async fn read_envelope(response: reqwest::Response) -> Result<Value, Failure> {
    let status = response.status();
    let body = response.text().await?;
    interpret(status, &body)
}

pub(crate) fn interpret(status: StatusCode, body: &str) -> Result<Value, Failure> {
    let parsed = serde_json::from_str::<Value>(body).ok();

    if status.is_success() {
        let value = parsed.ok_or_else(|| {
            Failure::Malformed(format!("expected a JSON body, got: {}", truncate(body)))
        })?;
        // A missing `success` field is treated as success.
        return match value.get("success").and_then(Value::as_bool) {
            Some(false) => Err(Failure::Rejected {
                status,
                message: message_of(&value),
            }),
            _ => Ok(value),
        };
    }

    match parsed {
        Some(value) if value.get("message").and_then(Value::as_str).is_some() => {
            Err(Failure::Rejected {
                status,
                message: message_of(&value),
            })
        }
        _ => Err(Failure::UnexpectedStatus {
            status,
            body: body.to_string(),
        }),
    }
}

/// Decode the payload fields of a successful envelope.
pub(crate) fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, Failure> {
    serde_json::from_value(value.clone()).map_err(|err| Failure::Malformed(err.to_string()))
}

/// Resolve the `indexed` field of an upload response.
///
/// A string is the identifier itself; `true` means the document is stored under the
/// requested name; `false` means nothing was indexed.
pub fn index_id_from(value: &Value, requested: &str) -> Result<IndexId, Failure> {
    match value.get("indexed") {
        Some(Value::String(id)) if !id.trim().is_empty() => Ok(IndexId(id.clone())),
        Some(Value::Bool(true)) => Ok(IndexId(requested.to_string())),
        Some(Value::Bool(false)) => Err(Failure::Rejected {
            status: StatusCode::OK,
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("document was not indexed")
                .to_string(),
        }),
        Some(other) => Err(Failure::Malformed(format!(
            "unexpected `indexed` value: {other}"
        ))),
        None => Err(Failure::Malformed("missing `indexed` field".to_string())),
    }
}

fn message_of(value: &Value) -> String {
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.trim().is_empty())
        .unwrap_or(DEFAULT_REJECTION)
        .to_string()
}

fn truncate(body: &str) -> String {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
