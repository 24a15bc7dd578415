//! Purpose: Decode etcd JSON error envelopes and pull entity names out of their messages.
//! Exports: `parse_full`, `parse_reduced`, `extract_name`, `role_conflict`, `user_conflict`.
//! Role: Leaf parser used by the response classifier.
//! Invariants: The full shape requires `errorCode`, `message`, `cause`, and `index`.
//! Invariants: Parsing is stateless; patterns are immutable once built.
use super::error::{ApiResult, Error, ErrorKind};
use super::node::ErrorMessage;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

static ROLE_CONFLICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Role (.+) already exists").expect("role conflict pattern"));
static USER_CONFLICT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"User (.+) already exists").expect("user conflict pattern"));

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FullEnvelope {
    error_code: i64,
    message: String,
    cause: String,
    index: u64,
}

#[derive(Deserialize)]
struct ReducedEnvelope {
    message: String,
}

/// Key-space error envelope: `{"errorCode", "message", "cause", "index"}`.
pub fn parse_full(body: &str) -> ApiResult<ErrorMessage> {
    let envelope: FullEnvelope = serde_json::from_str(body).map_err(invalid_envelope)?;
    Ok(ErrorMessage::new(
        envelope.error_code,
        envelope.message,
        envelope.cause,
        envelope.index,
    ))
}

/// Auth/membership error envelope: `{"message"}` only.
pub fn parse_reduced(body: &str) -> ApiResult<ErrorMessage> {
    let envelope: ReducedEnvelope = serde_json::from_str(body).map_err(invalid_envelope)?;
    Ok(ErrorMessage::message_only(envelope.message))
}

/// First capture group of `pattern` in `message`.
pub fn extract_name(pattern: &Regex, message: &str) -> Option<String> {
    pattern
        .captures(message)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

pub fn role_conflict(message: &str) -> Option<String> {
    extract_name(&ROLE_CONFLICT, message)
}

pub fn user_conflict(message: &str) -> Option<String> {
    extract_name(&USER_CONFLICT, message)
}

fn invalid_envelope(err: serde_json::Error) -> Error {
    Error::new(ErrorKind::Internal)
        .with_message("invalid etcd error envelope")
        .with_source(err)
}
