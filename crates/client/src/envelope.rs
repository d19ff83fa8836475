//! The internal API's `{code, message, data}` envelope.

use serde::Deserialize;
use serde_json::Value;

use crate::error::{messages, Error, ErrorKind, Result};

/// Envelope code signalling success.
pub const SUCCESS_CODE: i64 = 0;

/// Business code reported when the envelope's `code` is missing or not an integer.
pub const UNKNOWN_CODE: i64 = -1;

/// Wire shape of an internal API response.
///
/// `code` is kept as raw JSON: only a numeric zero (`0` or `0.0`) is success,
/// anything else, including a missing or string code, is a business failure.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T = Value> {
    /// Business status.
    #[serde(default)]
    pub code: Value,
    /// Human-readable status message.
    #[serde(default)]
    pub message: Option<String>,
    /// Payload handed to the caller on success.
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Returns true if `code` is numeric zero.
    pub fn is_success(&self) -> bool {
        self.code.as_f64() == Some(0.0)
    }

    /// The business code as an integer, or [`UNKNOWN_CODE`].
    pub fn business_code(&self) -> i64 {
        match &self.code {
            Value::Number(n) => n.as_i64().unwrap_or(UNKNOWN_CODE),
            Value::String(s) => s.trim().parse().unwrap_or(UNKNOWN_CODE),
            _ => UNKNOWN_CODE,
        }
    }

    /// Split the envelope into its payload or a business error.
    pub fn into_result(self) -> Result<Option<T>> {
        if self.is_success() {
            return Ok(self.data);
        }

        let code = self.business_code();
        let message = self
            .message
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| messages::REQUEST_FAILED.to_string());

        Err(Error::new(ErrorKind::Business { code, message }))
    }
}

/// Decode an envelope body and return the raw `data` payload.
///
/// A successful envelope without `data` yields JSON `null`. Bodies that are
/// not JSON objects are `InvalidEnvelope`.
pub fn unwrap(body: &[u8]) -> Result<Value> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        Error::with_source(ErrorKind::InvalidEnvelope(e.to_string()), e)
    })?;
    if !value.is_object() {
        return Err(Error::new(ErrorKind::InvalidEnvelope(
            "envelope is not a JSON object".to_string(),
        )));
    }

    let envelope: Envelope = serde_json::from_value(value).map_err(|e| {
        Error::with_source(ErrorKind::InvalidEnvelope(e.to_string()), e)
    })?;

    Ok(envelope.into_result()?.unwrap_or(Value::Null))
}
