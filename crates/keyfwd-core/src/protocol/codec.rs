//! JSON codec for the single-field key message.
//!
//! Wire body (before encryption):
//! ```text
//! {"VkCode":174}
//! ```
//! The record is versionless and self-describing.  Unknown fields are ignored
//! on decode; a missing or non-integer `VkCode` is a [`DecodeError`].  Only a
//! JSON object is accepted: the positional `[174]` form serde would otherwise
//! allow for a struct is rejected.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::keys::KeyCode;

/// The logical unit of transfer: one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "VkCode")]
    pub vk_code: KeyCode,
}

/// A key message could not be serialised.
#[derive(Debug, Error)]
#[error("failed to serialise key message: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// Bytes did not parse as a key message.  Always droppable, never fatal.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Zero-length input.
    #[error("empty key message")]
    Empty,

    /// Truncated JSON, wrong shape, or a `VkCode` outside the key-code range.
    #[error("malformed key message: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Serialises `code` as `{"VkCode":<code>}`.
///
/// # Errors
///
/// Returns [`EncodeError`] if serialisation fails.
///
/// # Examples
///
/// ```rust
/// use keyfwd_core::{decode_message, encode_message, KeyCode};
///
/// let bytes = encode_message(KeyCode(174)).unwrap();
/// assert_eq!(bytes, br#"{"VkCode":174}"#);
/// assert_eq!(decode_message(&bytes).unwrap(), KeyCode(174));
/// ```
pub fn encode_message(code: KeyCode) -> Result<Vec<u8>, EncodeError> {
    Ok(serde_json::to_vec(&Message { vk_code: code })?)
}

/// Parses a `{"VkCode":<code>}` record and returns the key code.
///
/// # Errors
///
/// Returns [`DecodeError`] on empty, truncated, or malformed input.
pub fn decode_message(bytes: &[u8]) -> Result<KeyCode, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let record: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(bytes)?;
    let message: Message = serde_json::from_value(serde_json::Value::Object(record))?;
    Ok(message.vk_code)
}
