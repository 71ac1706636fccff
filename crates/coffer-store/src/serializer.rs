//! Named-field value encoding.
//!
//! Values are stored as a JSON envelope `{"type": <type name>, "value": ..}`.
//! Field names, not positions, identify data, which lets stored values
//! survive shape changes: fields removed since the write are ignored, and
//! fields added since the write take their default when the shape carries
//! the `#[serde(default)]` container attribute:
//!
//! ```
//! # use serde::{Deserialize, Serialize};
//! #[derive(Default, Serialize, Deserialize)]
//! #[serde(default)]
//! struct User {
//!     name: String,
//!     email: String, // added later; older entries read back as ""
//! }
//! ```
//!
//! The stored value is handed to serde as is. Maps, enums and `Option`s
//! decode to exactly what was written, whatever their `Default` is.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    #[serde(rename = "type")]
    logical_type: &'a str,
    value: Value,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    logical_type: String,
    value: Value,
}

/// Encodes values to durable bytes and back.
#[derive(Clone, Copy, Debug, Default)]
pub struct Serializer;

impl Serializer {
    /// Encode a value.
    ///
    /// Fails with [`StoreError::NullRootValue`] when the value itself encodes
    /// to `null` (e.g. `None` or `()`).
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> StoreResult<Vec<u8>> {
        let value =
            serde_json::to_value(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        if value.is_null() {
            return Err(StoreError::NullRootValue);
        }
        let envelope = EnvelopeRef {
            logical_type: std::any::type_name::<T>(),
            value,
        };
        serde_json::to_vec(&envelope).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Decode the value stored under `key`.
    ///
    /// `key` only labels errors. The `Default` bound is what lets
    /// `#[serde(default)]` shapes fill in fields missing from older entries.
    pub fn decode<T>(&self, key: &str, bytes: &[u8]) -> StoreResult<T>
    where
        T: DeserializeOwned + Default,
    {
        let envelope: Envelope = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::corrupt(key, format!("malformed envelope: {e}")))?;

        let target = std::any::type_name::<T>();
        if envelope.logical_type != target {
            debug!(key, stored = %envelope.logical_type, target, "decoding into a different type");
        }

        serde_json::from_value(envelope.value).map_err(|e| StoreError::corrupt(key, e.to_string()))
    }

    /// The logical type name recorded when `bytes` were encoded.
    pub fn peek_type(&self, key: &str, bytes: &[u8]) -> StoreResult<String> {
        let envelope: Envelope = serde_json::from_slice(bytes)
            .map_err(|e| StoreError::corrupt(key, format!("malformed envelope: {e}")))?;
        Ok(envelope.logical_type)
    }
}
