//! Document codec.
//!
//! The keyspace is persisted as a gzip-compressed JSON object mapping keys
//! to values. JSON strings cannot carry arbitrary bytes, so each key and
//! value goes through a text encoding:
//!
//! - UTF-8 that does not start with [`BINARY_PREFIX`] is stored verbatim
//! - anything else is stored as [`BINARY_PREFIX`] followed by standard base64
//!
//! Decoding also accepts the legacy value shapes older writers produced:
//! `{"type":"Buffer","data":[...]}` objects, numbers and booleans.

use crate::error::{StoreError, StoreResult};
use crate::keyspace::Keyspace;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{Map, Value};
use std::io::{Read, Write};

/// Prefix marking a base64-encoded string.
pub const BINARY_PREFIX: &str = "base64:";

/// Gzip-compresses `data`.
pub fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Decompresses gzip `data`.
pub fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

/// Encodes bytes as a document string.
#[must_use]
pub fn encode_text(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.starts_with(BINARY_PREFIX) => text.to_string(),
        _ => format!("{BINARY_PREFIX}{}", STANDARD.encode(bytes)),
    }
}

/// Decodes a document string back into bytes.
pub fn decode_text(text: &str) -> StoreResult<Vec<u8>> {
    match text.strip_prefix(BINARY_PREFIX) {
        Some(encoded) => STANDARD
            .decode(encoded)
            .map_err(|e| StoreError::corruption(format!("invalid base64 string: {e}"))),
        None => Ok(text.as_bytes().to_vec()),
    }
}

/// Serializes and compresses the keyspace into a container payload.
pub fn encode_keyspace(keyspace: &Keyspace) -> StoreResult<Vec<u8>> {
    let object: Map<String, Value> = keyspace
        .entries()
        .map(|(k, v)| (encode_text(k), Value::String(encode_text(v))))
        .collect();

    let json = serde_json::to_vec(&Value::Object(object))
        .map_err(|e| StoreError::write(format!("failed to serialize keyspace: {e}")))?;
    compress(&json).map_err(|e| StoreError::write(format!("failed to compress keyspace: {e}")))
}

/// Decompresses and parses a container payload into a keyspace.
pub fn decode_keyspace(payload: &[u8]) -> StoreResult<Keyspace> {
    let json = decompress(payload)
        .map_err(|e| StoreError::corruption(format!("invalid gzip data: {e}")))?;
    let document: Value = serde_json::from_slice(&json)
        .map_err(|e| StoreError::corruption(format!("invalid document: {e}")))?;

    let Value::Object(object) = document else {
        return Err(StoreError::corruption("document is not a JSON object"));
    };

    object
        .into_iter()
        .map(|(k, v)| -> StoreResult<(Vec<u8>, Vec<u8>)> {
            let value = decode_value(&k, v)?;
            Ok((decode_text(&k)?, value))
        })
        .collect()
}

fn decode_value(key: &str, value: Value) -> StoreResult<Vec<u8>> {
    match value {
        Value::String(text) => decode_text(&text),
        Value::Number(n) => Ok(n.to_string().into_bytes()),
        Value::Bool(b) => Ok(b.to_string().into_bytes()),
        Value::Object(object) => decode_buffer_object(&object)
            .ok_or_else(|| StoreError::corruption(format!("unsupported value for key {key:?}"))),
        Value::Null | Value::Array(_) => Err(StoreError::corruption(format!(
            "unsupported value for key {key:?}"
        ))),
    }
}

// {"type":"Buffer","data":[1,2,3]}
fn decode_buffer_object(object: &Map<String, Value>) -> Option<Vec<u8>> {
    if object.get("type")?.as_str()? != "Buffer" {
        return None;
    }
    object
        .get("data")?
        .as_array()?
        .iter()
        .map(|b| b.as_u64().and_then(|b| u8::try_from(b).ok()))
        .collect()
}
