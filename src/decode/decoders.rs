//! Decoder implementations

use super::types::BodyDecoder;
use crate::error::{Error, Result};
use crate::types::Envelope;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;

// ============================================================================
// Envelope Decoder
// ============================================================================

/// Unwrap `{"success": ..., "data": D}` and return `data`
pub fn decode_envelope<D: DeserializeOwned>(body: &[u8]) -> Result<D> {
    serde_json::from_slice::<Envelope<D>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| Error::decode(format!("Failed to parse envelope: {e}")))
}

/// Envelope decoder handle
pub fn envelope<D: DeserializeOwned + 'static>() -> BodyDecoder<D> {
    Arc::new(decode_envelope::<D>)
}

// ============================================================================
// Plain JSON Decoder
// ============================================================================

/// Parse the whole body as `D`
pub fn decode_plain<D: DeserializeOwned>(body: &[u8]) -> Result<D> {
    serde_json::from_slice(body).map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
}

/// Plain JSON decoder handle
pub fn plain<D: DeserializeOwned + 'static>() -> BodyDecoder<D> {
    Arc::new(decode_plain::<D>)
}

// ============================================================================
// Raw Decoder
// ============================================================================

/// Pass the body through unchanged (export downloads)
pub fn raw() -> BodyDecoder<Bytes> {
    Arc::new(|body: &[u8]| Ok::<_, Error>(Bytes::copy_from_slice(body)))
}
