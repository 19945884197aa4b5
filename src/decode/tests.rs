//! Tests for the decode module

use super::*;
use crate::error::Error;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize, PartialEq)]
struct ChainInfo {
    #[serde(rename = "blockHeight")]
    block_height: i64,
}

// ============================================================================
// Envelope Decoder Tests
// ============================================================================

#[test]
fn test_envelope_unwraps_data() {
    let body = br#"{"success": true, "data": {"blockHeight": 250}}"#;
    let info: ChainInfo = decode_envelope(body).unwrap();
    assert_eq!(info, ChainInfo { block_height: 250 });
}

#[test]
fn test_envelope_without_success_flag() {
    let body = br#"{"data": [1, 2, 3]}"#;
    let data: Vec<u32> = decode_envelope(body).unwrap();
    assert_eq!(data, vec![1, 2, 3]);
}

#[test]
fn test_envelope_missing_data_is_decode_error() {
    let body = br#"{"success": true}"#;
    let err = decode_envelope::<Vec<u32>>(body).unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}

#[test]
fn test_envelope_malformed_body() {
    let decoder = envelope::<Value>();
    let err = decoder(b"<html>maintenance</html>".as_slice()).unwrap_err();
    assert!(err.to_string().starts_with("Failed to decode response"));
    assert!(!err.is_transient());
}

// ============================================================================
// Plain / Raw Decoder Tests
// ============================================================================

#[test]
fn test_plain_decoder() {
    let decoder = plain::<Value>();
    let value = decoder(br#"{"items": [], "total": 0}"#.as_slice()).unwrap();
    assert_eq!(value, json!({"items": [], "total": 0}));
}

#[test]
fn test_raw_decoder_passes_bytes_through() {
    let csv = b"block_time,amount\n1700000000,42\n";
    let decoder = raw();
    let bytes = decoder(csv.as_slice()).unwrap();
    assert_eq!(&bytes[..], &csv[..]);
}

#[test]
fn test_raw_decoder_accepts_empty_body() {
    assert!(raw()(b"".as_slice()).unwrap().is_empty());
}

// ============================================================================
// BodyFormat Tests
// ============================================================================

#[test]
fn test_body_format_default() {
    assert_eq!(BodyFormat::default(), BodyFormat::Envelope);
}

#[test]
fn test_body_format_selects_decoder() {
    let body: &[u8] = br#"{"success": true, "data": 7}"#;

    let wrapped: Value = BodyFormat::Envelope.decoder()(body).unwrap();
    assert_eq!(wrapped, json!(7));

    let whole: Value = BodyFormat::Plain.decoder()(body).unwrap();
    assert_eq!(whole["data"], 7);
}
