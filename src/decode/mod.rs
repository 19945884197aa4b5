//! Response decoder module
//!
//! Supports: `{success, data}` envelopes, plain JSON bodies, raw bytes
//!
//! # Overview
//!
//! A decoder turns the body of a successful response into a typed value. The
//! fetcher receives it as an injected [`BodyDecoder`], so endpoints choose
//! between unwrapping an envelope, parsing the body as-is, or passing the
//! bytes through for export downloads.

mod decoders;
mod types;

pub use decoders::{decode_envelope, decode_plain, envelope, plain, raw};
pub use types::{BodyDecoder, BodyFormat};

#[cfg(test)]
mod tests;
