//! Decoder types
//!
//! Defines the injected decoder handle and the body formats it can be built for.

use super::decoders;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Injected `bytes -> D` decoder
pub type BodyDecoder<D> = Arc<dyn Fn(&[u8]) -> Result<D> + Send + Sync>;

/// Layout of a successful JSON response body
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    /// `{"success": true, "data": ...}` (default)
    #[default]
    Envelope,
    /// The body is the payload itself
    Plain,
}

impl BodyFormat {
    /// Build a decoder for this format
    pub fn decoder<D: DeserializeOwned + 'static>(self) -> BodyDecoder<D> {
        match self {
            BodyFormat::Envelope => decoders::envelope(),
            BodyFormat::Plain => decoders::plain(),
        }
    }
}
