//! HTTP status interpretation
//!
//! Maps a response status (and, for 400, its body) onto the crate's error
//! taxonomy. Only `200 OK` is a success.

use crate::error::{Error, Result};
use crate::types::ErrorEnvelope;
use reqwest::StatusCode;
use std::sync::Arc;

/// Pluggable `(status, body) -> Result<()>` check run before decoding
pub type StatusInterpreter = Arc<dyn Fn(StatusCode, &[u8]) -> Result<()> + Send + Sync>;

/// Default status mapping
pub fn interpret_status(status: StatusCode, body: &[u8]) -> Result<()> {
    match status {
        StatusCode::OK => Ok(()),
        StatusCode::BAD_REQUEST => Err(bad_request(body)),
        StatusCode::UNAUTHORIZED => Err(Error::Unauthorized),
        StatusCode::FORBIDDEN => Err(Error::Forbidden),
        StatusCode::NOT_FOUND => Err(Error::NotFound),
        StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited),
        StatusCode::INTERNAL_SERVER_ERROR => Err(Error::ServerError),
        other => Err(Error::UnknownStatus {
            status: other.as_u16(),
        }),
    }
}

/// Default interpreter as a shareable handle
pub fn default_status_interpreter() -> StatusInterpreter {
    Arc::new(interpret_status)
}

fn bad_request(body: &[u8]) -> Error {
    match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => Error::client_error(envelope.errors.to_string()),
        Err(e) => Error::client_error(format!("can not unmarshal body: {e}")),
    }
}
