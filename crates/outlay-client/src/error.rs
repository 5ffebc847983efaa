//! Caller-facing error taxonomy for the request pipeline

use thiserror::Error;

/// Longest error body reproduced in Display output. The variant keeps the
/// full body for domain handling; Display is for logs and terminals.
const MAX_DISPLAY_BODY: usize = 200;

/// Errors surfaced by `Client` operations.
///
/// The pipeline recovers from exactly one condition on its own (a 401 with
/// a usable refresh token); every variant here is terminal for the call.
#[derive(Debug, Error)]
pub enum Error {
    /// The server was never reached or the exchange broke mid-flight
    #[error("network error: {0}")]
    Transport(String),

    /// Non-2xx from the API, passed through for the caller to interpret
    #[error("api returned {status}: {}", truncate_body(.body))]
    Api { status: u16, body: String },

    /// Credential renewal failed and the session has been cleared
    #[error("session expired, sign in again")]
    SessionExpired,

    /// A 2xx body that did not parse as the requested type
    #[error("decoding response body: {0}")]
    Decode(String),

    /// The credential file could not be read or written
    #[error("credential storage: {0}")]
    Storage(String),
}

/// Result alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_DISPLAY_BODY {
        return body.to_string();
    }
    let mut end = MAX_DISPLAY_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes total)", &body[..end], body.len())
}
