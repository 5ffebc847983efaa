//! Error types for credential operations

/// Errors from the token protocol and credential storage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// HTTP transport failure (endpoint unreachable, request aborted)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The endpoint answered with a non-2xx status
    #[error("endpoint rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// A successful response whose body did not match the expected shape
    #[error("invalid response body: {0}")]
    Parse(String),

    /// Stored credential file could not be parsed
    #[error("credential parse error: {0}")]
    CredentialParse(String),

    /// File system error reading or writing the credential file
    #[error("I/O error: {0}")]
    Io(String),

    /// An operation that needs a stored credential found none
    #[error("no stored credential: {0}")]
    MissingCredential(String),
}

/// Result alias for credential operations
pub type Result<T> = std::result::Result<T, Error>;
