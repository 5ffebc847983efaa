//! Credential handling for the budgeting API
//!
//! Owns the credential pair, its durable storage, and the unauthenticated
//! token protocol. The request pipeline in `outlay-client` builds on this
//! crate; nothing here dispatches ordinary API calls.
//!
//! Credential flow:
//! 1. Caller exchanges username/password via `token::obtain_pair()`
//! 2. The pair lands in `credentials::CredentialStore::set()`
//! 3. When the API rejects the access token, `token::refresh_access()`
//!    presents the refresh token for a new one
//! 4. The renewed pair is stored via `credentials::CredentialStore::set()`
//! 5. Sign-out removes the pair via `credentials::CredentialStore::clear()`

pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod token;

pub use credentials::{CredentialPair, CredentialStore};
pub use error::{Error, Result};
pub use token::{RefreshResponse, TokenResponse};
