//! Session state and teardown
//!
//! Session state is derived from the credential store on every probe, never
//! cached: an authenticated session is exactly "a pair is stored". Teardown
//! is the one autonomous corrective action the pipeline takes, and it is
//! idempotent, so a renewal failure racing an explicit sign-out cannot
//! double-fire.

use outlay_auth::CredentialStore;
use tracing::{debug, warn};

/// Caller-visible view of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Authenticated,
    Anonymous,
}

/// Derive the session state from the store.
pub async fn state(store: &CredentialStore) -> SessionState {
    if store.is_empty().await {
        SessionState::Anonymous
    } else {
        SessionState::Authenticated
    }
}

/// Clear the store and drop to anonymous.
///
/// Serves both explicit sign-out and renewal-failure teardown. An Err means
/// the file write failed; the in-memory session is anonymous regardless.
pub(crate) async fn terminate(store: &CredentialStore) -> outlay_auth::Result<()> {
    if store.is_empty().await {
        debug!("session already anonymous");
        return Ok(());
    }
    warn!("ending session, clearing stored credentials");
    store.clear().await
}
