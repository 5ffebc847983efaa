//! Durable storage for the credential pair
//!
//! Persists the current access/refresh pair to a JSON file so a session
//! survives process restarts. All writes go through an atomic temp-file +
//! rename, and a tokio Mutex serializes readers and writers, so a renewal
//! racing a sign-out cannot leave half a pair behind.
//!
//! The file holds either `null` (anonymous) or the serialized pair. It is
//! the single source of truth: the request pipeline reads it at dispatch
//! time and derives session state from it, never from a cached flag.

use std::path::{Path, PathBuf};

use common::Secret;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// The current session's tokens.
///
/// `access` is short-lived and stamped on ordinary API calls; `refresh` is
/// longer-lived and shown only to the refresh endpoint. The pair is replaced
/// or removed whole, never half-updated. Both tokens are opaque strings:
/// nothing decodes them or tracks expiry locally, the server's 401 is the
/// only expiry signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialPair {
    /// Bearer token for ordinary API calls
    pub access: Secret<String>,
    /// Token presented to the refresh endpoint for a new access token
    pub refresh: Secret<String>,
}

impl CredentialPair {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: Secret::new(access.into()),
            refresh: Secret::new(refresh.into()),
        }
    }
}

/// Thread-safe store for the single current credential pair.
///
/// Reads clone the in-memory pair so callers never hold the lock across a
/// network call.
#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    state: Mutex<Option<CredentialPair>>,
}

impl CredentialStore {
    /// Load the credential pair from the given file path.
    ///
    /// A missing file means an anonymous session. The file (and its parent
    /// directory) is created on first load so later loads skip the
    /// cold-start path.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let pair: Option<CredentialPair> = serde_json::from_str(&contents)
                .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?;
            info!(
                path = %path.display(),
                authenticated = pair.is_some(),
                "loaded credential file"
            );
            pair
        } else {
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| Error::Io(format!("creating credential directory: {e}")))?;
            }
            info!(path = %path.display(), "no credential file, starting anonymous");
            write_atomic(&path, &None).await?;
            None
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    /// Get a clone of the current pair, if any.
    pub async fn get(&self) -> Option<CredentialPair> {
        let state = self.state.lock().await;
        state.clone()
    }

    /// Replace the pair (both tokens at once) and persist it.
    ///
    /// Disk first, then memory: a pair this process cannot persist is not
    /// adopted, so memory and file never disagree about which tokens exist.
    pub async fn set(&self, pair: CredentialPair) -> Result<()> {
        let mut state = self.state.lock().await;
        let next = Some(pair);
        write_atomic(&self.path, &next).await?;
        *state = next;
        debug!("stored credential pair");
        Ok(())
    }

    /// Remove the pair and persist the anonymous state.
    ///
    /// Clearing an already-empty store is a successful no-op. The in-memory
    /// pair is dropped even when the file write fails: sign-out must hold
    /// for the running process, and a stale file self-corrects on the next
    /// start when the dead pair is rejected and cleared again.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            return Ok(());
        }
        *state = None;
        debug!("cleared credential pair");
        write_atomic(&self.path, &state).await
    }

    /// Whether no pair is stored (anonymous session).
    pub async fn is_empty(&self) -> bool {
        let state = self.state.lock().await;
        state.is_none()
    }
}

/// Write the credential state to a file atomically.
///
/// Writes a temp file in the same directory, then renames it over the
/// target, so a crash mid-write cannot leave a torn file. Permissions are
/// restricted to 0600 on unix before the rename: the file holds live tokens.
async fn write_atomic(path: &Path, state: &Option<CredentialPair>) -> Result<()> {
    let json = serde_json::to_string_pretty(state)
        .map_err(|e| Error::CredentialParse(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".to_string()))?;

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credential state");
    Ok(())
}
