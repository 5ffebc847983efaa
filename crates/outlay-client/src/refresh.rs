//! Credential renewal coordination
//!
//! One renewal in flight at a time. Concurrent requests that all saw the
//! same dead access token queue on the gate; whoever enters first makes the
//! wire call, and everyone behind it finds the store already holding a
//! fresh token and adopts it without a second call. The renewal request
//! itself goes out bare: no bearer header, refresh token in the body, and
//! its failures are never retried.

use outlay_auth::{CredentialPair, CredentialStore, token};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Serializes renewals so waiters adopt the winner's result.
pub struct RefreshCoordinator {
    gate: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self {
            gate: Mutex::new(()),
        }
    }

    /// Renew the access token that `stale_access` was rejected with.
    ///
    /// Returns the access token the caller should replay with. At most one
    /// wire call happens per generation of stale token: the gate admits one
    /// task, and every task entering afterwards sees a changed store and
    /// reuses it. Any error means the session cannot be saved; teardown is
    /// the caller's job, the store is not cleared here.
    pub async fn renew(
        &self,
        http: &reqwest::Client,
        base_url: &str,
        store: &CredentialStore,
        stale_access: &str,
    ) -> outlay_auth::Result<String> {
        let _in_flight = self.gate.lock().await;

        let Some(pair) = store.get().await else {
            return Err(outlay_auth::Error::MissingCredential(
                "no refresh token to renew with".to_string(),
            ));
        };

        if pair.access.expose() != stale_access {
            debug!("renewal already done by a concurrent request");
            return Ok(pair.access.expose().clone());
        }

        let renewed = token::refresh_access(http, base_url, pair.refresh.expose()).await?;

        // Carry the old refresh token forward unless the server rotated it.
        let rotated = renewed.refresh.is_some();
        let refresh = renewed
            .refresh
            .unwrap_or_else(|| pair.refresh.expose().clone());
        store
            .set(CredentialPair::new(renewed.access.clone(), refresh))
            .await?;

        info!(rotated_refresh = rotated, "access token renewed");
        Ok(renewed.access)
    }
}

impl Default for RefreshCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};

    async fn store_with(pair: Option<CredentialPair>) -> (Arc<CredentialStore>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            CredentialStore::load(dir.path().join("credentials.json"))
                .await
                .unwrap(),
        );
        if let Some(pair) = pair {
            store.set(pair).await.unwrap();
        }
        (store, dir)
    }

    type Script = (Arc<AtomicU32>, u16, serde_json::Value);

    async fn scripted_refresh(
        State((calls, status, reply)): State<Script>,
        Json(_body): Json<serde_json::Value>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        calls.fetch_add(1, Ordering::SeqCst);
        (StatusCode::from_u16(status).unwrap(), Json(reply))
    }

    async fn start_refresh_endpoint(status: u16, reply: serde_json::Value) -> (String, Arc<AtomicU32>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let calls = Arc::new(AtomicU32::new(0));

        let state: Script = (calls.clone(), status, reply);
        let app = Router::new()
            .route("/api/token/refresh/", post(scripted_refresh))
            .with_state(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/api/"), calls)
    }

    #[tokio::test]
    async fn renews_and_stores_the_new_access_token() {
        let (base, calls) =
            start_refresh_endpoint(200, serde_json::json!({"access": "A2"})).await;
        let (store, _dir) = store_with(Some(CredentialPair::new("A1", "R1"))).await;

        let coordinator = RefreshCoordinator::new();
        let access = coordinator
            .renew(&reqwest::Client::new(), &base, &store, "A1")
            .await
            .unwrap();

        assert_eq!(access, "A2");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let pair = store.get().await.unwrap();
        assert_eq!(pair.access.expose(), "A2");
        assert_eq!(pair.refresh.expose(), "R1");
    }

    #[tokio::test]
    async fn adopts_a_rotated_refresh_token() {
        let (base, _calls) =
            start_refresh_endpoint(200, serde_json::json!({"access": "A2", "refresh": "R2"})).await;
        let (store, _dir) = store_with(Some(CredentialPair::new("A1", "R1"))).await;

        let coordinator = RefreshCoordinator::new();
        coordinator
            .renew(&reqwest::Client::new(), &base, &store, "A1")
            .await
            .unwrap();

        let pair = store.get().await.unwrap();
        assert_eq!(pair.access.expose(), "A2");
        assert_eq!(pair.refresh.expose(), "R2");
    }

    #[tokio::test]
    async fn adopts_a_peer_renewal_without_a_wire_call() {
        // Store already holds a newer token than the one this task failed
        // with, as after a concurrent renewal. No server is running, so any
        // wire attempt would error.
        let (store, _dir) = store_with(Some(CredentialPair::new("A2", "R1"))).await;

        let coordinator = RefreshCoordinator::new();
        let access = coordinator
            .renew(&reqwest::Client::new(), "http://127.0.0.1:1/api/", &store, "A1")
            .await
            .unwrap();

        assert_eq!(access, "A2");
    }

    #[tokio::test]
    async fn empty_store_is_missing_credential() {
        let (store, _dir) = store_with(None).await;

        let coordinator = RefreshCoordinator::new();
        let err = coordinator
            .renew(&reqwest::Client::new(), "http://127.0.0.1:1/api/", &store, "A1")
            .await
            .unwrap_err();

        assert!(
            matches!(err, outlay_auth::Error::MissingCredential(_)),
            "got: {err:?}"
        );
    }

    #[tokio::test]
    async fn rejection_leaves_the_store_untouched() {
        let (base, calls) =
            start_refresh_endpoint(400, serde_json::json!({"detail": "token is blacklisted"})).await;
        let (store, _dir) = store_with(Some(CredentialPair::new("A1", "R1"))).await;

        let coordinator = RefreshCoordinator::new();
        let err = coordinator
            .renew(&reqwest::Client::new(), &base, &store, "A1")
            .await
            .unwrap_err();

        assert!(matches!(err, outlay_auth::Error::Rejected { .. }), "got: {err:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Teardown is the caller's decision; the pair is still here.
        let pair = store.get().await.unwrap();
        assert_eq!(pair.access.expose(), "A1");
    }
}
