//! The request dispatcher
//!
//! `Client` owns the end-to-end send path: stamp the stored access token,
//! dispatch, classify, and on a renewable 401 run one refresh and one
//! replay. It also carries the caller conveniences: login and register (the
//! producers of the credential pair), logout, and typed JSON verbs.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use outlay_auth::endpoints::api_url;
use outlay_auth::{CredentialPair, CredentialStore, token};

use crate::classify::{Classification, classify};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::refresh::RefreshCoordinator;
use crate::request::{ApiResponse, RequestDescriptor};
use crate::session::{self, SessionState};

/// Authenticated API client.
///
/// Cheap to clone: the HTTP connection pool, the credential store, and the
/// renewal gate are shared, so clones observe one session.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: String,
    store: Arc<CredentialStore>,
    refresher: Arc<RefreshCoordinator>,
}

impl Client {
    pub fn new(config: &Config, http: reqwest::Client, store: Arc<CredentialStore>) -> Self {
        Self {
            http,
            base_url: config.api_base_url.clone(),
            store,
            refresher: Arc::new(RefreshCoordinator::new()),
        }
    }

    /// Build the HTTP client most callers want: the configured per-request
    /// timeout over the workspace's rustls stack.
    pub fn http_client(config: &Config) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Transport(format!("building http client: {e}")))
    }

    /// Send one API call through the authenticated pipeline.
    ///
    /// 2xx resolves to the response. A 401 on the first attempt, with a
    /// refresh token stored, triggers exactly one renewal and one replay.
    /// Every other failure surfaces unchanged.
    pub async fn send(&self, request: RequestDescriptor) -> Result<ApiResponse> {
        let request_id = format!("req_{}", Uuid::new_v4().as_simple());
        self.send_pipeline(request, request_id).await
    }

    #[instrument(skip_all, fields(request_id = %request_id, method = %request.method, path = %request.path))]
    async fn send_pipeline(
        &self,
        request: RequestDescriptor,
        request_id: String,
    ) -> Result<ApiResponse> {
        // One store read gives a consistent snapshot: the token to stamp
        // and whether a renewal would have anything to work with.
        let pair = self.store.get().await;
        let has_refresh = pair.is_some();
        let access = pair.map(|p| p.access.expose().clone());

        let response = self.dispatch(&request, access.as_deref()).await?;

        match classify(response.status.as_u16(), false, has_refresh) {
            Classification::Authorized => Ok(response),
            Classification::OtherFailure => Err(api_error(response)),
            Classification::Unauthenticated => {
                debug!("access token rejected, renewing");
                let stale = access.unwrap_or_default();
                let renewed = match self
                    .refresher
                    .renew(&self.http, &self.base_url, &self.store, &stale)
                    .await
                {
                    Ok(token) => token,
                    Err(error) => {
                        warn!(error = %error, "credential renewal failed, ending session");
                        if let Err(persist) = session::terminate(&self.store).await {
                            warn!(error = %persist, "session cleared in memory but not on disk");
                        }
                        return Err(Error::SessionExpired);
                    }
                };

                let replay = self.dispatch(&request, Some(&renewed)).await?;
                match classify(replay.status.as_u16(), true, true) {
                    Classification::Authorized => Ok(replay),
                    _ => Err(api_error(replay)),
                }
            }
        }
    }

    /// One wire attempt: build the request from the descriptor, stamp the
    /// token, send, and collect status plus body.
    async fn dispatch(
        &self,
        request: &RequestDescriptor,
        access: Option<&str>,
    ) -> Result<ApiResponse> {
        let url = api_url(&self.base_url, &request.path);
        let mut builder = augment(self.http.request(request.method.clone(), &url), access);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Transport(format!("{} {url}: {e}", request.method)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("reading response body: {e}")))?
            .to_vec();

        debug!(status = status.as_u16(), bytes = body.len(), "response received");
        Ok(ApiResponse { status, body })
    }

    /// Sign in: exchange username/password for a pair and store it.
    ///
    /// Runs outside the 401 pipeline. A 401 here means wrong credentials
    /// and must surface as-is, not trigger a renewal.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let tokens = token::obtain_pair(&self.http, &self.base_url, username, password)
            .await
            .map_err(producer_error)?;
        self.store
            .set(CredentialPair::new(tokens.access, tokens.refresh))
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;
        info!(username, "signed in");
        Ok(())
    }

    /// Create an account. The caller signs in afterwards.
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<()> {
        token::register_account(&self.http, &self.base_url, username, email, password)
            .await
            .map_err(producer_error)?;
        info!(username, "account registered");
        Ok(())
    }

    /// Sign out. Idempotent: signing out of an anonymous session succeeds.
    pub async fn logout(&self) -> Result<()> {
        session::terminate(&self.store)
            .await
            .map_err(|e| Error::Storage(e.to_string()))
    }

    /// Whether a credential pair is currently stored.
    pub async fn is_authenticated(&self) -> bool {
        !self.store.is_empty().await
    }

    /// Derived session state.
    pub async fn session_state(&self) -> SessionState {
        session::state(&self.store).await
    }

    /// GET a JSON resource.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send(RequestDescriptor::new(Method::GET, path))
            .await?
            .json()
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.send(RequestDescriptor::new(Method::POST, path).with_json(body))
            .await?
            .json()
    }

    /// PUT a JSON body and decode the JSON reply.
    pub async fn put<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        self.send(RequestDescriptor::new(Method::PUT, path).with_json(body))
            .await?
            .json()
    }

    /// DELETE a resource, discarding the (usually empty) reply body.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(RequestDescriptor::new(Method::DELETE, path))
            .await?;
        Ok(())
    }
}

/// Stamp the authorization header when an access token is on hand.
///
/// Anonymous requests go out untouched: login and registration are
/// legitimate unauthenticated calls, and the server owns the decision of
/// which routes require auth.
fn augment(builder: reqwest::RequestBuilder, access: Option<&str>) -> reqwest::RequestBuilder {
    match access {
        Some(access) => builder.bearer_auth(access),
        None => builder,
    }
}

/// Pass a non-2xx response through as the caller-visible error.
fn api_error(response: ApiResponse) -> Error {
    Error::Api {
        status: response.status.as_u16(),
        body: response.text(),
    }
}

/// Map a producer (login/register) failure onto the caller-facing taxonomy.
fn producer_error(error: outlay_auth::Error) -> Error {
    match error {
        outlay_auth::Error::Rejected { status, body } => Error::Api { status, body },
        outlay_auth::Error::Http(message) => Error::Transport(message),
        outlay_auth::Error::Parse(message) => Error::Decode(message),
        other => Error::Storage(other.to_string()),
    }
}
