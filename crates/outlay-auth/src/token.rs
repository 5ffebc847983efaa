//! Token obtain and refresh wire protocol
//!
//! The three unauthenticated interactions with the budgeting API:
//! 1. Obtain: username/password exchanged for a credential pair (login)
//! 2. Refresh: refresh token exchanged for a new access token
//! 3. Register: create an account (caller logs in afterwards)
//!
//! All three POST JSON and none carries an authorization header. The refresh
//! call in particular must stay outside the authenticated pipeline: a 401
//! from it means the refresh token itself is dead, and routing it through
//! the 401-renewal path would recurse.

use serde::Deserialize;
use tracing::debug;

use crate::endpoints::{REGISTER_PATH, TOKEN_PATH, TOKEN_REFRESH_PATH, api_url};
use crate::error::{Error, Result};

/// Response from the token obtain endpoint. Both tokens are mandatory.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access: String,
    pub refresh: String,
}

/// Response from the refresh endpoint.
///
/// `refresh` is present only when the server rotates refresh tokens; when
/// absent the caller keeps presenting the old one.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Exchange username/password for a credential pair.
pub async fn obtain_pair(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    password: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(api_url(base_url, TOKEN_PATH))
        .json(&serde_json::json!({ "username": username, "password": password }))
        .send()
        .await
        .map_err(|e| Error::Http(format!("token request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| Error::Parse(format!("invalid token response: {e}")))
}

/// Exchange the refresh token for a new access token.
///
/// Any non-2xx answer means the session cannot be saved and the caller is
/// expected to tear it down. Transport failures surface as `Error::Http`.
pub async fn refresh_access(
    client: &reqwest::Client,
    base_url: &str,
    refresh: &str,
) -> Result<RefreshResponse> {
    let response = client
        .post(api_url(base_url, TOKEN_REFRESH_PATH))
        .json(&serde_json::json!({ "refresh": refresh }))
        .send()
        .await
        .map_err(|e| Error::Http(format!("refresh request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        debug!(status = status.as_u16(), "refresh endpoint rejected the credential");
        return Err(Error::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    response
        .json::<RefreshResponse>()
        .await
        .map_err(|e| Error::Parse(format!("invalid refresh response: {e}")))
}

/// Create an account.
///
/// The endpoint returns profile data this crate has no use for, so success
/// is reported as unit and the caller proceeds to login.
pub async fn register_account(
    client: &reqwest::Client,
    base_url: &str,
    username: &str,
    email: &str,
    password: &str,
) -> Result<()> {
    let response = client
        .post(api_url(base_url, REGISTER_PATH))
        .json(&serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        }))
        .send()
        .await
        .map_err(|e| Error::Http(format!("register request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::Rejected {
            status: status.as_u16(),
            body,
        });
    }

    Ok(())
}
