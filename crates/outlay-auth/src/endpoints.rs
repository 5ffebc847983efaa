//! Budgeting API endpoint paths
//!
//! Relative paths joined onto the configured base URL. Upstream routes end
//! in a slash and `api_url` preserves it, so "token/refresh/" does not turn
//! into "token/refresh" and get bounced by the server's router.

/// Token obtain endpoint: username/password in, credential pair out
pub const TOKEN_PATH: &str = "token/";

/// Token refresh endpoint: refresh token in, new access token out
pub const TOKEN_REFRESH_PATH: &str = "token/refresh/";

/// Account registration endpoint
pub const REGISTER_PATH: &str = "register/";

/// Base URL of a local development API server, used when no
/// configuration is present.
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";

/// Join a relative endpoint path onto a base URL.
///
/// Tolerates a base with or without a trailing slash and a path with or
/// without a leading slash. Query strings ride along in the path untouched.
pub fn api_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
