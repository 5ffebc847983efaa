//! Outgoing request descriptors and completed responses
//!
//! A descriptor is the immutable recipe for one API call: method, path
//! relative to the base URL, optional JSON body. The dispatcher rebuilds
//! the actual HTTP request from it on every attempt, so the renewal replay
//! cannot accidentally reuse header state from the rejected attempt.

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Recipe for one API call.
///
/// `path` is joined onto the configured base URL and keeps its trailing
/// slash; query strings ride along in the path ("expenses/3/?refund=true").
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    /// Attach a JSON body.
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// A completed API response: status plus raw body bytes.
///
/// Bodies are opaque to the pipeline. `json()` is a convenience for callers
/// that know the shape.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Decode the body as JSON into the requested type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| Error::Decode(format!("response body: {e}")))
    }

    /// The body as text, lossy on invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
