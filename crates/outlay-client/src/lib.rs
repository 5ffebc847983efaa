//! Authenticated request pipeline for the budgeting API
//!
//! Everything between "caller wants GET expenses/" and "caller has a
//! response": bearer stamping, 401 detection, a single refresh-and-replay,
//! and session teardown when the refresh credential is dead.
//!
//! Request lifecycle:
//! 1. `Client::send` stamps the stored access token and dispatches
//! 2. A 401 with a refresh token on hand triggers exactly one renewal
//! 3. Renewal success replays the original request once
//! 4. Renewal failure clears the store and surfaces `Error::SessionExpired`
//! 5. Every other failure passes through to the caller unchanged

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod refresh;
pub mod request;
pub mod session;

pub use client::Client;
pub use config::Config;
pub use error::{Error, Result};
pub use request::{ApiResponse, RequestDescriptor};
pub use session::SessionState;

pub use reqwest::{Method, StatusCode};
