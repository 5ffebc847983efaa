//! Shared types for the outlay workspace

mod secret;
mod error;

pub use secret::Secret;
pub use error::{Error, Result};
