//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias.
//! Only configuration problems surface as errors: degenerate numeric input is
//! clamped by the engine and runaway generation stops at a hard ceiling.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("path '{path}' has no generators")]
    NoGenerators { path: String },

    #[error("unknown generator type '{id}'")]
    UnknownGenerator { id: String },
}
