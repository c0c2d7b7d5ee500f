//! Error types and result aliases for the Trickle library.
//!
//! This module defines the core error type [`TrickleError`] and the [`Result`] type alias
//! used throughout the library. All public APIs that can fail return `Result<T>` for
//! consistent error handling.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrickleError {
    #[error("LLM gateway error: {0}")]
    GatewayError(String),

    #[error("Invalid input: {0}")]
    InputError(String),

    #[error("Malformed model output: {0}")]
    MalformedOutput(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TrickleError>;
