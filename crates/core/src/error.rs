use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchStreamError {
    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Unknown endpoint \"{0}\" (expected \"search-complete\" or \"search\")")]
    UnknownEndpoint(String),

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("Server answered {status} for {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("Stream closed by server")]
    StreamClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SearchStreamError>;
