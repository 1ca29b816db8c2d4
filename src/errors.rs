//! Typed error hierarchy for periscope.
//!
//! Two top-level enums cover the two fallible subsystems:
//! - `ClientError` — backend fetch failures (transport, status, decode)
//! - `ConfigError` — configuration loading failures
//!
//! The reconstruction core (classification, grouping, stage projection) is
//! infallible by design: any well-typed snapshot, however sparse, produces a
//! renderable model, so those modules define no error type of their own.

use thiserror::Error;

/// Errors from the backend HTTP client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Backend returned {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ClientError {
    /// The URL of the request that failed.
    pub fn url(&self) -> &str {
        match self {
            ClientError::Transport { url, .. }
            | ClientError::Status { url, .. }
            | ClientError::Decode { url, .. } => url,
        }
    }
}

/// Errors from configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    ReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    ParseFailed {
        path: std::path::PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("No API base URL configured (set api_url in periscope.toml or PERISCOPE_API_URL)")]
    MissingApiUrl,
}
