//! Error types for the separation relay

use std::path::PathBuf;

use thiserror::Error;

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required setting is absent or empty
    #[error("{name} is not set")]
    Missing { name: &'static str },

    /// A setting is present but unusable
    #[error("Invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Remote separation provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Transport-level failure talking to the provider
    #[error("Provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-success status
    #[error("Provider returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Provider answered with a body we could not interpret
    #[error("Unexpected provider response: {0}")]
    MalformedResponse(String),

    /// The job ran but ended in a failed state
    #[error("Separation job {job_id} ended with status '{status}': {reason}")]
    JobFailed {
        job_id: String,
        status: String,
        reason: String,
    },

    /// Writing a downloaded output failed
    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Object storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    /// Transport-level failure talking to storage
    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The configured project URL cannot address storage objects
    #[error("Invalid storage URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Storage answered with a non-success status
    #[error("Storage returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Reading the local stem failed
    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors surfaced by a `/separate` call
///
/// Only upstream failures abort a separation. Unreadable outputs, failed
/// uploads and failed cleanups are logged per file and never reach here.
#[derive(Error, Debug)]
pub enum SeparationError {
    /// The remote separation call failed
    #[error("{0}")]
    Upstream(#[from] ProviderError),
}
