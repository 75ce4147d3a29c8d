//! Remote stem-separation providers
//!
//! A provider takes a source URL plus resolved parameters, blocks (the
//! calling task, not the runtime) until the remote job completes, and
//! hands back the produced files in provider order.

mod sieve;

pub use sieve::{collect_file_urls, SieveClient, SieveConfig};

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::params::ResolvedParameters;

/// One file produced by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputHandle {
    path: Option<PathBuf>,
}

impl OutputHandle {
    /// Handle for a file already on local disk
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self { path: Some(path.into()) }
    }

    /// Handle for an output that never reached local disk
    pub fn unavailable() -> Self {
        Self { path: None }
    }

    /// Local path, if the output was materialised
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Common trait for separation backends
#[async_trait]
pub trait SeparationProvider: Send + Sync {
    /// Run a separation job to completion
    ///
    /// Any error here fails the whole request; there is no partial result.
    async fn separate(
        &self,
        audio_url: &str,
        params: &ResolvedParameters,
    ) -> Result<Vec<OutputHandle>, ProviderError>;

    /// Provider name for logs
    fn name(&self) -> &str;
}
