//! Separation orchestration
//!
//! One call runs the whole relay for a request, sequentially:
//! resolve parameters, run the provider job, upload each produced stem,
//! delete the local files, report.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::cleanup::TempFiles;
use crate::error::SeparationError;
use crate::params::{resolve, ResolvedParameters, SeparationRequest};
use crate::provider::SeparationProvider;
use crate::stems::name_for;
use crate::storage::{upload_stem, ObjectStore};

/// Owner id used when the audio URL carries none
pub const ANONYMOUS_OWNER: &str = "anonymous";

/// One uploaded stem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StemFile {
    /// Position in the provider's output list
    pub index: usize,
    /// Public URL, `None` when the upload failed
    pub url: Option<String>,
    pub stem_name: String,
}

/// Outcome of a completed separation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeparationResult {
    pub output_files: Vec<StemFile>,
    pub parameters: ResolvedParameters,
}

/// Owner id scoping the storage destination
///
/// Takes the path segment following the first `marker` segment. This is a
/// routing convenience only, nothing here authenticates the owner.
/// Empty and dot segments count as no owner.
pub fn owner_from_url(audio_url: &str, marker: &str) -> String {
    let mut segments = audio_url.split('/');
    while let Some(segment) = segments.next() {
        if segment == marker {
            return match segments.next() {
                Some(owner) if !matches!(owner, "" | "." | "..") => owner.to_string(),
                _ => ANONYMOUS_OWNER.to_string(),
            };
        }
    }
    ANONYMOUS_OWNER.to_string()
}

/// Runs separations against a provider and a store
#[derive(Clone)]
pub struct Separator {
    provider: Arc<dyn SeparationProvider>,
    store: Option<Arc<dyn ObjectStore>>,
    owner_marker: String,
}

impl Separator {
    /// `store = None` keeps the pipeline running with every upload failing
    pub fn new(
        provider: Arc<dyn SeparationProvider>,
        store: Option<Arc<dyn ObjectStore>>,
        owner_marker: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            store,
            owner_marker: owner_marker.into(),
        }
    }

    pub fn has_storage(&self) -> bool {
        self.store.is_some()
    }

    /// Run one separation end to end
    ///
    /// Fails only when the provider call fails. Unreadable outputs are
    /// skipped, failed uploads report `url: None`, and local files are
    /// removed before returning, or on drop if the future is cancelled.
    pub async fn separate(&self, request: &SeparationRequest) -> Result<SeparationResult, SeparationError> {
        let owner = owner_from_url(&request.audio_url, &self.owner_marker);
        let span = tracing::info_span!("separate", %owner);
        self.run(request, owner).instrument(span).await
    }

    async fn run(&self, request: &SeparationRequest, owner: String) -> Result<SeparationResult, SeparationError> {
        tracing::info!(audio_url = %request.audio_url, model = %request.model, two_stems = %request.two_stems, "Starting separation");

        let parameters = resolve(request);
        tracing::info!(
            model = %parameters.model,
            two_stems = %parameters.two_stems,
            overlap = parameters.overlap,
            shifts = parameters.shifts,
            provider = self.provider.name(),
            "Resolved parameters"
        );

        let outputs = self.provider.separate(&request.audio_url, &parameters).await?;
        tracing::info!(outputs = outputs.len(), "Separation completed");

        let mut temp_files = TempFiles::new();
        for path in outputs.iter().filter_map(|o| o.path()) {
            temp_files.track(path);
        }

        let mut output_files = Vec::with_capacity(outputs.len());

        for (index, output) in outputs.iter().enumerate() {
            let local = match output.path() {
                Some(path) if path.exists() => path,
                _ => {
                    tracing::warn!(index, "No local file for output, skipping");
                    continue;
                }
            };

            let stem_name = name_for(index, &parameters.two_stems, &parameters.model);
            let url = upload_stem(self.store.as_deref(), local, &stem_name, &owner).await;
            tracing::info!(index, stem = %stem_name, uploaded = url.is_some(), "Processed output");

            output_files.push(StemFile { index, url, stem_name });
        }

        temp_files.remove_all().await;

        Ok(SeparationResult { output_files, parameters })
    }
}
