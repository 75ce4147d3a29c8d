//! Test doubles shared by the integration suites

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stemify_api::provider::{OutputHandle, SeparationProvider};
use stemify_api::storage::{ObjectStore, UploadOptions};
use stemify_api::{ProviderError, ResolvedParameters, Separator, StorageError};
use tempfile::TempDir;

// ═══════════════════════════════════════════════════════════════════════════════
// PROVIDER FAKES
// ═══════════════════════════════════════════════════════════════════════════════

/// What the fake provider produces at one output position
#[derive(Debug, Clone)]
pub enum FakeOutput {
    /// A real file with these bytes
    File(Vec<u8>),
    /// A handle without a local path
    NoPath,
    /// A handle pointing at a file that does not exist
    Missing,
}

/// Provider writing its outputs into a temp dir
pub struct FakeProvider {
    dir: TempDir,
    outputs: Vec<FakeOutput>,
    pub calls: Mutex<Vec<(String, ResolvedParameters)>>,
    pub written: Mutex<Vec<PathBuf>>,
}

impl FakeProvider {
    pub fn new(outputs: Vec<FakeOutput>) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            outputs,
            calls: Mutex::new(Vec::new()),
            written: Mutex::new(Vec::new()),
        }
    }

    /// `count` readable files with distinct contents
    pub fn with_files(count: usize) -> Self {
        Self::new((0..count).map(|i| FakeOutput::File(format!("RIFF-stem-{i}").into_bytes())).collect())
    }

    pub fn written_paths(&self) -> Vec<PathBuf> {
        self.written.lock().unwrap().clone()
    }

    pub fn last_params(&self) -> ResolvedParameters {
        self.calls.lock().unwrap().last().unwrap().1.clone()
    }
}

#[async_trait]
impl SeparationProvider for FakeProvider {
    async fn separate(
        &self,
        audio_url: &str,
        params: &ResolvedParameters,
    ) -> Result<Vec<OutputHandle>, ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push((audio_url.to_string(), params.clone()));

        let mut handles = Vec::new();
        for (i, output) in self.outputs.iter().enumerate() {
            match output {
                FakeOutput::File(bytes) => {
                    let path = self.dir.path().join(format!("out_{i}.wav"));
                    std::fs::write(&path, bytes).unwrap();
                    self.written.lock().unwrap().push(path.clone());
                    handles.push(OutputHandle::local(path));
                }
                FakeOutput::NoPath => handles.push(OutputHandle::unavailable()),
                FakeOutput::Missing => {
                    handles.push(OutputHandle::local(self.dir.path().join(format!("gone_{i}.wav"))))
                }
            }
        }
        Ok(handles)
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Provider whose job always fails
pub struct FailingProvider;

#[async_trait]
impl SeparationProvider for FailingProvider {
    async fn separate(
        &self,
        _audio_url: &str,
        _params: &ResolvedParameters,
    ) -> Result<Vec<OutputHandle>, ProviderError> {
        Err(ProviderError::JobFailed {
            job_id: "job-42".into(),
            status: "error".into(),
            reason: "quota exceeded".into(),
        })
    }

    fn name(&self) -> &str {
        "failing"
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STORE FAKES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone)]
pub struct Upload {
    pub path: String,
    pub bytes: Vec<u8>,
    pub options: UploadOptions,
}

/// Store recording uploads; rejects paths ending in `fail_suffix`
#[derive(Default)]
pub struct RecordingStore {
    pub uploads: Mutex<Vec<Upload>>,
    pub fail_suffix: Option<String>,
}

impl RecordingStore {
    pub fn failing_on(suffix: &str) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail_suffix: Some(suffix.to_string()),
        }
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<(), StorageError> {
        if let Some(suffix) = &self.fail_suffix {
            if path.ends_with(suffix.as_str()) {
                return Err(StorageError::Api {
                    status: 413,
                    body: "Payload too large".into(),
                });
            }
        }
        self.uploads.lock().unwrap().push(Upload {
            path: path.to_string(),
            bytes,
            options: options.clone(),
        });
        Ok(())
    }

    // Trailing '?' mirrors storage clients that append an empty query
    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/public/{path}?")
    }
}

/// Store whose uploads never complete
pub struct StalledStore;

#[async_trait]
impl ObjectStore for StalledStore {
    async fn upload(&self, _path: &str, _bytes: Vec<u8>, _options: &UploadOptions) -> Result<(), StorageError> {
        std::future::pending().await
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://cdn.test/public/{path}")
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// WIRING
// ═══════════════════════════════════════════════════════════════════════════════

pub fn separator(provider: Arc<dyn SeparationProvider>, store: Option<Arc<RecordingStore>>) -> Separator {
    let store: Option<Arc<dyn ObjectStore>> = store.map(|s| s as Arc<dyn ObjectStore>);
    Separator::new(provider, store, "audio-files")
}

/// Serve `router` on an ephemeral local port
pub async fn spawn_router(router: axum::Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

pub const SONG_URL: &str =
    "https://proj.supabase.co/storage/v1/object/public/audio-files/U1/song.mp3";
