//! Sieve (sievedata.com) separation backend
//!
//! Runs a hosted Demucs function through the Sieve REST API:
//! push a job, poll it until it settles, then download every output file
//! into the work directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::io::AsyncWriteExt;

use super::{OutputHandle, SeparationProvider};
use crate::cleanup::TempFiles;
use crate::error::ProviderError;
use crate::params::ResolvedParameters;

const API_KEY_HEADER: &str = "X-API-Key";

/// Sieve connection settings
#[derive(Debug, Clone)]
pub struct SieveConfig {
    /// API base, e.g. `https://mango.sievedata.com`
    pub api_url: String,
    pub api_key: String,
    /// Function to run, e.g. `sieve/demucs`
    pub function: String,
    pub poll_interval: Duration,
    /// Where downloaded stems are written
    pub work_dir: PathBuf,
}

/// HTTP client for Sieve jobs
pub struct SieveClient {
    http: reqwest::Client,
    config: SieveConfig,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    status: String,
    #[serde(default)]
    outputs: Value,
    #[serde(default)]
    error: Value,
}

impl SieveClient {
    pub fn new(config: SieveConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }

    fn push_body(&self, audio_url: &str, params: &ResolvedParameters) -> Value {
        json!({
            "function": self.config.function,
            "inputs": {
                "file": { "url": audio_url },
                "model": params.model,
                "two_stems": params.two_stems,
                "overlap": params.overlap,
                "shifts": params.shifts,
                "audio_format": params.audio_format,
            },
        })
    }

    async fn push(&self, audio_url: &str, params: &ResolvedParameters) -> Result<String, ProviderError> {
        let response = self
            .http
            .post(self.endpoint("/v2/push"))
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&self.push_body(audio_url, params))
            .send()
            .await?;

        let pushed: PushResponse = read_json(response).await?;
        Ok(pushed.id)
    }

    /// Poll until the job settles, returning its raw `outputs`
    async fn wait(&self, job_id: &str) -> Result<Value, ProviderError> {
        let url = self.endpoint(&format!("/v2/jobs/{job_id}"));
        let mut last_status = String::new();

        loop {
            let response = self
                .http
                .get(&url)
                .header(API_KEY_HEADER, &self.config.api_key)
                .send()
                .await?;
            let job: JobResponse = read_json(response).await?;

            if job.status != last_status {
                tracing::debug!(job_id, status = %job.status, "Sieve job status");
                last_status.clone_from(&job.status);
            }

            match job.status.as_str() {
                "finished" => return Ok(job.outputs),
                "error" | "cancelled" => {
                    return Err(ProviderError::JobFailed {
                        job_id: job_id.to_string(),
                        status: job.status,
                        reason: error_reason(&job.error),
                    });
                }
                _ => tokio::time::sleep(self.config.poll_interval).await,
            }
        }
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), ProviderError> {
        let mut response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status: status.as_u16(), body });
        }

        let write_err = |source| ProviderError::Write { path: dest.to_path_buf(), source };
        let mut file = tokio::fs::File::create(dest).await.map_err(write_err)?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await.map_err(write_err)?;
        }
        file.flush().await.map_err(write_err)?;
        Ok(())
    }
}

#[async_trait]
impl SeparationProvider for SieveClient {
    async fn separate(
        &self,
        audio_url: &str,
        params: &ResolvedParameters,
    ) -> Result<Vec<OutputHandle>, ProviderError> {
        let job_id = self.push(audio_url, params).await?;
        tracing::info!(%job_id, function = %self.config.function, "Sieve job submitted");

        let outputs = self.wait(&job_id).await?;
        let urls = collect_file_urls(&outputs);
        tracing::info!(%job_id, files = urls.len(), "Sieve job finished");

        tokio::fs::create_dir_all(&self.config.work_dir)
            .await
            .map_err(|source| ProviderError::Write { path: self.config.work_dir.clone(), source })?;

        // Downloaded files belong to the caller only once every download is done
        let mut downloads = TempFiles::new();
        let mut handles = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            let dest = self
                .config
                .work_dir
                .join(format!("{job_id}_{index}.{}", params.audio_format));
            downloads.track(&dest);

            match self.download(url, &dest).await {
                Ok(()) => handles.push(OutputHandle::local(dest)),
                Err(e) => {
                    tracing::warn!(%job_id, index, error = %e, "Failed to download output");
                    if let Err(e) = tokio::fs::remove_file(&dest).await {
                        tracing::debug!(path = %dest.display(), error = %e, "No partial download to remove");
                    }
                    handles.push(OutputHandle::unavailable());
                }
            }
        }

        downloads.release();
        Ok(handles)
    }

    fn name(&self) -> &str {
        "sieve"
    }
}

/// File URLs in job outputs, in output order
///
/// Outputs nest file objects inside arrays and `data` wrappers; any object
/// carrying a string `url` counts as one file.
pub fn collect_file_urls(outputs: &Value) -> Vec<String> {
    let mut urls = Vec::new();
    walk_outputs(outputs, &mut urls);
    urls
}

fn walk_outputs(value: &Value, urls: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                walk_outputs(item, urls);
            }
        }
        Value::Object(map) => {
            if let Some(Value::String(url)) = map.get("url") {
                urls.push(url.clone());
            } else if let Some(data) = map.get("data") {
                walk_outputs(data, urls);
            }
        }
        _ => {}
    }
}

fn error_reason(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
        Value::Null => "no error details".to_string(),
        other => other.to_string(),
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Api { status: status.as_u16(), body });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}
