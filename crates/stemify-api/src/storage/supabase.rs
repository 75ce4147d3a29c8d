//! Supabase Storage backend

use async_trait::async_trait;
use reqwest::Url;

use super::{ObjectStore, UploadOptions};
use crate::error::StorageError;

/// Supabase Storage settings
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://<project>.supabase.co`
    pub url: String,
    pub service_key: String,
    pub bucket: String,
}

/// Uploads objects through the Supabase Storage REST API
pub struct SupabaseStorage {
    http: reqwest::Client,
    base: Url,
    config: SupabaseConfig,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig) -> Result<Self, StorageError> {
        let invalid = |reason: String| StorageError::InvalidUrl { url: config.url.clone(), reason };
        let base = Url::parse(&config.url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".into()));
        }

        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, base, config })
    }

    /// `{base}/storage/v1/object[/public]/{bucket}/{path}`
    ///
    /// Bucket and path segments are appended one by one and percent-encoded,
    /// so a segment can never add or climb directories.
    fn endpoint(&self, public: bool, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["storage", "v1", "object"]);
            if public {
                segments.push("public");
            }
            segments.push(&self.config.bucket).extend(path.split('/'));
        }
        url
    }

    fn object_url(&self, path: &str) -> Url {
        self.endpoint(false, path)
    }
}

#[async_trait]
impl ObjectStore for SupabaseStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<(), StorageError> {
        let response = self
            .http
            .post(self.object_url(path))
            .bearer_auth(&self.config.service_key)
            .header("apikey", &self.config.service_key)
            .header(reqwest::header::CONTENT_TYPE, &options.content_type)
            .header(
                reqwest::header::CACHE_CONTROL,
                format!("max-age={}", options.cache_max_age.as_secs()),
            )
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StorageError::Api { status: status.as_u16(), body });
        }
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.endpoint(true, path).into()
    }
}
