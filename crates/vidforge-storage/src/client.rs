//! R2 object store client.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Configuration for the object store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// R2 endpoint URL (S3 API endpoint)
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Public base URL under which bucket keys resolve (CDN domain)
    pub public_base_url: String,
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("R2_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("R2_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("R2_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("R2_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("R2_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("R2_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("R2_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("R2_BUCKET_NAME not set"))?,
            region: std::env::var("R2_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("R2_PUBLIC_BASE_URL")
                .map_err(|_| StorageError::config_error("R2_PUBLIC_BASE_URL not set"))?,
        })
    }
}

/// R2-backed durable object store.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl ObjectStore {
    /// Create a new store from configuration.
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "r2",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self {
            client,
            bucket: config.bucket_name,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = StorageConfig::from_env()?;
        Self::new(config).await
    }

    /// Public URL at which a key resolves.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    /// Extract the bucket key from a URL, if the URL is under our public
    /// base. Returns `None` for foreign URLs, which download over plain
    /// HTTP instead.
    pub fn key_for_url(&self, url: &str) -> Option<String> {
        let prefix = format!("{}/", self.public_base_url);
        url.strip_prefix(&prefix).and_then(|rest| {
            // Drop any query string; R2 keys never contain '?'
            let key = rest.split('?').next().unwrap_or(rest);
            if key.is_empty() {
                None
            } else {
                Some(key.to_string())
            }
        })
    }

    /// Upload a file.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Download an object to a file.
    pub async fn download_file(&self, key: &str, path: impl AsRef<Path>) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Downloading {} to {}", key, path.display());

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::DownloadFailed(e.to_string())
                }
            })?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::download_failed(format!("Failed to create directory: {}", e))
            })?;
        }

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            .into_bytes();

        tokio::fs::write(path, &bytes)
            .await
            .map_err(|e| StorageError::download_failed(format!("Failed to write file: {}", e)))?;

        info!("Downloaded {} to {}", key, path.display());
        Ok(())
    }

    /// Check if an object exists.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("NotFound") || e.to_string().contains("NoSuchKey") {
                    Ok(false)
                } else {
                    Err(StorageError::AwsSdk(e.to_string()))
                }
            }
        }
    }

    /// Delete an object.
    pub async fn delete_object(&self, key: &str) -> StorageResult<()> {
        debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        Ok(())
    }
}

/// Build the storage key for an assembled render.
pub fn render_output_key(project_id: &str, timestamp_millis: i64) -> String {
    format!("renders/{}/{}.mp4", project_id, timestamp_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> ObjectStore {
        ObjectStore::new(StorageConfig {
            endpoint_url: "http://localhost:9000".to_string(),
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
            bucket_name: "renders".to_string(),
            region: "auto".to_string(),
            public_base_url: "https://media.vidforge.io/".to_string(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_public_url_round_trip() {
        let store = test_store().await;
        let url = store.public_url("renders/p1/123.mp4");
        assert_eq!(url, "https://media.vidforge.io/renders/p1/123.mp4");
        assert_eq!(
            store.key_for_url(&url).as_deref(),
            Some("renders/p1/123.mp4")
        );
    }

    #[tokio::test]
    async fn test_key_for_url_rejects_foreign() {
        let store = test_store().await;
        assert!(store
            .key_for_url("https://cdn.elsewhere.com/renders/p1/123.mp4")
            .is_none());
        assert!(store.key_for_url("https://media.vidforge.io/").is_none());
    }

    #[tokio::test]
    async fn test_key_for_url_strips_query() {
        let store = test_store().await;
        assert_eq!(
            store
                .key_for_url("https://media.vidforge.io/a/b.mp4?sig=abc")
                .as_deref(),
            Some("a/b.mp4")
        );
    }

    #[test]
    fn test_render_output_key() {
        assert_eq!(
            render_output_key("proj-9", 1700000000000),
            "renders/proj-9/1700000000000.mp4"
        );
    }
}
