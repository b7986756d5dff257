//! Direct HTTP artifact fetch.
//!
//! Fallback path for artifact URLs that are not under our public base:
//! the body is streamed to disk rather than buffered, since chunk files
//! routinely run to hundreds of megabytes.

use std::path::Path;

use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Stream a URL's body into a local file.
pub async fn fetch_url_to_file(url: &str, path: impl AsRef<Path>) -> StorageResult<()> {
    let path = path.as_ref();
    debug!("Fetching {} to {}", url, path.display());

    let response = reqwest::get(url).await?;
    if !response.status().is_success() {
        return Err(StorageError::download_failed(format!(
            "GET {} returned {}",
            url,
            response.status()
        )));
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(path).await?;
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    if written == 0 {
        // An empty body is a failed render artifact, not a video
        let _ = fs::remove_file(path).await;
        return Err(StorageError::download_failed(format!(
            "GET {} returned an empty body",
            url
        )));
    }

    info!("Fetched {} bytes from {} to {}", written, url, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{method, path as url_path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_fetch_writes_body_to_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/chunk.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"not really mp4".to_vec()))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("chunk.mp4");
        fetch_url_to_file(&format!("{}/chunk.mp4", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(fs::read(&dest).await.unwrap(), b"not really mp4");
    }

    #[tokio::test]
    async fn test_fetch_propagates_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/gone.mp4"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("gone.mp4");
        let err = fetch_url_to_file(&format!("{}/gone.mp4", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DownloadFailed(_)));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(url_path("/empty.mp4"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("empty.mp4");
        let err = fetch_url_to_file(&format!("{}/empty.mp4", server.uri()), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DownloadFailed(_)));
        assert!(!dest.exists());
    }
}
