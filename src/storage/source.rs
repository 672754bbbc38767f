//! Source image loading
//!
//! Reads the map image to geolocalize from a local path, an HTTP(S) URL or a
//! `gs://bucket/object` URI. The bytes are kept in memory; nothing is written
//! to disk.

use std::path::Path;

use tracing::{debug, info};

use crate::error::{ServiceError, TilerError};
use crate::service;

const SERVICE: &str = "storage";
const GCS_PUBLIC_HOST: &str = "https://storage.googleapis.com";

/// Where a source URI points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// Fetched over HTTP(S)
    Remote(String),
    /// Read from the local filesystem
    Local(String),
}

impl SourceLocation {
    /// Classify a URI, rewriting `gs://` to the public storage URL
    pub fn parse(uri: &str) -> Result<Self, TilerError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(TilerError::InvalidInput("no URI given".to_string()));
        }

        if let Some(path) = uri.strip_prefix("gs://") {
            return match path.split_once('/') {
                Some((bucket, object)) if !bucket.is_empty() && !object.is_empty() => Ok(
                    SourceLocation::Remote(format!("{}/{}/{}", GCS_PUBLIC_HOST, bucket, object)),
                ),
                _ => Err(TilerError::InvalidInput(format!(
                    "storage URI must name a bucket and an object: {}",
                    uri
                ))),
            };
        }

        if uri.starts_with("http://") || uri.starts_with("https://") {
            Ok(SourceLocation::Remote(uri.to_string()))
        } else {
            Ok(SourceLocation::Local(uri.to_string()))
        }
    }
}

/// Load the source image bytes for a URI
pub async fn load_source(uri: &str, client: &reqwest::Client) -> Result<Vec<u8>, TilerError> {
    let bytes = match SourceLocation::parse(uri)? {
        SourceLocation::Remote(url) => {
            info!("Downloading source image from {}", url);
            download(&url, client).await?
        }
        SourceLocation::Local(path) => {
            debug!("Reading source image from {}", path);
            tokio::fs::read(&path)
                .await
                .map_err(|source| TilerError::Io {
                    path: Path::new(&path).to_path_buf(),
                    source,
                })?
        }
    };

    if bytes.is_empty() {
        return Err(TilerError::InvalidInput(format!("source image {} is empty", uri)));
    }
    Ok(bytes)
}

async fn download(url: &str, client: &reqwest::Client) -> Result<Vec<u8>, ServiceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| ServiceError::Http {
            service: SERVICE,
            source,
        })?;

    let bytes = service::check_status(SERVICE, response)
        .await?
        .bytes()
        .await
        .map_err(|source| ServiceError::Http {
            service: SERVICE,
            source,
        })?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_gcs_uri() {
        assert_eq!(
            SourceLocation::parse("gs://maps/scans/1890/sheet.tif").unwrap(),
            SourceLocation::Remote(
                "https://storage.googleapis.com/maps/scans/1890/sheet.tif".to_string()
            )
        );
    }

    #[test]
    fn test_parse_gcs_uri_without_object() {
        assert!(matches!(
            SourceLocation::parse("gs://maps"),
            Err(TilerError::InvalidInput(_))
        ));
        assert!(matches!(
            SourceLocation::parse("gs:///object"),
            Err(TilerError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_http_and_local() {
        assert_eq!(
            SourceLocation::parse("https://i.stack.imgur.com/WiDpa.jpg").unwrap(),
            SourceLocation::Remote("https://i.stack.imgur.com/WiDpa.jpg".to_string())
        );
        assert_eq!(
            SourceLocation::parse(" ./map.png ").unwrap(),
            SourceLocation::Local("./map.png".to_string())
        );
    }

    #[test]
    fn test_parse_empty_uri() {
        assert!(matches!(
            SourceLocation::parse("   "),
            Err(TilerError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"\x89PNG fake").unwrap();
        let client = reqwest::Client::new();

        let bytes = load_source(temp_file.path().to_str().unwrap(), &client)
            .await
            .unwrap();
        assert_eq!(bytes, b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_load_empty_file_is_invalid() {
        let temp_file = NamedTempFile::new().unwrap();
        let client = reqwest::Client::new();

        let result = load_source(temp_file.path().to_str().unwrap(), &client).await;
        assert!(matches!(result, Err(TilerError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let client = reqwest::Client::new();
        let result = load_source("/nonexistent/map.png", &client).await;
        assert!(matches!(result, Err(TilerError::Io { .. })));
    }
}
