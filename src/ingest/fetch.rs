use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

use super::config::SourceConfig;
use super::error::IngestError;

/// XLSX files are ZIP archives.
const ZIP_SIGNATURE: &[u8] = b"PK";

/// A downloaded source file. Lives only for one ingestion run.
#[derive(Clone)]
pub struct RawSource {
    pub url: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl RawSource {
    pub fn new(url: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            content_type,
            bytes,
        }
    }

    /// Reject payloads that cannot be a workbook.
    pub fn check(&self, max_bytes: usize) -> Result<(), IngestError> {
        if self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"))
        {
            return Err(IngestError::Download(
                "received HTML instead of a workbook; check the share link permissions".into(),
            ));
        }
        if self.bytes.is_empty() {
            return Err(IngestError::Download("empty payload".into()));
        }
        if self.bytes.len() > max_bytes {
            return Err(IngestError::Download(format!(
                "payload of {} bytes exceeds the {} byte limit",
                self.bytes.len(),
                max_bytes
            )));
        }
        if !self.bytes.starts_with(ZIP_SIGNATURE) {
            return Err(IngestError::Download(
                "payload is not an xlsx workbook (missing ZIP signature)".into(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for RawSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawSource")
            .field("url", &self.url)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Downloads the source file.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawSource, IngestError>;
}

/// Rewrite a OneDrive short link (`1drv.ms`) so it serves the file itself
/// rather than a preview page. Other URLs are returned unchanged.
pub fn normalize_download_url(raw: &str) -> String {
    let Ok(mut url) = url::Url::parse(raw) else {
        return raw.to_string();
    };
    if url.host_str() != Some("1drv.ms") {
        return raw.to_string();
    }
    if url
        .query_pairs()
        .any(|(key, value)| key == "download" && value == "1")
    {
        return raw.to_string();
    }
    url.query_pairs_mut().append_pair("download", "1");
    url.into()
}

/// Downloads over HTTP(S) with reqwest.
///
/// Redirects are followed. The body is read chunk by chunk so an oversized
/// payload is cut off at `max_bytes` instead of being buffered whole.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| IngestError::Download(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }

    fn too_large(&self, len: u64) -> IngestError {
        IngestError::Download(format!(
            "payload of {} bytes exceeds the {} byte limit",
            len, self.max_bytes
        ))
    }
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawSource, IngestError> {
        let mut response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| IngestError::Download(format!("network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Download(format!("source returned HTTP {}", status)));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);

        if let Some(len) = response.content_length() {
            if len > self.max_bytes as u64 {
                return Err(self.too_large(len));
            }
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| IngestError::Download(format!("network error: {}", e)))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large((bytes.len() + chunk.len()) as u64));
            }
            bytes.extend_from_slice(&chunk);
        }

        tracing::debug!(url, bytes = bytes.len(), "Source downloaded");
        Ok(RawSource::new(url, content_type, bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(content_type: Option<&str>, bytes: &[u8]) -> RawSource {
        RawSource::new("https://example.com/x.xlsx", content_type.map(String::from), bytes.to_vec())
    }

    #[test]
    fn test_normalize_short_link() {
        assert_eq!(
            normalize_download_url("https://1drv.ms/x/s!AbCd"),
            "https://1drv.ms/x/s!AbCd?download=1"
        );
        assert_eq!(
            normalize_download_url("https://1drv.ms/x/s!AbCd?e=xyz"),
            "https://1drv.ms/x/s!AbCd?e=xyz&download=1"
        );
    }

    #[test]
    fn test_normalize_leaves_other_urls_alone() {
        let already = "https://1drv.ms/x/s!AbCd?download=1";
        assert_eq!(normalize_download_url(already), already);

        let other = "https://example.com/data.xlsx";
        assert_eq!(normalize_download_url(other), other);

        assert_eq!(normalize_download_url("not a url"), "not a url");
    }

    #[test]
    fn test_check_accepts_zip_payload() {
        assert!(source(Some("application/octet-stream"), b"PK\x03\x04rest").check(1024).is_ok());
        assert!(source(None, b"PK\x03\x04").check(1024).is_ok());
    }

    #[test]
    fn test_check_rejects_html() {
        let err = source(Some("text/html; charset=utf-8"), b"PK\x03\x04").check(1024).unwrap_err();
        assert!(err.reason().contains("HTML"));
    }

    #[test]
    fn test_check_rejects_empty_oversized_and_non_zip() {
        assert!(source(None, b"").check(1024).is_err());
        assert!(source(None, b"PK\x03\x04").check(2).is_err());
        let err = source(None, b"<!doctype html>").check(1024).unwrap_err();
        assert!(err.reason().contains("ZIP signature"));
    }
}
