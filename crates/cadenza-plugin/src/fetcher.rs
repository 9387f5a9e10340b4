// SPDX-FileCopyrightText: 2026 Cadenza Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Raw plugin source retrieval from local files and remote URLs.
//!
//! The fetcher holds no state beyond its HTTP client. It never retries:
//! a failed fetch surfaces as [`CadenzaError::Fetch`] and the caller decides.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use cadenza_config::PluginConfig;
use cadenza_core::CadenzaError;
use chrono::Utc;
use futures::StreamExt;
use tracing::debug;

/// Where plugin source comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Url(String),
    File(PathBuf),
}

impl Locator {
    /// `http(s)://` is remote; `file://` URIs and everything else are paths.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Locator::Url(raw.to_string());
        }
        if raw.starts_with("file://")
            && let Ok(url) = reqwest::Url::parse(raw)
            && let Ok(path) = url.to_file_path()
        {
            return Locator::File(path);
        }
        Locator::File(PathBuf::from(raw))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Url(url) => f.write_str(url),
            Locator::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Appends `#<unix millis>` so intermediate caches see a fresh URL.
///
/// URLs that already carry a fragment are returned unchanged.
pub fn add_cache_buster(url: &str) -> String {
    if url.contains('#') {
        url.to_string()
    } else {
        format!("{url}#{}", Utc::now().timestamp_millis())
    }
}

/// Drops the fragment (and with it any cache buster) from a URL.
pub fn strip_fragment(url: &str) -> &str {
    url.split('#').next().unwrap_or(url)
}

/// Fetches plugin sources and subscription manifests.
pub struct Fetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl Fetcher {
    pub fn new(config: &PluginConfig) -> Result<Self, CadenzaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .user_agent(concat!("cadenza/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CadenzaError::Internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            max_bytes: config.max_source_bytes,
        })
    }

    /// Returns the raw bytes behind `locator`. Empty content is a failure.
    pub async fn fetch(&self, locator: &Locator) -> Result<Vec<u8>, CadenzaError> {
        let bytes = match locator {
            Locator::File(path) => self.read_file(locator, path).await?,
            Locator::Url(url) => self.download(locator, url).await?,
        };
        if bytes.is_empty() {
            return Err(fetch_error(locator, "source is empty"));
        }
        debug!(locator = %locator, bytes = bytes.len(), "fetched plugin source");
        Ok(bytes)
    }

    /// Like [`fetch`](Self::fetch) but requires UTF-8 text.
    pub async fn fetch_text(&self, locator: &Locator) -> Result<String, CadenzaError> {
        let bytes = self.fetch(locator).await?;
        String::from_utf8(bytes).map_err(|e| CadenzaError::Fetch {
            locator: locator.to_string(),
            message: "content is not valid UTF-8".to_string(),
            source: Some(Box::new(e)),
        })
    }

    async fn read_file(
        &self,
        locator: &Locator,
        path: &std::path::Path,
    ) -> Result<Vec<u8>, CadenzaError> {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| CadenzaError::Fetch {
            locator: locator.to_string(),
            message: "file is not readable".to_string(),
            source: Some(Box::new(e)),
        })?;
        if metadata.len() > self.max_bytes as u64 {
            return Err(self.too_large(locator));
        }
        tokio::fs::read(path).await.map_err(|e| CadenzaError::Fetch {
            locator: locator.to_string(),
            message: "file is not readable".to_string(),
            source: Some(Box::new(e)),
        })
    }

    async fn download(&self, locator: &Locator, url: &str) -> Result<Vec<u8>, CadenzaError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CadenzaError::Fetch {
                locator: locator.to_string(),
                message: "request failed".to_string(),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(locator, format!("server returned {status}")));
        }
        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(self.too_large(locator));
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| CadenzaError::Fetch {
                locator: locator.to_string(),
                message: "failed to read response body".to_string(),
                source: Some(Box::new(e)),
            })?;
            if body.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large(locator));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    fn too_large(&self, locator: &Locator) -> CadenzaError {
        fetch_error(
            locator,
            format!("source exceeds the {} byte limit", self.max_bytes),
        )
    }
}

fn fetch_error(locator: &Locator, message: impl Into<String>) -> CadenzaError {
    CadenzaError::Fetch {
        locator: locator.to_string(),
        message: message.into(),
        source: None,
    }
}
