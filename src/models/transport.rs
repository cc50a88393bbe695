//! HTTP transport seam for header probes and streaming downloads.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use tokio::io::AsyncRead;
use tokio_util::io::StreamReader;

use super::error::LoaderError;

/// Response body as a byte reader. Consumed incrementally by the loader.
pub type BodyReader = Box<dyn AsyncRead + Send + Unpin>;

/// Status and headers of a HEAD request. Header names are lowercase.
#[derive(Debug, Clone, Default)]
pub struct HeadResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
}

impl HeadResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

/// Streaming GET response.
pub struct GetResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: BodyReader,
}

impl std::fmt::Debug for GetResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GetResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Network client used by the probe and the streaming loader.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn head(&self, url: &str) -> Result<HeadResponse, LoaderError>;
    async fn get(&self, url: &str) -> Result<GetResponse, LoaderError>;
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a client whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, LoaderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoaderError::Transport(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn head(&self, url: &str) -> Result<HeadResponse, LoaderError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| LoaderError::Transport(e.to_string()))?;

        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();

        Ok(HeadResponse { status: response.status().as_u16(), headers })
    }

    async fn get(&self, url: &str) -> Result<GetResponse, LoaderError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LoaderError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        let stream = response
            .bytes_stream()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
        let body: BodyReader = Box::new(StreamReader::new(Box::pin(stream)));

        Ok(GetResponse { status, content_length, body })
    }
}
