//! Retrieval of externally referenced scripts.

use async_trait::async_trait;
use log::debug;
use reqwest::StatusCode;
use url::Url;

use crate::error_handling::RetrievalError;

/// Source of external script bodies.
///
/// Anything but a complete 200 response is a [`RetrievalError`].
#[async_trait]
pub trait ScriptFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, RetrievalError>;
}

/// [`ScriptFetcher`] over a shared `reqwest::Client`.
///
/// The client carries the timeout and User-Agent (see
/// [`crate::initialization::init_client`]); this type adds the status check and
/// the body size limit.
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }
}

#[async_trait]
impl ScriptFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, RetrievalError> {
        debug!("Fetching {url}");
        let mut response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RetrievalError::Status(status.as_u16()));
        }

        // Reject early when the server announces an oversized body
        if let Some(declared) = response.content_length() {
            let declared = usize::try_from(declared).unwrap_or(usize::MAX);
            if declared > self.max_bytes {
                return Err(RetrievalError::TooLarge {
                    size: declared,
                    limit: self.max_bytes,
                });
            }
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(RetrievalError::TooLarge {
                    size: body.len() + chunk.len(),
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}
