//! Source-image download from the photo CDN.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::PhotoError;

/// Fetches the bytes behind a variant URL. Faked in pipeline tests.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, PhotoError>;
}

/// `ImageFetcher` over reqwest. Variant URLs are pre-signed by the API, so
/// no auth is attached.
pub struct HttpImageFetcher {
    http: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, PhotoError> {
        let response = self.http.get(url).send().await.map_err(|e| PhotoError::Fetch {
            message: e.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(PhotoError::FetchStatus {
                status: status.as_u16(),
            });
        }
        response.bytes().await.map_err(|e| PhotoError::Fetch {
            message: e.to_string(),
        })
    }
}
