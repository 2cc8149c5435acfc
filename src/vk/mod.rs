//! VK photos API: typed `photos.get` client and the pull-based pager that
//! walks a profile album page by page.

pub mod error;
pub mod types;

pub use error::VkError;
pub use types::{Likes, PhotoPage, PhotoRecord, PhotoSize};

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::pacing::FixedIntervalGate;
use types::Envelope;

const API_ROOT: &str = "https://api.vk.com/method";
/// Pinned API version; newer ones change the `sizes` payload.
const API_VERSION: &str = "5.131";

/// Photos requested per page, the documented maximum.
pub const PAGE_SIZE: u64 = 1000;
/// Minimum spacing between page requests.
pub const PAGE_INTERVAL: Duration = Duration::from_millis(500);

/// One page fetch against the photos API. The pager drives this; tests
/// substitute scripted pages.
#[async_trait]
pub trait PhotoPages: Send + Sync {
    async fn fetch_page(&self, owner_id: i64, offset: u64, count: u64)
        -> Result<PhotoPage, VkError>;
}

/// `photos.get` over reqwest.
pub struct VkClient {
    http: reqwest::Client,
    token: String,
}

impl VkClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self { http, token }
    }
}

#[async_trait]
impl PhotoPages for VkClient {
    async fn fetch_page(
        &self,
        owner_id: i64,
        offset: u64,
        count: u64,
    ) -> Result<PhotoPage, VkError> {
        let url = format!("{API_ROOT}/photos.get");
        let owner = owner_id.to_string();
        let count = count.to_string();
        let offset = offset.to_string();
        debug!("photos.get owner_id={owner} offset={offset} count={count}");

        let response = self
            .http
            .get(&url)
            .query(&[
                ("access_token", self.token.as_str()),
                ("v", API_VERSION),
                ("owner_id", owner.as_str()),
                ("album_id", "profile"),
                ("extended", "1"),
                ("photo_sizes", "1"),
                ("count", count.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(VkError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        let envelope: Envelope = serde_json::from_slice(&body)?;
        if let Some(error) = envelope.error {
            return Err(VkError::Api {
                code: error.error_code,
                message: error.error_msg,
            });
        }
        envelope.response.ok_or(VkError::MissingField("response"))
    }
}

/// Lazy cursor over a profile album.
///
/// Pages are pulled on demand; the cursor advances by [`PAGE_SIZE`] per
/// fetch and never resets. The sequence ends at the first page with zero
/// items (a short non-empty page does not end it). Fetches are spaced by
/// the gate, and the cancellation token is consulted at page boundaries.
pub struct PhotoPager<'a> {
    source: &'a dyn PhotoPages,
    owner_id: i64,
    offset: u64,
    gate: FixedIntervalGate,
    cancel: CancellationToken,
    total: Option<u64>,
    done: bool,
}

impl<'a> PhotoPager<'a> {
    pub fn new(
        source: &'a dyn PhotoPages,
        owner_id: i64,
        gate: FixedIntervalGate,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            owner_id,
            offset: 0,
            gate,
            cancel,
            total: None,
            done: false,
        }
    }

    /// Collection total reported by the API; known once the first page is in.
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Pull the next page. `None` means the album is drained or cancellation
    /// was requested.
    ///
    /// Yielded pages are cleaned up: records without any size variant are
    /// dropped with a warning, and every surviving record has its variants
    /// sorted ascending by area. The raw item count still decides
    /// termination, so a page of nothing but skipped records comes back
    /// empty rather than ending the album.
    pub async fn next_page(&mut self) -> Result<Option<PhotoPage>, VkError> {
        if self.done || self.cancel.is_cancelled() {
            self.done = true;
            return Ok(None);
        }

        self.gate.wait().await;
        let mut page = self
            .source
            .fetch_page(self.owner_id, self.offset, PAGE_SIZE)
            .await?;
        self.total.get_or_insert(page.count);

        if page.items.is_empty() {
            self.done = true;
            return Ok(None);
        }
        self.offset += PAGE_SIZE;

        page.items.retain(|record| {
            if record.sizes.is_empty() {
                warn!("Skipping photo {} with no size variants", record.id);
                false
            } else {
                true
            }
        });
        for record in &mut page.items {
            record.normalize();
        }
        Ok(Some(page))
    }
}
