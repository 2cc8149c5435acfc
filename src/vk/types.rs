use serde::Deserialize;

/// One size variant of a photo: a CDN URL plus its pixel dimensions and the
/// service's single-letter size class.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(rename = "type", default)]
    pub letter: String,
}

impl PhotoSize {
    /// Pixel area, the ranking key for variants.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Like summary attached to a photo. Only the count is carried; it becomes
/// the photo's display name on the destination.
#[derive(Debug, Clone, Deserialize)]
pub struct Likes {
    pub count: u64,
}

/// A single photo with its size variants.
///
/// After [`normalize`](Self::normalize) the variants are sorted ascending by
/// area, so the last entry is the best one to download. Elderly uploads
/// report 0x0 for some variants; the sort is stable, so those keep their API
/// order ahead of every measured variant.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoRecord {
    pub id: i64,
    pub likes: Likes,
    #[serde(default)]
    pub sizes: Vec<PhotoSize>,
}

impl PhotoRecord {
    /// The highest-resolution variant, once normalized.
    pub fn largest(&self) -> Option<&PhotoSize> {
        self.sizes.last()
    }

    pub(crate) fn normalize(&mut self) {
        self.sizes.sort_by_key(PhotoSize::area);
    }
}

/// One page of `photos.get` results plus the collection-wide total.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoPage {
    pub count: u64,
    pub items: Vec<PhotoRecord>,
}

/// Top-level envelope: the API answers with either `response` or `error`,
/// always under HTTP 200.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope {
    pub response: Option<PhotoPage>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiError {
    pub error_code: i64,
    pub error_msg: String,
}
