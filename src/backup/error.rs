use thiserror::Error;

use crate::disk::DiskError;

/// Why one photo failed. The pipeline records these and moves to the next
/// photo; none of them ends the run.
#[derive(Debug, Error)]
pub enum PhotoError {
    /// Network-level failure while fetching the source image.
    #[error("fetching source image: {message}")]
    Fetch { message: String },

    /// The image CDN answered with a non-2xx status.
    #[error("source image fetch returned HTTP {status}")]
    FetchStatus { status: u16 },

    /// Record arrived without a single size variant, nothing to download.
    #[error("photo record carries no size variants")]
    NoVariants,

    /// Storage-side failure anywhere between name resolution and upload.
    #[error(transparent)]
    Storage(#[from] DiskError),
}

impl PhotoError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PhotoError::Fetch { .. } => true,
            PhotoError::FetchStatus { status } => *status == 429 || *status >= 500,
            PhotoError::NoVariants => false,
            PhotoError::Storage(e) => e.is_retryable(),
        }
    }

    /// Status to surface in the failure report, when a server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            PhotoError::FetchStatus { status } => Some(*status),
            PhotoError::Storage(e) => e.status_code(),
            _ => None,
        }
    }
}
