use thiserror::Error;

/// Typed storage errors enabling retry classification.
///
/// `is_retryable()` separates transient answers (network faults, rate
/// limits, server errors) from permanent ones (quota, bad paths, contract
/// drift) so the per-photo retry loop can abort early.
#[derive(Debug, Error)]
pub enum DiskError {
    /// Network-level failure before any HTTP status arrived.
    #[error("storage transport error for {path}: {message}")]
    Transport { path: String, message: String },

    /// Non-2xx answer from the storage API.
    #[error("storage rejected {path} with HTTP {status}")]
    Rejected { status: u16, path: String },

    /// Well-formed negotiation answer that carries no upload href. The API
    /// contract changed; retrying the same request cannot help.
    #[error("upload link for {path} carried no href")]
    MissingHref { path: String },

    /// Response body that does not decode into the expected shape.
    #[error("undecodable storage response for {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl DiskError {
    /// Whether this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            DiskError::Transport { .. } => true,
            DiskError::Rejected { status, .. } => *status == 429 || *status >= 500,
            DiskError::MissingHref { .. } => false,
            DiskError::Decode { .. } => false,
        }
    }

    /// HTTP status carried by the failure, when the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DiskError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
