use thiserror::Error;

/// Failures while enumerating photos.
///
/// Every one of these aborts the run: there is no partial-enumeration mode,
/// and skipping a bad page would silently truncate the backup.
#[derive(Debug, Error)]
pub enum VkError {
    /// Network-level failure reaching the API.
    #[error("vk transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-2xx HTTP status.
    #[error("vk api returned HTTP {0}")]
    Status(u16),

    /// A well-formed error object inside a 2xx response.
    #[error("vk api error {code}: {message}")]
    Api { code: i64, message: String },

    /// Response body that does not decode as a photos page.
    #[error("undecodable vk response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Response decoded but carried neither a result nor an error object.
    #[error("vk response missing the {0} field")]
    MissingField(&'static str),
}
