use serde::Deserialize;

/// What `ensure_directory` found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStatus {
    Created,
    AlreadyExists,
}

/// Terminal state of one binary upload. A non-2xx answer from the upload
/// host is a recorded outcome, not an error, so the pipeline can keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Accepted,
    Refused(u16),
}

/// Metadata probe body. Only the error marker matters: its presence means
/// the resource is absent, its absence means the resource exists. The rest
/// of the payload is deliberately ignored.
#[derive(Debug, Deserialize)]
pub(crate) struct ResourceProbe {
    #[serde(default)]
    pub error: Option<String>,
}

/// Upload negotiation body; `href` is a single-use pre-signed URL.
#[derive(Debug, Deserialize)]
pub(crate) struct UploadLink {
    #[serde(default)]
    pub href: Option<String>,
}
