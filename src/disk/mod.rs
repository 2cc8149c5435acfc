//! Yandex Disk REST client: destination directory preparation, existence
//! probes, upload-href negotiation, and the binary PUT itself.
//!
//! Two seams stack here. [`StorageSession`] is the plain HTTP surface
//! (auth header injection lives in its reqwest impl), and [`DiskStore`] is
//! the capability the pipeline and name resolver actually consume. Tests
//! script the former to exercise the client, and fake the latter to
//! exercise the pipeline.

pub mod error;
pub mod types;

pub use error::DiskError;
pub use types::{DirectoryStatus, UploadOutcome};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::AUTHORIZATION;
use tracing::debug;

use types::{ResourceProbe, UploadLink};

const RESOURCES_URL: &str = "https://cloud-api.yandex.net/v1/disk/resources";
const UPLOAD_URL: &str = "https://cloud-api.yandex.net/v1/disk/resources/upload";

/// Status plus raw body of one storage API answer.
pub struct HttpReply {
    pub status: u16,
    pub body: Bytes,
}

/// Minimal async HTTP surface under the disk client.
#[async_trait]
pub trait StorageSession: Send + Sync {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpReply, DiskError>;

    /// Bodyless PUT; only the status matters to callers.
    async fn put(&self, url: &str, query: &[(&str, &str)]) -> Result<u16, DiskError>;

    /// Raw-bytes PUT to an absolute pre-signed URL. No auth is attached:
    /// the href itself carries the authorization.
    async fn put_bytes(&self, url: &str, body: Bytes) -> Result<u16, DiskError>;
}

/// `StorageSession` over reqwest with OAuth header injection.
pub struct HttpStorageSession {
    http: reqwest::Client,
    auth_header: String,
}

impl HttpStorageSession {
    pub fn new(http: reqwest::Client, token: &str) -> Self {
        Self {
            http,
            auth_header: format!("OAuth {token}"),
        }
    }
}

fn transport(url: &str, e: reqwest::Error) -> DiskError {
    DiskError::Transport {
        path: url.to_string(),
        message: e.to_string(),
    }
}

#[async_trait]
impl StorageSession for HttpStorageSession {
    async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpReply, DiskError> {
        let response = self
            .http
            .get(url)
            .header(AUTHORIZATION, &self.auth_header)
            .query(query)
            .send()
            .await
            .map_err(|e| transport(url, e))?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| transport(url, e))?;
        Ok(HttpReply { status, body })
    }

    async fn put(&self, url: &str, query: &[(&str, &str)]) -> Result<u16, DiskError> {
        let response = self
            .http
            .put(url)
            .header(AUTHORIZATION, &self.auth_header)
            .query(query)
            .send()
            .await
            .map_err(|e| transport(url, e))?;
        Ok(response.status().as_u16())
    }

    async fn put_bytes(&self, url: &str, body: Bytes) -> Result<u16, DiskError> {
        let response = self
            .http
            .put(url)
            .body(body)
            .send()
            .await
            .map_err(|e| transport(url, e))?;
        Ok(response.status().as_u16())
    }
}

/// The storage capability consumed by the backup pipeline.
#[async_trait]
pub trait DiskStore: Send + Sync {
    /// Make sure `path` exists as a directory, creating it when the probe
    /// does not confirm it.
    async fn ensure_directory(&self, path: &str) -> Result<DirectoryStatus, DiskError>;

    /// Whether a resource occupies `path`.
    async fn resource_exists(&self, path: &str) -> Result<bool, DiskError>;

    /// Negotiate a single-use upload href for `path`.
    async fn request_upload_href(&self, path: &str, overwrite: bool)
        -> Result<String, DiskError>;

    /// PUT the bytes to a previously negotiated href.
    async fn upload(&self, href: &str, body: Bytes) -> Result<UploadOutcome, DiskError>;
}

/// Yandex Disk client over a [`StorageSession`].
pub struct DiskClient {
    session: Box<dyn StorageSession>,
}

impl DiskClient {
    pub fn new(session: Box<dyn StorageSession>) -> Self {
        Self { session }
    }

    pub fn over_http(http: reqwest::Client, token: &str) -> Self {
        Self::new(Box::new(HttpStorageSession::new(http, token)))
    }
}

#[async_trait]
impl DiskStore for DiskClient {
    async fn ensure_directory(&self, path: &str) -> Result<DirectoryStatus, DiskError> {
        let probe = self.session.get(RESOURCES_URL, &[("path", path)]).await?;
        if (200..300).contains(&probe.status) {
            debug!("Directory {path} already present");
            return Ok(DirectoryStatus::AlreadyExists);
        }
        // Anything non-2xx reads as "absent" and is answered with a create.
        // The create's status is not inspected: losing a race to another
        // writer still leaves the directory in place.
        let status = self.session.put(RESOURCES_URL, &[("path", path)]).await?;
        debug!("Created directory {path} (HTTP {status})");
        Ok(DirectoryStatus::Created)
    }

    async fn resource_exists(&self, path: &str) -> Result<bool, DiskError> {
        let reply = self.session.get(RESOURCES_URL, &[("path", path)]).await?;
        match serde_json::from_slice::<ResourceProbe>(&reply.body) {
            // The error marker alone decides; the HTTP status is ignored so
            // that not-found answers stay non-exceptional.
            Ok(probe) => Ok(probe.error.is_none()),
            Err(_) if !(200..300).contains(&reply.status) => Err(DiskError::Rejected {
                status: reply.status,
                path: path.to_string(),
            }),
            Err(source) => Err(DiskError::Decode {
                path: path.to_string(),
                source,
            }),
        }
    }

    async fn request_upload_href(
        &self,
        path: &str,
        overwrite: bool,
    ) -> Result<String, DiskError> {
        let overwrite = if overwrite { "true" } else { "false" };
        let reply = self
            .session
            .get(UPLOAD_URL, &[("path", path), ("overwrite", overwrite)])
            .await?;
        if !(200..300).contains(&reply.status) {
            return Err(DiskError::Rejected {
                status: reply.status,
                path: path.to_string(),
            });
        }
        let link: UploadLink =
            serde_json::from_slice(&reply.body).map_err(|source| DiskError::Decode {
                path: path.to_string(),
                source,
            })?;
        link.href.ok_or_else(|| DiskError::MissingHref {
            path: path.to_string(),
        })
    }

    async fn upload(&self, href: &str, body: Bytes) -> Result<UploadOutcome, DiskError> {
        let status = self.session.put_bytes(href, body).await?;
        if (200..300).contains(&status) {
            Ok(UploadOutcome::Accepted)
        } else {
            Ok(UploadOutcome::Refused(status))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashSet, VecDeque};
    use std::sync::{Arc, Mutex};

    use super::*;

    const NOT_FOUND_BODY: &str = r#"{
        "message": "Resource not found.",
        "description": "Resource not found.",
        "error": "DiskNotFoundError"
    }"#;

    fn reply(status: u16, body: &str) -> Result<HttpReply, DiskError> {
        Ok(HttpReply {
            status,
            body: Bytes::from(body.to_string()),
        })
    }

    fn transport_err(url: &str) -> DiskError {
        DiskError::Transport {
            path: url.to_string(),
            message: "connection refused".to_string(),
        }
    }

    /// Answers from pre-loaded queues and keeps a call log. The log is
    /// shared through an `Arc` so tests can read it after the session moves
    /// into the client.
    #[derive(Default)]
    struct ScriptedSession {
        gets: Mutex<VecDeque<Result<HttpReply, DiskError>>>,
        puts: Mutex<VecDeque<Result<u16, DiskError>>>,
        uploads: Mutex<VecDeque<Result<u16, DiskError>>>,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl ScriptedSession {
        fn on_get(self, r: Result<HttpReply, DiskError>) -> Self {
            self.gets.lock().unwrap().push_back(r);
            self
        }

        fn on_put(self, r: Result<u16, DiskError>) -> Self {
            self.puts.lock().unwrap().push_back(r);
            self
        }

        fn on_upload(self, r: Result<u16, DiskError>) -> Self {
            self.uploads.lock().unwrap().push_back(r);
            self
        }

        fn log_handle(&self) -> Arc<Mutex<Vec<String>>> {
            self.log.clone()
        }

        fn note(&self, verb: &str, url: &str, query: &[(&str, &str)]) {
            let q: Vec<String> = query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            self.log
                .lock()
                .unwrap()
                .push(format!("{verb} {url}?{}", q.join("&")));
        }
    }

    #[async_trait]
    impl StorageSession for ScriptedSession {
        async fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<HttpReply, DiskError> {
            self.note("GET", url, query);
            self.gets.lock().unwrap().pop_front().expect("unscripted GET")
        }

        async fn put(&self, url: &str, query: &[(&str, &str)]) -> Result<u16, DiskError> {
            self.note("PUT", url, query);
            self.puts.lock().unwrap().pop_front().expect("unscripted PUT")
        }

        async fn put_bytes(&self, url: &str, _body: Bytes) -> Result<u16, DiskError> {
            self.log.lock().unwrap().push(format!("UPLOAD {url}"));
            self.uploads
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted upload")
        }
    }

    /// Stateful directory set, for idempotence checks.
    #[derive(Default)]
    struct DirSession {
        dirs: Mutex<HashSet<String>>,
    }

    #[async_trait]
    impl StorageSession for DirSession {
        async fn get(&self, _url: &str, query: &[(&str, &str)]) -> Result<HttpReply, DiskError> {
            let path = query
                .iter()
                .find(|(k, _)| *k == "path")
                .map(|(_, v)| v.to_string())
                .unwrap_or_default();
            if self.dirs.lock().unwrap().contains(&path) {
                reply(200, r#"{"name": "VkBackup", "type": "dir"}"#)
            } else {
                reply(404, NOT_FOUND_BODY)
            }
        }

        async fn put(&self, _url: &str, query: &[(&str, &str)]) -> Result<u16, DiskError> {
            let path = query
                .iter()
                .find(|(k, _)| *k == "path")
                .map(|(_, v)| v.to_string())
                .unwrap_or_default();
            self.dirs.lock().unwrap().insert(path);
            Ok(201)
        }

        async fn put_bytes(&self, _url: &str, _body: Bytes) -> Result<u16, DiskError> {
            Ok(201)
        }
    }

    #[tokio::test]
    async fn test_ensure_directory_already_present() {
        let session = ScriptedSession::default().on_get(reply(200, r#"{"type": "dir"}"#));
        let client = DiskClient::new(Box::new(session));
        // Holding no second call scripted also proves no create PUT is sent.
        let status = client.ensure_directory("/VkBackup").await.unwrap();
        assert_eq!(status, DirectoryStatus::AlreadyExists);
    }

    #[tokio::test]
    async fn test_ensure_directory_creates_when_probe_misses() {
        let session = ScriptedSession::default()
            .on_get(reply(404, NOT_FOUND_BODY))
            .on_put(Ok(201));
        let client = DiskClient::new(Box::new(session));
        let status = client.ensure_directory("/VkBackup").await.unwrap();
        assert_eq!(status, DirectoryStatus::Created);
    }

    #[tokio::test]
    async fn test_ensure_directory_ignores_create_status() {
        // Losing the create race answers 409; the directory is there either way.
        let session = ScriptedSession::default()
            .on_get(reply(404, NOT_FOUND_BODY))
            .on_put(Ok(409));
        let client = DiskClient::new(Box::new(session));
        let status = client.ensure_directory("/VkBackup").await.unwrap();
        assert_eq!(status, DirectoryStatus::Created);
    }

    #[tokio::test]
    async fn test_ensure_directory_idempotent() {
        let client = DiskClient::new(Box::<DirSession>::default());
        assert_eq!(
            client.ensure_directory("/VkBackup").await.unwrap(),
            DirectoryStatus::Created
        );
        assert_eq!(
            client.ensure_directory("/VkBackup").await.unwrap(),
            DirectoryStatus::AlreadyExists
        );
    }

    #[tokio::test]
    async fn test_ensure_directory_transport_error_propagates() {
        let session = ScriptedSession::default().on_get(Err(transport_err(RESOURCES_URL)));
        let client = DiskClient::new(Box::new(session));
        let err = client.ensure_directory("/VkBackup").await.unwrap_err();
        assert!(matches!(err, DiskError::Transport { .. }));
    }

    #[tokio::test]
    async fn test_resource_exists_when_no_error_marker() {
        let session =
            ScriptedSession::default().on_get(reply(200, r#"{"name": "10.jpg", "size": 1}"#));
        let client = DiskClient::new(Box::new(session));
        assert!(client.resource_exists("/VkBackup/10.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_resource_absent_on_error_marker() {
        let session = ScriptedSession::default().on_get(reply(404, NOT_FOUND_BODY));
        let client = DiskClient::new(Box::new(session));
        assert!(!client.resource_exists("/VkBackup/10.jpg").await.unwrap());
    }

    #[tokio::test]
    async fn test_resource_probe_gateway_html_maps_to_rejection() {
        let session = ScriptedSession::default().on_get(reply(502, "<html>bad gateway</html>"));
        let client = DiskClient::new(Box::new(session));
        let err = client.resource_exists("/VkBackup/10.jpg").await.unwrap_err();
        assert!(matches!(err, DiskError::Rejected { status: 502, .. }));
    }

    #[tokio::test]
    async fn test_resource_probe_undecodable_success_is_decode_error() {
        let session = ScriptedSession::default().on_get(reply(200, "not json"));
        let client = DiskClient::new(Box::new(session));
        let err = client.resource_exists("/VkBackup/10.jpg").await.unwrap_err();
        assert!(matches!(err, DiskError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_upload_href_negotiated_with_overwrite() {
        let session = ScriptedSession::default().on_get(reply(
            200,
            r#"{"href": "https://uploader.example/target", "method": "PUT"}"#,
        ));
        let client = DiskClient::new(Box::new(session));
        let href = client
            .request_upload_href("/VkBackup/10.jpg", true)
            .await
            .unwrap();
        assert_eq!(href, "https://uploader.example/target");
    }

    #[tokio::test]
    async fn test_upload_href_query_carries_path_and_overwrite() {
        let session = ScriptedSession::default().on_get(reply(200, r#"{"href": "https://u/t"}"#));
        let log = session.log_handle();
        let client = DiskClient::new(Box::new(session));
        client
            .request_upload_href("/VkBackup/10.jpg", true)
            .await
            .unwrap();
        let calls = log.lock().unwrap().clone();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with(&format!("GET {UPLOAD_URL}?")));
        assert!(calls[0].contains("path=/VkBackup/10.jpg"));
        assert!(calls[0].contains("overwrite=true"));
    }

    #[tokio::test]
    async fn test_upload_href_missing_is_contract_error() {
        let session =
            ScriptedSession::default().on_get(reply(200, r#"{"operation_id": "d80c269c"}"#));
        let client = DiskClient::new(Box::new(session));
        let err = client
            .request_upload_href("/VkBackup/10.jpg", true)
            .await
            .unwrap_err();
        assert!(matches!(err, DiskError::MissingHref { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_upload_href_rejection_carries_status() {
        let session = ScriptedSession::default().on_get(reply(
            401,
            r#"{"message": "Unauthorized", "error": "UnauthorizedError"}"#,
        ));
        let client = DiskClient::new(Box::new(session));
        let err = client
            .request_upload_href("/VkBackup/10.jpg", true)
            .await
            .unwrap_err();
        assert!(matches!(err, DiskError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_upload_accepted_on_201() {
        let session = ScriptedSession::default().on_upload(Ok(201));
        let client = DiskClient::new(Box::new(session));
        let outcome = client
            .upload("https://uploader.example/target", Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        assert_eq!(outcome, UploadOutcome::Accepted);
    }

    #[tokio::test]
    async fn test_upload_refusal_is_an_outcome_not_an_error() {
        let session = ScriptedSession::default().on_upload(Ok(413));
        let client = DiskClient::new(Box::new(session));
        let outcome = client
            .upload("https://uploader.example/target", Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        assert_eq!(outcome, UploadOutcome::Refused(413));
    }

    #[tokio::test]
    async fn test_upload_transport_failure_is_an_error() {
        let session =
            ScriptedSession::default().on_upload(Err(transport_err("https://uploader.example/t")));
        let client = DiskClient::new(Box::new(session));
        let err = client
            .upload("https://uploader.example/t", Bytes::from_static(b"jpeg"))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_upload_goes_to_the_negotiated_href() {
        let session = ScriptedSession::default().on_upload(Ok(201));
        let log = session.log_handle();
        let client = DiskClient::new(Box::new(session));
        client
            .upload("https://uploader.example/target", Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        let calls = log.lock().unwrap().clone();
        assert_eq!(calls, ["UPLOAD https://uploader.example/target"]);
    }
}
