//! Integration tests for tokoledger.
//!
//! Each test starts the full application on an ephemeral local port, backed
//! by the in-memory repository and a temporary upload directory, and talks
//! to it over HTTP.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tokoledger-integration-tests
//! ```

use std::path::Path;
use std::sync::Arc;

use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use tempfile::TempDir;

use tokoledger_server::config::{ServerConfig, UploadConfig};
use tokoledger_server::db::MemoryRepository;
use tokoledger_server::{AppState, app};

/// A running server and a client pointed at it.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    pub repo: Arc<MemoryRepository>,
    upload_dir: TempDir,
}

impl TestContext {
    /// Start a server with default upload limits.
    pub async fn new() -> Self {
        Self::with_uploads(|_| {}).await
    }

    /// Start a server, letting the caller adjust upload limits first.
    pub async fn with_uploads(configure: impl FnOnce(&mut UploadConfig)) -> Self {
        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        let mut uploads = UploadConfig {
            root: upload_dir.path().to_path_buf(),
            ..UploadConfig::default()
        };
        configure(&mut uploads);

        let repo = Arc::new(MemoryRepository::new());
        let state = AppState::new(ServerConfig::for_uploads(uploads), repo.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        tokio::spawn(async move {
            axum::serve(listener, app(state))
                .await
                .expect("Test server error");
        });

        Self {
            client: Client::new(),
            base_url: format!("http://{addr}"),
            repo,
            upload_dir,
        }
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Directory uploaded files are written to.
    pub fn upload_root(&self) -> &Path {
        self.upload_dir.path()
    }

    /// `GET` and decode the JSON body.
    pub async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed");
        decode(resp).await
    }

    /// `POST` a JSON body and decode the JSON response.
    pub async fn post_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("POST failed");
        decode(resp).await
    }

    /// `PUT` a JSON body and decode the JSON response.
    pub async fn put_json(&self, path: &str, body: &Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("PUT failed");
        decode(resp).await
    }

    /// `DELETE` and decode the JSON response.
    pub async fn delete_json(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("DELETE failed");
        decode(resp).await
    }
}

/// Split a response into its status and JSON body (`Null` when empty).
pub async fn decode(resp: Response) -> (StatusCode, Value) {
    let status = resp.status();
    let bytes = resp.bytes().await.expect("Failed to read response body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body is not JSON")
    };
    (status, body)
}
