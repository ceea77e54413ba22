use std::net::SocketAddr;
use std::sync::Arc;

use common::media::MAX_MEDIA_SIZE;
use common::storage::memory::MemoryBlobStore;
use reqwest::Client;
use serde_json::Value;
use tempfile::TempDir;

use hunt_server::config::{
    AppConfig, CorsConfig, DatabaseConfig, PrintConfig, ServerConfig, StorageConfig,
};
use hunt_server::feed::ChangeFeed;
use hunt_server::service::HuntService;
use hunt_server::state::AppState;

pub const PUBLIC_URL: &str = "https://hunts.example.com";
pub const QR_IMAGE_URL: &str = "https://qr.example.com/create";

pub mod routes {
    use std::fmt::Display;

    pub const HUNTS: &str = "/api/v1/hunts";
    pub const HUNTS_LOOKUP: &str = "/api/v1/hunts/lookup";

    pub fn hunt(id: impl Display) -> String {
        format!("/api/v1/hunts/{id}")
    }

    pub fn hunt_events(id: impl Display) -> String {
        format!("/api/v1/hunts/{id}/events")
    }

    pub fn hunt_print(id: impl Display) -> String {
        format!("/api/v1/hunts/{id}/print")
    }

    pub fn clues(hunt_id: impl Display) -> String {
        format!("/api/v1/hunts/{hunt_id}/clues")
    }

    pub fn clues_reorder(hunt_id: impl Display) -> String {
        format!("/api/v1/hunts/{hunt_id}/clues/reorder")
    }

    pub fn clue(hunt_id: impl Display, clue_id: impl Display) -> String {
        format!("/api/v1/hunts/{hunt_id}/clues/{clue_id}")
    }

    pub fn clue_media(hunt_id: impl Display, clue_id: impl Display) -> String {
        format!("/api/v1/hunts/{hunt_id}/clues/{clue_id}/media")
    }

    pub fn media(path: &str) -> String {
        format!("/api/v1/media/{path}")
    }
}

/// A running test server over a throwaway SQLite file and an in-memory
/// blob store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub hunts: HuntService,
    pub blobs: Arc<MemoryBlobStore>,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_max_blob_size(MAX_MEDIA_SIZE).await
    }

    pub async fn spawn_with_max_blob_size(max_blob_size: u64) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}/hunts.db?mode=rwc", dir.path().display());
        let db = hunt_server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");
        hunt_server::database::ensure_indexes(&db)
            .await
            .expect("Failed to create indexes");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                public_url: PUBLIC_URL.to_string(),
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            storage: StorageConfig {
                media_dir: dir.path().join("media"),
                max_blob_size,
            },
            print: PrintConfig {
                qr_image_url: QR_IMAGE_URL.to_string(),
            },
        };

        let blobs = Arc::new(MemoryBlobStore::new());
        let hunts = HuntService::new(db, blobs.clone(), ChangeFeed::default());
        let state = AppState {
            hunts: hunts.clone(),
            config: app_config,
        };

        let app = hunt_server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            hunts,
            blobs,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_empty(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn patch(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PATCH request");

        TestResponse::from_response(res).await
    }

    pub async fn put(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn upload(
        &self,
        path: &str,
        file_name: &str,
        content_type: &str,
        file_bytes: Vec<u8>,
    ) -> TestResponse {
        let part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .expect("Failed to set MIME type");
        let form = reqwest::multipart::Form::new().part("file", part);

        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// Create a hunt via the API and return its `id`.
    pub async fn create_hunt(&self, display_name: &str) -> String {
        let res = self
            .post(
                routes::HUNTS,
                &serde_json::json!({ "display_name": display_name }),
            )
            .await;
        assert_eq!(res.status, 201, "create_hunt failed: {}", res.text);
        res.id()
    }

    /// Append a clue with the given text and return its `id`.
    pub async fn create_clue(&self, hunt_id: &str, text: &str) -> String {
        let res = self.post_empty(&routes::clues(hunt_id)).await;
        assert_eq!(res.status, 201, "create_clue failed: {}", res.text);
        let clue_id = res.id();

        if !text.is_empty() {
            let res = self
                .patch(
                    &routes::clue(hunt_id, &clue_id),
                    &serde_json::json!({ "text": text }),
                )
                .await;
            assert_eq!(res.status, 200, "update_clue failed: {}", res.text);
        }
        clue_id
    }

    /// Clue IDs of a hunt in hunt order.
    pub async fn clue_ids(&self, hunt_id: &str) -> Vec<String> {
        let res = self.get(&routes::clues(hunt_id)).await;
        assert_eq!(res.status, 200, "list_clues failed: {}", res.text);
        res.body
            .as_array()
            .expect("clue list should be an array")
            .iter()
            .map(|c| c["id"].as_str().unwrap().to_string())
            .collect()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            headers,
            text,
            body,
        }
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
