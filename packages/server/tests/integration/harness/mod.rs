use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use common::storage::{BlobHandle, BlobStore, ImageFormat};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use server::config::{AppConfig, CorsConfig, DatabaseConfig, ServerConfig, StorageConfig};
use server::state::AppState;

pub mod routes {
    pub const CATEGORIES: &str = "/api/v1/categories";
    pub const PRODUCTS: &str = "/api/v1/products";

    pub fn category(id: i32) -> String {
        format!("/api/v1/categories/{id}")
    }

    pub fn product(id: i32) -> String {
        format!("/api/v1/products/{id}")
    }

    pub fn product_image(id: i32, image_id: i32) -> String {
        format!("/api/v1/products/{id}/images/{image_id}")
    }

    pub fn image(handle: &str) -> String {
        format!("/api/v1/images/{handle}")
    }
}

const MAX_BLOB_SIZE: u64 = 16 * 1024 * 1024;

/// A running test server backed by a file SQLite database and a blob
/// store in a temporary directory.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    blob_store: Arc<dyn BlobStore>,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"].as_i64().expect("Response should have an id") as i32
    }
}

/// A small valid PNG payload, generated with the `image` crate.
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_fn(8, 8, |x, y| image::Rgb([x as u8 * 16, y as u8 * 16, 128]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode test PNG");
    buf.into_inner()
}

fn image_part(data: Vec<u8>) -> Part {
    Part::bytes(data)
        .file_name("upload.png")
        .mime_str("image/png")
        .expect("Failed to set MIME type")
}

/// Multipart form for category create/update requests.
pub fn category_form(name: &str, description: &str, image: Option<Vec<u8>>) -> Form {
    let mut form = Form::new()
        .text("name", name.to_string())
        .text("description", description.to_string());
    if let Some(data) = image {
        form = form.part("image", image_part(data));
    }
    form
}

/// Multipart form for product create/update requests.
pub fn product_form(
    name: &str,
    description: &str,
    category_id: i32,
    images: Vec<Vec<u8>>,
) -> Form {
    let mut form = Form::new()
        .text("name", name.to_string())
        .text("description", description.to_string())
        .text("category_id", category_id.to_string());
    for data in images {
        form = form.part("images", image_part(data));
    }
    form
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = TempDir::new().expect("Failed to create temp directory");

        let db_path = dir.path().join("catalog.sqlite");
        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize test database");

        let blob_root = dir.path().join("blobs");
        let store = FilesystemBlobStore::new(blob_root.clone(), MAX_BLOB_SIZE)
            .await
            .expect("Failed to create blob store");
        let blob_store: Arc<dyn BlobStore> = Arc::new(store);

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig { url: db_url },
            storage: StorageConfig {
                root: blob_root,
                max_blob_size: MAX_BLOB_SIZE,
                image_format: ImageFormat::Jpeg,
            },
        };

        let state = AppState {
            db: db.clone(),
            blob_store: blob_store.clone(),
            config: Arc::new(config),
        };

        let app = server::build_router(state);

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
            db,
            blob_store,
            _dir: dir,
        }
    }

    fn url(&self, path: &str) -> String {
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

    /// GET returning the raw bytes and content type, for image downloads.
    pub async fn get_bytes(&self, path: &str) -> (u16, Option<String>, Vec<u8>) {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        let status = res.status().as_u16();
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        (status, content_type, bytes)
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn put_multipart(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .multipart(form)
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

    /// Create a category via the API and return its `id`.
    pub async fn create_category(&self, name: &str, image: Option<Vec<u8>>) -> i32 {
        let res = self
            .post_multipart(routes::CATEGORIES, category_form(name, "A category", image))
            .await;
        assert_eq!(res.status, 201, "create_category failed: {}", res.text);
        res.id()
    }

    /// Create a product via the API and return the full response.
    pub async fn create_product(
        &self,
        name: &str,
        category_id: i32,
        images: Vec<Vec<u8>>,
    ) -> TestResponse {
        let res = self
            .post_multipart(
                routes::PRODUCTS,
                product_form(name, "A product", category_id, images),
            )
            .await;
        assert_eq!(res.status, 201, "create_product failed: {}", res.text);
        res
    }

    /// Whether the blob a stored handle refers to exists in the store.
    pub async fn blob_exists(&self, handle: &str) -> bool {
        let handle = BlobHandle::parse(handle).expect("Stored handle should parse");
        self.blob_store
            .exists(&handle)
            .await
            .expect("Blob existence check failed")
    }
}
