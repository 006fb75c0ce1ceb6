#![allow(dead_code)]

use actix_web::{middleware::NormalizePath, web, App, HttpServer};
use portfolio_admin::{
    routes::configure_routes,
    settings::{AppConfig, AppEnvironment},
    storage::MemoryBackend,
    AppState,
};
use reqwest::{multipart::Part, redirect::Policy, Client, Response};
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    Executor, PgPool,
};
use std::{net::TcpListener, str::FromStr, sync::Arc, time::Duration};
use uuid::Uuid;

pub const PNG_HEADER: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub client: Client,
    pub storage: Arc<MemoryBackend>,
    pub config: AppConfig,
}

impl TestApp {
    /// Spawns the app against a fresh schema, or returns `None` when
    /// `TEST_DATABASE_URL` is not set.
    pub async fn try_spawn() -> Option<Self> {
        let database_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) if !url.trim().is_empty() => url,
            _ => {
                eprintln!("TEST_DATABASE_URL not set, skipping integration test");
                return None;
            }
        };

        let config = test_config(&database_url);
        let schema = format!("test_{}", Uuid::new_v4().simple());

        let admin_pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await
            .expect("Failed to connect to test database");
        admin_pool
            .execute(format!("CREATE SCHEMA {}", schema).as_str())
            .await
            .expect("Failed to create test schema");

        let options = PgConnectOptions::from_str(&database_url)
            .expect("Invalid TEST_DATABASE_URL")
            .options([("search_path", schema.as_str())]);

        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect_with(options)
            .await
            .expect("Failed to create test DB pool");

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .expect("Failed to run migrations");

        let storage = Arc::new(MemoryBackend::new());
        let state = web::Data::new(AppState::new(&config, db_pool.clone(), storage.clone()));

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state.clone())
                .wrap(NormalizePath::trim())
                .configure(configure_routes)
        })
        .listen(listener)
        .expect("Failed to bind server")
        .workers(config.worker_count)
        .run();

        tokio::spawn(server);

        let client = Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to build HTTP client");

        while client.get(format!("{}/health", address)).send().await.is_err() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        Some(Self {
            address,
            db_pool,
            client,
            storage,
            config,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn insert_technology(&self, name: &str, category: &str) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO technologies (name, slug, category) VALUES ($1, $2, $3::technology_category) RETURNING id",
        )
        .bind(name)
        .bind(slug::slugify(name))
        .bind(category)
        .fetch_one(&self.db_pool)
        .await
        .unwrap()
    }

    /// Ids of the project's files, in sort order.
    pub async fn project_file_ids(&self, project_id: i64) -> Vec<i64> {
        sqlx::query_scalar("SELECT file_id FROM project_files WHERE project_id = $1 ORDER BY sort_order")
            .bind(project_id)
            .fetch_all(&self.db_pool)
            .await
            .unwrap()
    }

    pub async fn project_file_orders(&self, project_id: i64) -> Vec<(i64, i32, bool)> {
        sqlx::query_as("SELECT file_id, sort_order, is_featured FROM project_files WHERE project_id = $1 ORDER BY sort_order")
            .bind(project_id)
            .fetch_all(&self.db_pool)
            .await
            .unwrap()
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.db_pool)
            .await
            .unwrap()
    }

    pub async fn latest_id(&self, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT MAX(id) FROM {}", table))
            .fetch_one(&self.db_pool)
            .await
            .unwrap()
    }
}

pub fn png_part(name: &str) -> Part {
    let mut bytes = PNG_HEADER.to_vec();
    bytes.extend_from_slice(&[0u8; 64]);
    Part::bytes(bytes)
        .file_name(name.to_string())
        .mime_str("image/png")
        .unwrap()
}

pub fn pdf_part(name: &str) -> Part {
    Part::bytes(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n1 0 obj\n<<>>\nendobj\n".to_vec())
        .file_name(name.to_string())
        .mime_str("application/pdf")
        .unwrap()
}

pub async fn json_body(response: Response) -> serde_json::Value {
    response.json().await.expect("Response body is not JSON")
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn test_config(database_url: &str) -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Portfolio-Admin-Test".to_string(),
        port: 0,
        host: "127.0.0.1".to_string(),
        worker_count: 1,
        database_url: database_url.to_string(),
        db_max_connections: 5,
        cors_allowed_origins: vec!["*".to_string()],
        storage_root: "storage/test".to_string(),
        storage_public_url: "/storage".to_string(),
        default_per_page: 10,
        max_per_page: 100,
        max_image_kb: 2048,
        max_document_kb: 5120,
    }
}
