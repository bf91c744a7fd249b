//! Shared helpers for leadsplit-server integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use leadsplit_common::config::DEFAULT_MAX_UPLOAD_BYTES;
use leadsplit_common::db::init_database;
use leadsplit_server::upload::UploadSettings;
use leadsplit_server::{build_router, AppState};

const BOUNDARY: &str = "leadsplit-test-boundary";

/// A router over a throwaway root folder
pub struct TestApp {
    pub dir: TempDir,
    pub state: AppState,
    pub app: Router,
}

impl TestApp {
    /// Auth disabled (shared secret 0), default upload ceiling
    pub async fn new() -> Self {
        Self::with_options(0, DEFAULT_MAX_UPLOAD_BYTES).await
    }

    pub async fn with_options(shared_secret: i64, max_upload_bytes: u64) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let uploads_dir = dir.path().join("uploads");
        std::fs::create_dir_all(&uploads_dir).expect("uploads dir");

        let pool = init_database(&dir.path().join("leadsplit.db"))
            .await
            .expect("database");

        let state = AppState::new(
            pool,
            shared_secret,
            UploadSettings {
                uploads_dir,
                max_bytes: max_upload_bytes,
            },
        );
        let app = build_router(state.clone());

        Self { dir, state, app }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, body)
    }

    /// Create agents one after another so creation order is unambiguous
    pub async fn create_agents(&self, names: &[&str]) -> Vec<Value> {
        let mut agents = Vec::new();
        for name in names {
            let (status, body) = self
                .send(json_request("POST", "/agents", agent_body(name)))
                .await;
            assert_eq!(status, StatusCode::CREATED, "creating {}: {}", name, body);
            agents.push(body["agent"].clone());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        agents
    }

    pub async fn upload(&self, file_name: &str, content: &[u8]) -> (StatusCode, Value) {
        self.send(multipart_request("/upload", "file", file_name, content))
            .await
    }

    /// Files left in the uploads folder
    pub fn staged_files(&self) -> usize {
        std::fs::read_dir(&self.state.uploads.uploads_dir)
            .expect("uploads dir")
            .count()
    }
}

/// In-memory .xlsx workbook: one header row, then one row per record.
/// Numeric cells are written as numbers, everything else as text.
pub fn leads_xlsx(headers: &[&str], rows: &[Vec<Value>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).expect("header cell");
    }
    for (r, row) in rows.iter().enumerate() {
        let line = r as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                Value::Number(n) => {
                    sheet
                        .write_number(line, col as u16, n.as_f64().expect("number"))
                        .expect("number cell");
                }
                Value::String(text) => {
                    sheet.write_string(line, col as u16, text).expect("text cell");
                }
                _ => {}
            }
        }
    }

    workbook.save_to_buffer().expect("workbook bytes")
}

pub fn agent_body(name: &str) -> Value {
    json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "mobile": "+15550100",
        "password": "hunter2",
    })
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

/// Single-field multipart/form-data request
pub fn multipart_request(uri: &str, field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .expect("request")
}

/// CSV with `rows` leads named Lead1..LeadN
pub fn leads_csv(rows: usize) -> String {
    let mut csv = String::from("FirstName,Phone,Notes\n");
    for i in 1..=rows {
        csv.push_str(&format!("Lead{},555-{:04},note {}\n", i, i, i));
    }
    csv
}
