#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tempfile::TempDir;

pub const SAMPLE_RESPONSE: &str = r#"{
    "transcript": "Alice: Let's size the checkout stories. Bob: The API work is five points.",
    "summary": "The team estimated the checkout stories and agreed on sprint scope.",
    "sentiment": "positive",
    "duration": "~25 min",
    "meetingPurpose": "Sprint Planning",
    "autoTags": ["checkout", "estimates", "sprint"]
}"#;

/// One multipart field as the mock service received it.
#[derive(Debug, Clone)]
pub struct Upload {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
}

#[derive(Clone, Default)]
struct MockState {
    uploads: Arc<Mutex<Vec<Upload>>>,
}

/// In-process stand-in for the analysis backend.
///
/// - `POST /api/process-audio` answers [`SAMPLE_RESPONSE`] when an `audio` field is present
/// - `POST /api/fail` answers 500
/// - `POST /api/garbage` answers 200 with a non-JSON body
/// - `GET /api/meetings` lists two meetings
/// - `GET /api/slow-meetings` never answers in time
pub struct MockService {
    addr: SocketAddr,
    state: MockState,
}

impl MockService {
    pub async fn start() -> Self {
        let state = MockState::default();
        let app = Router::new()
            .route("/api/process-audio", post(process_audio))
            .route("/api/fail", post(fail))
            .route("/api/garbage", post(garbage))
            .route("/api/meetings", get(meetings))
            .route("/api/slow-meetings", get(slow_meetings))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock service");
        let addr = listener.local_addr().expect("mock service address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock service");
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.state.uploads.lock().expect("uploads lock").clone()
    }
}

async fn process_audio(
    State(state): State<MockState>,
    mut multipart: Multipart,
) -> (StatusCode, String) {
    let mut received = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        received.push(Upload {
            field: name,
            file_name,
            content_type,
            size,
        });
    }

    let has_audio = received.iter().any(|u| u.field == "audio");
    state.uploads.lock().expect("uploads lock").extend(received);

    if has_audio {
        (StatusCode::OK, SAMPLE_RESPONSE.to_string())
    } else {
        (StatusCode::BAD_REQUEST, "No audio file provided".to_string())
    }
}

async fn fail() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "transcription backend unavailable")
}

async fn garbage() -> &'static str {
    "<html>Bad Gateway</html>"
}

async fn meetings() -> Json<serde_json::Value> {
    Json(serde_json::json!([
        {
            "id": "a1",
            "title": "Checkout Sprint Planning",
            "date": "2024-03-04T15:00:00Z",
            "summary": "Estimated the checkout stories.",
            "sentiment": "positive",
            "actionItemsCount": 4
        },
        {
            "id": "a2",
            "title": "Incident Retro",
            "date": "2024-03-01T10:30:00Z",
            "summary": "Walked through the payment outage timeline.",
            "sentiment": "negative",
            "actionItemsCount": 7
        }
    ]))
}

async fn slow_meetings() -> Json<serde_json::Value> {
    tokio::time::sleep(Duration::from_secs(30)).await;
    Json(serde_json::json!([]))
}

/// Isolated HOME and XDG dirs for running the binary.
pub struct TestEnv {
    home: TempDir,
    config: TempDir,
    data: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
            data: tempfile::tempdir().expect("create temporary XDG data dir"),
        }
    }

    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_meetlens"))
            .args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env("XDG_DATA_HOME", self.data.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("failed to execute meetlens binary")
    }

    pub fn config_path(&self) -> PathBuf {
        self.config.path().join("meetlens").join("config.toml")
    }

    pub fn write_config(&self, contents: &str) {
        let config_path = self.config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).expect("create config parent directory");
        }
        std::fs::write(&config_path, contents).expect("write config file");
    }

    /// Write a file into the temporary HOME and return its path.
    pub fn write_file(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.home.path().join(name);
        std::fs::write(&path, bytes).expect("write fixture file");
        path
    }

    pub fn home(&self) -> &Path {
        self.home.path()
    }
}

/// Config with no artificial pacing.
pub fn fast_config(endpoint: &str, history_endpoint: Option<&str>) -> String {
    let mut config = format!(
        "[service]\nendpoint = \"{endpoint}\"\ntimeout_seconds = 30\n\n\
         [pipeline]\nanalyzing_delay_ms = 0\nsaving_delay_ms = 0\n\n\
         [history]\nsample_latency_ms = 0\n"
    );
    if let Some(history) = history_endpoint {
        config.push_str(&format!("endpoint = \"{history}\"\n"));
    }
    config
}

pub fn describe(output: &Output) -> String {
    format!(
        "status: {:?}\nstdout:\n{}\nstderr:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}
