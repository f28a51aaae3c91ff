//! Shared test utilities and fixtures
//!
//! A wiremock server stands in for both the Workbench API and Leonardo.

#![allow(dead_code)]

use std::path::Path;
use std::process::{Command, Output};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use workbench_client::WorkbenchClient;

pub const NAMESPACE: &str = "aou-rw-1";
pub const RUNTIME_PATH: &str = "/v1/workspaces/aou-rw-1/runtime";

/// Replays `responses` in order, repeating the last one.
pub struct Sequence {
    responses: Vec<ResponseTemplate>,
    hits: Arc<AtomicUsize>,
}

impl Sequence {
    pub fn new(responses: Vec<ResponseTemplate>) -> (Self, Arc<AtomicUsize>) {
        let hits = Arc::new(AtomicUsize::new(0));
        (
            Self {
                responses,
                hits: Arc::clone(&hits),
            },
            hits,
        )
    }
}

impl Respond for Sequence {
    fn respond(&self, _: &Request) -> ResponseTemplate {
        let n = self.hits.fetch_add(1, Ordering::SeqCst);
        self.responses[n.min(self.responses.len() - 1)].clone()
    }
}

pub fn client(server: &MockServer) -> WorkbenchClient {
    let base = Url::parse(&server.uri()).unwrap();
    WorkbenchClient::new(base.clone(), base).unwrap()
}

pub fn runtime_json(status: &str) -> Value {
    json!({
        "runtimeName": "all-of-us-1",
        "googleProject": NAMESPACE,
        "status": status,
        "configurationType": "GeneralAnalysis",
    })
}

pub fn runtime(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(runtime_json(status))
}

pub async fn mount_runtime_sequence(
    server: &MockServer,
    responses: Vec<ResponseTemplate>,
) -> Arc<AtomicUsize> {
    let (sequence, hits) = Sequence::new(responses);
    Mock::given(method("GET"))
        .and(path(RUNTIME_PATH))
        .respond_with(sequence)
        .mount(server)
        .await;
    hits
}

pub async fn mount_json(server: &MockServer, verb: &str, route: &str, body: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

pub async fn expect_post(server: &MockServer, route: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200))
        .expect(times)
        .mount(server)
        .await;
}

/// Config file pointing both services at `server`, with a fast poller.
pub fn write_config(dir: &Path, server: &MockServer, extra: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let body = format!(
        r#"[server]
api_url = "{uri}"
leo_url = "{uri}"

[runtime]
initial_delay_ms = 10
max_delay_ms = 20
overall_timeout_ms = 5000
{extra}
"#,
        uri = server.uri()
    );
    std::fs::write(&path, body).unwrap();
    path
}

/// Run the `workbench` binary off the async runtime so the mock server keeps serving.
pub async fn run_cli(config: &Path, args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_workbench");
    let config = config.to_path_buf();
    let args: Vec<String> = args.iter().map(ToString::to_string).collect();
    tokio::task::spawn_blocking(move || {
        Command::new(bin)
            .args(&args)
            .env("WORKBENCH_CONFIG", &config)
            .env("RUST_LOG", "warn")
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
