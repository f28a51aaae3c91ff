//! Runtime initialization against a mocked API, through the library and the binary.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workbench_runtime::{InitializerOptions, RuntimeInitializer, RuntimeStore};
use workbench_types::{RuntimeStatus, WorkspaceNamespace};

use crate::common::{
    NAMESPACE, RUNTIME_PATH, client, mount_runtime_sequence, run_cli, runtime, stderr, stdout,
    write_config,
};

fn fast() -> InitializerOptions {
    InitializerOptions {
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(20),
        ..InitializerOptions::default()
    }
}

#[tokio::test]
async fn missing_runtime_is_created_and_awaited() {
    let server = MockServer::start().await;
    mount_runtime_sequence(
        &server,
        vec![
            ResponseTemplate::new(404),
            runtime("Creating"),
            runtime("Running"),
        ],
    )
    .await;
    Mock::given(method("POST"))
        .and(path(RUNTIME_PATH))
        .and(body_partial_json(
            json!({"configurationType": "GeneralAnalysis"}),
        ))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let namespace = WorkspaceNamespace::new(NAMESPACE).unwrap();
    let store = RuntimeStore::new();
    store.switch_workspace(Some(namespace.clone()));

    let mut seen = Vec::new();
    let runtime = RuntimeInitializer::new(&client, namespace)
        .with_options(fast())
        .with_store(store.clone())
        .on_poll(|runtime| seen.push(runtime.and_then(|r| r.status)))
        .run()
        .await
        .unwrap();

    assert!(runtime.has_status(RuntimeStatus::Running));
    assert_eq!(
        seen,
        vec![
            None,
            Some(RuntimeStatus::Creating),
            Some(RuntimeStatus::Running)
        ]
    );
    let snapshot = store.get();
    assert_eq!(
        snapshot.runtime.and_then(|r| r.status),
        Some(RuntimeStatus::Running)
    );
}

#[tokio::test]
async fn status_command_prints_runtime() {
    let server = MockServer::start().await;
    mount_runtime_sequence(&server, vec![runtime("Stopped")]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server, "");

    let output = run_cli(&config, &["runtime", "status", "-w", NAMESPACE]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "aou-rw-1/all-of-us-1 Stopped (General Analysis)"
    );
}

#[tokio::test]
async fn init_command_resumes_stopped_runtime() {
    let server = MockServer::start().await;
    mount_runtime_sequence(
        &server,
        vec![runtime("Stopped"), runtime("Starting"), runtime("Running")],
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/google/v1/runtimes/aou-rw-1/all-of-us-1/start"))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server, "");

    let output = run_cli(&config, &["runtime", "init", "--workspace", NAMESPACE]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Stopped"), "{out}");
    assert!(out.contains("Starting"), "{out}");
    assert!(
        out.trim_end().ends_with("Ready: aou-rw-1/all-of-us-1"),
        "{out}"
    );
}

#[tokio::test]
async fn init_command_reports_exhausted_budget() {
    let server = MockServer::start().await;
    mount_runtime_sequence(&server, vec![ResponseTemplate::new(404)]).await;
    Mock::given(method("POST"))
        .and(path(RUNTIME_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server, "max_create_count = 0");

    let output = run_cli(&config, &["runtime", "init", "-w", NAMESPACE]).await;

    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("reached max runtime create count (0)"),
        "{}",
        stderr(&output)
    );
}
