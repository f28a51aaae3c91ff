//! Default workspace persistence and config resolution through the binary.

use wiremock::MockServer;

use crate::common::{mount_runtime_sequence, run_cli, runtime, stderr, stdout, write_config};

#[tokio::test]
async fn use_command_sets_default_workspace() {
    let server = MockServer::start().await;
    mount_runtime_sequence(&server, vec![runtime("Running")]).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server, "# poller tuned for tests");

    let output = run_cli(&config, &["use", "aou-rw-1"]).await;
    assert!(output.status.success(), "{}", stderr(&output));

    let written = std::fs::read_to_string(&config).unwrap();
    assert!(written.contains("# poller tuned for tests"), "{written}");
    assert!(written.contains("workspace = \"aou-rw-1\""), "{written}");

    let output = run_cli(&config, &["runtime", "status"]).await;
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("Running"));
}

#[tokio::test]
async fn runtime_command_without_workspace_fails() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server, "");

    let output = run_cli(&config, &["runtime", "status"]).await;

    assert!(!output.status.success());
    assert!(
        stderr(&output).contains("no workspace given"),
        "{}",
        stderr(&output)
    );
}

#[tokio::test]
async fn explicit_missing_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.toml");
    let config = dir.path().join("unused.toml");

    let output = run_cli(
        &config,
        &[
            "--config",
            missing.to_str().unwrap(),
            "runtime",
            "status",
            "-w",
            "aou-rw-1",
        ],
    )
    .await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("does not exist"), "{}", stderr(&output));
}
