//! Data access requirement flows: status report, external sync, self-bypass.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use workbench_access::{AccessContext, AccessPlan, PageMode};
use workbench_client::{ProfileStore, actions};
use workbench_types::ServerConfig;

use crate::common::{
    Sequence, client, expect_post, mount_json, run_cli, stderr, stdout, write_config,
};

const NOW: i64 = 1_704_067_200_000;

fn profile(completed: &[&str]) -> serde_json::Value {
    let modules: Vec<_> = completed
        .iter()
        .map(|name| json!({"moduleName": name, "completionEpochMillis": NOW - 1}))
        .collect();
    json!({
        "username": "researcher@example.org",
        "accessModules": {"modules": modules},
        "duccSignedVersion": 4,
        "tierEligibilities": [
            {"accessTierShortName": "registered", "eligible": true, "eraRequired": false},
        ],
    })
}

#[tokio::test]
async fn sync_then_reload_completes_the_plan() {
    let server = MockServer::start().await;
    let (profiles, _) = Sequence::new(vec![
        ResponseTemplate::new(200).set_body_json(profile(&["DATA_USER_CODE_OF_CONDUCT"])),
        ResponseTemplate::new(200).set_body_json(profile(&[
            "TWO_FACTOR_AUTH",
            "DATA_USER_CODE_OF_CONDUCT",
        ])),
    ]);
    Mock::given(method("GET"))
        .and(path("/v1/profile"))
        .respond_with(profiles)
        .expect(2)
        .mount(&server)
        .await;
    expect_post(&server, "/v1/profile/sync-two-factor-auth-status", 1).await;

    let config = ServerConfig {
        current_ducc_versions: vec![4],
        ..ServerConfig::default()
    };
    let store = ProfileStore::new();
    let profile = actions::sync_incomplete_modules(&client(&server), &store, &config, NOW)
        .await
        .unwrap();

    let ctx = AccessContext::new(&profile, &config, NOW);
    let plan = AccessPlan::build(&ctx, PageMode::InitialRegistration);
    assert!(plan.complete, "{plan:?}");
    assert_eq!(store.get(), Some(profile));
}

#[tokio::test]
async fn status_command_renders_report() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/v1/config", json!({"currentDuccVersions": [4]})).await;
    mount_json(&server, "GET", "/v1/profile", profile(&["TWO_FACTOR_AUTH"])).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server, "");

    let output = run_cli(&config, &["access", "status"]).await;

    assert!(output.status.success(), "{}", stderr(&output));
    let out = stdout(&output);
    assert!(
        out.starts_with("Data access requirements for researcher@example.org"),
        "{out}"
    );
    assert!(out.contains("Next:"), "{out}");
}

#[tokio::test]
async fn bypass_command_refuses_when_server_disallows() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/v1/config", json!({"unsafeAllowSelfBypass": false})).await;
    expect_post(&server, "/v1/profile/unsafe-self-bypass-access-requirement", 0).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server, "");

    let output = run_cli(&config, &["access", "bypass"]).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("not allowed"), "{}", stderr(&output));
}

#[tokio::test]
async fn bypass_command_sends_one_request_per_module() {
    let server = MockServer::start().await;
    mount_json(&server, "GET", "/v1/config", json!({"unsafeAllowSelfBypass": true})).await;
    mount_json(&server, "GET", "/v1/profile", profile(&[])).await;
    expect_post(&server, "/v1/profile/unsafe-self-bypass-access-requirement", 2).await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server, "");

    let output = run_cli(
        &config,
        &["access", "bypass", "era-commons", "TWO_FACTOR_AUTH"],
    )
    .await;

    assert!(output.status.success(), "{}", stderr(&output));
}
