//! Binary-level tests for the `repodesk` command.
//!
//! Every invocation runs with a temporary HOME and no GITHUB_TOKEN so the
//! user's real configuration and secrets are never touched.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repodesk(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("repodesk").unwrap();
    cmd.current_dir(home.path())
        .env("HOME", home.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("REPODESK_CONFIG")
        .env_remove("GITHUB_TOKEN")
        .env_remove("REPODESK_SESSION")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let home = TempDir::new().unwrap();
    repodesk(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("tree"))
        .stdout(predicate::str::contains("put"));
}

#[test]
fn completion_script_names_binary() {
    let home = TempDir::new().unwrap();
    repodesk(&home)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("repodesk"));
}

#[test]
fn put_requires_source() {
    let home = TempDir::new().unwrap();
    repodesk(&home)
        .args(["put", "octo/demo", "README.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--from"));
}

#[test]
fn invalid_repo_is_reported() {
    let home = TempDir::new().unwrap();
    repodesk(&home)
        .args(["tree", "not-a-repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid repository 'not-a-repo'"));
}

#[test]
fn auth_status_round_trip() {
    let home = TempDir::new().unwrap();

    repodesk(&home)
        .args(["auth", "--status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Not authenticated."));

    repodesk(&home)
        .args(["auth", "--token", "ghp_abcdefghijklmnop"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Token stored."))
        .stdout(predicate::str::contains("ghp_").not());

    repodesk(&home)
        .args(["auth", "--status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Authenticated via secret store."));

    repodesk(&home)
        .args(["auth", "--logout", "-q"])
        .assert()
        .success();

    repodesk(&home)
        .args(["-q", "auth", "--status"])
        .assert()
        .success()
        .stdout("not_authenticated\n");
}

#[test]
fn content_commands_need_a_token() {
    let home = TempDir::new().unwrap();
    repodesk(&home)
        .args(["cat", "octo/demo", "README.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not authenticated"));
}

async fn relay_stub() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/github/repos/octo/demo/contents"))
        .and(query_param("path", ""))
        .and(header("cookie", "sid=s-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "src", "path": "src", "type": "dir", "sha": "d1"},
            {"name": "README.md", "path": "README.md", "type": "file", "sha": "f1"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/github/repos/octo/demo/contents"))
        .and(query_param("path", "src"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "main.rs", "path": "src/main.rs", "type": "file", "sha": "f2"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/github/repos/octo/demo/contents/README.md"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "path": "README.md", "decodedContent": "# demo\n", "sha": "f1"
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn tree_and_cat_through_relay() {
    let server = relay_stub().await;
    let home = TempDir::new().unwrap();
    let uri = server.uri();

    let tree = {
        let mut cmd = repodesk(&home);
        cmd.env("REPODESK_SESSION", "s-1")
            .args(["--relay", &uri, "tree", "octo/demo", "--expand", "src"]);
        tokio::task::spawn_blocking(move || cmd.assert().success().get_output().stdout.clone())
            .await
            .unwrap()
    };
    assert_eq!(
        String::from_utf8(tree).unwrap(),
        "src/\n  main.rs\nREADME.md\n"
    );

    let text = {
        let mut cmd = repodesk(&home);
        cmd.env("REPODESK_SESSION", "s-1")
            .args(["--relay", &uri, "cat", "octo/demo", "README.md"]);
        tokio::task::spawn_blocking(move || cmd.assert().success().get_output().stdout.clone())
            .await
            .unwrap()
    };
    assert_eq!(text, b"# demo\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn relay_without_session_is_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Not authenticated"})))
        .mount(&server)
        .await;
    let home = TempDir::new().unwrap();
    let uri = server.uri();

    let mut cmd = repodesk(&home);
    cmd.args(["--relay", &uri, "tree", "octo/demo"]);
    let stderr = tokio::task::spawn_blocking(move || {
        cmd.assert().failure().get_output().stderr.clone()
    })
    .await
    .unwrap();
    assert!(String::from_utf8_lossy(&stderr).contains("Not authenticated"));
}
