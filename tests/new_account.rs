//! End-to-end `new` account flow against a mocked ACME directory: directory
//! fetch, nonce priming, the `onlyReturnExisting` probe, the terms-of-service
//! autoaccept path (`-y`), and account creation.

use std::process::Command;

use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn new_account_is_created_after_autoaccepting_terms() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/directory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "newNonce": format!("{}/new-nonce", server.uri()),
            "newAccount": format!("{}/new-account", server.uri()),
            "newOrder": format!("{}/new-order", server.uri()),
            "revokeCert": format!("{}/revoke-cert", server.uri()),
            "meta": { "termsOfService": format!("{}/terms", server.uri()) },
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new-nonce"))
        .respond_with(ResponseTemplate::new(204).insert_header("replay-nonce", "nonce-0"))
        .mount(&server)
        .await;

    // First POST: onlyReturnExisting probe. No such account yet.
    Mock::given(method("POST"))
        .and(path("/new-account"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("content-type", "application/problem+json")
                .insert_header("replay-nonce", "nonce-1")
                .set_body_json(json!({
                    "type": "urn:ietf:params:acme:error:accountDoesNotExist",
                    "detail": "no account exists with this key",
                })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    // Second POST: the actual creation.
    Mock::given(method("POST"))
        .and(path("/new-account"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("location", format!("{}/acct/1", server.uri()))
                .insert_header("replay-nonce", "nonce-2")
                .set_body_json(json!({ "status": "valid", "contact": [] })),
        )
        .mount(&server)
        .await;

    let confdir = tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_uacme-rs"))
        .args([
            "-a",
            &format!("{}/directory", server.uri()),
            "-c",
            confdir.path().to_str().unwrap(),
            "-y",
            "new",
            "admin@example.com",
        ])
        .output()
        .expect("run uacme-rs new");

    assert!(
        output.status.success(),
        "stdout={}\nstderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let account_key = confdir.path().join("private").join("key.pem");
    assert!(account_key.exists(), "account key should be persisted");
}
