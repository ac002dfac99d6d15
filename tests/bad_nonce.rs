//! A `badNonce` response is retried exactly once (§4.4/§9); a second
//! `badNonce` in a row is surfaced as a fatal error rather than retried
//! indefinitely.

use std::process::Command;

use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn repeated_bad_nonce_is_fatal_after_one_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/directory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "newNonce": format!("{}/new-nonce", server.uri()),
            "newAccount": format!("{}/new-account", server.uri()),
            "newOrder": format!("{}/new-order", server.uri()),
            "revokeCert": format!("{}/revoke-cert", server.uri()),
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new-nonce"))
        .respond_with(ResponseTemplate::new(204).insert_header("replay-nonce", "nonce-0"))
        .mount(&server)
        .await;

    // Every attempt at the account probe comes back badNonce: the first
    // signed POST fails, gets retried once with the fresh nonce from the
    // error response, and fails again, which must surface as an error
    // rather than loop forever.
    Mock::given(method("POST"))
        .and(path("/new-account"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("content-type", "application/problem+json")
                .insert_header("replay-nonce", "nonce-retry")
                .set_body_json(json!({
                    "type": "urn:ietf:params:acme:error:badNonce",
                    "detail": "JWS has an invalid anti-replay nonce",
                })),
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
            "deactivate",
        ])
        .output()
        .expect("run uacme-rs deactivate");

    assert!(
        !output.status.success(),
        "repeated badNonce must not succeed"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("badNonce"),
        "the problem document should be logged, got: {stderr}"
    );

    let requests = server.received_requests().await.unwrap();
    let account_posts = requests
        .iter()
        .filter(|r| r.url.path() == "/new-account")
        .count();
    assert_eq!(
        account_posts, 2,
        "expect exactly one retry: original attempt + one retry, no more"
    );
}

#[tokio::test]
async fn a_single_bad_nonce_is_retried_and_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/directory"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "newNonce": format!("{}/new-nonce", server.uri()),
            "newAccount": format!("{}/new-account", server.uri()),
            "newOrder": format!("{}/new-order", server.uri()),
            "revokeCert": format!("{}/revoke-cert", server.uri()),
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/new-nonce"))
        .respond_with(ResponseTemplate::new(204).insert_header("replay-nonce", "nonce-0"))
        .mount(&server)
        .await;

    // First attempt: badNonce, consumed exactly once. The retry re-signs
    // with "nonce-retry" and falls through to the always-on success mock.
    Mock::given(method("POST"))
        .and(path("/new-account"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("content-type", "application/problem+json")
                .insert_header("replay-nonce", "nonce-retry")
                .set_body_json(json!({
                    "type": "urn:ietf:params:acme:error:badNonce",
                    "detail": "JWS has an invalid anti-replay nonce",
                })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/new-account"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("location", format!("{}/acct/1", server.uri()))
                .insert_header("replay-nonce", "nonce-1")
                .set_body_json(json!({ "status": "valid", "contact": [] })),
        )
        .mount(&server)
        .await;

    let confdir = tempdir().unwrap();

    // `update` with no email and an empty existing `contact` is a no-op
    // after `retrieve` succeeds, so no further POST needs mocking.
    let output = Command::new(env!("CARGO_BIN_EXE_uacme-rs"))
        .args([
            "-a",
            &format!("{}/directory", server.uri()),
            "-c",
            confdir.path().to_str().unwrap(),
            "update",
        ])
        .output()
        .expect("run uacme-rs update");

    assert!(
        output.status.success(),
        "a single retried badNonce must still succeed overall; stdout={}\nstderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let requests = server.received_requests().await.unwrap();
    let account_posts = requests
        .iter()
        .filter(|r| r.url.path() == "/new-account")
        .count();
    assert_eq!(account_posts, 2, "original attempt + one successful retry");
}
