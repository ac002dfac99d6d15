//! End-to-end `revoke`: the certificate is re-encoded as base64url(DER) and
//! posted to `revokeCert` with the (default) reason code 0.

use std::fs;
use std::process::Command;

use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder};
use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn self_signed_cert_der(name: &str) -> (Vec<u8>, Vec<u8>) {
    let rsa = Rsa::generate(2048).unwrap();
    let pkey = PKey::from_rsa(rsa).unwrap();

    let mut name_builder = X509NameBuilder::new().unwrap();
    name_builder
        .append_entry_by_nid(Nid::COMMONNAME, name)
        .unwrap();
    let subject = name_builder.build();

    let mut builder = X509Builder::new().unwrap();
    builder.set_subject_name(&subject).unwrap();
    builder.set_issuer_name(&subject).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder
        .set_not_before(&openssl::asn1::Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&openssl::asn1::Asn1Time::days_from_now(90).unwrap())
        .unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();
    let cert = builder.build();
    (cert.to_pem().unwrap(), cert.to_der().unwrap())
}

#[tokio::test]
async fn revoke_posts_certificate_der_and_default_reason() {
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

    Mock::given(method("POST"))
        .and(path("/revoke-cert"))
        .respond_with(ResponseTemplate::new(200).insert_header("replay-nonce", "nonce-2"))
        .mount(&server)
        .await;

    let confdir = tempdir().unwrap();
    let (pem, der) = self_signed_cert_der("example.com");
    let certfile = confdir.path().join("c.pem");
    fs::write(&certfile, &pem).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_uacme-rs"))
        .args([
            "-a",
            &format!("{}/directory", server.uri()),
            "-c",
            confdir.path().to_str().unwrap(),
            "revoke",
            certfile.to_str().unwrap(),
        ])
        .output()
        .expect("run uacme-rs revoke");

    assert!(
        output.status.success(),
        "stdout={}\nstderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );

    let requests = server.received_requests().await.unwrap();
    let revoke_req = requests
        .iter()
        .find(|r| r.url.path() == "/revoke-cert")
        .expect("revokeCert should have been called");

    let jws: serde_json::Value = serde_json::from_slice(&revoke_req.body).unwrap();
    let payload_b64 = jws["payload"].as_str().unwrap();
    let payload_bytes = base64::decode_config(payload_b64, base64::URL_SAFE_NO_PAD).unwrap();
    let payload: serde_json::Value = serde_json::from_slice(&payload_bytes).unwrap();

    assert_eq!(payload["reason"], 0);
    let cert_b64 = payload["certificate"].as_str().unwrap();
    let decoded = base64::decode_config(cert_b64, base64::URL_SAFE_NO_PAD).unwrap();
    assert_eq!(decoded, der);
}
