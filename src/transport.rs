//! HTTP transport: synchronous GET/POST with full header and body capture.
//! Deliberately thin, carrying no ACME-specific logic of its own.

use std::time::Duration;

use reqwest::blocking::{Client, Response as ReqwestResponse};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::Problem;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const JOSE_JSON: &str = "application/jose+json";

pub struct Transport {
    client: Client,
}

impl Transport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("uacme-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Transport { client })
    }

    pub fn get(&self, url: &str) -> Result<Response> {
        let resp = self.client.get(url).send()?;
        Response::capture(resp)
    }

    pub fn post_jose(&self, url: &str, jws: &Value) -> Result<Response> {
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, JOSE_JSON)
            .json(jws)
            .send()?;
        Response::capture(resp)
    }
}

/// Captured HTTP response: status, raw headers, raw body, and a lazily
/// parsed JSON value when the `Content-Type` contains `json` (a substring
/// match rather than an exact comparison, since some CAs send
/// `application/json; charset=utf-8`).
pub struct Response {
    pub status: u16,
    headers: reqwest::header::HeaderMap,
    pub body: Vec<u8>,
}

impl Response {
    fn capture(resp: ReqwestResponse) -> Result<Self> {
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp.bytes()?.to_vec();
        Ok(Response {
            status,
            headers,
            body,
        })
    }

    /// Case-insensitive header lookup, first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.contains("json"))
            .unwrap_or(false)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Parse the body as an ACME problem document if the content type says
    /// so; returns `None` rather than erroring when it isn't one, so
    /// callers can use this opportunistically while reporting failures.
    pub fn problem(&self) -> Option<Problem> {
        if !self.is_json() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    pub fn is_problem_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.eq_ignore_ascii_case("application/problem+json"))
            .unwrap_or(false)
    }

    /// Build a [`Error::Protocol`] from this response for `url`, attaching
    /// the problem document when present.
    pub fn protocol_error(&self, url: &str) -> Error {
        Error::Protocol {
            status: self.status,
            url: url.to_string(),
            problem: if self.is_problem_json() {
                self.problem()
            } else {
                None
            },
        }
    }
}
