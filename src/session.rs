//! Per-invocation session state: the directory, the nonce stream, the
//! account `kid`, and the signed-POST helper every higher-level driver
//! (account/order/authorization/csr) is built on.

use log::{debug, trace};
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::jose;
use crate::key::KeyPair;
use crate::nonce::NonceManager;
use crate::transport::{Response, Transport};
use crate::types::{Directory, BAD_NONCE};

pub struct Session {
    pub transport: Transport,
    pub nonce: NonceManager,
    pub directory: Directory,
    pub key: KeyPair,
    pub kid: Option<String>,
}

impl Session {
    pub fn new(
        transport: Transport,
        nonce: NonceManager,
        directory: Directory,
        key: KeyPair,
    ) -> Self {
        Session {
            transport,
            nonce,
            directory,
            key,
            kid: None,
        }
    }

    /// Build the JWS protected header: `jwk` when no `kid` is known yet
    /// (only ever true for the very first `newAccount` call), `kid`
    /// thereafter. Exactly one of the two is ever present, never both.
    fn protected(&self, nonce: &str, url: &str) -> Result<String> {
        match &self.kid {
            Some(kid) => jose::protected_kid(nonce, url, kid, self.key.alg.jws_alg()),
            None => jose::protected_jwk(nonce, url, &self.key),
        }
    }

    fn signed_body<T: Serialize>(&self, nonce: &str, url: &str, payload: Option<&T>) -> Result<Value> {
        let protected = self.protected(nonce, url)?;
        jose::encode(&protected, payload, &self.key)
    }

    /// Signed POST with a single bad-nonce retry: a `400
    /// urn:ietf:params:acme:error:badNonce` response is retried exactly
    /// once with the nonce carried on that response.
    pub fn post_signed<T: Serialize>(&mut self, url: &str, payload: Option<&T>) -> Result<Response> {
        let resp = self.post_signed_once(url, payload)?;
        if resp.status == 400 {
            if let Some(problem) = resp.problem() {
                if problem.is_type(BAD_NONCE) {
                    debug!("badNonce from {url}, retrying once with fresh nonce");
                    return self.post_signed_once(url, payload);
                }
            }
        }
        Ok(resp)
    }

    fn post_signed_once<T: Serialize>(&mut self, url: &str, payload: Option<&T>) -> Result<Response> {
        let nonce = self.nonce.take(&self.transport, &self.directory.new_nonce)?;
        let body = self.signed_body(&nonce, url, payload)?;
        trace!("POST {url} body={body}");
        let resp = self.transport.post_jose(url, &body)?;
        self.nonce.observe(&resp);
        Ok(resp)
    }

    /// GET-as-POST (RFC 8555 section 6.3): a signed POST with an empty
    /// payload, used to fetch authorizations, poll orders/challenges, and
    /// download the certificate.
    pub fn post_as_get(&mut self, url: &str) -> Result<Response> {
        self.post_signed::<()>(url, None)
    }
}
