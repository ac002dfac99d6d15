//! Nonce manager: maintains exactly one fresh anti-replay nonce across all
//! signed requests, refilling from `newNonce` when empty.

use crate::error::{Error, Result};
use crate::transport::{Response, Transport};

#[derive(Default)]
pub struct NonceManager {
    nonce: Option<String>,
}

impl NonceManager {
    pub fn new() -> Self {
        NonceManager { nonce: None }
    }

    /// Overwrite the stored nonce from a response's `Replay-Nonce` header,
    /// if present. Called after every GET and POST, successful or not.
    pub fn observe(&mut self, resp: &Response) {
        if let Some(n) = resp.header("replay-nonce") {
            self.nonce = Some(n.to_string());
        }
    }

    /// Take the current nonce, refilling from `new_nonce_url` first if
    /// empty. Expects HTTP 204 from the refill GET.
    pub fn take(&mut self, transport: &Transport, new_nonce_url: &str) -> Result<String> {
        if self.nonce.is_none() {
            let resp = transport.get(new_nonce_url)?;
            self.observe(&resp);
            if resp.status != 204 {
                return Err(resp.protocol_error(new_nonce_url));
            }
        }
        self.nonce
            .take()
            .ok_or(Error::MissingHeader("Replay-Nonce"))
    }
}
