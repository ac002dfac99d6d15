//! Directory fetch: retrieve and validate the ACME directory.

use crate::error::Result;
use crate::nonce::NonceManager;
use crate::transport::Transport;
use crate::types::Directory;

/// GET the directory (expect 200 JSON), then immediately GET `newNonce`
/// (expect 204) to prime the nonce manager: nonce priming happens once up
/// front, not lazily on the first POST.
pub fn bootstrap(transport: &Transport, directory_url: &str) -> Result<(Directory, NonceManager)> {
    let resp = transport.get(directory_url)?;
    if resp.status != 200 {
        return Err(resp.protocol_error(directory_url));
    }
    let dir: Directory = resp.json()?;

    let mut nonce_mgr = NonceManager::new();
    let nonce_resp = transport.get(&dir.new_nonce)?;
    nonce_mgr.observe(&nonce_resp);
    if nonce_resp.status != 204 {
        return Err(nonce_resp.protocol_error(&dir.new_nonce));
    }

    Ok((dir, nonce_mgr))
}
