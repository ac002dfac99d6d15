//! Filesystem layout rooted at `confdir`:
//!
//! ```text
//! <confdir>/private/key.pem               mode 0600  (account key)
//! <confdir>/private/<domain>/key.pem      mode 0600  (domain key)
//! <confdir>/<domain>/cert.pem             mode 0644  (certificate chain)
//! ```
//!
//! Directory creation is gated by the action, not global: `confdir` and
//! `private/` are only created on `new` (subject to `-n`); the per-domain
//! directories are only created by `issue` (subject to `-n`).

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::{Error, Result};

pub struct Layout {
    pub confdir: PathBuf,
    pub keydir: PathBuf,
    pub account_key: PathBuf,
}

impl Layout {
    pub fn new(confdir: &Path) -> Self {
        let keydir = confdir.join("private");
        let account_key = keydir.join("key.pem");
        Layout {
            confdir: confdir.to_path_buf(),
            keydir,
            account_key,
        }
    }

    pub fn dkeydir(&self, domain: &str) -> PathBuf {
        self.keydir.join(domain)
    }

    pub fn domain_key(&self, domain: &str) -> PathBuf {
        self.dkeydir(domain).join("key.pem")
    }

    pub fn certdir(&self, domain: &str) -> PathBuf {
        self.confdir.join(domain)
    }

    pub fn cert_path(&self, domain: &str) -> PathBuf {
        self.certdir(domain).join("cert.pem")
    }
}

/// Verify `dir` exists (and is a directory), creating it with `mode` if
/// `allow_create` is set and it doesn't.
pub fn check_or_mkdir(allow_create: bool, dir: &Path, mode: u32) -> Result<()> {
    if !dir.exists() {
        if !allow_create {
            return Err(Error::Config(format!("failed to access {}", dir.display())));
        }
        fs::create_dir(dir)?;
        fs::set_permissions(dir, fs::Permissions::from_mode(mode))?;
        info!("created directory {}", dir.display());
    }
    let meta = fs::metadata(dir)?;
    if !meta.is_dir() {
        return Err(Error::Config(format!("{} is not a directory", dir.display())));
    }
    Ok(())
}

/// Strip a leading `*.` from a domain, used to derive the on-disk path
/// component for a wildcard name; the literal name (with wildcard) is
/// still what's sent to the server and put in the CSR.
pub fn path_component(domain: &str) -> &str {
    domain.strip_prefix("*.").unwrap_or(domain)
}
