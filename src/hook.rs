//! Hook protocol: subprocess invocation with a fixed argument vector and
//! exit-code contract.
//!
//! ```text
//! <hook> <method> <type> <identifier> <token> <key_auth>
//! method ∈ {begin, done, failed}
//! ```
//!
//! Only `begin`'s exit code is interpreted semantically; `done`/`failed`
//! are advisory and their results are never allowed to fail the action.

use std::path::Path;
use std::process::Command;

use log::{debug, info};

use crate::error::{Error, Result};

pub enum BeginOutcome {
    Accepted,
    Declined,
}

/// Run the hook with method `begin`. Exit code 0 is acceptance, a positive
/// exit code is a decline (try the next challenge), and a failure to spawn
/// the child at all is fatal.
pub fn begin(
    hook: &Path,
    challenge_type: &str,
    identifier: &str,
    token: &str,
    key_auth: &str,
) -> Result<BeginOutcome> {
    info!(
        "running {} begin {challenge_type} {identifier} {token} {key_auth}",
        hook.display()
    );
    let status = run(hook, "begin", challenge_type, identifier, token, key_auth)?;
    debug!("hook returned {status}");
    if status == 0 {
        Ok(BeginOutcome::Accepted)
    } else {
        info!("challenge {challenge_type} declined");
        Ok(BeginOutcome::Declined)
    }
}

/// Run the hook with method `done` or `failed`, depending on whether the
/// challenge attempt succeeded. The result is ignored: this call must
/// never cause the action to fail further than the attempt already has.
pub fn finish(
    hook: &Path,
    succeeded: bool,
    challenge_type: &str,
    identifier: &str,
    token: &str,
    key_auth: &str,
) {
    let method = if succeeded { "done" } else { "failed" };
    info!(
        "running {} {method} {challenge_type} {identifier} {token} {key_auth}",
        hook.display()
    );
    let _ = run(hook, method, challenge_type, identifier, token, key_auth);
}

fn run(
    hook: &Path,
    method: &str,
    challenge_type: &str,
    identifier: &str,
    token: &str,
    key_auth: &str,
) -> Result<i32> {
    let status = Command::new(hook)
        .arg(method)
        .arg(challenge_type)
        .arg(identifier)
        .arg(token)
        .arg(key_auth)
        .status()
        .map_err(|e| Error::HookSpawn(format!("{}: {e}", hook.display())))?;
    Ok(status.code().unwrap_or(-1))
}

/// The hook path must be readable and executable by us before we start any
/// network activity.
pub fn check_executable(hook: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let meta = std::fs::metadata(hook)
        .map_err(|e| Error::Config(format!("{}: {e}", hook.display())))?;
    let mode = meta.permissions().mode();
    if mode & 0o444 == 0 {
        return Err(Error::Config(format!("{} is not readable", hook.display())));
    }
    if mode & 0o111 == 0 {
        return Err(Error::Config(format!(
            "{} is not executable",
            hook.display()
        )));
    }
    Ok(())
}
