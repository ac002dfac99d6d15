//! Authorization & challenge driver: for each pending authorization, walk
//! its challenges in server-declared order, invoke the hook (or prompt
//! interactively), trigger validation, and poll to a terminal state.

use std::path::Path;

use log::{debug, info};
use openssl::hash::{hash, MessageDigest};
use serde_json::json;

use crate::cli::prompt_confirm;
use crate::error::{Error, Result};
use crate::hook::{self, BeginOutcome};
use crate::jose::b64url;
use crate::poll::Deadline;
use crate::session::Session;
use crate::types::{Authorization, AuthorizationStatus, Challenge, ChallengeStatus};

/// Derive the key-authorization value for a challenge:
/// `base64url(SHA-256(token + "." + thumbprint))` for `dns-01`, and
/// `token + "." + thumbprint` for every other challenge type.
pub fn key_authorization(challenge_type: &str, token: &str, thumbprint: &str) -> Result<String> {
    let base = format!("{token}.{thumbprint}");
    if challenge_type == "dns-01" {
        let digest = hash(MessageDigest::sha256(), base.as_bytes())?;
        Ok(b64url(&digest))
    } else {
        Ok(base)
    }
}

/// Drive every pending authorization in `authorization_urls` to `valid`.
/// Fails the whole order the moment one authorization exhausts its
/// challenges without success.
pub fn authorize(
    session: &mut Session,
    authorization_urls: &[String],
    hook_path: Option<&Path>,
    thumbprint: &str,
) -> Result<()> {
    for url in authorization_urls {
        info!("retrieving authorization at {url}");
        let resp = session.post_as_get(url)?;
        if resp.status != 200 {
            return Err(resp.protocol_error(url));
        }
        let auth: Authorization = resp.json()?;

        match auth.status {
            AuthorizationStatus::Valid => continue,
            AuthorizationStatus::Pending => {}
            other => {
                return Err(Error::Config(format!(
                    "unexpected auth status ({other:?}) at {url}"
                )))
            }
        }

        if !attempt_challenges(session, &auth, hook_path, thumbprint)? {
            return Err(Error::ChallengeDeclined(auth.identifier.value));
        }
    }
    Ok(())
}

/// Try each pending challenge in `auth` in order; stop at the first
/// success. Returns whether any challenge succeeded.
fn attempt_challenges(
    session: &mut Session,
    auth: &Authorization,
    hook_path: Option<&Path>,
    thumbprint: &str,
) -> Result<bool> {
    for challenge in &auth.challenges {
        if challenge.status != ChallengeStatus::Pending {
            continue;
        }

        let key_auth = key_authorization(&challenge.kind, &challenge.token, thumbprint)?;
        debug!("type={} ident={} token={}", challenge.kind, auth.identifier.value, challenge.token);

        let accepted = accept_challenge(hook_path, challenge, &auth.identifier.value, &key_auth)?;
        if !accepted {
            continue;
        }

        let succeeded = run_challenge(session, challenge)?;

        if let Some(hook) = hook_path {
            hook::finish(
                hook,
                succeeded,
                &challenge.kind,
                &auth.identifier.value,
                &challenge.token,
                &key_auth,
            );
        }

        if succeeded {
            return Ok(true);
        }
    }
    Ok(false)
}

fn accept_challenge(
    hook_path: Option<&Path>,
    challenge: &Challenge,
    identifier: &str,
    key_auth: &str,
) -> Result<bool> {
    match hook_path {
        Some(hook) => Ok(matches!(
            hook::begin(hook, &challenge.kind, identifier, &challenge.token, key_auth)?,
            BeginOutcome::Accepted
        )),
        None => {
            let prompt = format!(
                "challenge={} ident={} token={} key_auth={}\n\
                 type 'y' to accept challenge, anything else to skip",
                challenge.kind, identifier, challenge.token, key_auth
            );
            Ok(prompt_confirm(&prompt)?)
        }
    }
}

/// POST `{}` to trigger validation, then poll to `valid`/terminal failure.
fn run_challenge(session: &mut Session, challenge: &Challenge) -> Result<bool> {
    info!("starting challenge at {}", challenge.url);
    let resp = session.post_signed(&challenge.url, Some(&json!({})))?;
    if resp.status != 200 {
        debug!("failed to start challenge at {}: {:?}", challenge.url, resp.protocol_error(&challenge.url));
        return Ok(false);
    }

    let deadline = Deadline::start(format!("challenge {}", challenge.url));
    loop {
        info!("polling challenge status at {}", challenge.url);
        let resp = session.post_as_get(&challenge.url)?;
        if resp.status != 200 {
            return Ok(false);
        }
        let polled: Challenge = resp.json()?;
        match polled.status {
            ChallengeStatus::Valid => return Ok(true),
            ChallengeStatus::Pending | ChallengeStatus::Processing => {
                deadline.wait()?;
            }
            other => {
                debug!("challenge {} failed with status {:?}", challenge.url, other);
                return Ok(false);
            }
        }
    }
}
