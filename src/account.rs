//! Account lifecycle: new / retrieve-existing / update-contacts / deactivate.

use log::info;

use crate::cli::prompt_confirm;
use crate::error::{Error, Result};
use crate::session::Session;
use crate::types::{Account, AccountStatus, NewAccountPayload, ACCOUNT_DOES_NOT_EXIST};

/// `new`: creates an account if none exists yet. This is *not* idempotent:
/// if an account already exists for this key, it fails rather than
/// silently reusing it.
pub fn new(session: &mut Session, email: Option<&str>, yes: bool) -> Result<()> {
    let url = session.directory.new_account.clone();

    let probe = NewAccountPayload {
        only_return_existing: true,
        terms_of_service_agreed: None,
        contact: Vec::new(),
    };
    info!("creating new account at {url}");
    let resp = session.post_signed(&url, Some(&probe))?;

    match resp.status {
        200 => {
            let existing = resp
                .header("location")
                .map(str::to_string)
                .unwrap_or_else(|| "<unknown location>".to_string());
            Err(Error::Config(format!(
                "account already exists at {existing}"
            )))
        }
        400 if resp.is_problem_json()
            && resp
                .problem()
                .map(|p| p.is_type(ACCOUNT_DOES_NOT_EXIST))
                .unwrap_or(false) =>
        {
            if let Some(terms) = session
                .directory
                .meta
                .as_ref()
                .and_then(|m| m.terms_of_service.clone())
            {
                if yes {
                    info!("terms at {terms} autoaccepted (-y)");
                } else if !prompt_confirm(&format!("type 'y' to accept the terms at {terms}"))? {
                    return Err(Error::Config("terms not agreed to, aborted".into()));
                }
            }

            let create = NewAccountPayload {
                only_return_existing: false,
                terms_of_service_agreed: Some(true),
                contact: email
                    .map(|e| vec![format!("mailto:{e}")])
                    .unwrap_or_default(),
            };
            let resp = session.post_signed(&url, Some(&create))?;
            if resp.status != 201 {
                return Err(resp.protocol_error(&url));
            }
            let account: Account = resp.json()?;
            if account.status != AccountStatus::Valid {
                return Err(Error::Config(format!(
                    "account created but status is not valid ({:?})",
                    account.status
                )));
            }
            let kid = resp
                .header("location")
                .ok_or(Error::MissingHeader("Location"))?
                .to_string();
            info!("account created at {kid}");
            session.kid = Some(kid);
            Ok(())
        }
        _ => Err(resp.protocol_error(&url)),
    }
}

/// `retrieve`: looks up the caller's existing account and adopts its
/// `kid`. Used by `update`, `deactivate`, `issue`, and `revoke`. Returns
/// the account body so callers (namely `update`) can inspect `contact`.
pub fn retrieve(session: &mut Session) -> Result<Account> {
    let url = session.directory.new_account.clone();
    let probe = NewAccountPayload {
        only_return_existing: true,
        terms_of_service_agreed: None,
        contact: Vec::new(),
    };
    info!("retrieving account at {url}");
    let resp = session.post_signed(&url, Some(&probe))?;

    match resp.status {
        200 => {
            let account: Account = resp.json()?;
            if account.status != AccountStatus::Valid {
                return Err(Error::Config(format!(
                    "invalid account status ({:?})",
                    account.status
                )));
            }
            let kid = resp
                .header("location")
                .ok_or(Error::MissingHeader("Location"))?
                .to_string();
            info!("account location: {kid}");
            session.kid = Some(kid);
            Ok(account)
        }
        400 if resp.is_problem_json()
            && resp
                .problem()
                .map(|p| p.is_type(ACCOUNT_DOES_NOT_EXIST))
                .unwrap_or(false) =>
        {
            Err(Error::Config(format!(
                "no account found at {url}. Consider trying 'new'"
            )))
        }
        _ => Err(resp.protocol_error(&url)),
    }
}

/// `update`: compares the server's current `contact` array to the
/// requested `email` and only POSTs when they diverge (add, change, or
/// clear). Every element of `contact` must begin with `mailto:`
/// (case-insensitive) or the response is treated as malformed.
pub fn update(session: &mut Session, account: &Account, email: Option<&str>) -> Result<()> {
    for c in &account.contact {
        if !c.to_lowercase().starts_with("mailto:") {
            return Err(Error::Config("failed to parse account contacts".into()));
        }
    }

    let current: Vec<&str> = account
        .contact
        .iter()
        .map(|c| &c[c.find(':').map(|i| i + 1).unwrap_or(0)..])
        .collect();

    let divergent = match email {
        Some(e) => current.len() != 1 || !current[0].eq_ignore_ascii_case(e),
        None => !current.is_empty(),
    };

    let kid = session
        .kid
        .clone()
        .ok_or_else(|| Error::Config("no account kid; call retrieve first".into()))?;

    if !divergent {
        info!("email is already up to date for account at {kid}");
        return Ok(());
    }

    let contact = email
        .map(|e| vec![format!("mailto:{e}")])
        .unwrap_or_default();
    match email {
        Some(e) => info!("updating account email to {e} at {kid}"),
        None => info!("removing account email at {kid}"),
    }

    let resp = session.post_signed(&kid, Some(&crate::types::UpdateAccountPayload { contact }))?;
    if resp.status != 200 {
        return Err(resp.protocol_error(&kid));
    }
    info!("account at {kid} updated");
    Ok(())
}

/// `deactivate`: irrevocably deactivates the account.
pub fn deactivate(session: &mut Session) -> Result<()> {
    let kid = session
        .kid
        .clone()
        .ok_or_else(|| Error::Config("no account kid; call retrieve first".into()))?;
    info!("deactivating account at {kid}");
    let resp = session.post_signed(
        &kid,
        Some(&crate::types::DeactivateAccountPayload::default()),
    )?;
    if resp.status != 200 {
        return Err(resp.protocol_error(&kid));
    }
    info!("account at {kid} deactivated");
    Ok(())
}
