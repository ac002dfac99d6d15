//! Top-level action dispatcher: resolves paths, bootstraps a session, and
//! drives the action named on the command line.

use log::info;

use crate::account;
use crate::cli::{Action, Cli};
use crate::csr;
use crate::directory;
use crate::error::{Error, Result};
use crate::hook;
use crate::key::{self, KeyAlg};
use crate::order;
use crate::paths::{check_or_mkdir, path_component, Layout};
use crate::session::Session;
use crate::transport::Transport;
use crate::validate::validate_domain;

const DEFAULT_KEY_ALG: KeyAlg = KeyAlg::EcdsaP256;

pub fn run(cli: Cli) -> Result<()> {
    info!("uacme-rs {} starting", env!("CARGO_PKG_VERSION"));

    let layout = Layout::new(&cli.confdir);

    let create_base = matches!(cli.action, Action::New { .. }) && !cli.never_create;
    check_or_mkdir(create_base, &layout.confdir, 0o755)?;
    check_or_mkdir(create_base, &layout.keydir, 0o700)?;

    if let Some(hook) = &cli.hook {
        hook::check_executable(hook)?;
    }

    let account_key = key::load_or_create(&layout.account_key, create_base, DEFAULT_KEY_ALG)?;

    // `issue`'s renewal precheck runs before any network activity (directory
    // bootstrap, account retrieval): a still-valid certificate is a no-op
    // that never touches the CA, matching the source's ordering where
    // `cert_valid` is checked before `acme_bootstrap`. For every other
    // action there's nothing to precheck, so `names` stays empty.
    let mut names = Vec::new();
    if let Action::Issue { domain, altnames } = &cli.action {
        names = prepare_issue_dirs(&cli, &layout, domain, altnames)?;
        let certdir = layout.certdir(path_component(domain));
        if !cli.force && csr::cert_valid(&certdir, &names, cli.days) {
            info!("certificate for {domain} is still valid, skipping");
            return Err(Error::PrecheckSkip);
        }
    }

    let transport = Transport::new()?;
    let directory_url = cli.directory_url().to_string();
    info!("using ACME directory at {directory_url}");
    let (directory, nonce) = directory::bootstrap(&transport, &directory_url)?;
    let mut session = Session::new(transport, nonce, directory, account_key);

    match &cli.action {
        Action::New { email } => account::new(&mut session, email.as_deref(), cli.yes),
        Action::Update { email } => {
            let acc = account::retrieve(&mut session)?;
            account::update(&mut session, &acc, email.as_deref())
        }
        Action::Deactivate => {
            account::retrieve(&mut session)?;
            account::deactivate(&mut session)
        }
        Action::Issue { domain, .. } => {
            account::retrieve(&mut session)?;
            issue(&mut session, &cli, &layout, domain, &names)
        }
        Action::Revoke { certfile, reason } => {
            account::retrieve(&mut session)?;
            order::revoke(&mut session, certfile, *reason)
        }
    }
}

/// Validate `domain`/`altnames` and create the per-domain key/cert
/// directories, returning the full name list (domain first).
fn prepare_issue_dirs(
    cli: &Cli,
    layout: &Layout,
    domain: &str,
    altnames: &[String],
) -> Result<Vec<String>> {
    let mut names = Vec::with_capacity(1 + altnames.len());
    names.push(domain.to_string());
    names.extend(altnames.iter().cloned());
    for name in &names {
        validate_domain(name)?;
    }

    let component = path_component(domain);
    let create = !cli.never_create;
    check_or_mkdir(create, &layout.dkeydir(component), 0o700)?;
    check_or_mkdir(create, &layout.certdir(component), 0o755)?;

    Ok(names)
}

fn issue(
    session: &mut Session,
    cli: &Cli,
    layout: &Layout,
    domain: &str,
    names: &[String],
) -> Result<()> {
    let component = path_component(domain);
    let create = !cli.never_create;
    let certdir = layout.certdir(component);
    let domain_key = key::load_or_create(&layout.domain_key(component), create, DEFAULT_KEY_ALG)?;
    order::issue(session, names, &domain_key, cli.hook.as_ref(), &certdir)
}
