//! Command-line surface: global flags plus the five actions
//! (`new`/`update`/`deactivate`/`issue`/`revoke`).

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub const PRODUCTION_URL: &str = "https://acme-v02.api.letsencrypt.org/directory";
pub const STAGING_URL: &str = "https://acme-staging-v02.api.letsencrypt.org/directory";
pub const DEFAULT_CONFDIR: &str = "/etc/ssl/uacme";

#[derive(Parser, Debug)]
#[clap(name = "uacme-rs", version, about = "An ACME (RFC 8555) client")]
pub struct Cli {
    /// Override the ACME directory URL
    #[clap(short = 'a', long = "acme-url", value_name = "URL")]
    pub acme_url: Option<String>,

    /// Configuration directory
    #[clap(short, long, value_name = "DIR", default_value = DEFAULT_CONFDIR)]
    pub confdir: PathBuf,

    /// Minimum remaining validity (days) before `issue` renews
    #[clap(short, long, value_name = "DAYS", default_value_t = 30)]
    pub days: u32,

    /// Force reissue even if the certificate is still valid
    #[clap(short, long)]
    pub force: bool,

    /// Path to the challenge-provisioning hook program
    #[clap(short = 'h', long = "hook", value_name = "PROGRAM")]
    pub hook: Option<PathBuf>,

    /// Never create missing directories or keys
    #[clap(short = 'n', long = "never-create")]
    pub never_create: bool,

    /// Use the staging directory instead of production
    #[clap(short, long)]
    pub staging: bool,

    /// Raise verbosity (repeatable)
    #[clap(short, long, parse(from_occurrences))]
    pub verbose: u8,

    /// Auto-accept the CA's terms of service
    #[clap(short, long)]
    pub yes: bool,

    #[clap(subcommand)]
    pub action: Action,
}

#[derive(Subcommand, Debug)]
pub enum Action {
    /// Create a new account
    New { email: Option<String> },
    /// Update the account's contact email
    Update { email: Option<String> },
    /// Deactivate the account
    Deactivate,
    /// Issue (or renew) a certificate
    Issue {
        domain: String,
        #[clap(name = "ALTNAME")]
        altnames: Vec<String>,
    },
    /// Revoke a certificate
    Revoke {
        certfile: PathBuf,
        /// CRL reason code (RFC 5280 section 5.3.1)
        #[clap(long, default_value_t = 0)]
        reason: u32,
    },
}

impl Cli {
    pub fn directory_url(&self) -> &str {
        match &self.acme_url {
            Some(url) => url,
            None if self.staging => STAGING_URL,
            None => PRODUCTION_URL,
        }
    }
}

/// Prompt the operator with `message`, requiring a literal `y`/`Y` to
/// proceed.
pub fn prompt_confirm(message: &str) -> io::Result<bool> {
    println!("{message}");
    print!("> ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_lowercase().starts_with('y'))
}
