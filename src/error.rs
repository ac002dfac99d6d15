use thiserror::Error;

use crate::types::Problem;

/// Unified error type for the ACME protocol driver and its collaborators.
///
/// Variant groups follow the taxonomy laid out for the driver: config/key
/// errors are operator mistakes, transport/protocol errors come from the
/// network and the CA, and the last three describe outcomes specific to
/// the challenge and renewal flows rather than generic failures.
#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("openssl error: {0}")]
    Openssl(#[from] openssl::error::ErrorStack),

    #[error("error writing header value: {0}")]
    ToStr(#[from] reqwest::header::ToStrError),

    #[error("error while de/encoding json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unexpected response {status} from {url}{}", problem_suffix(problem))]
    Protocol {
        status: u16,
        url: String,
        problem: Option<Problem>,
    },

    #[error("header '{0}' missing from response")]
    MissingHeader(&'static str),

    #[error("polling {0} did not reach a terminal state within the time limit")]
    PollTimeout(String),

    #[error("all challenges for {0} were declined or failed")]
    ChallengeDeclined(String),

    /// Not a real failure: `issue` determined the existing certificate is
    /// still valid and skipped re-issuance. The dispatcher maps this to a
    /// clean exit 0 rather than printing it as an error.
    #[error("certificate is still valid, nothing to do")]
    PrecheckSkip,

    #[error("hook {0} failed to spawn")]
    HookSpawn(String),

    #[error("invalid domain name: {0}")]
    InvalidDomain(String),
}

fn problem_suffix(problem: &Option<Problem>) -> String {
    match problem {
        Some(p) => format!(": {p}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, Error>;
