//! Wire types exchanged with the ACME server (RFC 8555).
//!
//! Status fields are modeled as tagged enums rather than raw strings so that
//! the driver's `match` statements are exhaustive; an `Unknown(String)`
//! variant absorbs anything the server sends that we don't recognize so a
//! forward-compatible CA doesn't make us panic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The ACME directory (RFC 8555 section 7.1.1).
#[derive(Debug, Clone, Deserialize)]
pub struct Directory {
    #[serde(rename = "newNonce")]
    pub new_nonce: String,
    #[serde(rename = "newAccount")]
    pub new_account: String,
    #[serde(rename = "newOrder")]
    pub new_order: String,
    #[serde(rename = "revokeCert")]
    pub revoke_cert: String,
    #[serde(default)]
    pub meta: Option<DirectoryMeta>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DirectoryMeta {
    #[serde(rename = "termsOfService", default)]
    pub terms_of_service: Option<String>,
}

/// `application/problem+json` error body (RFC 7807 / RFC 8555 section 6.7).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Problem {
    #[serde(rename = "type", default)]
    pub problem_type: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

pub const ACCOUNT_DOES_NOT_EXIST: &str = "urn:ietf:params:acme:error:accountDoesNotExist";
pub const BAD_NONCE: &str = "urn:ietf:params:acme:error:badNonce";

impl Problem {
    pub fn is_type(&self, urn: &str) -> bool {
        self.problem_type.as_deref() == Some(urn)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            self.problem_type.as_deref().unwrap_or("unknown error"),
            self.detail
                .as_ref()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Ready,
    Processing,
    Valid,
    Invalid,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizationStatus {
    Pending,
    Valid,
    Invalid,
    Deactivated,
    Expired,
    Revoked,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Pending,
    Processing,
    Valid,
    Invalid,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Valid,
    Deactivated,
    Revoked,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl Identifier {
    pub fn dns(value: impl Into<String>) -> Self {
        Identifier {
            kind: "dns".to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewOrderPayload {
    pub identifiers: Vec<Identifier>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub status: OrderStatus,
    #[serde(default)]
    pub authorizations: Vec<String>,
    #[serde(default)]
    pub finalize: Option<String>,
    #[serde(default)]
    pub certificate: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Authorization {
    pub status: AuthorizationStatus,
    pub identifier: Identifier,
    #[serde(default)]
    pub challenges: Vec<Challenge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Challenge {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    pub token: String,
    pub status: ChallengeStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub status: AccountStatus,
    #[serde(default)]
    pub contact: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAccountPayload {
    #[serde(rename = "onlyReturnExisting", skip_serializing_if = "is_false")]
    pub only_return_existing: bool,
    #[serde(rename = "termsOfServiceAgreed", skip_serializing_if = "Option::is_none")]
    pub terms_of_service_agreed: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateAccountPayload {
    pub contact: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeactivateAccountPayload {
    pub status: &'static str,
}

impl Default for DeactivateAccountPayload {
    fn default() -> Self {
        DeactivateAccountPayload {
            status: "deactivated",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizePayload {
    pub csr: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RevokeCertPayload {
    pub certificate: String,
    pub reason: u32,
}
