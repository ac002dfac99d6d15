//! An ACME (RFC 8555) client library: the protocol driver plus the
//! cryptographic, transport, and filesystem collaborators it is built on.
//! The `uacme-rs` binary is a thin CLI wrapper around [`dispatch::run`].

pub mod account;
pub mod authz;
pub mod cli;
pub mod csr;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod hook;
pub mod jose;
pub mod key;
pub mod logging;
pub mod nonce;
pub mod order;
pub mod paths;
pub mod poll;
pub mod session;
pub mod transport;
pub mod types;
pub mod validate;
