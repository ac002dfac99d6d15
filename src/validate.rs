//! Domain name syntax validation: a conservative character-class check,
//! not a full DNS label/IDNA validator.

use crate::error::{Error, Result};

/// Accepts ASCII letters, digits, `.`, `_`, `-`; forbids a leading `.`;
/// allows a `*.` wildcard prefix only as an exact prefix; requires at
/// least one character besides the separators.
pub fn validate_domain(name: &str) -> Result<()> {
    let rest = name.strip_prefix("*.").unwrap_or(name);

    if rest.is_empty() {
        return Err(Error::InvalidDomain(name.to_string()));
    }
    if rest.starts_with('.') {
        return Err(Error::InvalidDomain(name.to_string()));
    }
    if !rest
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(Error::InvalidDomain(name.to_string()));
    }
    if !rest.chars().any(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidDomain(name.to_string()));
    }
    Ok(())
}
