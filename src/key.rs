//! Key storage: load-or-create account and domain keys, persisted as PEM
//! with restrictive permissions.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use openssl::ec::{EcGroup, EcKey};
use openssl::nid::Nid;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;

use crate::error::{Error, Result};

/// Account key width when a fresh RSA key is generated. Chosen once per
/// install; existing keys keep whatever width they were created with.
const RSA_KEY_WIDTH: u32 = 2048;

/// The asymmetric algorithm backing a key, driving both key generation and
/// the `alg` used when signing JWS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlg {
    Rsa,
    EcdsaP256,
    EcdsaP384,
    EcdsaP521,
}

impl KeyAlg {
    pub fn jws_alg(self) -> &'static str {
        match self {
            KeyAlg::Rsa => "RS256",
            KeyAlg::EcdsaP256 => "ES256",
            KeyAlg::EcdsaP384 => "ES384",
            KeyAlg::EcdsaP521 => "ES512",
        }
    }

    /// Byte length of each of `r`/`s` in the fixed-length JWS ECDSA
    /// signature encoding (RFC 7518 section 3.4). Unused for RSA.
    pub fn ecdsa_coord_len(self) -> usize {
        match self {
            KeyAlg::EcdsaP256 => 32,
            KeyAlg::EcdsaP384 => 48,
            KeyAlg::EcdsaP521 => 66,
            KeyAlg::Rsa => 0,
        }
    }
}

/// A loaded or freshly generated key pair, plus the algorithm it determines.
pub struct KeyPair {
    pub alg: KeyAlg,
    pub pkey: PKey<Private>,
}

impl KeyPair {
    pub(crate) fn generate(alg: KeyAlg) -> Result<Self> {
        let pkey = match alg {
            KeyAlg::Rsa => {
                let rsa = Rsa::generate(RSA_KEY_WIDTH)?;
                PKey::from_rsa(rsa)?
            }
            KeyAlg::EcdsaP256 => generate_ec(Nid::X9_62_PRIME256V1)?,
            KeyAlg::EcdsaP384 => generate_ec(Nid::SECP384R1)?,
            KeyAlg::EcdsaP521 => generate_ec(Nid::SECP521R1)?,
        };
        Ok(KeyPair { alg, pkey })
    }

    pub(crate) fn from_pem(pem: &[u8]) -> Result<Self> {
        let pkey = PKey::private_key_from_pem(pem)?;
        let alg = match pkey.id() {
            openssl::pkey::Id::RSA => KeyAlg::Rsa,
            openssl::pkey::Id::EC => {
                let ec = pkey.ec_key()?;
                let group = ec.group();
                match group.curve_name() {
                    Some(Nid::X9_62_PRIME256V1) => KeyAlg::EcdsaP256,
                    Some(Nid::SECP384R1) => KeyAlg::EcdsaP384,
                    Some(Nid::SECP521R1) => KeyAlg::EcdsaP521,
                    other => {
                        return Err(Error::Key(format!(
                            "unsupported EC curve in key file: {other:?}"
                        )))
                    }
                }
            }
            other => return Err(Error::Key(format!("unsupported key type: {other:?}"))),
        };
        Ok(KeyPair { alg, pkey })
    }

    pub(crate) fn to_pem(&self) -> Result<Vec<u8>> {
        Ok(self.pkey.private_key_to_pem_pkcs8()?)
    }
}

fn generate_ec(curve: Nid) -> Result<PKey<Private>> {
    let group = EcGroup::from_curve_name(curve)?;
    let ec = EcKey::generate(&group)?;
    Ok(PKey::from_ec_key(ec)?)
}

/// Load a PEM key from `path`, or generate-and-persist one of `alg` if it
/// doesn't exist and `create_allowed` is set. The parent directory must
/// already exist with the right mode; this only sets the file's own mode.
pub fn load_or_create(path: &Path, create_allowed: bool, alg: KeyAlg) -> Result<KeyPair> {
    if path.exists() {
        let pem = fs::read(path)
            .map_err(|e| Error::Key(format!("failed to read {}: {e}", path.display())))?;
        return KeyPair::from_pem(&pem)
            .map_err(|e| Error::Key(format!("failed to parse {}: {e}", path.display())));
    }

    if !create_allowed {
        return Err(Error::Key(format!(
            "{} does not exist and -n/--never-create was given",
            path.display()
        )));
    }

    let key = KeyPair::generate(alg)?;
    let pem = key.to_pem()?;
    write_private_pem(path, &pem)?;
    Ok(key)
}

/// Write `pem` to `path` with mode 0600, creating the file if needed.
pub fn write_private_pem(path: &Path, pem: &[u8]) -> Result<()> {
    fs::write(path, pem)?;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}
