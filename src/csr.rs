//! Certificate request generation and on-disk certificate handling.

use std::collections::HashSet;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use openssl::asn1::Asn1Time;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509NameBuilder, X509ReqBuilder, X509};

use crate::error::Result;
use crate::jose::b64url;
use crate::key::{KeyAlg, KeyPair};

/// Build a PKCS#10 CSR for `names` signed by `domain_key`, returning its DER
/// form base64url-encoded for direct embedding in a finalize payload. The
/// subject CN is the literal first name (including any `*.` prefix); the
/// SAN extension lists every name in `names`, in order.
pub fn generate_csr(names: &[String], domain_key: &KeyPair) -> Result<String> {
    let mut name_builder = X509NameBuilder::new()?;
    name_builder.append_entry_by_nid(Nid::COMMONNAME, &names[0])?;
    let subject = name_builder.build();

    let mut req = X509ReqBuilder::new()?;
    req.set_subject_name(&subject)?;
    req.set_pubkey(&domain_key.pkey)?;

    let mut san = SubjectAlternativeName::new();
    for name in names {
        san.dns(name);
    }
    let ctx = req.x509v3_context(None);
    let san_ext = san.build(&ctx)?;
    let mut extensions = openssl::stack::Stack::new()?;
    extensions.push(san_ext)?;
    req.add_extensions(&extensions)?;

    req.sign(&domain_key.pkey, digest_for(domain_key.alg))?;
    let der = req.build().to_der()?;
    Ok(b64url(&der))
}

fn digest_for(alg: KeyAlg) -> MessageDigest {
    match alg {
        KeyAlg::Rsa | KeyAlg::EcdsaP256 => MessageDigest::sha256(),
        KeyAlg::EcdsaP384 => MessageDigest::sha384(),
        KeyAlg::EcdsaP521 => MessageDigest::sha512(),
    }
}

/// Re-encode the single PEM certificate at `path` as base64url(DER), the
/// form `revokeCert` expects.
pub fn cert_der_base64url(path: &Path) -> Result<String> {
    let pem = fs::read(path)?;
    let cert = X509::from_pem(&pem)?;
    Ok(b64url(&cert.to_der()?))
}

/// Whether the certificate chain at `dir/cert.pem` is still usable: parses,
/// has at least `min_days` of validity remaining, and covers exactly the
/// requested `names` (order-independent). Any parse failure or missing file
/// is treated as "not valid" rather than propagated, since the caller only
/// uses this to decide whether to reissue.
pub fn cert_valid(dir: &Path, names: &[String], min_days: u32) -> bool {
    match check_cert_valid(dir, names, min_days) {
        Ok(valid) => valid,
        Err(_) => false,
    }
}

fn check_cert_valid(dir: &Path, names: &[String], min_days: u32) -> Result<bool> {
    let pem = fs::read(dir.join("cert.pem"))?;
    let cert = X509::from_pem(&pem)?;

    let now = Asn1Time::days_from_now(0)?;
    let diff = cert.not_after().diff(&now)?;
    let remaining_secs = diff.days as i64 * 86_400 + diff.secs as i64;
    if remaining_secs < min_days as i64 * 86_400 {
        return Ok(false);
    }

    let wanted: HashSet<&str> = names.iter().map(String::as_str).collect();
    let have: HashSet<String> = cert
        .subject_alt_names()
        .map(|stack| {
            stack
                .iter()
                .filter_map(|n| n.dnsname().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    let have: HashSet<&str> = have.iter().map(String::as_str).collect();

    Ok(wanted == have)
}

/// Persist a downloaded certificate chain atomically (write to a sibling
/// temp file, then rename) with mode 0644.
pub fn save_certificate(body: &[u8], certdir: &Path) -> Result<()> {
    let tmp = certdir.join(".cert.pem.tmp");
    fs::write(&tmp, body)?;
    fs::set_permissions(&tmp, fs::Permissions::from_mode(0o644))?;
    fs::rename(&tmp, certdir.join("cert.pem"))?;
    Ok(())
}
