//! JWS signer: builds the protected header, serializes the flattened JWS
//! body, signs with the account key, and computes the JWK thumbprint
//! (RFC 7638).

use base64::{decode_config, encode_config, URL_SAFE_NO_PAD};
use openssl::bn::BigNum;
use openssl::ecdsa::EcdsaSig;
use openssl::hash::{hash, MessageDigest};
use openssl::rsa::Padding;
use openssl::sign::Signer;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::key::{KeyAlg, KeyPair};

pub fn b64url(bytes: &[u8]) -> String {
    encode_config(bytes, URL_SAFE_NO_PAD)
}

pub fn b64url_decode(s: &str) -> Result<Vec<u8>> {
    Ok(decode_config(s, URL_SAFE_NO_PAD)?)
}

impl From<base64::DecodeError> for crate::error::Error {
    fn from(e: base64::DecodeError) -> Self {
        crate::error::Error::Key(format!("base64 decode failed: {e}"))
    }
}

/// The canonical JWK (RFC 7517) for a key, in the field order RFC 7638
/// requires for thumbprinting: lexicographic by member name.
fn canonical_jwk(key: &KeyPair) -> Result<Value> {
    let jwk = match key.alg {
        KeyAlg::Rsa => {
            let rsa = key.pkey.rsa()?;
            json!({
                "e": b64url(&rsa.e().to_vec()),
                "kty": "RSA",
                "n": b64url(&rsa.n().to_vec()),
            })
        }
        KeyAlg::EcdsaP256 | KeyAlg::EcdsaP384 | KeyAlg::EcdsaP521 => {
            let ec = key.pkey.ec_key()?;
            let group = ec.group();
            let mut ctx = openssl::bn::BigNumContext::new()?;
            let mut x = BigNum::new()?;
            let mut y = BigNum::new()?;
            ec.public_key()
                .affine_coordinates_gfp(group, &mut x, &mut y, &mut ctx)?;
            let coord_len = key.alg.ecdsa_coord_len();
            json!({
                "crv": crv_name(key.alg),
                "kty": "EC",
                "x": b64url(&pad(&x.to_vec(), coord_len)),
                "y": b64url(&pad(&y.to_vec(), coord_len)),
            })
        }
    };
    Ok(jwk)
}

fn crv_name(alg: KeyAlg) -> &'static str {
    match alg {
        KeyAlg::EcdsaP256 => "P-256",
        KeyAlg::EcdsaP384 => "P-384",
        KeyAlg::EcdsaP521 => "P-521",
        KeyAlg::Rsa => unreachable!("RSA keys have no EC curve"),
    }
}

/// Left-pad a big-endian integer to `len` bytes, as required for fixed
/// width JWK/JWS EC coordinates and signature components.
fn pad(bytes: &[u8], len: usize) -> Vec<u8> {
    if bytes.len() >= len {
        return bytes.to_vec();
    }
    let mut out = vec![0u8; len - bytes.len()];
    out.extend_from_slice(bytes);
    out
}

/// RFC 7638 JWK thumbprint: base64url(SHA-256(canonical JSON)).
pub fn thumbprint(key: &KeyPair) -> Result<String> {
    let jwk = canonical_jwk(key)?;
    let canonical = serde_json::to_string(&jwk)?;
    let digest = hash(MessageDigest::sha256(), canonical.as_bytes())?;
    Ok(b64url(&digest))
}

/// protected header carrying `jwk`, used only for the very first
/// `newAccount` request, before a `kid` exists.
pub fn protected_jwk(nonce: &str, url: &str, key: &KeyPair) -> Result<String> {
    let header = json!({
        "alg": key.alg.jws_alg(),
        "jwk": canonical_jwk(key)?,
        "nonce": nonce,
        "url": url,
    });
    Ok(b64url(serde_json::to_string(&header)?.as_bytes()))
}

/// protected header carrying `kid`, used for every authenticated request
/// after the account exists. `alg` still has to come from the signing key,
/// but a `kid` header carries no key material to derive it from, so the
/// caller (which holds the `KeyPair`) passes it in.
pub fn protected_kid(nonce: &str, url: &str, kid: &str, alg: &str) -> Result<String> {
    let header = json!({
        "alg": alg,
        "kid": kid,
        "nonce": nonce,
        "url": url,
    });
    Ok(b64url(serde_json::to_string(&header)?.as_bytes()))
}

/// Serialize `payload` and sign it into a flattened-serialization JWS
/// (RFC 7515 section 7.2.2) under the already base64url-encoded
/// `protected` header. An empty payload (GET-as-POST, RFC 8555 section 6.3)
/// encodes to an empty string rather than `"\"\""`.
pub fn encode<T: Serialize>(protected: &str, payload: Option<&T>, key: &KeyPair) -> Result<Value> {
    let payload64 = match payload {
        Some(p) => b64url(serde_json::to_vec(p)?.as_slice()),
        None => String::new(),
    };

    let signing_input = format!("{protected}.{payload64}");
    let signature = sign(key, signing_input.as_bytes())?;

    Ok(json!({
        "protected": protected,
        "payload": payload64,
        "signature": b64url(&signature),
    }))
}

fn sign(key: &KeyPair, input: &[u8]) -> Result<Vec<u8>> {
    match key.alg {
        KeyAlg::Rsa => {
            let mut signer = Signer::new(MessageDigest::sha256(), &key.pkey)?;
            signer.set_rsa_padding(Padding::PKCS1)?;
            signer.update(input)?;
            Ok(signer.sign_to_vec()?)
        }
        KeyAlg::EcdsaP256 | KeyAlg::EcdsaP384 | KeyAlg::EcdsaP521 => {
            let digest = match key.alg {
                KeyAlg::EcdsaP256 => MessageDigest::sha256(),
                KeyAlg::EcdsaP384 => MessageDigest::sha384(),
                KeyAlg::EcdsaP521 => MessageDigest::sha512(),
                KeyAlg::Rsa => unreachable!(),
            };
            let mut signer = Signer::new(digest, &key.pkey)?;
            signer.update(input)?;
            let der = signer.sign_to_vec()?;
            der_to_fixed_ecdsa(&der, key.alg.ecdsa_coord_len())
        }
    }
}

/// JWS requires ECDSA signatures as fixed-length `r || s` (RFC 7518
/// section 3.4), but openssl's `Signer` emits the ASN.1 DER `SEQUENCE`
/// form; convert between the two.
fn der_to_fixed_ecdsa(der: &[u8], coord_len: usize) -> Result<Vec<u8>> {
    let sig = EcdsaSig::from_der(der)?;
    let r = pad(&sig.r().to_vec(), coord_len);
    let s = pad(&sig.s().to_vec(), coord_len);
    let mut out = Vec::with_capacity(coord_len * 2);
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeyPair;

    fn ecdsa_key() -> KeyPair {
        KeyPair::generate(KeyAlg::EcdsaP256).unwrap()
    }

    fn rsa_key() -> KeyPair {
        KeyPair::generate(KeyAlg::Rsa).unwrap()
    }

    #[test]
    fn thumbprint_is_stable_for_the_same_key() {
        let key = ecdsa_key();
        assert_eq!(thumbprint(&key).unwrap(), thumbprint(&key).unwrap());
    }

    #[test]
    fn thumbprint_differs_across_keys() {
        assert_ne!(
            thumbprint(&ecdsa_key()).unwrap(),
            thumbprint(&ecdsa_key()).unwrap()
        );
    }

    #[test]
    fn empty_payload_encodes_to_empty_string() {
        let key = rsa_key();
        let protected = protected_jwk("nonce1", "https://example.test/acct", &key).unwrap();
        let jws = encode::<()>(&protected, None, &key).unwrap();
        assert_eq!(jws["payload"], "");
        assert!(jws["signature"].as_str().unwrap().len() > 0);
    }

    #[test]
    fn rsa_signature_verifies() {
        let key = rsa_key();
        let protected = protected_jwk("nonce2", "https://example.test/order", &key).unwrap();
        let jws = encode(&protected, Some(&json!({"k": "v"})), &key).unwrap();
        let signing_input = format!("{}.{}", jws["protected"], jws["payload"]);
        let sig = b64url_decode(jws["signature"].as_str().unwrap()).unwrap();

        let mut verifier = openssl::sign::Verifier::new(MessageDigest::sha256(), &key.pkey).unwrap();
        verifier.set_rsa_padding(Padding::PKCS1).unwrap();
        verifier.update(signing_input.as_bytes()).unwrap();
        assert!(verifier.verify(&sig).unwrap());
    }

    #[test]
    fn ecdsa_signature_is_fixed_length_and_verifies() {
        let key = ecdsa_key();
        let protected = protected_jwk("nonce3", "https://example.test/order", &key).unwrap();
        let jws = encode(&protected, Some(&json!({"k": "v"})), &key).unwrap();
        let signing_input = format!("{}.{}", jws["protected"], jws["payload"]);
        let sig = b64url_decode(jws["signature"].as_str().unwrap()).unwrap();

        let coord_len = key.alg.ecdsa_coord_len();
        assert_eq!(sig.len(), coord_len * 2);

        let r = BigNum::from_slice(&sig[..coord_len]).unwrap();
        let s = BigNum::from_slice(&sig[coord_len..]).unwrap();
        let ecdsa_sig = EcdsaSig::from_private_components(r, s).unwrap();
        let digest = hash(MessageDigest::sha256(), signing_input.as_bytes()).unwrap();
        let ec = key.pkey.ec_key().unwrap();
        assert!(ecdsa_sig.verify(&digest, &ec).unwrap());
    }
}
