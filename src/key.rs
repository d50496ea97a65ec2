//! # Key Management
//!
//! Ed25519 key pairs exchanged as PEM text. Public keys travel as SPKI
//! `PUBLIC KEY` documents and private keys as PKCS#8 `PRIVATE KEY`
//! documents. The DER bytes inside the armor are the "raw" key material fed
//! to the multibase codec and the document builder.

use std::fmt::{self, Debug, Formatter};

use base64ct::{Base64, Encoding};
use ed25519_dalek::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;

use crate::error::Error;

/// PEM label for SPKI public keys.
pub const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// PEM label for PKCS#8 private keys.
pub const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";

const LINE_WIDTH: usize = 64;

/// An Ed25519 key pair in PEM form.
///
/// The private key is handed to the caller once and never stored by this
/// crate, so the type deliberately has no `Serialize` impl.
#[derive(Clone)]
pub struct KeyPair {
    /// SPKI public key, PEM armored.
    pub public_key: String,

    /// PKCS#8 private key, PEM armored.
    pub private_key: String,
}

impl Debug for KeyPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key)
            .field("private_key", &"[redacted]")
            .finish()
    }
}

/// Generate a fresh Ed25519 key pair from the operating system's CSPRNG.
///
/// # Errors
///
/// Returns [`Error::KeyFormat`] if the generated key cannot be DER encoded.
pub fn generate() -> crate::Result<KeyPair> {
    let signing_key = SigningKey::generate(&mut OsRng);
    key_pair(&signing_key)
}

/// Armor an existing signing key and its verifying key.
///
/// # Errors
///
/// Returns [`Error::KeyFormat`] if either key cannot be DER encoded.
pub fn key_pair(signing_key: &SigningKey) -> crate::Result<KeyPair> {
    let private_der = signing_key
        .to_pkcs8_der()
        .map_err(|e| Error::KeyFormat(format!("issue encoding private key: {e}")))?;
    let public_der = signing_key
        .verifying_key()
        .to_public_key_der()
        .map_err(|e| Error::KeyFormat(format!("issue encoding public key: {e}")))?;

    Ok(KeyPair {
        public_key: raw_to_armored(public_der.as_bytes(), PUBLIC_KEY_LABEL),
        private_key: raw_to_armored(private_der.as_bytes(), PRIVATE_KEY_LABEL),
    })
}

/// Strip PEM armor and return the DER bytes it wraps.
///
/// # Errors
///
/// Returns [`Error::KeyFormat`] if the `BEGIN`/`END` lines are missing or
/// disagree, or if the body is not valid base64.
pub fn armored_to_raw(text: &str) -> crate::Result<Vec<u8>> {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("-----BEGIN ") else {
        return Err(Error::KeyFormat("missing BEGIN line".into()));
    };
    let Some((label, rest)) = rest.split_once("-----") else {
        return Err(Error::KeyFormat("malformed BEGIN line".into()));
    };
    let footer = format!("-----END {label}-----");
    let Some(body) = rest.trim_end().strip_suffix(footer.as_str()) else {
        return Err(Error::KeyFormat(format!("missing END line for {label}")));
    };

    let body: String = body.chars().filter(|c| !c.is_whitespace()).collect();
    if body.is_empty() {
        return Err(Error::KeyFormat(format!("empty {label} body")));
    }
    Base64::decode_vec(&body).map_err(|e| Error::KeyFormat(format!("issue decoding {label}: {e}")))
}

/// Wrap DER bytes in PEM armor with the given label.
#[must_use]
pub fn raw_to_armored(bytes: &[u8], label: &str) -> String {
    let encoded = Base64::encode_string(bytes);
    let mut armored = format!("-----BEGIN {label}-----\n");
    // base64 output is ASCII so chunking bytes never splits a character
    for line in encoded.as_bytes().chunks(LINE_WIDTH) {
        armored.push_str(&String::from_utf8_lossy(line));
        armored.push('\n');
    }
    armored.push_str(&format!("-----END {label}-----"));
    armored
}

/// Parse a PKCS#8 PEM private key.
///
/// # Errors
///
/// Returns [`Error::KeyFormat`] if the text is not an Ed25519 PKCS#8 key.
pub fn signing_key(private_key: &str) -> crate::Result<SigningKey> {
    let der = armored_to_raw(private_key)?;
    SigningKey::from_pkcs8_der(&der)
        .map_err(|e| Error::KeyFormat(format!("issue parsing private key: {e}")))
}

/// Parse an SPKI PEM public key.
///
/// # Errors
///
/// Returns [`Error::KeyFormat`] if the text is not an Ed25519 SPKI key.
pub fn verifying_key(public_key: &str) -> crate::Result<VerifyingKey> {
    let der = armored_to_raw(public_key)?;
    verifying_key_from_der(&der)
}

/// Parse SPKI DER bytes into a verifying key.
///
/// # Errors
///
/// Returns [`Error::KeyFormat`] if the bytes are not an Ed25519 SPKI key.
pub fn verifying_key_from_der(der: &[u8]) -> crate::Result<VerifyingKey> {
    VerifyingKey::from_public_key_der(der)
        .map_err(|e| Error::KeyFormat(format!("issue parsing public key: {e}")))
}
