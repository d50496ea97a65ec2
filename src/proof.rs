//! # Data Integrity Proof
//!
//! Embedded proofs for credentials, after the
//! [Ed25519 Signature 2020](https://w3c-ccg.github.io/lds-ed25519-2020) suite.
//!
//! The signing input is the SHA-256 digest of the [RFC 8785] (JCS) canonical
//! form of the unsecured document. JCS sorts keys at every nesting level and
//! fixes number formatting, so signer and verifier hash identical bytes no
//! matter how the claims were assembled.
//!
//! JCS formats every number as an IEEE-754 double. Integers beyond
//! ±(2^53 - 1) would share canonical bytes with their neighbours, so values
//! containing them are refused rather than signed or verified.
//!
//! [RFC 8785]: https://www.rfc-editor.org/rfc/rfc8785

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::document::MethodType;
use crate::error::Error;
use crate::multibase;

/// An embedded proof over a credential body.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// The signature suite used to create the proof.
    #[serde(rename = "type")]
    pub type_: SignatureSuite,

    /// When the proof was created.
    pub created: DateTime<Utc>,

    /// The verification method whose key verifies the proof, e.g.
    /// `did:idblock:z6Mk...#key-1`.
    pub verification_method: String,

    /// The reason for the proof. Acts as a safeguard against the proof being
    /// used for something other than what was intended.
    pub proof_purpose: ProofPurpose,

    /// The signature, multibase (base58btc) encoded.
    pub proof_value: String,
}

impl Proof {
    /// Sign `unsecured` with `signing_key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serialization`] if `unsecured` cannot be
    /// canonicalized and [`Error::UnsafeInteger`] if it holds an integer JCS
    /// cannot represent exactly.
    pub fn create<T: Serialize>(
        unsecured: &T, signing_key: &SigningKey, verification_method: impl Into<String>,
    ) -> crate::Result<Self> {
        let digest = digest(unsecured)?;
        let signature = signing_key.sign(&digest);

        Ok(Self {
            type_: SignatureSuite::Ed25519Signature2020,
            created: crate::now(),
            verification_method: verification_method.into(),
            proof_purpose: ProofPurpose::AssertionMethod,
            proof_value: multibase::encode(&signature.to_bytes()),
        })
    }

    /// Check the proof against `unsecured`, the document it was created over.
    ///
    /// # Errors
    ///
    /// Returns an error if the proof value is not a well-formed signature, the
    /// key type does not suit the proof type, or the signature does not match.
    pub fn verify<T: Serialize>(
        &self, unsecured: &T, method_type: MethodType, verifying_key: &VerifyingKey,
    ) -> crate::Result<()> {
        self.type_.check(method_type)?;

        let bytes = multibase::decode(&self.proof_value)?;
        let signature = Signature::from_slice(&bytes)
            .map_err(|e| anyhow!("proof value is not a signature: {e}"))?;

        let digest = digest(unsecured)?;
        verifying_key
            .verify(&digest, &signature)
            .map_err(|e| anyhow!("signature does not match: {e}"))?;
        Ok(())
    }
}

/// Signature suites supported for proofs.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum SignatureSuite {
    /// Ed25519 signature over a SHA-256 digest of the canonical document.
    #[default]
    Ed25519Signature2020,
}

impl SignatureSuite {
    /// Ensure a verification method of `method_type` can verify this suite.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSuite`] if the key type does not suit the
    /// signature suite.
    pub fn check(self, method_type: MethodType) -> crate::Result<()> {
        match (self, method_type) {
            (Self::Ed25519Signature2020, MethodType::Ed25519VerificationKey2020) => Ok(()),
        }
    }
}

impl Display for SignatureSuite {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519Signature2020 => write!(f, "Ed25519Signature2020"),
        }
    }
}

impl FromStr for SignatureSuite {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Ed25519Signature2020" => Ok(Self::Ed25519Signature2020),
            _ => Err(Error::UnsupportedSuite(format!("{s} is not a supported signature suite"))),
        }
    }
}

/// The purpose a proof was created for.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ProofPurpose {
    /// Used to express claims, such as issuing a credential.
    #[default]
    AssertionMethod,
}

/// Largest integer magnitude an IEEE-754 double holds exactly.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Serialize `value` to its RFC 8785 canonical form.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if `value` cannot be represented as JSON
/// and [`Error::UnsafeInteger`] if it holds an integer outside
/// ±[`MAX_SAFE_INTEGER`].
pub fn canonicalize<T: Serialize>(value: &T) -> crate::Result<String> {
    let value = serde_json::to_value(value)?;
    ensure_exact(&value, "")?;
    Ok(serde_json_canonicalizer::to_string(&value)?)
}

fn ensure_exact(value: &Value, path: &str) -> crate::Result<()> {
    match value {
        Value::Number(n) => {
            let magnitude = n.as_i64().map(i64::unsigned_abs).or_else(|| n.as_u64());
            if magnitude.is_some_and(|m| m > MAX_SAFE_INTEGER) {
                return Err(Error::UnsafeInteger(format!("{n} at {path:?} is not exactly representable")));
            }
            Ok(())
        }
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                ensure_exact(item, &format!("{path}/{i}"))?;
            }
            Ok(())
        }
        Value::Object(map) => {
            for (key, item) in map {
                ensure_exact(item, &format!("{path}/{key}"))?;
            }
            Ok(())
        }
        Value::Null | Value::Bool(_) | Value::String(_) => Ok(()),
    }
}

/// SHA-256 digest of the canonical form of `value`. This is the exact input
/// to signing and verification.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if `value` cannot be canonicalized.
pub fn digest<T: Serialize>(value: &T) -> crate::Result<Vec<u8>> {
    let canonical = canonicalize(value)?;
    Ok(Sha256::digest(canonical.as_bytes()).to_vec())
}
