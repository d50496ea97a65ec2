//! # Verifiable Credential
//!
//! The [VC data model](https://www.w3.org/TR/vc-data-model) as issued by this
//! crate: an unsecured [`CredentialBody`] plus the embedded [`Proof`] created
//! over it.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::core::Kind;
use crate::proof::Proof;

/// Contexts added to every credential.
pub const CONTEXT: [&str; 2] =
    ["https://www.w3.org/2018/credentials/v1", "https://idblock.id/credentials/v1"];

/// The base type every credential carries.
pub const BASE_TYPE: &str = "VerifiableCredential";

/// Days a credential stays valid after issuance.
pub const VALIDITY_DAYS: i64 = 365;

/// A credential with its proof.
///
/// Serializes as a single flat JSON object: the body's properties plus
/// `proof`.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerifiableCredential {
    /// The signed claims.
    #[serde(flatten)]
    pub body: CredentialBody,

    /// Proof created over the canonical form of `body`.
    pub proof: Proof,
}

impl VerifiableCredential {
    /// The issuer's DID.
    #[must_use]
    pub fn issuer_did(&self) -> &str {
        self.body.issuer_did()
    }
}

/// The unsecured credential: everything except the proof.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialBody {
    /// JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// `VerifiableCredential` followed by the caller's credential type.
    #[serde(rename = "type")]
    pub type_: Vec<String>,

    /// The issuer's DID, or an object whose `id` is the issuer's DID.
    pub issuer: Kind<Issuer>,

    /// When the credential was issued.
    pub issuance_date: DateTime<Utc>,

    /// When the credential stops being valid.
    pub expiration_date: DateTime<Utc>,

    /// Claims about the subject. Opaque to this crate.
    pub credential_subject: Map<String, Value>,
}

impl CredentialBody {
    /// Assemble an unsecured credential issued at `issued`.
    #[must_use]
    pub fn new(
        issuer_did: impl Into<String>, credential_type: impl Into<String>,
        credential_subject: Map<String, Value>, issued: DateTime<Utc>,
    ) -> Self {
        Self {
            context: CONTEXT.iter().map(|ctx| Kind::String((*ctx).to_string())).collect(),
            type_: vec![BASE_TYPE.to_string(), credential_type.into()],
            issuer: Kind::String(issuer_did.into()),
            issuance_date: issued,
            expiration_date: issued + Duration::days(VALIDITY_DAYS),
            credential_subject,
        }
    }

    /// Whether the credential has expired at `at`. It stops being valid at the
    /// expiration instant itself.
    #[must_use]
    pub fn is_expired(&self, at: DateTime<Utc>) -> bool {
        self.expiration_date <= at
    }

    /// The issuer's DID, whichever form `issuer` takes.
    #[must_use]
    pub fn issuer_did(&self) -> &str {
        match &self.issuer {
            Kind::String(did) => did,
            Kind::Object(issuer) => &issuer.id,
        }
    }
}

/// Issuer in object form.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct Issuer {
    /// The issuer's DID.
    pub id: String,

    /// Additional issuer properties, e.g. `name`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
