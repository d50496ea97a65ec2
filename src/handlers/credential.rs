//! # Credential Endpoint

use std::fmt::{self, Debug, Formatter};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use crate::credential::VerifiableCredential;
use crate::handlers::Endpoint;
use crate::issue::{CredentialData, issue};
use crate::registry::Registry;
use crate::verify::check;

/// Request to issue a credential.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssueCredentialRequest {
    /// The issuer's DID. Must be published.
    pub issuer_did: String,

    /// PKCS#8 PEM private key matching the issuer's `#key-1`.
    pub issuer_private_key: String,

    /// Subject, type and claims of the credential.
    pub credential_data: CredentialData,
}

impl Debug for IssueCredentialRequest {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssueCredentialRequest")
            .field("issuer_did", &self.issuer_did)
            .field("issuer_private_key", &"[redacted]")
            .field("credential_data", &self.credential_data)
            .finish()
    }
}

/// The issued credential.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct IssueCredentialResponse {
    /// The credential, with its proof.
    pub credential: VerifiableCredential,
}

/// Request to verify a credential.
///
/// The credential is carried as raw JSON so that a credential this crate
/// cannot model still gets a verdict rather than a transport error.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct VerifyCredentialRequest {
    /// The credential to verify.
    pub credential: Value,
}

/// The verification verdict.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCredentialResponse {
    /// Whether the credential verified.
    pub is_valid: bool,

    /// When verification took place.
    pub verified_at: DateTime<Utc>,
}

impl<R: Registry> Endpoint<R> {
    /// Issue a credential from a published issuer to a published subject.
    ///
    /// # Errors
    ///
    /// Returns an error if either DID is not published, the private key does
    /// not belong to the issuer or the registry cannot be reached.
    #[instrument(level = "debug", skip(self))]
    pub async fn issue_credential(
        &self, request: IssueCredentialRequest,
    ) -> crate::Result<IssueCredentialResponse> {
        let credential = issue(
            &request.issuer_did,
            &request.issuer_private_key,
            request.credential_data,
            self.registry(),
        )
        .await?;
        Ok(IssueCredentialResponse { credential })
    }

    /// Verify a credential. Never fails: any problem yields `isValid: false`.
    ///
    /// Expired credentials are rejected unless [`crate::Config`] says
    /// otherwise.
    #[instrument(level = "debug", skip_all)]
    pub async fn verify_credential(&self, request: VerifyCredentialRequest) -> VerifyCredentialResponse {
        let verification = check(&request.credential, self.registry()).await;
        VerifyCredentialResponse {
            is_valid: verification.is_valid_with(self.config().reject_expired),
            verified_at: crate::now(),
        }
    }
}
