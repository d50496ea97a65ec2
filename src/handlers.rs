//! # Endpoint
//!
//! `Endpoint` provides the entry point for the DID and credential operations.
//! Each operation takes a request that can be deserialized from, and returns
//! a response that can be serialized to, the JSON bodies a transport
//! exchanges with its callers.
//!
//! Every registry call made through an `Endpoint` is bounded by
//! [`Config::registry_timeout`].

mod credential;
mod did;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

pub use self::credential::{
    IssueCredentialRequest, IssueCredentialResponse, VerifyCredentialRequest,
    VerifyCredentialResponse,
};
pub use self::did::{CreateDidRequest, CreateDidResponse};
use crate::config::Config;
use crate::credential::VerifiableCredential;
use crate::issue::CredentialData;
use crate::registry::{Registry, Timeout};

/// Issuer endpoint published by the demo issuer.
const DEMO_ENDPOINT: &str = "https://idblock.id/api/v1/did/credentials/issue";

/// Serves the DID and credential operations against a registry.
#[derive(Clone, Debug)]
pub struct Endpoint<R> {
    registry: Timeout<R>,
    config: Config,
}

impl<R: Registry> Endpoint<R> {
    /// Create an endpoint backed by `registry`.
    pub fn new(registry: R, config: Config) -> Self {
        let registry = Timeout::new(registry, config.registry_timeout());
        Self { registry, config }
    }

    /// The endpoint's configuration.
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The registry, wrapped in the configured timeout.
    pub const fn registry(&self) -> &Timeout<R> {
        &self.registry
    }

    /// Run the full workflow: create an issuer and a subject, issue the
    /// subject an `IdentityCredential` and verify it.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails.
    #[instrument(level = "debug", skip(self))]
    pub async fn demo(&self) -> crate::Result<DemoResponse> {
        let issuer = self
            .create_did(CreateDidRequest {
                name: "IDBLOCK Issuer".into(),
                email: "issuer@idblock.id".into(),
                service_endpoint: Some(DEMO_ENDPOINT.into()),
            })
            .await?;
        let subject = self
            .create_did(CreateDidRequest {
                name: "Demo Holder".into(),
                email: "holder@idblock.id".into(),
                service_endpoint: None,
            })
            .await?;

        let claims = json!({
            "id": subject.did,
            "name": "Demo Holder",
            "birthDate": "1994-05-01",
            "nationality": "KR",
            "verified": true,
            "verificationDate": crate::now(),
        });
        let serde_json::Value::Object(credential_subject) = claims else {
            return Err(anyhow::anyhow!("claims should be an object").into());
        };

        let IssueCredentialResponse { credential } = self
            .issue_credential(IssueCredentialRequest {
                issuer_did: issuer.did.clone(),
                issuer_private_key: issuer.private_key,
                credential_data: CredentialData {
                    subject_did: subject.did.clone(),
                    credential_type: "IdentityCredential".into(),
                    credential_subject,
                },
            })
            .await?;

        let verified = self
            .verify_credential(VerifyCredentialRequest {
                credential: serde_json::to_value(&credential)?,
            })
            .await;

        Ok(DemoResponse {
            issuer_did: issuer.did,
            subject_did: subject.did,
            credential,
            verification_result: verified.is_valid,
            verified_at: verified.verified_at,
        })
    }
}

/// Artifacts produced by [`Endpoint::demo`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DemoResponse {
    /// The issuer's DID.
    pub issuer_did: String,

    /// The subject's DID.
    pub subject_did: String,

    /// The issued credential.
    pub credential: VerifiableCredential,

    /// Whether the credential verified.
    pub verification_result: bool,

    /// When the credential was verified.
    pub verified_at: DateTime<Utc>,
}
