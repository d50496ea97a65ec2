//! # Credential Verification
//!
//! Verification is total: every failure, from an unpublished issuer to a
//! malformed signature, is an ordinary negative outcome and never an error.
//!
//! The proof is checked against the credential exactly as received, minus its
//! `proof` property. Properties a typed model would ignore are still covered
//! by the signature, so adding a claim breaks verification just like changing
//! one does.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::credential::CredentialBody;
use crate::error::Error;
use crate::proof::{Proof, SignatureSuite};
use crate::registry::Registry;
use crate::resolve;

/// The outcome of checking a credential.
///
/// Signature validity and temporal validity are reported separately.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    /// The proof was made by the issuer's published key over this exact
    /// credential.
    pub signature_valid: bool,

    /// The credential is past its expiration date.
    pub expired: bool,

    /// Why the signature check failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verification {
    /// Whether the signature is valid and the credential has not expired.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.signature_valid && !self.expired
    }

    /// Like [`Self::is_valid`], optionally accepting expired credentials.
    #[must_use]
    pub const fn is_valid_with(&self, reject_expired: bool) -> bool {
        self.signature_valid && !(reject_expired && self.expired)
    }
}

/// Verify a credential against the issuer's published document.
///
/// Returns `true` only when the signature is valid and the credential has not
/// expired.
pub async fn verify(credential: &impl Serialize, registry: &impl Registry) -> bool {
    check(credential, registry).await.is_valid()
}

/// Check a credential's signature and expiry.
///
/// `credential` may be a [`crate::VerifiableCredential`] or raw JSON as
/// received from a holder.
pub async fn check(credential: &impl Serialize, registry: &impl Registry) -> Verification {
    check_at(credential, registry, crate::now()).await
}

/// Check a credential as of `at`.
pub async fn check_at(
    credential: &impl Serialize, registry: &impl Registry, at: DateTime<Utc>,
) -> Verification {
    match check_signature(credential, registry).await {
        Ok(body) => Verification {
            signature_valid: true,
            expired: body.is_expired(at),
            reason: None,
        },
        Err(e) => {
            tracing::debug!("credential verification failed: {e}");
            Verification {
                signature_valid: false,
                expired: false,
                reason: Some(e.to_string()),
            }
        }
    }
}

async fn check_signature(
    credential: &impl Serialize, registry: &impl Registry,
) -> crate::Result<CredentialBody> {
    let Value::Object(mut unsecured) = serde_json::to_value(credential)? else {
        return Err(anyhow!("credential is not a JSON object").into());
    };
    let Some(proof) = unsecured.remove("proof") else {
        return Err(anyhow!("credential has no proof").into());
    };

    // name the suite before the typed parse rejects it
    if let Some(suite) = proof.get("type").and_then(Value::as_str) {
        suite.parse::<SignatureSuite>()?;
    }
    let proof: Proof = serde_json::from_value(proof)?;
    let unsecured = Value::Object(unsecured);
    let body: CredentialBody = serde_json::from_value(unsecured.clone())?;

    let issuer = body.issuer_did();
    let method = resolve::method(issuer).unwrap_or_default();
    let document = resolve::resolve(issuer, method, registry)
        .await
        .into_result()
        .map_err(|e| Error::UnknownDid(format!("{issuer} does not resolve: {}", e.code())))?;

    let kid = &proof.verification_method;
    let Some(vm) = document.verification_method(kid) else {
        return Err(anyhow!("{kid} is not published by {issuer}").into());
    };
    if !document.is_assertion_method(kid) {
        return Err(anyhow!("{kid} is not an assertion method of {issuer}").into());
    }

    proof.verify(&unsecured, vm.type_, &vm.verifying_key()?)?;
    Ok(body)
}

#[cfg(test)]
mod test {
    use chrono::Duration;
    use serde_json::json;

    use super::*;
    use crate::document::{CreateOptions, DocumentBuilder, VerificationMethodBuilder, build_document};
    use crate::issue::{CredentialData, issue};
    use crate::key;
    use crate::registry::InMemoryRegistry;
    use crate::VerifiableCredential;

    async fn issued(registry: &InMemoryRegistry) -> VerifiableCredential {
        let issuer = key::generate().expect("should generate");
        let (issuer_did, document) =
            build_document(&issuer.public_key, &CreateOptions::default()).expect("should build");
        registry.store(&issuer_did, document, None).await.expect("should store");

        let subject = key::generate().expect("should generate");
        let (subject_did, document) =
            build_document(&subject.public_key, &CreateOptions::default()).expect("should build");
        registry.store(&subject_did, document, None).await.expect("should store");

        let Value::Object(claims) = json!({
            "id": subject_did,
            "profile": {"name": "Alice", "address": {"country": "KR", "city": "Seoul"}},
            "score": 0.5
        }) else {
            panic!("should be an object");
        };
        let data = CredentialData {
            subject_did,
            credential_type: "IdentityCredential".into(),
            credential_subject: claims,
        };
        issue(&issuer_did, &issuer.private_key, data, registry).await.expect("should issue")
    }

    #[tokio::test]
    async fn valid_credential() {
        let registry = InMemoryRegistry::new();
        let vc = issued(&registry).await;

        assert!(verify(&vc, &registry).await);

        // raw JSON as a holder would present it
        let json: Value = serde_json::from_str(&serde_json::to_string(&vc).expect("should serialize"))
            .expect("should parse");
        let verification = check(&json, &registry).await;
        assert!(verification.is_valid());
        assert_eq!(verification.reason, None);
    }

    #[tokio::test]
    async fn tampering() {
        let registry = InMemoryRegistry::new();
        let vc = serde_json::to_value(issued(&registry).await).expect("should serialize");

        let tamper: [(&str, Box<dyn Fn(&mut Value)>); 7] = [
            ("subject claim", Box::new(|v: &mut Value| v["credentialSubject"]["score"] = json!(0.6))),
            ("nested claim", Box::new(|v: &mut Value| v["credentialSubject"]["profile"]["address"]["city"] = json!("Busan"))),
            ("added claim", Box::new(|v: &mut Value| v["credentialSubject"]["admin"] = json!(true))),
            ("type", Box::new(|v: &mut Value| v["type"][1] = json!("AdminCredential"))),
            ("expiration", Box::new(|v: &mut Value| v["expirationDate"] = json!("2999-01-01T00:00:00Z"))),
            ("added property", Box::new(|v: &mut Value| v["note"] = json!("hello"))),
            ("proof value", Box::new(|v: &mut Value| v["proof"]["proofValue"] = json!("z1111"))),
        ];

        for (name, mutate) in tamper {
            let mut tampered = vc.clone();
            mutate(&mut tampered);
            let verification = check(&tampered, &registry).await;
            assert!(!verification.signature_valid, "{name} should break the signature");
            assert!(verification.reason.is_some());
        }
    }

    #[tokio::test]
    async fn unknown_issuer() {
        let registry = InMemoryRegistry::new();
        let vc = issued(&registry).await;

        let verification = check(&vc, &InMemoryRegistry::new()).await;
        assert!(!verification.signature_valid);
        assert!(verification.reason.expect("should have reason").contains("notFound"));
    }

    #[tokio::test]
    async fn unsupported_suite() {
        let registry = InMemoryRegistry::new();
        let mut vc = serde_json::to_value(issued(&registry).await).expect("should serialize");
        vc["proof"]["type"] = json!("RsaSignature2018");

        let verification = check(&vc, &registry).await;
        assert!(!verification.is_valid());
        assert!(verification.reason.expect("should have reason").contains("RsaSignature2018"));
    }

    #[tokio::test]
    async fn malformed_input() {
        let registry = InMemoryRegistry::new();
        for input in [json!(null), json!("vc"), json!({}), json!({"proof": {}}), json!({"proof": 1})] {
            assert!(!verify(&input, &registry).await, "{input} should not verify");
        }
    }

    #[tokio::test]
    async fn expiry() {
        let registry = InMemoryRegistry::new();
        let vc = issued(&registry).await;

        let later = vc.body.expiration_date + Duration::seconds(1);
        let verification = check_at(&vc, &registry, later).await;
        assert!(verification.signature_valid);
        assert!(verification.expired);
        assert!(!verification.is_valid());
        assert!(verification.is_valid_with(false));

        let earlier = vc.body.expiration_date - Duration::seconds(1);
        assert!(check_at(&vc, &registry, earlier).await.is_valid());
    }

    #[tokio::test]
    async fn method_not_an_assertion_method() {
        let registry = InMemoryRegistry::new();
        let vc = issued(&registry).await;
        let issuer = vc.issuer_did().to_string();

        // republish the issuer's key without the assertionMethod relationship
        let entry = registry.fetch(&issuer).await.expect("should fetch").expect("should exist");
        let vm = entry.document.verification_method[0].clone();
        let der = crate::multibase::decode(&vm.public_key_multibase).expect("should decode");
        let document = DocumentBuilder::new(&issuer)
            .verification_method(VerificationMethodBuilder::new(&der).did(&issuer).build())
            .authentication(vm.id.as_str())
            .build()
            .expect("should build");
        registry.store(&issuer, document, None).await.expect("should store");

        let verification = check(&vc, &registry).await;
        assert!(!verification.signature_valid);
        assert!(verification.reason.expect("should have reason").contains("assertion method"));
    }
}
