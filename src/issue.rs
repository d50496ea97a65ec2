//! # Credential Issuance
//!
//! Issue a credential from one published DID to another. Both DIDs must be
//! resolvable and the supplied private key must belong to the issuer's
//! published `#key-1`, so an issued credential always verifies while the
//! issuer's document stays published.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::credential::{CredentialBody, VerifiableCredential};
use crate::document::{Document, KEY_FRAGMENT};
use crate::error::Error;
use crate::proof::Proof;
use crate::registry::Registry;
use crate::{key, resolve};

/// What the issuer asserts, and about whom.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialData {
    /// The subject's DID. Must be published.
    pub subject_did: String,

    /// The credential type, appended to `VerifiableCredential`.
    pub credential_type: String,

    /// Claims about the subject.
    #[serde(default)]
    pub credential_subject: Map<String, Value>,
}

/// Issue a credential signed with the issuer's private key.
///
/// # Errors
///
/// Returns [`Error::UnknownDid`] if the issuer or subject is not published,
/// [`Error::RegistryUnavailable`] if the registry cannot be reached,
/// [`Error::KeyFormat`] if the private key is not an Ed25519 PKCS#8 PEM,
/// [`Error::KeyMismatch`] if it does not belong to the issuer, and
/// [`Error::UnsafeInteger`] if a claim holds an integer outside
/// ±(2^53 - 1).
pub async fn issue(
    issuer_did: &str, issuer_private_key: &str, data: CredentialData, registry: &impl Registry,
) -> crate::Result<VerifiableCredential> {
    // the subject must be a DID of the issuer's method
    let method = resolve::method(issuer_did).unwrap_or_default();
    let issuer = published(issuer_did, method, registry).await?;
    published(&data.subject_did, method, registry).await?;

    let kid = format!("{issuer_did}#{KEY_FRAGMENT}");
    let signing_key = key::signing_key(issuer_private_key)?;
    let Some(vm) = issuer.verification_method(&kid) else {
        return Err(Error::KeyMismatch(format!("{issuer_did} publishes no {KEY_FRAGMENT}")));
    };
    if vm.verifying_key()? != signing_key.verifying_key() {
        return Err(Error::KeyMismatch(format!("private key does not belong to {kid}")));
    }

    let body = CredentialBody::new(
        issuer_did,
        data.credential_type,
        data.credential_subject,
        crate::now(),
    );
    let proof = Proof::create(&body, &signing_key, kid)?;

    tracing::info!("issued {} from {issuer_did} to {}", body.type_.join(","), data.subject_did);
    Ok(VerifiableCredential { body, proof })
}

async fn published(did: &str, method: &str, registry: &impl Registry) -> crate::Result<Document> {
    match resolve::resolve(did, method, registry).await.into_result() {
        Ok(document) => Ok(document),
        Err(e @ (Error::RegistryUnavailable(_) | Error::Other(_))) => Err(e),
        Err(e) => Err(Error::UnknownDid(e.message())),
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;
    use crate::document::{CreateOptions, build_document};
    use crate::key::KeyPair;
    use crate::registry::InMemoryRegistry;

    async fn publish(registry: &InMemoryRegistry) -> (String, KeyPair) {
        let pair = key::generate().expect("should generate");
        let (did, document) =
            build_document(&pair.public_key, &CreateOptions::default()).expect("should build");
        registry.store(&did, document, None).await.expect("should store");
        (did, pair)
    }

    fn data(subject_did: &str) -> CredentialData {
        let Value::Object(subject) = json!({"id": subject_did, "verified": true}) else {
            panic!("should be an object");
        };
        CredentialData {
            subject_did: subject_did.to_string(),
            credential_type: "IdentityCredential".into(),
            credential_subject: subject,
        }
    }

    #[tokio::test]
    async fn issues_credential() {
        let registry = InMemoryRegistry::new();
        let (issuer, pair) = publish(&registry).await;
        let (subject, _) = publish(&registry).await;

        let vc = issue(&issuer, &pair.private_key, data(&subject), &registry)
            .await
            .expect("should issue");

        assert_eq!(vc.issuer_did(), issuer);
        assert_eq!(vc.proof.verification_method, format!("{issuer}#key-1"));
        assert_eq!(vc.body.credential_subject["id"], json!(subject));
    }

    #[tokio::test]
    async fn unknown_issuer() {
        let registry = InMemoryRegistry::new();
        let (subject, pair) = publish(&registry).await;

        let result = issue("did:idblock:zNobody", &pair.private_key, data(&subject), &registry).await;
        let Err(Error::UnknownDid(_)) = result else {
            panic!("expected unknown DID");
        };
    }

    #[tokio::test]
    async fn unknown_subject() {
        let registry = InMemoryRegistry::new();
        let (issuer, pair) = publish(&registry).await;

        for subject in ["did:idblock:zNobody", "not-a-did"] {
            let result = issue(&issuer, &pair.private_key, data(subject), &registry).await;
            assert!(matches!(result, Err(Error::UnknownDid(_))), "{subject} should be unknown");
        }
    }

    #[tokio::test]
    async fn subject_of_another_method() {
        let registry = InMemoryRegistry::new();
        let (issuer, pair) = publish(&registry).await;

        let other = key::generate().expect("should generate");
        let options = CreateOptions {
            method: "example".into(),
            ..CreateOptions::default()
        };
        let (subject, document) = build_document(&other.public_key, &options).expect("should build");
        registry.store(&subject, document, None).await.expect("should store");

        let result = issue(&issuer, &pair.private_key, data(&subject), &registry).await;
        assert!(matches!(result, Err(Error::UnknownDid(_))));
    }

    #[tokio::test]
    async fn unsafe_integer_claim() {
        let registry = InMemoryRegistry::new();
        let (issuer, pair) = publish(&registry).await;
        let (subject, _) = publish(&registry).await;

        let mut request = data(&subject);
        request.credential_subject.insert("balance".into(), json!(u64::MAX));
        let Err(Error::UnsafeInteger(msg)) = issue(&issuer, &pair.private_key, request, &registry).await
        else {
            panic!("expected unsafe integer");
        };
        assert!(msg.contains("/credentialSubject/balance"));
    }

    #[tokio::test]
    async fn wrong_private_key() {
        let registry = InMemoryRegistry::new();
        let (issuer, _) = publish(&registry).await;
        let (subject, subject_pair) = publish(&registry).await;

        let result = issue(&issuer, &subject_pair.private_key, data(&subject), &registry).await;
        let Err(Error::KeyMismatch(_)) = result else {
            panic!("expected key mismatch");
        };

        let result = issue(&issuer, "not a key", data(&subject), &registry).await;
        let Err(Error::KeyFormat(_)) = result else {
            panic!("expected key format error");
        };
    }
}
