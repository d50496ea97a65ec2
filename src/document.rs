//! # DID Document
//!
//! A DID Document is a JSON-LD document that contains information related to a
//! DID.
//!
//! The DID itself is derived from the subject's public key: the SHA-256 digest
//! of the SPKI DER bytes, multibase encoded, becomes the method-specific
//! identifier. A given key therefore always yields the same DID.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Utc};
use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::core::{Kind, OneMany};
use crate::error::Error;
use crate::{key, multibase};

/// Contexts added to every DID document.
pub const CONTEXT: [&str; 2] =
    ["https://www.w3.org/ns/did/v1", "https://w3id.org/security/suites/ed25519-2020/v1"];

/// DID method used when none is configured.
pub const DEFAULT_METHOD: &str = "idblock";

/// Fragment of the single signing key published in each document.
pub const KEY_FRAGMENT: &str = "key-1";

/// Fragment of the optional profile service.
pub const PROFILE_FRAGMENT: &str = "profile";

/// Service type of the optional profile service.
pub const PROFILE_SERVICE_TYPE: &str = "ProfileService";

/// DID Document
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// The context of the DID document.
    #[serde(rename = "@context")]
    pub context: Vec<Kind<Value>>,

    /// The DID for a particular DID subject.
    pub id: String,

    /// The verification methods (public keys) of the DID subject.
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,

    /// The `authentication` verification relationship is used to specify how
    /// the DID subject is expected to be authenticated.
    ///
    /// <https://www.w3.org/TR/did-core/#authentication>
    #[serde(default)]
    pub authentication: Vec<Kind<VerificationMethod>>,

    /// The `assertion_method` verification relationship is used to specify how
    /// the DID subject is expected to express claims, such as for the
    /// purposes of issuing a Verifiable Credential.
    ///
    /// <https://www.w3.org/TR/did-core/#assertion>
    #[serde(default)]
    pub assertion_method: Vec<Kind<VerificationMethod>>,

    /// The `capability_invocation` verification relationship is used to specify
    /// a verification method that might be used by the DID subject to
    /// invoke a cryptographic capability.
    ///
    /// <https://www.w3.org/TR/did-core/#capability-invocation>
    #[serde(default)]
    pub capability_invocation: Vec<Kind<VerificationMethod>>,

    /// A set of services, that express ways of communicating with the DID
    /// subject or related entities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,

    /// When the document was created.
    pub created: DateTime<Utc>,

    /// When the document was last updated. Omitted if it never was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

impl Document {
    /// Retrieve a verification method by its ID.
    #[must_use]
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.iter().find(|vm| vm.id == id)
    }

    /// Whether the verification method with `id` may be used to issue
    /// credentials.
    #[must_use]
    pub fn is_assertion_method(&self, id: &str) -> bool {
        self.assertion_method.iter().any(|am| match am {
            Kind::String(reference) => reference == id,
            Kind::Object(vm) => vm.id == id,
        })
    }

    /// Check the document's structural invariants.
    ///
    /// Verification method IDs must be unique and prefixed by the document's
    /// `id`, and every relationship reference must name a verification method
    /// listed in the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] naming the first violation found.
    pub fn validate(&self) -> crate::Result<()> {
        let prefix = format!("{}#", self.id);
        for (i, vm) in self.verification_method.iter().enumerate() {
            if !vm.id.starts_with(&prefix) {
                return Err(Error::InvalidDocument(format!(
                    "verification method {} is not prefixed by {}",
                    vm.id, self.id
                )));
            }
            if self.verification_method[..i].iter().any(|other| other.id == vm.id) {
                return Err(Error::InvalidDocument(format!("duplicate verification method {}", vm.id)));
            }
        }

        let relationships = [
            ("authentication", &self.authentication),
            ("assertionMethod", &self.assertion_method),
            ("capabilityInvocation", &self.capability_invocation),
        ];
        for (name, relationship) in relationships {
            for entry in relationship {
                let id = match entry {
                    Kind::String(reference) => reference,
                    Kind::Object(vm) => &vm.id,
                };
                if self.verification_method(id).is_none() {
                    return Err(Error::InvalidDocument(format!(
                        "{name} references unknown verification method {id}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Binds a public key to the DID that controls it.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// A DID URL that identifies the verification method, `<did>#key-1`.
    pub id: String,

    /// The type of verification method.
    #[serde(rename = "type")]
    pub type_: MethodType,

    /// The DID of the controller of the verification method.
    pub controller: String,

    /// The SPKI DER public key, multibase encoded.
    pub public_key_multibase: String,
}

impl VerificationMethod {
    /// Infer the DID from the key ID.
    #[must_use]
    pub fn did(&self) -> String {
        self.id.split('#').next().unwrap_or_default().to_string()
    }

    /// Decode the published key into an Ed25519 verifying key.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the multibase value is malformed and
    /// [`Error::KeyFormat`] if the bytes are not an Ed25519 SPKI key.
    pub fn verifying_key(&self) -> crate::Result<VerifyingKey> {
        let der = multibase::decode(&self.public_key_multibase)?;
        match self.type_ {
            MethodType::Ed25519VerificationKey2020 => key::verifying_key_from_der(&der),
        }
    }
}

/// Verification method types supported by this library. SHOULD be registered in
/// the [DID Specification Registries](https://www.w3.org/TR/did-spec-registries).
///
/// Unknown types fail deserialization rather than being carried as free text.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, Eq, PartialEq)]
pub enum MethodType {
    /// `ED25519` Verification key, version 2020.
    #[default]
    Ed25519VerificationKey2020,
}

impl Display for MethodType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519VerificationKey2020 => write!(f, "Ed25519VerificationKey2020"),
        }
    }
}

/// Services are used to express ways of communicating with the DID subject or
/// associated entities.
///
/// Not needed for signing or verification.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// A URI unique to the service.
    pub id: String,

    /// The service type.
    #[serde(rename = "type")]
    pub type_: String,

    /// One or more endpoints for the service: URIs or structured values.
    #[allow(clippy::struct_field_names)]
    pub service_endpoint: OneMany<Kind<Value>>,
}

/// Options that can be provided when creating a DID document.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptions {
    /// DID method name, the `<method>` in `did:<method>:<id>`.
    pub method: String,

    /// Optional profile service endpoint. MUST be an absolute URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_endpoint: Option<String>,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            method: DEFAULT_METHOD.to_string(),
            service_endpoint: None,
        }
    }
}

/// Derive the DID for the given SPKI DER public key bytes.
#[must_use]
pub fn did_from_key(method: &str, public_key_der: &[u8]) -> String {
    let digest = Sha256::digest(public_key_der);
    format!("did:{method}:{}", multibase::encode(&digest))
}

/// Build the DID and DID document for a PEM armored Ed25519 public key.
///
/// The document carries a single verification method, `<did>#key-1`, that
/// backs the `authentication`, `assertionMethod` and `capabilityInvocation`
/// relationships, plus a profile service when one is requested.
///
/// # Errors
///
/// Returns [`Error::KeyFormat`] if the public key is not an Ed25519 SPKI PEM
/// and [`Error::InvalidServiceEndpoint`] if the service endpoint is not an
/// absolute URI.
pub fn build_document(
    public_key: &str, options: &CreateOptions,
) -> crate::Result<(String, Document)> {
    let der = key::armored_to_raw(public_key)?;
    key::verifying_key_from_der(&der)?;

    let did = did_from_key(&options.method, &der);
    let vm = VerificationMethodBuilder::new(&der).did(&did).key_id(KEY_FRAGMENT).build();
    let kid = vm.id.clone();

    let mut builder = DocumentBuilder::new(&did)
        .verification_method(vm)
        .authentication(kid.as_str())
        .assertion_method(kid.as_str())
        .capability_invocation(kid.as_str());

    if let Some(endpoint) = &options.service_endpoint {
        url::Url::parse(endpoint)
            .map_err(|e| Error::InvalidServiceEndpoint(format!("{endpoint}: {e}")))?;
        let service = ServiceBuilder::new()
            .id(PROFILE_FRAGMENT)
            .service_type(PROFILE_SERVICE_TYPE)
            .endpoint(endpoint.as_str())
            .build(&did)?;
        builder = builder.service(service);
    }

    let document = builder.build()?;
    Ok((did, document))
}

/// DID Document builder.
pub struct DocumentBuilder {
    did: String,
    context: Vec<Kind<Value>>,
    verification_method: Vec<VerificationMethod>,
    authentication: Vec<Kind<VerificationMethod>>,
    assertion_method: Vec<Kind<VerificationMethod>>,
    capability_invocation: Vec<Kind<VerificationMethod>>,
    service: Option<Vec<Service>>,
}

impl DocumentBuilder {
    /// Creates a new `DocumentBuilder` for the given DID with the default
    /// contexts.
    #[must_use]
    pub fn new(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            context: CONTEXT.iter().map(|ctx| Kind::String((*ctx).to_string())).collect(),
            verification_method: vec![],
            authentication: vec![],
            assertion_method: vec![],
            capability_invocation: vec![],
            service: None,
        }
    }

    /// Add a verification method.
    #[must_use]
    pub fn verification_method(mut self, vm: VerificationMethod) -> Self {
        self.verification_method.push(vm);
        self
    }

    /// Add a verification method to the `authentication` relationship.
    #[must_use]
    pub fn authentication(mut self, vm: impl Into<Kind<VerificationMethod>>) -> Self {
        self.authentication.push(vm.into());
        self
    }

    /// Add a verification method to the `assertion_method` relationship.
    #[must_use]
    pub fn assertion_method(mut self, vm: impl Into<Kind<VerificationMethod>>) -> Self {
        self.assertion_method.push(vm.into());
        self
    }

    /// Add a verification method to the `capability_invocation` relationship.
    #[must_use]
    pub fn capability_invocation(mut self, vm: impl Into<Kind<VerificationMethod>>) -> Self {
        self.capability_invocation.push(vm.into());
        self
    }

    /// Add a service endpoint.
    ///
    /// Chain to add multiple service endpoints.
    #[must_use]
    pub fn service(mut self, service: Service) -> Self {
        self.service.get_or_insert(vec![]).push(service);
        self
    }

    /// Build the document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] if a relationship references a
    /// verification method that was not added.
    pub fn build(self) -> crate::Result<Document> {
        let document = Document {
            context: self.context,
            id: self.did,
            verification_method: self.verification_method,
            authentication: self.authentication,
            assertion_method: self.assertion_method,
            capability_invocation: self.capability_invocation,
            service: self.service,
            created: crate::now(),
            updated: None,
        };
        document.validate()?;
        Ok(document)
    }
}

/// A builder for creating a verification method.
pub struct VerificationMethodBuilder {
    public_key_multibase: String,
    did: String,
    key_id: String,
}

impl VerificationMethodBuilder {
    /// Creates a new `VerificationMethodBuilder` with the given SPKI DER
    /// public key.
    #[must_use]
    pub fn new(public_key_der: &[u8]) -> Self {
        Self {
            public_key_multibase: multibase::encode(public_key_der),
            did: String::new(),
            key_id: KEY_FRAGMENT.to_string(),
        }
    }

    /// The DID controlling the key.
    #[must_use]
    pub fn did(mut self, did: impl Into<String>) -> Self {
        self.did = did.into();
        self
    }

    /// The fragment appended to the DID to form the key ID.
    #[must_use]
    pub fn key_id(mut self, key_id: impl Into<String>) -> Self {
        self.key_id = key_id.into();
        self
    }

    /// Build the verification method.
    #[must_use]
    pub fn build(self) -> VerificationMethod {
        VerificationMethod {
            id: format!("{}#{}", self.did, self.key_id),
            type_: MethodType::Ed25519VerificationKey2020,
            controller: self.did,
            public_key_multibase: self.public_key_multibase,
        }
    }
}

/// Service builder
#[derive(Default)]
pub struct ServiceBuilder {
    id: Option<String>,
    service_type: Option<String>,
    endpoint: Option<Vec<Kind<Value>>>,
}

impl ServiceBuilder {
    /// Creates a new, empty `ServiceBuilder`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The fragment appended to the DID to form the service ID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Specify the service type.
    #[must_use]
    pub fn service_type(mut self, service_type: impl Into<String>) -> Self {
        self.service_type = Some(service_type.into());
        self
    }

    /// Add an endpoint: a URI string or a structured value.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<Kind<Value>>) -> Self {
        self.endpoint.get_or_insert(vec![]).push(endpoint.into());
        self
    }

    /// Build the service for the given DID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDocument`] if the ID, type or endpoint is
    /// missing.
    pub fn build(self, did: &str) -> crate::Result<Service> {
        let Some(id) = self.id else {
            return Err(Error::InvalidDocument("no service id specified".into()));
        };
        let Some(service_type) = self.service_type else {
            return Err(Error::InvalidDocument("no service type specified".into()));
        };
        let Some(mut endpoints) = self.endpoint else {
            return Err(Error::InvalidDocument("no service endpoints specified".into()));
        };
        let endpoint = if endpoints.len() == 1 {
            OneMany::One(endpoints.remove(0))
        } else {
            OneMany::Many(endpoints)
        };

        Ok(Service {
            id: format!("{did}#{id}"),
            type_: service_type,
            service_endpoint: endpoint,
        })
    }
}
