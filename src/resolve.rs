//! # DID Resolver
//!
//! Resolution turns a DID string into the document published for it, shaped
//! after [DID resolution](https://w3c.github.io/did-resolution).
//!
//! Resolution is total: a malformed DID, a missing document and a failing
//! registry are all reported inside [`Resolved`] rather than as an error.

use std::fmt::{self, Display, Formatter};
use std::sync::LazyLock;

use anyhow::anyhow;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Error;
use crate::registry::{DocumentMetadata, Registry};

static DID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^did:(?<method>[a-z0-9]+):(?<identifier>[a-zA-Z0-9]+)$").expect("should compile")
});

/// Resolve `did` against the registry.
///
/// Only DIDs of `method` are accepted. The DID is checked lexically before
/// any lookup, so a malformed string or a foreign method never reaches the
/// registry.
pub async fn resolve(did: &str, method: &str, registry: &impl Registry) -> Resolved {
    match self::method(did) {
        None => {
            tracing::debug!("resolution of {did:?} failed: not a DID");
            return Resolved::error(ResolutionError::InvalidDid, format!("{did} is not a valid DID"));
        }
        Some(other) if other != method => {
            tracing::debug!("resolution of {did} failed: method {other} is not served");
            return Resolved::error(
                ResolutionError::InvalidDid,
                format!("{did} is not a did:{method} DID"),
            );
        }
        Some(_) => {}
    }

    match registry.fetch(did).await {
        Ok(Some(entry)) => {
            tracing::debug!("resolved {did}");
            Resolved {
                did_document: Some(entry.document),
                did_document_metadata: entry.metadata,
                did_resolution_metadata: ResolutionMetadata {
                    content_type: Some(ContentType::DidLdJson),
                    ..ResolutionMetadata::default()
                },
            }
        }
        Ok(None) => {
            tracing::debug!("resolution of {did} failed: not found");
            Resolved::error(ResolutionError::NotFound, format!("no document stored for {did}"))
        }
        Err(e) => {
            tracing::debug!("resolution of {did} failed: {e}");
            let code = match e {
                Error::RegistryUnavailable(_) => ResolutionError::RegistryUnavailable,
                _ => ResolutionError::InternalError,
            };
            Resolved::error(code, e.message())
        }
    }
}

/// The method name of a DID of the lexical form `did:<method>:<alphanumeric>`,
/// or `None` if `did` does not have that form.
#[must_use]
pub fn method(did: &str) -> Option<&str> {
    DID_REGEX.captures(did).and_then(|caps| caps.name("method")).map(|m| m.as_str())
}

/// The result of a DID resolution.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resolved {
    /// The resolved document, `null` when resolution failed.
    pub did_document: Option<Document>,

    /// Creation and update timestamps of the document. Empty on failure.
    pub did_document_metadata: DocumentMetadata,

    /// Resolution metadata.
    pub did_resolution_metadata: ResolutionMetadata,
}

impl Resolved {
    fn error(error: ResolutionError, message: String) -> Self {
        Self {
            did_resolution_metadata: ResolutionMetadata {
                content_type: None,
                error: Some(error),
                error_message: Some(message),
            },
            ..Self::default()
        }
    }

    /// Whether a document was resolved.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.did_document.is_some()
    }

    /// Convert into the resolved document or the error that prevented its
    /// resolution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDidFormat`] or [`Error::DidNotFound`] for the
    /// matching resolution errors, and [`Error::RegistryUnavailable`] or
    /// [`Error::Other`] when the registry failed.
    pub fn into_result(self) -> crate::Result<Document> {
        let metadata = self.did_resolution_metadata;
        let message = metadata.error_message.unwrap_or_default();
        match (self.did_document, metadata.error) {
            (Some(document), _) => Ok(document),
            (None, Some(ResolutionError::InvalidDid)) => Err(Error::InvalidDidFormat(message)),
            (None, Some(ResolutionError::NotFound) | None) => Err(Error::DidNotFound(message)),
            (None, Some(ResolutionError::RegistryUnavailable)) => {
                Err(Error::RegistryUnavailable(message))
            }
            (None, Some(ResolutionError::InternalError)) => Err(anyhow!("{message}").into()),
        }
    }
}

/// DID resolution metadata.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionMetadata {
    /// The Media Type of the returned resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<ContentType>,

    /// The error code from the resolution process, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResolutionError>,

    /// A human-readable explanation of the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// The Media Type of a resolved document.
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub enum ContentType {
    /// JSON-LD representation of a DID document.
    #[default]
    #[serde(rename = "application/did+ld+json")]
    DidLdJson,
}

/// DID resolution error codes.
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ResolutionError {
    /// The DID is not lexically valid or names a method that is not served.
    InvalidDid,

    /// No document is stored for the DID.
    NotFound,

    /// The registry did not answer in time.
    RegistryUnavailable,

    /// The registry failed for another reason.
    InternalError,
}

impl Display for ResolutionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::InvalidDid => "invalidDid",
            Self::NotFound => "notFound",
            Self::RegistryUnavailable => "registryUnavailable",
            Self::InternalError => "internalError",
        };
        f.write_str(code)
    }
}
