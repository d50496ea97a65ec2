//! # Errors
//!
//! Error taxonomy for DID creation, resolution, and credential issuance.
//!
//! Resolution failures are reported inside [`crate::Resolved`] and
//! verification failures collapse to `false`, so these errors only reach
//! callers that violate a contract (e.g. issuing from an unknown DID).

use serde_json::json;
use thiserror::Error;

/// Errors returned by this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// The DID does not match `did:<method>:<alphanumeric>`.
    #[error("invalid DID: {0}")]
    InvalidDidFormat(String),

    /// The DID is well formed but no document is stored for it.
    #[error("DID not found: {0}")]
    DidNotFound(String),

    /// Key interchange text (PEM) or key bytes are malformed.
    #[error("key format error: {0}")]
    KeyFormat(String),

    /// The supplied private key does not belong to the issuer's verification
    /// method.
    #[error("key mismatch: {0}")]
    KeyMismatch(String),

    /// The multibase prefix is not supported.
    #[error("unsupported multibase encoding: {0}")]
    UnsupportedEncoding(String),

    /// A multibase body character is outside the base58 alphabet.
    #[error("invalid base58 character {0:?}")]
    InvalidCharacter(char),

    /// Issuance referenced a DID the registry cannot resolve.
    #[error("unknown DID: {0}")]
    UnknownDid(String),

    /// A signature suite or verification method type is not supported.
    #[error("unsupported suite: {0}")]
    UnsupportedSuite(String),

    /// A DID document breaks a structural invariant, such as a relationship
    /// referencing a verification method the document does not contain.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A service endpoint is not an absolute URI.
    #[error("invalid service endpoint: {0}")]
    InvalidServiceEndpoint(String),

    /// The registry did not answer in time or is otherwise unreachable.
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// A value holds an integer that canonical JSON cannot represent exactly.
    #[error("unsafe integer: {0}")]
    UnsafeInteger(String),

    /// A value could not be serialized or canonicalized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Catch-all for errors raised by collaborators.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Stable, machine-readable error code.
    ///
    /// Resolution codes follow the DID resolution registry (`invalidDid`,
    /// `notFound`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidDidFormat(_) => "invalidDid",
            Self::DidNotFound(_) => "notFound",
            Self::KeyFormat(_) => "invalidKey",
            Self::KeyMismatch(_) => "keyMismatch",
            Self::UnsupportedEncoding(_) => "unsupportedEncoding",
            Self::InvalidCharacter(_) => "invalidCharacter",
            Self::UnknownDid(_) => "unknownDid",
            Self::UnsupportedSuite(_) => "unsupportedSuite",
            Self::InvalidDocument(_) => "invalidDocument",
            Self::InvalidServiceEndpoint(_) => "invalidServiceEndpoint",
            Self::RegistryUnavailable(_) => "registryUnavailable",
            Self::UnsafeInteger(_) => "unsafeInteger",
            Self::Serialization(_) => "serializationError",
            Self::Other(_) => "internalError",
        }
    }

    /// Human-readable description without the code prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::InvalidDidFormat(msg)
            | Self::DidNotFound(msg)
            | Self::KeyFormat(msg)
            | Self::KeyMismatch(msg)
            | Self::UnsupportedEncoding(msg)
            | Self::UnknownDid(msg)
            | Self::UnsupportedSuite(msg)
            | Self::InvalidDocument(msg)
            | Self::InvalidServiceEndpoint(msg)
            | Self::RegistryUnavailable(msg)
            | Self::UnsafeInteger(msg) => msg.clone(),
            Self::InvalidCharacter(c) => format!("{c:?} is not a base58 character"),
            Self::Serialization(e) => e.to_string(),
            Self::Other(e) => e.to_string(),
        }
    }

    /// Transfer the error to a JSON body suitable for a transport response.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "error": self.code(),
            "error_description": self.message(),
        })
    }
}
