//! # IDBLOCK DID
//!
//! Decentralized Identifiers (DIDs) bound to Ed25519 key pairs, and
//! Verifiable Credentials issued and verified against them.
//!
//! A DID is derived from its public key, `did:<method>:<multibase(sha256(key))>`
//! with the method taken from [`Config`] (default `idblock`), and its document
//! is published to a [`Registry`]. Issuance signs the
//! canonical form of a credential with the issuer's private key; verification
//! resolves the issuer and checks the proof against the published key.
//!
//! [`Endpoint`] exposes the four operations (create, resolve, issue, verify)
//! with JSON request and response types for a transport to serve.

pub mod config;
pub mod credential;
pub mod document;
pub mod issue;
pub mod key;
pub mod multibase;
pub mod proof;
pub mod registry;
pub mod resolve;
pub mod verify;

mod core;
mod error;
mod handlers;

use chrono::{DateTime, SubsecRound, Utc};

pub use self::config::Config;
pub use self::core::{Kind, OneMany};
pub use self::credential::VerifiableCredential;
pub use self::document::{CreateOptions, Document, build_document};
pub use self::error::Error;
pub use self::handlers::*;
pub use self::issue::{CredentialData, issue};
pub use self::registry::{InMemoryRegistry, Registry, Timeout};
pub use self::resolve::{Resolved, resolve};
pub use self::verify::{Verification, check, verify};

/// Result type for DID and credential operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The current time at the millisecond precision used for every timestamp
/// this crate writes.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
