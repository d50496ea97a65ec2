//! # DID Registry
//!
//! The registry is the authority consulted for DID documents by resolution,
//! issuance and verification. Implement [`Registry`] to back it with a ledger,
//! content-addressed store, or database; [`InMemoryRegistry`] serves tests and
//! single-process deployments.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::Error;

/// Storage for DID documents, keyed by DID.
///
/// Implementations may suspend (e.g. for a ledger write), so callers must
/// treat both operations as potentially slow. Wrap an implementation in
/// [`Timeout`] to bound them.
pub trait Registry: Send + Sync {
    /// Insert or replace the document stored for `did`.
    ///
    /// Idempotent. The first write records the creation time. A later write
    /// that changes the document records an update time on both the document
    /// and its metadata. Rewriting an identical document changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn store(
        &self, did: &str, document: Document, profile: Option<Profile>,
    ) -> impl Future<Output = crate::Result<()>> + Send;

    /// Fetch the entry stored for `did`, returning `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn fetch(&self, did: &str) -> impl Future<Output = crate::Result<Option<Entry>>> + Send;
}

/// A stored DID document with its bookkeeping.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// The published document.
    pub document: Document,

    /// Creation and update timestamps.
    pub metadata: DocumentMetadata,

    /// Opaque metadata supplied at creation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
}

/// DID document metadata. This typically does not change unless the DID
/// document changes.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// Timestamp of the Create operation.
    /// An XMLSCHEMA11-2 (RFC3339) e.g. 2010-01-01T19:23:24Z. Empty when
    /// resolution fails.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,

    /// Timestamp of the last Update operation. Omitted if an Update operation
    /// has never been performed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

/// Caller-supplied details stored alongside, but never inside, a DID
/// document.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Display name of the DID subject.
    pub name: String,

    /// Contact email of the DID subject.
    pub email: String,
}

/// Concurrent in-memory registry.
///
/// Clones share the same underlying map.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRegistry {
    entries: Arc<DashMap<String, Entry>>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no documents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Registry for InMemoryRegistry {
    async fn store(&self, did: &str, document: Document, profile: Option<Profile>) -> crate::Result<()> {
        let now = crate::now();
        self.entries
            .entry(did.to_string())
            .and_modify(|entry| {
                let mut replacement = document.clone();
                replacement.updated = entry.document.updated;
                if replacement != entry.document {
                    replacement.updated = Some(now);
                    entry.document = replacement;
                    entry.metadata.updated = Some(now);
                }
                if profile.is_some() {
                    entry.profile.clone_from(&profile);
                }
            })
            .or_insert_with(|| Entry {
                metadata: DocumentMetadata {
                    created: Some(document.created),
                    updated: None,
                },
                document,
                profile,
            });
        Ok(())
    }

    async fn fetch(&self, did: &str) -> crate::Result<Option<Entry>> {
        Ok(self.entries.get(did).map(|entry| entry.value().clone()))
    }
}

/// Bounds every call to the wrapped registry.
///
/// A call that does not finish within the limit fails with
/// [`Error::RegistryUnavailable`].
#[derive(Clone, Debug)]
pub struct Timeout<R> {
    inner: R,
    limit: Duration,
}

impl<R: Registry> Timeout<R> {
    /// Wrap `inner` so each call is abandoned after `limit`.
    pub const fn new(inner: R, limit: Duration) -> Self {
        Self { inner, limit }
    }

    /// The wrapped registry.
    pub const fn inner(&self) -> &R {
        &self.inner
    }
}

impl<R: Registry> Registry for Timeout<R> {
    async fn store(&self, did: &str, document: Document, profile: Option<Profile>) -> crate::Result<()> {
        let Ok(result) = tokio::time::timeout(self.limit, self.inner.store(did, document, profile)).await
        else {
            tracing::warn!("registry store for {did} timed out after {:?}", self.limit);
            return Err(Error::RegistryUnavailable(format!("store timed out after {:?}", self.limit)));
        };
        result
    }

    async fn fetch(&self, did: &str) -> crate::Result<Option<Entry>> {
        let Ok(result) = tokio::time::timeout(self.limit, self.inner.fetch(did)).await else {
            tracing::warn!("registry fetch for {did} timed out after {:?}", self.limit);
            return Err(Error::RegistryUnavailable(format!("fetch timed out after {:?}", self.limit)));
        };
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::document::{DocumentBuilder, ServiceBuilder};

    const DID: &str = "did:idblock:zAbc";

    fn document() -> Document {
        DocumentBuilder::new(DID).build().expect("should build")
    }

    #[tokio::test]
    async fn store_and_fetch() {
        let registry = InMemoryRegistry::new();
        assert!(registry.fetch(DID).await.expect("should fetch").is_none());

        let profile = Profile {
            name: "Alice".into(),
            email: "alice@example.com".into(),
        };
        registry.store(DID, document(), Some(profile.clone())).await.expect("should store");

        let entry = registry.fetch(DID).await.expect("should fetch").expect("should exist");
        assert_eq!(entry.document.id, DID);
        assert_eq!(entry.metadata.created, Some(entry.document.created));
        assert!(entry.metadata.updated.is_none());
        assert_eq!(entry.profile, Some(profile));
    }

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let registry = InMemoryRegistry::new();
        let doc = document();

        registry.store(DID, doc.clone(), None).await.expect("should store");
        registry.store(DID, doc.clone(), None).await.expect("should store");

        assert_eq!(registry.len(), 1);
        let entry = registry.fetch(DID).await.expect("should fetch").expect("should exist");
        assert_eq!(entry.document, doc);
        assert_eq!(entry.metadata.created, Some(doc.created));
        assert!(entry.metadata.updated.is_none());
    }

    #[tokio::test]
    async fn upsert_records_update() {
        let registry = InMemoryRegistry::new();
        let doc = document();
        registry.store(DID, doc.clone(), None).await.expect("should store");

        let service = ServiceBuilder::new()
            .id("profile")
            .service_type("ProfileService")
            .endpoint("https://example/profile")
            .build(DID)
            .expect("should build");
        let changed = Document {
            service: Some(vec![service]),
            ..doc.clone()
        };
        registry.store(DID, changed.clone(), None).await.expect("should store");

        let entry = registry.fetch(DID).await.expect("should fetch").expect("should exist");
        let updated = entry.metadata.updated.expect("should record update");
        assert_eq!(entry.document.updated, Some(updated));
        assert_eq!(entry.document.service, changed.service);
        assert_eq!(entry.metadata.created, Some(doc.created));

        // the same change again leaves the update time alone
        registry.store(DID, changed, None).await.expect("should store");
        let entry = registry.fetch(DID).await.expect("should fetch").expect("should exist");
        assert_eq!(entry.metadata.updated, Some(updated));
    }

    #[tokio::test]
    async fn clones_share_state() {
        let registry = InMemoryRegistry::new();
        let clone = registry.clone();
        clone.store(DID, document(), None).await.expect("should store");
        assert!(!registry.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_stores() {
        let registry = InMemoryRegistry::new();

        let mut handles = vec![];
        for i in 0..64 {
            let registry = registry.clone();
            handles.push(tokio::spawn(async move {
                let did = format!("did:idblock:z{i}");
                let doc = DocumentBuilder::new(&did).build().expect("should build");
                registry.store(&did, doc, None).await.expect("should store");
                registry.fetch(&did).await.expect("should fetch").is_some()
            }));
        }
        for handle in handles {
            assert!(handle.await.expect("task should finish"));
        }
        assert_eq!(registry.len(), 64);
    }

    #[derive(Clone)]
    struct Stalled;
    impl Registry for Stalled {
        async fn store(&self, _: &str, _: Document, _: Option<Profile>) -> crate::Result<()> {
            std::future::pending().await
        }

        async fn fetch(&self, _: &str) -> crate::Result<Option<Entry>> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn timeout_reports_unavailable() {
        let registry = Timeout::new(Stalled, Duration::from_millis(20));

        let Err(Error::RegistryUnavailable(_)) = registry.fetch(DID).await else {
            panic!("expected registry unavailable");
        };
        let Err(Error::RegistryUnavailable(_)) = registry.store(DID, document(), None).await else {
            panic!("expected registry unavailable");
        };
    }

    #[tokio::test]
    async fn timeout_passes_through() {
        let registry = Timeout::new(InMemoryRegistry::new(), Duration::from_secs(1));
        registry.store(DID, document(), None).await.expect("should store");
        assert!(registry.fetch(DID).await.expect("should fetch").is_some());
        assert_eq!(registry.inner().len(), 1);
    }
}
