//! Persistence port traits for host documents, compendium packs and settings.

use async_trait::async_trait;
use coc7_domain::{Document, DocumentId, DocumentKind, PackMetadata, Patch};
use serde_json::Value;

use super::error::RepoError;

/// Options passed with every committed patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOptions {
    /// When false, the host accepts values that temporarily violate the
    /// declared schema shape. Migration commits always pass false.
    pub enforce_types: bool,
}

impl UpdateOptions {
    pub fn migration() -> Self {
        Self {
            enforce_types: false,
        }
    }
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self {
            enforce_types: true,
        }
    }
}

// =============================================================================
// World Documents
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentRepo: Send + Sync {
    /// Plain snapshots of every document in a world collection.
    async fn list(&self, kind: DocumentKind) -> Result<Vec<Document>, RepoError>;
    async fn get(&self, kind: DocumentKind, id: &DocumentId) -> Result<Option<Document>, RepoError>;
    /// Commit a partial update; resolves once the host acknowledges it.
    async fn update(
        &self,
        kind: DocumentKind,
        id: &DocumentId,
        patch: &Patch,
        options: UpdateOptions,
    ) -> Result<(), RepoError>;
}

// =============================================================================
// Compendium Packs
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackRepo: Send + Sync {
    async fn list_packs(&self) -> Result<Vec<PackMetadata>, RepoError>;
    async fn set_locked(&self, collection: &str, locked: bool) -> Result<(), RepoError>;
    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, RepoError>;
    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: &Patch,
        options: UpdateOptions,
    ) -> Result<(), RepoError>;
}

// =============================================================================
// Settings Storage
// =============================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettingsRepo: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, RepoError>;
    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), RepoError>;
}
