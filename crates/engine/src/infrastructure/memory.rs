//! In-memory world: documents, compendium packs and settings held as plain
//! JSON snapshots.
//!
//! Patches are applied the way the host applies an update object. Backs the
//! world-directory binary and the pipeline tests.

use async_trait::async_trait;
use coc7_domain::{Document, DocumentId, DocumentKind, FieldEdit, PackMetadata, Patch};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use crate::infrastructure::ports::{
    DocumentRepo, PackRepo, RepoError, SettingsRepo, UpdateOptions,
};

/// A compendium pack and its raw documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPack {
    pub metadata: PackMetadata,
    #[serde(default)]
    pub documents: Vec<Value>,
    /// File under `packs/` the pack was read from, when it came from disk.
    #[serde(skip)]
    pub file_name: Option<String>,
}

/// Everything the in-memory world holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldState {
    pub collections: BTreeMap<DocumentKind, Vec<Value>>,
    pub packs: Vec<StoredPack>,
    /// namespace -> key -> value
    pub settings: BTreeMap<String, BTreeMap<String, Value>>,
}

pub struct InMemoryWorld {
    state: RwLock<WorldState>,
}

impl InMemoryWorld {
    pub fn new() -> Self {
        Self::from_state(WorldState::default())
    }

    pub fn from_state(state: WorldState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    /// A copy of the current state, for saving.
    pub async fn snapshot(&self) -> WorldState {
        self.state.read().await.clone()
    }

    pub async fn insert(&self, kind: DocumentKind, document: Value) {
        self.state
            .write()
            .await
            .collections
            .entry(kind)
            .or_default()
            .push(document);
    }

    pub async fn add_pack(&self, pack: StoredPack) {
        self.state.write().await.packs.push(pack);
    }

    /// Raw snapshot of a world document.
    pub async fn raw_document(&self, kind: DocumentKind, id: &str) -> Option<Value> {
        let state = self.state.read().await;
        state
            .collections
            .get(&kind)
            .and_then(|docs| find_raw(docs, id))
            .cloned()
    }

    /// Raw snapshot of a pack document.
    pub async fn raw_pack_document(&self, collection: &str, id: &str) -> Option<Value> {
        let state = self.state.read().await;
        state
            .packs
            .iter()
            .find(|p| p.metadata.collection == collection)
            .and_then(|p| find_raw(&p.documents, id))
            .cloned()
    }

    pub async fn pack_locked(&self, collection: &str) -> Option<bool> {
        let state = self.state.read().await;
        state
            .packs
            .iter()
            .find(|p| p.metadata.collection == collection)
            .map(|p| p.metadata.locked)
    }
}

impl Default for InMemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn find_raw<'a>(documents: &'a [Value], id: &str) -> Option<&'a Value> {
    documents
        .iter()
        .find(|doc| doc.get("_id").and_then(Value::as_str) == Some(id))
}

fn find_raw_mut<'a>(documents: &'a mut [Value], id: &str) -> Option<&'a mut Value> {
    documents
        .iter_mut()
        .find(|doc| doc.get("_id").and_then(Value::as_str) == Some(id))
}

fn parse_all(kind: DocumentKind, raw: &[Value]) -> Vec<Document> {
    raw.iter()
        .filter_map(|value| match Document::from_snapshot(kind, value) {
            Ok(doc) => Some(doc),
            Err(e) => {
                tracing::warn!(%kind, error = %e, "Skipping unreadable document snapshot");
                None
            }
        })
        .collect()
}

/// Apply `patch` to `target` all-or-nothing.
fn apply_patch(target: &mut Value, patch: &Patch, options: UpdateOptions) -> Result<(), RepoError> {
    if options.enforce_types {
        check_types(target, patch)?;
    }
    let mut updated = target.clone();
    patch.apply_to(&mut updated)?;
    *target = updated;
    Ok(())
}

/// With type enforcement on, a set may not change the JSON type of an
/// existing non-null value.
fn check_types(target: &Value, patch: &Patch) -> Result<(), RepoError> {
    for op in patch.ops() {
        let FieldEdit::Set(value) = &op.edit else {
            continue;
        };
        let Some(current) = coc7_domain::common::lookup(target, op.path.as_str()) else {
            continue;
        };
        if !current.is_null() && !value.is_null() && json_type(current) != json_type(value) {
            return Err(RepoError::rejected(format!(
                "{} expects {}, got {}",
                op.path,
                json_type(current),
                json_type(value)
            )));
        }
    }
    Ok(())
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[async_trait]
impl DocumentRepo for InMemoryWorld {
    async fn list(&self, kind: DocumentKind) -> Result<Vec<Document>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .collections
            .get(&kind)
            .map(|raw| parse_all(kind, raw))
            .unwrap_or_default())
    }

    async fn get(&self, kind: DocumentKind, id: &DocumentId) -> Result<Option<Document>, RepoError> {
        let state = self.state.read().await;
        state
            .collections
            .get(&kind)
            .and_then(|docs| find_raw(docs, id.as_str()))
            .map(|raw| Document::from_snapshot(kind, raw).map_err(RepoError::from))
            .transpose()
    }

    async fn update(
        &self,
        kind: DocumentKind,
        id: &DocumentId,
        patch: &Patch,
        options: UpdateOptions,
    ) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        let target = state
            .collections
            .get_mut(&kind)
            .and_then(|docs| find_raw_mut(docs, id.as_str()))
            .ok_or_else(|| RepoError::not_found(kind.as_str(), id))?;
        apply_patch(target, patch, options)
    }
}

#[async_trait]
impl PackRepo for InMemoryWorld {
    async fn list_packs(&self) -> Result<Vec<PackMetadata>, RepoError> {
        let state = self.state.read().await;
        Ok(state.packs.iter().map(|p| p.metadata.clone()).collect())
    }

    async fn set_locked(&self, collection: &str, locked: bool) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        let pack = state
            .packs
            .iter_mut()
            .find(|p| p.metadata.collection == collection)
            .ok_or_else(|| RepoError::not_found("Pack", collection))?;
        pack.metadata.locked = locked;
        Ok(())
    }

    async fn list_documents(&self, collection: &str) -> Result<Vec<Document>, RepoError> {
        let state = self.state.read().await;
        let pack = state
            .packs
            .iter()
            .find(|p| p.metadata.collection == collection)
            .ok_or_else(|| RepoError::not_found("Pack", collection))?;
        let kind = pack.metadata.document_kind().ok_or_else(|| {
            RepoError::rejected(format!(
                "pack {collection} holds {} documents",
                pack.metadata.entity
            ))
        })?;
        Ok(parse_all(kind, &pack.documents))
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &DocumentId,
        patch: &Patch,
        options: UpdateOptions,
    ) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        let pack = state
            .packs
            .iter_mut()
            .find(|p| p.metadata.collection == collection)
            .ok_or_else(|| RepoError::not_found("Pack", collection))?;
        if pack.metadata.locked {
            return Err(RepoError::rejected(format!("pack {collection} is locked")));
        }
        let target = find_raw_mut(&mut pack.documents, id.as_str())
            .ok_or_else(|| RepoError::not_found("PackDocument", id))?;
        apply_patch(target, patch, options)
    }
}

#[async_trait]
impl SettingsRepo for InMemoryWorld {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, RepoError> {
        let state = self.state.read().await;
        Ok(state
            .settings
            .get(namespace)
            .and_then(|values| values.get(key))
            .cloned())
    }

    async fn set(&self, namespace: &str, key: &str, value: Value) -> Result<(), RepoError> {
        self.state
            .write()
            .await
            .settings
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }
}
