//! Compendium pack metadata

use serde::{Deserialize, Serialize};

use super::DocumentKind;

/// Package name of packs that belong to the active world.
pub const WORLD_PACKAGE: &str = "world";

/// Metadata of a compendium pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackMetadata {
    /// Collection key, `<package>.<name>`.
    pub collection: String,
    #[serde(default)]
    pub label: String,
    /// Package (system, module or world) that declares the pack.
    pub package: String,
    /// Host entity name of the pack's documents ("Actor", "JournalEntry", ...).
    pub entity: String,
    #[serde(default)]
    pub locked: bool,
}

impl PackMetadata {
    /// Document kind, when the pack holds a kind the engine migrates.
    pub fn document_kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_entity_name(&self.entity)
    }

    pub fn is_owned_by(&self, package: &str) -> bool {
        self.package == package
    }

    pub fn is_world_pack(&self) -> bool {
        self.package == WORLD_PACKAGE
    }
}
