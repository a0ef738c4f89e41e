//! Test fixtures: JSON fixture loading and snapshot builders.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_fixtures::{item_snapshot, world_seeder};
//!
//! #[tokio::test]
//! async fn test_legacy_world() {
//!     let seeded = world_seeder::legacy_world();
//!     // ... test logic
//! }
//! ```

pub mod world_seeder;

use std::path::PathBuf;

use coc7_domain::PackMetadata;
use serde_json::{json, Value};

use crate::infrastructure::memory::StoredPack;

// =============================================================================
// Fixture Loading
// =============================================================================

/// Load a JSON fixture from the test_data/ directory.
///
/// # Panics
///
/// Panics if the fixture file cannot be read or parsed.
pub fn load_fixture<T: serde::de::DeserializeOwned>(path: &str) -> T {
    let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_data")
        .join(path);
    let content = std::fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read fixture '{}': {}",
            fixture_path.display(),
            e
        )
    });
    serde_json::from_str(&content).unwrap_or_else(|e| {
        panic!(
            "Failed to parse fixture '{}': {}",
            fixture_path.display(),
            e
        )
    })
}

// =============================================================================
// Snapshot Builders
// =============================================================================

/// A plain item snapshot.
pub fn item_snapshot(id: &str, name: &str, item_type: &str, data: Value) -> Value {
    json!({"_id": id, "name": name, "type": item_type, "data": data})
}

/// A skill with empty system data.
pub fn skill(id: &str, name: &str) -> Value {
    item_snapshot(id, name, "skill", json!({}))
}

/// A plain actor snapshot, without effects or embedded items.
pub fn actor_snapshot(id: &str, name: &str, actor_type: &str, data: Value) -> Value {
    json!({"_id": id, "name": name, "type": actor_type, "data": data})
}

/// A compendium pack holding `documents`.
pub fn pack(
    collection: &str,
    package: &str,
    entity: &str,
    locked: bool,
    documents: Vec<Value>,
) -> StoredPack {
    StoredPack {
        metadata: PackMetadata {
            collection: collection.to_string(),
            label: collection.to_string(),
            package: package.to_string(),
            entity: entity.to_string(),
            locked,
        },
        documents,
        file_name: None,
    }
}
