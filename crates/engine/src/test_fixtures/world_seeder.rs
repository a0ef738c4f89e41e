//! Seeder for the legacy world fixture.
//!
//! `test_data/legacy_world.json` holds a world saved by an older system
//! release: legacy icon paths, a `data.status` block, string descriptions,
//! old book and spell shapes, module and system packs. Loads it into an
//! [`InMemoryWorld`] along with the host facts it was saved under.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use coc7_domain::DocumentKind;

use super::load_fixture;
use crate::infrastructure::memory::{InMemoryWorld, StoredPack, WorldState};
use crate::infrastructure::world_dir::HostManifest;

/// The fixture file layout.
#[derive(Debug, Deserialize)]
struct LegacyWorldFixture {
    #[serde(default)]
    actors: Vec<Value>,
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    tables: Vec<Value>,
    #[serde(default)]
    macros: Vec<Value>,
    #[serde(default)]
    packs: Vec<StoredPack>,
    #[serde(default)]
    settings: BTreeMap<String, BTreeMap<String, Value>>,
    host: HostManifest,
}

/// A seeded world and its host.
pub struct SeededWorld {
    pub world: Arc<InMemoryWorld>,
    pub host: HostManifest,
}

/// Load the legacy world fixture.
pub fn legacy_world() -> SeededWorld {
    let fixture: LegacyWorldFixture = load_fixture("legacy_world.json");

    let mut state = WorldState::default();
    state.collections.insert(DocumentKind::Actor, fixture.actors);
    state.collections.insert(DocumentKind::Item, fixture.items);
    state.collections.insert(DocumentKind::RollTable, fixture.tables);
    state.collections.insert(DocumentKind::Macro, fixture.macros);
    state.packs = fixture.packs;
    state.settings = fixture.settings;

    SeededWorld {
        world: Arc::new(InMemoryWorld::from_state(state)),
        host: fixture.host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_legacy_world_loads() {
        let seeded = legacy_world();
        assert!(seeded.host.is_gm);
        assert_eq!(seeded.host.system_version, "0.8.0");

        let state = seeded.world.snapshot().await;
        assert_eq!(state.packs.len(), 4);
        assert_eq!(state.collections[&DocumentKind::Item].len(), 3);
        assert!(seeded
            .world
            .raw_document(DocumentKind::Actor, "act-harvey")
            .await
            .is_some());
    }
}
