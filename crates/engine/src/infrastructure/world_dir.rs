//! World directory: JSON files holding a world's documents, packs and host
//! facts.
//!
//! ```text
//! <world>/actors.json      [ {actor}, ... ]
//! <world>/items.json
//! <world>/tables.json
//! <world>/macros.json
//! <world>/packs/<name>.json  { "metadata": {...}, "documents": [...] }
//!                            (new packs: <package>.<name>.json)
//! <world>/host.json        { "systemVersion", "isGm", "modules": { id: { title, version } } }
//! ```

use coc7_domain::DocumentKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::infrastructure::memory::{StoredPack, WorldState};
use crate::infrastructure::ports::{HostInfoPort, RepoError};

const PACKS_DIR: &str = "packs";
const HOST_FILE: &str = "host.json";

fn collection_file(kind: DocumentKind) -> &'static str {
    match kind {
        DocumentKind::Actor => "actors.json",
        DocumentKind::Item => "items.json",
        DocumentKind::RollTable => "tables.json",
        DocumentKind::Macro => "macros.json",
    }
}

/// An installed add-on module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleInfo {
    #[serde(default)]
    pub title: String,
    pub version: String,
}

/// Host facts read from `host.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostManifest {
    pub system_version: String,
    #[serde(default)]
    pub is_gm: bool,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleInfo>,
}

impl HostInfoPort for HostManifest {
    fn system_version(&self) -> String {
        self.system_version.clone()
    }

    fn module_version(&self, package: &str) -> Option<String> {
        self.modules.get(package).map(|m| m.version.clone())
    }

    fn module_title(&self, package: &str) -> Option<String> {
        self.modules
            .get(package)
            .map(|m| m.title.clone())
            .filter(|title| !title.is_empty())
    }

    fn user_is_gm(&self) -> bool {
        self.is_gm
    }
}

/// Reads and writes a world directory.
pub struct WorldDirectory {
    root: PathBuf,
}

impl WorldDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn load_host(&self) -> Result<HostManifest, RepoError> {
        let path = self.root.join(HOST_FILE);
        match read_json(&path).await? {
            Some(manifest) => Ok(manifest),
            None => Err(RepoError::not_found("HostManifest", path.display())),
        }
    }

    /// Load every collection and pack. Missing collection files read empty.
    pub async fn load(&self) -> Result<WorldState, RepoError> {
        let mut state = WorldState::default();
        for kind in DocumentKind::ALL {
            let documents: Vec<Value> = read_json(&self.root.join(collection_file(kind)))
                .await?
                .unwrap_or_default();
            state.collections.insert(kind, documents);
        }

        let packs_dir = self.root.join(PACKS_DIR);
        let mut entries = match tokio::fs::read_dir(&packs_dir).await {
            Ok(entries) => Some(entries),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(RepoError::io("read_packs", e)),
        };
        let mut pack_files = Vec::new();
        if let Some(entries) = entries.as_mut() {
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| RepoError::io("read_packs", e))?
            {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some("json") {
                    pack_files.push(path);
                }
            }
        }
        pack_files.sort();
        for path in pack_files {
            if let Some(mut pack) = read_json::<StoredPack>(&path).await? {
                pack.file_name = path.file_name().and_then(|n| n.to_str()).map(str::to_string);
                state.packs.push(pack);
            }
        }

        tracing::info!(
            world = %self.root.display(),
            packs = state.packs.len(),
            "Loaded world directory"
        );
        Ok(state)
    }

    /// Write collections and packs back. A pack read from disk goes back to
    /// the file it came from; any other pack is named by its full collection
    /// key.
    pub async fn save(&self, state: &WorldState) -> Result<(), RepoError> {
        for (kind, documents) in &state.collections {
            write_json(&self.root.join(collection_file(*kind)), documents).await?;
        }
        let packs_dir = self.root.join(PACKS_DIR);
        for pack in &state.packs {
            let name = pack
                .file_name
                .clone()
                .unwrap_or_else(|| pack_file_name(&pack.metadata.collection));
            write_json(&packs_dir.join(name), pack).await?;
        }
        Ok(())
    }
}

fn pack_file_name(collection: &str) -> String {
    let safe: String = collection
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect();
    format!("{safe}.json")
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>, RepoError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RepoError::io("read_json", e)),
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| RepoError::serialization(format!("{}: {e}", path.display())))
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), RepoError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| RepoError::io("write_json", e))?;
    }
    let json = serde_json::to_vec_pretty(value).map_err(RepoError::serialization)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| RepoError::io("write_json", e))
}
