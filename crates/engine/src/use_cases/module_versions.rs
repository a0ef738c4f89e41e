//! Recorded system and module versions, and the settings the migration
//! pass writes.

use coc7_domain::common::to_js_string;
use coc7_domain::{DocumentKind, PackMetadata};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::infrastructure::ports::{HostInfoPort, RepoError, SettingsRepo};

/// System version recorded by the last completed migration.
pub const SYSTEM_UPDATE_VERSION: &str = "systemUpdateVersion";
/// Map of module package to the version recorded at the last migration.
pub const SYSTEM_UPDATED_MODULE_VERSION: &str = "systemUpdatedModuleVersion";
pub const PULP_RULES: &str = "pulpRules";
/// Pulp sub-rules switched on when pulp rules are enabled.
pub const PULP_RULE_FLAGS: [&str; 7] = [
    "pulpRuleDoubleMaxHealth",
    "pulpRuleDevelopmentRollLuck",
    "pulpRuleArchetype",
    "pulpRuleOrganization",
    "pulpRuleTalents",
    "pulpRuleFasterRecovery",
    "pulpRuleIgnoreMajorWounds",
];

/// An add-on module whose compendium content has not been migrated at its
/// installed version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleChange {
    pub package: String,
    pub title: String,
    pub version: String,
}

/// Module versions recorded at the last migration. Anything but a map
/// reads as nothing recorded.
pub async fn recorded_modules(
    settings: &dyn SettingsRepo,
    namespace: &str,
) -> Result<Map<String, Value>, RepoError> {
    Ok(match settings.get(namespace, SYSTEM_UPDATED_MODULE_VERSION).await? {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

/// Modules with Actor or Item packs that are unrecorded or recorded at a
/// different version. Each package is listed once, in pack order.
pub fn changed_modules(
    packs: &[PackMetadata],
    recorded: &Map<String, Value>,
    host: &dyn HostInfoPort,
    system_id: &str,
) -> Vec<ModuleChange> {
    let mut seen = BTreeSet::new();
    let mut changes = Vec::new();
    for pack in packs {
        if pack.is_owned_by(system_id) || pack.is_world_pack() {
            continue;
        }
        if !matches!(
            pack.document_kind(),
            Some(DocumentKind::Actor | DocumentKind::Item)
        ) {
            continue;
        }
        if !seen.insert(pack.package.as_str()) {
            continue;
        }
        let Some(installed) = host.module_version(&pack.package) else {
            tracing::warn!(
                package = %pack.package,
                pack = %pack.collection,
                "Pack belongs to a module that is not installed"
            );
            continue;
        };
        let changed = recorded
            .get(&pack.package)
            .map_or(true, |version| to_js_string(version) != installed);
        if changed {
            changes.push(ModuleChange {
                title: host
                    .module_title(&pack.package)
                    .unwrap_or_else(|| pack.package.clone()),
                package: pack.package.clone(),
                version: installed,
            });
        }
    }
    changes
}

/// `recorded` with every changed module set to its installed version.
pub fn merge_recorded(
    mut recorded: Map<String, Value>,
    changes: &[ModuleChange],
) -> Map<String, Value> {
    for change in changes {
        recorded.insert(change.package.clone(), Value::String(change.version.clone()));
    }
    recorded
}
