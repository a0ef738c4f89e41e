//! Update check use case.
//!
//! Decides at startup whether the migration pass should be offered: the
//! installed system is newer than the recorded one, or a module's packs were
//! never migrated at its installed version.

use std::sync::Arc;

use coc7_domain::common::to_js_string;
use coc7_domain::ReleaseVersion;
use serde::Serialize;
use serde_json::Value;

use crate::infrastructure::ports::{HostInfoPort, PackRepo, RepoError, SettingsRepo};
use crate::use_cases::module_versions::{
    changed_modules, recorded_modules, ModuleChange, SYSTEM_UPDATE_VERSION,
};

/// What the host should do after the update check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum UpdateDecision {
    /// Nothing to migrate.
    UpToDate,
    /// Offer the migration to the game master.
    OfferMigration {
        version: String,
        /// Modules with unmigrated packs. Empty when only the system changed.
        modules: Vec<ModuleChange>,
    },
    /// Migration is needed but only a game master may run it.
    GmRequired { version: String },
}

impl UpdateDecision {
    pub fn migration_needed(&self) -> bool {
        !matches!(self, UpdateDecision::UpToDate)
    }
}

/// Errors that can occur during the update check.
#[derive(Debug, thiserror::Error)]
pub enum UpdateCheckError {
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}

/// Update check use case.
pub struct CheckForUpdate {
    packs: Arc<dyn PackRepo>,
    settings: Arc<dyn SettingsRepo>,
    host: Arc<dyn HostInfoPort>,
    system_id: String,
}

impl CheckForUpdate {
    pub fn new(
        packs: Arc<dyn PackRepo>,
        settings: Arc<dyn SettingsRepo>,
        host: Arc<dyn HostInfoPort>,
        system_id: impl Into<String>,
    ) -> Self {
        Self {
            packs,
            settings,
            host,
            system_id: system_id.into(),
        }
    }

    pub async fn execute(&self) -> Result<UpdateDecision, UpdateCheckError> {
        let installed = self.host.system_version();
        let recorded = self
            .settings
            .get(&self.system_id, SYSTEM_UPDATE_VERSION)
            .await?;
        let system_changed = system_is_newer(&installed, recorded.as_ref());

        let recorded_modules = recorded_modules(self.settings.as_ref(), &self.system_id).await?;
        let packs = self.packs.list_packs().await?;
        let modules = changed_modules(&packs, &recorded_modules, self.host.as_ref(), &self.system_id);

        if !system_changed && modules.is_empty() {
            tracing::debug!(version = %installed, "System data is up to date");
            return Ok(UpdateDecision::UpToDate);
        }

        tracing::info!(
            version = %installed,
            system_changed,
            modules = modules.len(),
            "System migration needed"
        );
        if self.host.user_is_gm() {
            Ok(UpdateDecision::OfferMigration {
                version: installed,
                modules,
            })
        } else {
            Ok(UpdateDecision::GmRequired { version: installed })
        }
    }
}

/// True when `installed` is newer than the recorded version.
///
/// Nothing recorded means the world never ran a migration. A version that
/// does not parse is logged and never triggers a migration on its own.
fn system_is_newer(installed: &str, recorded: Option<&Value>) -> bool {
    let recorded = match recorded {
        None | Some(Value::Null) => return true,
        Some(value) => to_js_string(value),
    };
    match (ReleaseVersion::parse(installed), ReleaseVersion::parse(&recorded)) {
        (Ok(installed), Ok(recorded)) => installed.is_newer_than(&recorded),
        (installed_result, recorded_result) => {
            tracing::warn!(
                installed = %installed,
                recorded = %recorded,
                installed_error = ?installed_result.err(),
                recorded_error = ?recorded_result.err(),
                "Malformed system version, skipping version comparison"
            );
            false
        }
    }
}
