//! Application state and composition.

use std::sync::Arc;

use crate::infrastructure::{
    clock::SystemClock,
    ports::{ClockPort, DocumentRepo, HostInfoPort, PackRepo, SettingsRepo},
};
use crate::use_cases;
use crate::use_cases::migration::{PatchBuilder, RuleCatalogue};
use crate::use_cases::sheets::{OccupationSheet, SetupSheet};

/// Main application state.
///
/// Holds the ports and every use case built on them.
pub struct App {
    pub repositories: Repositories,
    pub use_cases: UseCases,
}

/// Container for the injected ports.
pub struct Repositories {
    pub documents: Arc<dyn DocumentRepo>,
    pub packs: Arc<dyn PackRepo>,
    pub settings: Arc<dyn SettingsRepo>,
    pub host: Arc<dyn HostInfoPort>,
}

/// Container for all use cases.
pub struct UseCases {
    pub migration: use_cases::MigrationUseCases,
    pub sheets: use_cases::SheetUseCases,
}

impl App {
    /// Wire the use cases for the system installed as `system_id`.
    ///
    /// Fails only when `system_id` cannot be built into the asset path
    /// patterns.
    pub fn new(
        documents: Arc<dyn DocumentRepo>,
        packs: Arc<dyn PackRepo>,
        settings: Arc<dyn SettingsRepo>,
        host: Arc<dyn HostInfoPort>,
        system_id: &str,
    ) -> Result<Self, regex_lite::Error> {
        let clock_port: Arc<dyn ClockPort> = Arc::new(SystemClock::new());
        let builder = Arc::new(PatchBuilder::new(RuleCatalogue::new(system_id)?));

        let check = Arc::new(use_cases::CheckForUpdate::new(
            packs.clone(),
            settings.clone(),
            host.clone(),
            system_id,
        ));
        let migrate = Arc::new(use_cases::MigrateWorld::new(
            documents.clone(),
            packs.clone(),
            settings.clone(),
            host.clone(),
            clock_port,
            builder,
            system_id,
        ));

        let use_cases = UseCases {
            migration: use_cases::MigrationUseCases::new(check, migrate),
            sheets: use_cases::SheetUseCases::new(
                Arc::new(OccupationSheet::new(documents.clone())),
                Arc::new(SetupSheet::new(documents.clone())),
            ),
        };

        Ok(Self {
            repositories: Repositories {
                documents,
                packs,
                settings,
                host,
            },
            use_cases,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::world_seeder::legacy_world;
    use crate::use_cases::{MigrationOptions, UpdateDecision};
    use coc7_domain::{DocumentId, DocumentKind};

    #[tokio::test]
    async fn test_app_runs_gate_then_migration() {
        let seeded = legacy_world();
        let app = App::new(
            seeded.world.clone(),
            seeded.world.clone(),
            seeded.world.clone(),
            Arc::new(seeded.host.clone()),
            "CoC7",
        )
        .unwrap();

        let decision = app.use_cases.migration.check.execute().await.unwrap();
        assert!(decision.migration_needed());

        let report = app
            .use_cases
            .migration
            .migrate
            .execute(MigrationOptions::default())
            .await
            .unwrap();
        assert!(report.is_clean());
        assert!(report.finished_at.is_some());

        let decision = app.use_cases.migration.check.execute().await.unwrap();
        assert_eq!(decision, UpdateDecision::UpToDate);
    }

    #[tokio::test]
    async fn test_app_serves_setup_sheet() {
        let seeded = legacy_world();
        let app = App::new(
            seeded.world.clone(),
            seeded.world.clone(),
            seeded.world.clone(),
            Arc::new(seeded.host.clone()),
            "CoC7",
        )
        .unwrap();

        let view = app
            .use_cases
            .sheets
            .setup
            .view(&DocumentId::new("itm-setup"))
            .await
            .unwrap();
        assert_eq!(view.skills.len(), 1);
        assert!(app
            .repositories
            .documents
            .get(DocumentKind::Item, &DocumentId::new("itm-setup"))
            .await
            .unwrap()
            .is_some());
    }
}
