//! Migrate world use case.
//!
//! Walks world collections, then eligible compendium packs, one document at a
//! time. Every commit is awaited before the next document is built. A failed
//! document is logged and reported; the pass continues.

use std::sync::Arc;

use coc7_domain::common::is_truthy;
use coc7_domain::{Document, DocumentKind, PackMetadata, Patch};
use serde_json::Value;

use crate::infrastructure::ports::{
    ClockPort, DocumentRepo, HostInfoPort, PackRepo, RepoError, SettingsRepo, UpdateOptions,
};
use crate::use_cases::module_versions::{
    changed_modules, merge_recorded, recorded_modules, PULP_RULES, PULP_RULE_FLAGS,
    SYSTEM_UPDATED_MODULE_VERSION, SYSTEM_UPDATE_VERSION,
};

use super::builder::PatchBuilder;
use super::error::MigrationError;
use super::pack_lock::PackLockCoordinator;
use super::report::{
    CollectionOutcome, CollectionScope, MigratedDocument, MigrationFailure, MigrationReport,
    PackOutcome,
};

/// Options for one migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationOptions {
    /// Build and report patches without committing anything.
    pub dry_run: bool,
}

/// Migrate world use case.
///
/// Orchestrates: world collections, compendium packs (unlocked for the
/// duration), the pulp rule cascade, and recording the migrated versions.
pub struct MigrateWorld {
    documents: Arc<dyn DocumentRepo>,
    packs: Arc<dyn PackRepo>,
    settings: Arc<dyn SettingsRepo>,
    host: Arc<dyn HostInfoPort>,
    clock: Arc<dyn ClockPort>,
    builder: Arc<PatchBuilder>,
    locks: PackLockCoordinator,
    system_id: String,
}

impl MigrateWorld {
    pub fn new(
        documents: Arc<dyn DocumentRepo>,
        packs: Arc<dyn PackRepo>,
        settings: Arc<dyn SettingsRepo>,
        host: Arc<dyn HostInfoPort>,
        clock: Arc<dyn ClockPort>,
        builder: Arc<PatchBuilder>,
        system_id: impl Into<String>,
    ) -> Self {
        Self {
            locks: PackLockCoordinator::new(packs.clone()),
            documents,
            packs,
            settings,
            host,
            clock,
            builder,
            system_id: system_id.into(),
        }
    }

    /// Execute the migration pass.
    ///
    /// # Returns
    /// * `Ok(MigrationReport)` - Pass completed; per-document failures are in the report
    /// * `Err(MigrationError)` - Not a game master, or a collection or setting could not be read or written
    pub async fn execute(&self, options: MigrationOptions) -> Result<MigrationReport, MigrationError> {
        if !self.host.user_is_gm() {
            return Err(MigrationError::NotGameMaster);
        }

        let version = self.host.system_version();
        let mut report = MigrationReport::new(self.clock.now(), options.dry_run);
        tracing::info!(
            run_id = %report.run_id,
            version = %version,
            dry_run = options.dry_run,
            "Applying system migration"
        );

        // Read before anything is written: it is the base of the merged record.
        let recorded = recorded_modules(self.settings.as_ref(), &self.system_id).await?;
        let packs = self.packs.list_packs().await?;
        let modules = changed_modules(&packs, &recorded, self.host.as_ref(), &self.system_id);

        for kind in DocumentKind::ALL {
            let documents = self.documents.list(kind).await?;
            let outcome = self
                .migrate_collection(&CollectionScope::World { kind }, documents, options)
                .await;
            report.absorb(outcome);
        }

        for pack in packs.iter().filter(|p| !p.is_owned_by(&self.system_id)) {
            let Some(kind) = pack.document_kind() else {
                continue;
            };
            let outcome = self.migrate_pack(pack, kind, options, &mut report).await;
            report.packs.push(outcome);
        }

        if !options.dry_run {
            self.apply_pulp_rules().await?;
            self.settings
                .set(
                    &self.system_id,
                    SYSTEM_UPDATED_MODULE_VERSION,
                    Value::Object(merge_recorded(recorded, &modules)),
                )
                .await?;
            self.settings
                .set(&self.system_id, SYSTEM_UPDATE_VERSION, Value::String(version))
                .await?;
        }

        report.finished_at = Some(self.clock.now());
        tracing::info!(%report, "System migration finished");
        Ok(report)
    }

    async fn migrate_pack(
        &self,
        pack: &PackMetadata,
        kind: DocumentKind,
        options: MigrationOptions,
        report: &mut MigrationReport,
    ) -> PackOutcome {
        let scope = CollectionScope::Pack {
            collection: pack.collection.clone(),
            kind,
        };
        let mut outcome = PackOutcome {
            collection: pack.collection.clone(),
            kind,
            documents: 0,
            was_locked: pack.locked,
            error: None,
            lock_restore_error: None,
        };

        let result = if options.dry_run {
            self.migrate_pack_documents(pack, &scope, options).await
        } else {
            let scope = &scope;
            match self
                .locks
                .with_unlocked(pack, move || async move {
                    self.migrate_pack_documents(pack, scope, options).await
                })
                .await
            {
                Ok(unlocked) => {
                    outcome.lock_restore_error = unlocked.restore_error.map(|e| e.to_string());
                    unlocked.value
                }
                Err(e) => Err(e),
            }
        };

        match result {
            Ok(collection) => {
                outcome.documents = collection.documents;
                report.absorb(collection);
            }
            Err(e) => {
                tracing::error!(
                    pack = %pack.collection,
                    error = %e,
                    "Failed to migrate compendium pack"
                );
                outcome.error = Some(e.to_string());
            }
        }
        outcome
    }

    async fn migrate_pack_documents(
        &self,
        pack: &PackMetadata,
        scope: &CollectionScope,
        options: MigrationOptions,
    ) -> Result<CollectionOutcome, RepoError> {
        let documents = self.packs.list_documents(&pack.collection).await?;
        Ok(self.migrate_collection(scope, documents, options).await)
    }

    async fn migrate_collection(
        &self,
        scope: &CollectionScope,
        documents: Vec<Document>,
        options: MigrationOptions,
    ) -> CollectionOutcome {
        let mut outcome = CollectionOutcome {
            documents: documents.len(),
            ..CollectionOutcome::default()
        };

        for doc in documents {
            let built = self.builder.build(&doc);
            outcome.skipped_rules.extend(built.skipped);
            if built.patch.is_empty() {
                continue;
            }

            if !options.dry_run {
                if let Err(e) = self.commit(scope, &doc, &built.patch).await {
                    tracing::error!(
                        scope = %scope,
                        document_id = %doc.id,
                        document_name = %doc.name,
                        error = %e,
                        "Failed system migration for document"
                    );
                    outcome.failures.push(MigrationFailure {
                        scope: scope.clone(),
                        id: doc.id.clone(),
                        name: doc.name.clone(),
                        message: e.to_string(),
                    });
                    continue;
                }
            }

            tracing::info!(
                scope = %scope,
                document_name = %doc.name,
                edits = built.patch.len(),
                "Migrated document"
            );
            if options.dry_run {
                tracing::debug!(update = %built.patch.to_update_object(), "Would commit update");
            } else {
                tracing::debug!(update = %built.patch.to_update_object(), "Committed update");
            }
            outcome.migrated.push(MigratedDocument {
                scope: scope.clone(),
                id: doc.id,
                name: doc.name,
                edits: built.patch.len(),
            });
        }
        outcome
    }

    async fn commit(
        &self,
        scope: &CollectionScope,
        doc: &Document,
        patch: &Patch,
    ) -> Result<(), RepoError> {
        match scope {
            CollectionScope::World { kind } => {
                self.documents
                    .update(*kind, &doc.id, patch, UpdateOptions::migration())
                    .await
            }
            CollectionScope::Pack { collection, .. } => {
                self.packs
                    .update_document(collection, &doc.id, patch, UpdateOptions::migration())
                    .await
            }
        }
    }

    /// With pulp rules on, switch every pulp sub-rule on as well.
    async fn apply_pulp_rules(&self) -> Result<(), RepoError> {
        let enabled = self
            .settings
            .get(&self.system_id, PULP_RULES)
            .await?
            .is_some_and(|value| is_truthy(&value));
        if !enabled {
            return Ok(());
        }
        for flag in PULP_RULE_FLAGS {
            self.settings
                .set(&self.system_id, flag, Value::Bool(true))
                .await?;
        }
        tracing::info!("Pulp rules enabled, switched on every pulp sub-rule");
        Ok(())
    }
}
