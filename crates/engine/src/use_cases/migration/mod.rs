//! Data migration engine.
//!
//! Classifies documents, runs the field transform rules over each snapshot,
//! and commits the resulting patches through the persistence ports.

use std::sync::Arc;

use crate::use_cases::update_check::CheckForUpdate;

mod builder;
mod classifier;
mod error;
mod orchestrator;
mod pack_lock;
mod report;
pub mod rules;


pub use builder::{DocumentPatch, PatchBuilder};
pub use classifier::rules_for;
pub use error::MigrationError;
pub use orchestrator::{MigrateWorld, MigrationOptions};
pub use pack_lock::{PackLockCoordinator, Unlocked};
pub use report::{
    CollectionOutcome, CollectionScope, MigratedDocument, MigrationFailure, MigrationReport,
    PackOutcome, SkippedRule,
};
pub use rules::{AssetPathRewriter, RuleCatalogue, RuleId, RuleSkipped};

/// Container for the update gate and the migration pass.
pub struct MigrationUseCases {
    pub check: Arc<CheckForUpdate>,
    pub migrate: Arc<MigrateWorld>,
}

impl MigrationUseCases {
    pub fn new(check: Arc<CheckForUpdate>, migrate: Arc<MigrateWorld>) -> Self {
        Self { check, migrate }
    }
}
