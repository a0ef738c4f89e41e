//! Migration run report.

use chrono::{DateTime, Utc};
use coc7_domain::{Document, DocumentId, DocumentKind, MigrationRunId};
use serde::Serialize;
use std::fmt;

use super::rules::{RuleId, RuleSkipped};

/// Where a document lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum CollectionScope {
    World { kind: DocumentKind },
    Pack { collection: String, kind: DocumentKind },
}

impl fmt::Display for CollectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionScope::World { kind } => write!(f, "world {kind}"),
            CollectionScope::Pack { collection, kind } => write!(f, "{collection} ({kind})"),
        }
    }
}

/// A document whose patch was committed (or would be, in a dry run).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigratedDocument {
    pub scope: CollectionScope,
    pub id: DocumentId,
    pub name: String,
    /// Number of field edits, embedded ones included.
    pub edits: usize,
}

/// A document that failed to migrate. The run went on without it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationFailure {
    pub scope: CollectionScope,
    pub id: DocumentId,
    pub name: String,
    pub message: String,
}

/// A rule that could not evaluate on a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRule {
    pub document_id: DocumentId,
    pub document_name: String,
    #[serde(serialize_with = "serialize_rule")]
    pub rule: RuleId,
    pub reason: String,
}

impl SkippedRule {
    pub fn new(doc: &Document, skipped: RuleSkipped) -> Self {
        Self {
            document_id: doc.id.clone(),
            document_name: doc.name.clone(),
            rule: skipped.rule,
            reason: skipped.reason,
        }
    }
}

fn serialize_rule<S: serde::Serializer>(rule: &RuleId, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(rule.name())
}

/// Outcome of one compendium pack.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackOutcome {
    pub collection: String,
    pub kind: DocumentKind,
    pub documents: usize,
    pub was_locked: bool,
    /// Set when the pack could not be unlocked or its documents listed.
    pub error: Option<String>,
    /// Set when the lock could not be put back.
    pub lock_restore_error: Option<String>,
}

/// Documents migrated and failed within one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionOutcome {
    pub documents: usize,
    pub migrated: Vec<MigratedDocument>,
    pub failures: Vec<MigrationFailure>,
    pub skipped_rules: Vec<SkippedRule>,
}

/// Summary of a migration run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    pub run_id: MigrationRunId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub migrated: Vec<MigratedDocument>,
    pub failures: Vec<MigrationFailure>,
    pub skipped_rules: Vec<SkippedRule>,
    pub packs: Vec<PackOutcome>,
}

impl MigrationReport {
    pub fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            run_id: MigrationRunId::new(),
            started_at,
            finished_at: None,
            dry_run,
            migrated: Vec::new(),
            failures: Vec::new(),
            skipped_rules: Vec::new(),
            packs: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
            && self
                .packs
                .iter()
                .all(|pack| pack.error.is_none() && pack.lock_restore_error.is_none())
    }

    pub fn absorb(&mut self, outcome: CollectionOutcome) {
        self.migrated.extend(outcome.migrated);
        self.failures.extend(outcome.failures);
        self.skipped_rules.extend(outcome.skipped_rules);
    }

    pub fn failed_ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.failures.iter().map(|failure| &failure.id)
    }
}

impl fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run {}: {} migrated, {} failed, {} rules skipped, {} packs",
            self.run_id,
            self.migrated.len(),
            self.failures.len(),
            self.skipped_rules.len(),
            self.packs.len()
        )?;
        if self.dry_run {
            f.write_str(" (dry run)")?;
        }
        Ok(())
    }
}
