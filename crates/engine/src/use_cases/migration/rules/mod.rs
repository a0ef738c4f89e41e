//! Field transform rule catalogue.
//!
//! Every rule reads one document snapshot and returns a patch fragment, or
//! an empty patch when its precondition does not hold. Preconditions gate on
//! the legacy shape (field missing, old shape present), never on a value the
//! rule does not itself remove or update, so a second run yields nothing.
//!
//! Rules also see the patch accumulated by earlier rules for the same
//! document. Only the keeper notes merge reads it.

mod actor;
mod artwork;
mod item;

use coc7_domain::{Document, Patch};
use regex_lite::Regex;
use serde_json::Value;
use std::fmt;

pub use artwork::AssetPathRewriter;

/// Identifier of a field transform rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleId {
    CharacterSanity,
    ActorArtwork,
    ActorKeeperNotes,
    NpcDefaults,
    StatusEffects,
    SkillExperience,
    ItemArtwork,
    BookAutomation,
    ItemKeeperNotes,
    SpellAutomation,
    KeeperNotesMerge,
    SetupEras,
    TableArtwork,
    MacroArtwork,
}

impl RuleId {
    pub fn name(&self) -> &'static str {
        match self {
            RuleId::CharacterSanity => "character_sanity",
            RuleId::ActorArtwork => "actor_artwork",
            RuleId::ActorKeeperNotes => "actor_keeper_notes",
            RuleId::NpcDefaults => "npc_defaults",
            RuleId::StatusEffects => "status_effects",
            RuleId::SkillExperience => "skill_experience",
            RuleId::ItemArtwork => "item_artwork",
            RuleId::BookAutomation => "book_automation",
            RuleId::ItemKeeperNotes => "item_keeper_notes",
            RuleId::SpellAutomation => "spell_automation",
            RuleId::KeeperNotesMerge => "keeper_notes_merge",
            RuleId::SetupEras => "setup_eras",
            RuleId::TableArtwork => "table_artwork",
            RuleId::MacroArtwork => "macro_artwork",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A rule could not evaluate because a nested field has an unexpected shape.
///
/// Recoverable: the document is still migrated with the remaining rules.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("rule {rule} skipped: {reason}")]
pub struct RuleSkipped {
    pub rule: RuleId,
    pub reason: String,
}

impl RuleSkipped {
    pub fn new(rule: RuleId, reason: impl Into<String>) -> Self {
        Self {
            rule,
            reason: reason.into(),
        }
    }
}

pub type RuleOutcome = Result<Patch, RuleSkipped>;

/// The fixed rule catalogue, with its compiled patterns.
pub struct RuleCatalogue {
    assets: AssetPathRewriter,
    status_icons: Regex,
}

impl RuleCatalogue {
    pub fn new(system_id: &str) -> Result<Self, regex_lite::Error> {
        Ok(Self {
            assets: AssetPathRewriter::new(system_id)?,
            status_icons: actor::status_icon_pattern()?,
        })
    }

    pub fn assets(&self) -> &AssetPathRewriter {
        &self.assets
    }

    /// Run one rule against a snapshot.
    pub fn evaluate(&self, rule: RuleId, doc: &Document, pending: &Patch) -> RuleOutcome {
        match rule {
            RuleId::CharacterSanity => actor::character_sanity(doc),
            RuleId::ActorArtwork => artwork::actor_artwork(&self.assets, doc),
            RuleId::ActorKeeperNotes => Ok(actor::actor_keeper_notes(doc)),
            RuleId::NpcDefaults => Ok(actor::npc_defaults(doc)),
            RuleId::StatusEffects => Ok(actor::status_effects(&self.status_icons, doc)),
            RuleId::SkillExperience => Ok(item::skill_experience(doc)),
            RuleId::ItemArtwork => artwork::item_artwork(&self.assets, doc),
            RuleId::BookAutomation => Ok(item::book_automation(doc)),
            RuleId::ItemKeeperNotes => item::item_keeper_notes(doc),
            RuleId::SpellAutomation => Ok(item::spell_automation(doc)),
            RuleId::KeeperNotesMerge => Ok(item::keeper_notes_merge(doc, pending)),
            RuleId::SetupEras => item::setup_eras(doc),
            RuleId::TableArtwork => Ok(artwork::table_artwork(&self.assets, doc)),
            RuleId::MacroArtwork => Ok(artwork::macro_artwork(&self.assets, doc)),
        }
    }
}

/// True when the key is absent or holds `null`.
fn absent_or_null(doc: &Document, path: &str) -> bool {
    matches!(doc.data_field(path), None | Some(Value::Null))
}

/// Entries of a nested collection: positions of a sequence or keys of a map.
///
/// `Ok(None)` when the container is absent or `null` (the rule does not
/// apply); `Err` when it holds a scalar.
fn collection_entries<'a>(
    rule: RuleId,
    doc: &'a Document,
    path: &str,
) -> Result<Option<Vec<(String, &'a Value)>>, RuleSkipped> {
    match doc.data_field(path) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => entries_of(value)
            .map(Some)
            .ok_or_else(|| RuleSkipped::new(rule, format!("data.{path} is not a collection"))),
    }
}

fn entries_of(value: &Value) -> Option<Vec<(String, &Value)>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v))
                .collect(),
        ),
        Value::Object(map) => Some(map.iter().map(|(k, v)| (k.clone(), v)).collect()),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) fn test_catalogue() -> RuleCatalogue {
    match RuleCatalogue::new("CoC7") {
        Ok(catalogue) => catalogue,
        Err(e) => panic!("catalogue patterns must compile: {e}"),
    }
}
