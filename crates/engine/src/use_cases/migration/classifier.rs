//! Document classification: which rules apply, in which order.

use coc7_domain::{ActorType, DocumentKind, ItemType, Subtype};

use super::rules::RuleId;

/// Ordered rule list for a document kind and subtype.
///
/// Order matters: the keeper notes merge reads what book automation
/// proposed for the same item. Unknown subtypes only get the rules every
/// document of their kind receives.
pub fn rules_for(kind: DocumentKind, subtype: &Subtype) -> Vec<RuleId> {
    match kind {
        DocumentKind::Actor => actor_rules(subtype),
        DocumentKind::Item => item_rules(subtype),
        DocumentKind::RollTable => vec![RuleId::TableArtwork],
        DocumentKind::Macro => vec![RuleId::MacroArtwork],
    }
}

fn actor_rules(subtype: &Subtype) -> Vec<RuleId> {
    let actor_type = match subtype {
        Subtype::Actor(t) => Some(t),
        _ => None,
    };
    let mut rules = Vec::new();
    if actor_type == Some(&ActorType::Character) {
        rules.push(RuleId::CharacterSanity);
    }
    rules.push(RuleId::ActorArtwork);
    if matches!(
        actor_type,
        Some(ActorType::Character | ActorType::Npc | ActorType::Creature)
    ) {
        rules.push(RuleId::ActorKeeperNotes);
    }
    if actor_type == Some(&ActorType::Npc) {
        rules.push(RuleId::NpcDefaults);
    }
    rules.push(RuleId::StatusEffects);
    rules
}

fn item_rules(subtype: &Subtype) -> Vec<RuleId> {
    let item_type = match subtype {
        Subtype::Item(t) => Some(t),
        _ => None,
    };
    let mut rules = Vec::new();
    if item_type == Some(&ItemType::Skill) {
        rules.push(RuleId::SkillExperience);
    }
    rules.push(RuleId::ItemArtwork);
    if item_type == Some(&ItemType::Book) {
        rules.push(RuleId::BookAutomation);
    }
    if item_type.is_some_and(has_keeper_description) {
        rules.push(RuleId::ItemKeeperNotes);
    }
    if item_type == Some(&ItemType::Spell) {
        rules.push(RuleId::SpellAutomation);
    }
    if matches!(item_type, Some(ItemType::Spell | ItemType::Book)) {
        rules.push(RuleId::KeeperNotesMerge);
    }
    if item_type == Some(&ItemType::Setup) {
        rules.push(RuleId::SetupEras);
    }
    rules
}

fn has_keeper_description(item_type: &ItemType) -> bool {
    !matches!(item_type, ItemType::Book | ItemType::Other(_))
}
