//! Actor rules: sanity backfill, keeper notes, npc defaults, status effects.

use coc7_domain::common::{is_truthy, js_number_text, number_value, to_number};
use coc7_domain::{
    condition_for_icon_stem, ActorType, ConditionId, Document, Patch, STATUS_ICON_CONDITIONS,
};
use regex_lite::Regex;
use serde_json::{json, Value};

use super::{absent_or_null, RuleId, RuleOutcome, RuleSkipped};

/// `/(<stem>|...)\.`, in table order so the leftmost match wins.
pub(super) fn status_icon_pattern() -> Result<Regex, regex_lite::Error> {
    let stems = STATUS_ICON_CONDITIONS
        .iter()
        .map(|(stem, _)| regex_lite::escape(stem))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"/({stems})\."))
}

/// Backfill sanity and magic point fields derived from current sanity.
pub(super) fn character_sanity(doc: &Document) -> RuleOutcome {
    if doc.actor_type() != Some(&ActorType::Character) {
        return Ok(Patch::new());
    }
    let san = match doc.data_field("attribs.san") {
        Some(Value::Object(san)) => san,
        _ => {
            return Err(RuleSkipped::new(
                RuleId::CharacterSanity,
                "data.attribs.san is not an object",
            ))
        }
    };
    let sanity = to_number(san.get("value"));
    if sanity.is_nan() {
        return Err(RuleSkipped::new(
            RuleId::CharacterSanity,
            "data.attribs.san.value is not numeric",
        ));
    }
    let fifth = (sanity / 5.0).ceil();
    let fifth_text = js_number_text(fifth);

    let mut patch = Patch::new();
    let mut backfill = |path: &str, value: Value| {
        if absent_or_null(doc, path) {
            patch.set(format!("data.{path}"), value);
        }
    };
    backfill("attribs.san.dailyLoss", json!(0));
    backfill("attribs.san.oneFifthSanity", json!(format!(" / {fifth_text}")));
    backfill("indefiniteInsanityLevel.value", json!(0));
    backfill("indefiniteInsanityLevel.max", number_value(fifth));
    backfill("attribs.mp.value", number_value(fifth));
    backfill("attribs.mp.max", number_value(fifth));
    backfill("notes", json!(""));
    Ok(patch)
}

pub(super) fn actor_keeper_notes(doc: &Document) -> Patch {
    let mut patch = Patch::new();
    let eligible = matches!(
        doc.actor_type(),
        Some(ActorType::Character | ActorType::Npc | ActorType::Creature)
    );
    if eligible && !doc.has_data_field("description") {
        patch.set("data.description", json!({"keeper": ""}));
    }
    patch
}

pub(super) fn npc_defaults(doc: &Document) -> Patch {
    let mut patch = Patch::new();
    if doc.actor_type() != Some(&ActorType::Npc) {
        return patch;
    }
    if !doc.has_data_field("special") {
        patch.set(
            "data.special",
            json!({"checkPassed": null, "checkFailled": null}),
        );
    }
    if !doc.has_data_field("attacksPerRound") {
        patch.set("data.attacksPerRound", json!(1));
    }
    patch
}

/// Replace the legacy status block with condition flags.
///
/// Every condition is written explicitly: legacy status values first, then
/// any active effect whose icon names a status condition.
pub(super) fn status_effects(icons: &Regex, doc: &Document) -> Patch {
    let mut patch = Patch::new();
    if !doc.has_data_field("status") && doc.has_data_field("conditions") {
        return patch;
    }

    for condition in ConditionId::ALL {
        let legacy = condition
            .legacy_status_path()
            .strip_prefix("data.")
            .and_then(|path| doc.data_field(path))
            .is_some_and(is_truthy);
        patch.set(condition.value_path(), Value::Bool(legacy));
    }

    for (i, effect) in doc.effects.iter().enumerate() {
        let Some(icon) = effect.icon.as_deref() else {
            continue;
        };
        let Some(condition) = icons
            .captures(icon)
            .and_then(|caps| caps.get(1))
            .and_then(|stem| condition_for_icon_stem(stem.as_str()))
        else {
            continue;
        };
        let path = condition.value_path();
        if !patch.pending_value(&path).is_some_and(is_truthy) {
            patch.set(path, Value::Bool(true));
        }
        if effect.status_id.as_deref() != Some(condition.as_str()) {
            patch.set(
                format!("effects.{i}.flags.core.statusId"),
                json!(condition.as_str()),
            );
        }
    }

    patch.delete("data.status");
    patch
}
