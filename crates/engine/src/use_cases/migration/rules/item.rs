//! Item rules: skill experience, keeper notes, book and spell automation,
//! keeper notes merge, setup eras.

use coc7_domain::common::{number_or_zero, or_default, to_js_string};
use coc7_domain::{Document, ItemType, Patch};
use serde_json::{json, Value};

use super::{collection_entries, RuleId, RuleOutcome, RuleSkipped};

const KEEPER_PATH: &str = "data.description.keeper";

pub(super) fn skill_experience(doc: &Document) -> Patch {
    let mut patch = Patch::new();
    if doc.item_type() == Some(&ItemType::Skill) && !doc.has_data_field("adjustments.experience") {
        patch.set("data.adjustments.experience", json!(0));
    }
    patch
}

/// Normalise `data.description` to `{value, keeper}`.
pub(super) fn item_keeper_notes(doc: &Document) -> RuleOutcome {
    let mut patch = Patch::new();
    let eligible = matches!(
        doc.item_type(),
        Some(
            ItemType::Archetype
                | ItemType::Chase
                | ItemType::Item
                | ItemType::Occupation
                | ItemType::Setup
                | ItemType::Skill
                | ItemType::Spell
                | ItemType::Status
                | ItemType::Talent
                | ItemType::Weapon
        )
    );
    if !eligible {
        return Ok(patch);
    }
    match doc.data_field("description") {
        Some(Value::String(text)) => {
            patch.set("data.description", json!({"value": text, "keeper": ""}));
        }
        None | Some(Value::Null) => {
            patch.set("data.description", json!({"value": "", "keeper": ""}));
        }
        Some(Value::Object(description)) => {
            if !description.contains_key("keeper") {
                patch.set(KEEPER_PATH, json!(""));
            }
        }
        Some(_) => {
            return Err(RuleSkipped::new(
                RuleId::ItemKeeperNotes,
                "data.description is neither text nor an object",
            ))
        }
    }
    Ok(patch)
}

/// Move legacy book fields into the automated book shape.
///
/// Gated on `data.description.unidentified`, which the rule removes.
pub(super) fn book_automation(doc: &Document) -> Patch {
    let mut patch = Patch::new();
    if doc.item_type() != Some(&ItemType::Book) {
        return patch;
    }
    let Some(unidentified) = doc.data_field("description.unidentified") else {
        return patch;
    };
    let field = |path: &str| doc.data_field(path);

    patch
        .set("data.author", or_default(field("author"), json!("")))
        .set("data.date", or_default(field("date"), json!("")))
        .set("data.language", or_default(field("language"), json!("")))
        .set("data.sanityLoss", or_default(field("sanLoss"), json!(0)))
        .set("data.mythosRating", number_or_zero(field("mythosRating")))
        .set("data.content", unidentified.clone());
    if let Some(notes) = field("description.notes") {
        patch.set(KEEPER_PATH, notes.clone());
    }
    patch
        .set("data.difficultyLevel", json!("regular"))
        .set("data.fullStudies", json!(0))
        .set("data.initialReading", json!(false))
        .set(
            "data.gains.cthulhuMythos.initial",
            number_or_zero(field("gain.cthulhuMythos.CMI")),
        )
        .set(
            "data.gains.cthulhuMythos.final",
            number_or_zero(field("gain.cthulhuMythos.CMF")),
        )
        .set("data.gains.occult", number_or_zero(field("gain.occult")))
        .set("data.gains.others", json!([]))
        .set(
            "data.study",
            json!({"necessary": number_or_zero(field("weeksStudyTime")), "progress": 0}),
        )
        .delete("data.sanLoss")
        .delete("data.weeksStudyTime")
        .delete("data.gain")
        .delete("data.description.unidentified")
        .delete("data.description.notes")
        .delete("data.gains.other")
        .delete("data.properties")
        .delete("data.flags");
    patch
}

/// Replace the single spell cost block with the split costs.
pub(super) fn spell_automation(doc: &Document) -> Patch {
    let mut patch = Patch::new();
    if doc.item_type() != Some(&ItemType::Spell) || !doc.has_data_field("cost") {
        return patch;
    }
    let field = |path: &str| doc.data_field(path);
    patch
        .set("data.castingTime", or_default(field("castingTime"), json!("")))
        .set("data.costs.hitPoints", or_default(field("cost.hp"), json!(0)))
        .set("data.costs.magicPoints", or_default(field("cost.mp"), json!(0)))
        .set("data.costs.sanity", or_default(field("cost.san"), json!(0)))
        .set("data.costs.power", or_default(field("cost.pow"), json!(0)))
        .set("data.costs.others", json!(""))
        .delete("data.cost")
        .delete("data.description.unidentified")
        .delete("data.description.notes");
    patch
}

/// Fold `data.notes` and `data.keeperNotes` into `data.description.keeper`.
///
/// Order is `keeperNotes + keeper + notes`, where `keeper` is whatever an
/// earlier rule already proposed for this document, or the stored value.
pub(super) fn keeper_notes_merge(doc: &Document, pending: &Patch) -> Patch {
    let mut patch = Patch::new();
    if !matches!(doc.item_type(), Some(ItemType::Spell | ItemType::Book)) {
        return patch;
    }

    if let Some(notes) = doc.data_field("notes") {
        let merged = match doc.data_field("description.keeper") {
            Some(keeper) => json!(format!("{}{}", to_js_string(keeper), to_js_string(notes))),
            None => notes.clone(),
        };
        patch.set(KEEPER_PATH, merged).delete("data.notes");
    }

    if let Some(keeper_notes) = doc.data_field("keeperNotes") {
        let current = patch
            .pending_value(KEEPER_PATH)
            .or_else(|| pending.pending_value(KEEPER_PATH));
        let merged = match current {
            Some(keeper) => json!(format!(
                "{}{}",
                to_js_string(keeper_notes),
                to_js_string(keeper)
            )),
            None => keeper_notes.clone(),
        };
        patch.set(KEEPER_PATH, merged).delete("data.keeperNotes");
    }
    patch
}

/// Collapse `{selected}` era entries to their selected flag.
pub(super) fn setup_eras(doc: &Document) -> RuleOutcome {
    let mut patch = Patch::new();
    if doc.item_type() != Some(&ItemType::Setup) {
        return Ok(patch);
    }
    if let Some(eras) = collection_entries(RuleId::SetupEras, doc, "eras")? {
        for (key, era) in eras {
            if let Some(selected) = era.get("selected") {
                patch.set(format!("data.eras.{key}"), selected.clone());
            }
        }
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coc7_domain::{DocumentKind, FieldEdit};

    fn item(snapshot: Value) -> Document {
        Document::from_snapshot(DocumentKind::Item, &snapshot).unwrap()
    }

    fn value_at<'a>(patch: &'a Patch, path: &str) -> Option<&'a Value> {
        match patch.get(path) {
            Some(FieldEdit::Set(v)) => Some(v),
            _ => None,
        }
    }

    #[test]
    fn test_description_string_is_wrapped() {
        let doc = item(json!({"_id": "i", "type": "weapon", "data": {"description": "A knife"}}));
        let patch = item_keeper_notes(&doc).unwrap();
        assert_eq!(
            value_at(&patch, "data.description"),
            Some(&json!({"value": "A knife", "keeper": ""}))
        );
    }

    #[test]
    fn test_description_missing_or_partial() {
        let missing = item(json!({"_id": "i", "type": "talent", "data": {}}));
        assert_eq!(
            value_at(&item_keeper_notes(&missing).unwrap(), "data.description"),
            Some(&json!({"value": "", "keeper": ""}))
        );

        let partial = item(json!({"_id": "i", "type": "skill", "data": {"description": {"value": "x"}}}));
        assert_eq!(
            value_at(&item_keeper_notes(&partial).unwrap(), KEEPER_PATH),
            Some(&json!(""))
        );

        let done = item(json!({"_id": "i", "type": "skill", "data": {"description": {"value": "x", "keeper": ""}}}));
        assert!(item_keeper_notes(&done).unwrap().is_empty());
    }

    #[test]
    fn test_description_of_unlisted_type_is_untouched() {
        let doc = item(json!({"_id": "i", "type": "book", "data": {"description": "text"}}));
        assert!(item_keeper_notes(&doc).unwrap().is_empty());
    }

    #[test]
    fn test_skill_experience_backfill() {
        let doc = item(json!({"_id": "s", "type": "skill", "data": {"adjustments": {}}}));
        assert_eq!(
            value_at(&skill_experience(&doc), "data.adjustments.experience"),
            Some(&json!(0))
        );
    }

    #[test]
    fn test_spell_costs_keep_truthy_values() {
        let doc = item(json!({
            "_id": "sp", "type": "spell",
            "data": {"cost": {"hp": "1d6", "mp": 0, "san": "1d4"}, "castingTime": null}
        }));
        let patch = spell_automation(&doc);
        assert_eq!(value_at(&patch, "data.costs.hitPoints"), Some(&json!("1d6")));
        assert_eq!(value_at(&patch, "data.costs.magicPoints"), Some(&json!(0)));
        assert_eq!(value_at(&patch, "data.costs.power"), Some(&json!(0)));
        assert_eq!(value_at(&patch, "data.castingTime"), Some(&json!("")));
        assert_eq!(patch.get("data.cost"), Some(&FieldEdit::Delete));
    }

    #[test]
    fn test_book_automation_moves_fields() {
        let doc = item(json!({
            "_id": "b", "type": "book",
            "data": {
                "description": {"unidentified": "Strange text", "notes": "Keeper only"},
                "sanLoss": "1d4",
                "mythosRating": "12",
                "weeksStudyTime": "x",
                "gain": {"cthulhuMythos": {"CMI": "2", "CMF": 5}, "occult": null}
            }
        }));
        let patch = book_automation(&doc);
        assert_eq!(value_at(&patch, "data.content"), Some(&json!("Strange text")));
        assert_eq!(value_at(&patch, KEEPER_PATH), Some(&json!("Keeper only")));
        assert_eq!(value_at(&patch, "data.sanityLoss"), Some(&json!("1d4")));
        assert_eq!(value_at(&patch, "data.mythosRating"), Some(&json!(12)));
        assert_eq!(value_at(&patch, "data.gains.cthulhuMythos.initial"), Some(&json!(2)));
        assert_eq!(value_at(&patch, "data.gains.occult"), Some(&json!(0)));
        assert_eq!(
            value_at(&patch, "data.study"),
            Some(&json!({"necessary": 0, "progress": 0}))
        );
        assert_eq!(patch.get("data.description.unidentified"), Some(&FieldEdit::Delete));
        assert!(!patch.contains("data.keeperNotes"));
    }

    #[test]
    fn test_book_without_legacy_shape_is_left_alone() {
        let doc = item(json!({"_id": "b", "type": "book", "data": {"description": {"value": ""}}}));
        assert!(book_automation(&doc).is_empty());
    }

    #[test]
    fn test_merge_order() {
        let doc = item(json!({
            "_id": "sp", "type": "spell",
            "data": {"description": {"keeper": "A"}, "notes": "B", "keeperNotes": "C"}
        }));
        let patch = keeper_notes_merge(&doc, &Patch::new());
        assert_eq!(value_at(&patch, KEEPER_PATH), Some(&json!("CAB")));
        assert_eq!(patch.get("data.notes"), Some(&FieldEdit::Delete));
        assert_eq!(patch.get("data.keeperNotes"), Some(&FieldEdit::Delete));
    }

    #[test]
    fn test_merge_reads_pending_keeper() {
        let doc = item(json!({"_id": "b", "type": "book", "data": {"keeperNotes": "K"}}));
        let mut pending = Patch::new();
        pending.set(KEEPER_PATH, json!("from book"));
        let patch = keeper_notes_merge(&doc, &pending);
        assert_eq!(value_at(&patch, KEEPER_PATH), Some(&json!("Kfrom book")));
    }

    #[test]
    fn test_setup_eras_collapse() {
        let doc = item(json!({
            "_id": "st", "type": "setup",
            "data": {"eras": {"pulp": {"selected": true, "name": "Pulp"}, "classic": false}}
        }));
        let patch = setup_eras(&doc).unwrap();
        assert_eq!(value_at(&patch, "data.eras.pulp"), Some(&json!(true)));
        assert_eq!(patch.len(), 1);
    }
}
