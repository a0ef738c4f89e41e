//! Patch builder: runs the classified rules over one document snapshot.

use coc7_domain::{Document, DocumentKind, Patch};

use super::classifier::rules_for;
use super::report::SkippedRule;
use super::rules::RuleCatalogue;

/// Patch proposed for one document, plus the rules that could not run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentPatch {
    pub patch: Patch,
    pub skipped: Vec<SkippedRule>,
}

/// Builds migration patches. Pure: never touches a repository.
pub struct PatchBuilder {
    catalogue: RuleCatalogue,
}

impl PatchBuilder {
    pub fn new(catalogue: RuleCatalogue) -> Self {
        Self { catalogue }
    }

    /// Merge every applicable rule's fragment, later rules winning on the
    /// same path. Actors also collect one embedded patch per owned item.
    pub fn build(&self, doc: &Document) -> DocumentPatch {
        let mut out = DocumentPatch::default();
        for rule in rules_for(doc.kind, &doc.subtype) {
            match self.catalogue.evaluate(rule, doc, &out.patch) {
                Ok(fragment) => out.patch.merge(fragment),
                Err(skipped) => {
                    tracing::warn!(
                        document_id = %doc.id,
                        document_name = %doc.name,
                        rule = %skipped.rule,
                        reason = %skipped.reason,
                        "Migration rule skipped"
                    );
                    out.skipped.push(SkippedRule::new(doc, skipped));
                }
            }
        }

        if doc.kind == DocumentKind::Actor {
            for item in &doc.items {
                let embedded = self.build(item);
                out.patch.attach_embedded(item.id.clone(), embedded.patch);
                out.skipped.extend(embedded.skipped);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::migration::rules::{test_catalogue, RuleId};
    use coc7_domain::FieldEdit;
    use serde_json::{json, Value};

    fn builder() -> PatchBuilder {
        PatchBuilder::new(test_catalogue())
    }

    fn doc(kind: DocumentKind, snapshot: Value) -> Document {
        Document::from_snapshot(kind, &snapshot).unwrap()
    }

    #[test]
    fn test_actor_collects_embedded_item_patches() {
        let actor = doc(
            DocumentKind::Actor,
            json!({
                "_id": "a1", "type": "npc",
                "data": {"description": {"keeper": ""}, "special": {}, "attacksPerRound": 1, "conditions": {}},
                "items": [
                    {"_id": "i1", "type": "skill", "data": {"description": "Spot things"}},
                    {"_id": "i2", "type": "skill", "data": {"description": {"value": "", "keeper": ""}, "adjustments": {"experience": 0}}}
                ]
            }),
        );
        let out = builder().build(&actor);
        assert!(out.patch.ops().is_empty());
        assert_eq!(out.patch.embedded().len(), 1);
        assert_eq!(out.patch.embedded()[0].id.as_str(), "i1");
    }

    #[test]
    fn test_book_then_merge_compose() {
        let book = doc(
            DocumentKind::Item,
            json!({
                "_id": "b1", "type": "book",
                "data": {
                    "description": {"unidentified": "text", "notes": "N"},
                    "keeperNotes": "K"
                }
            }),
        );
        let out = builder().build(&book);
        assert_eq!(
            out.patch.get("data.description.keeper"),
            Some(&FieldEdit::Set(json!("KN")))
        );
    }

    #[test]
    fn test_skipped_rule_does_not_block_others() {
        let setup = doc(
            DocumentKind::Item,
            json!({
                "_id": "s1", "type": "setup", "name": "Broken setup",
                "img": "systems/CoC7/artwork/icons/setup.svg",
                "data": {"items": "oops", "eras": {}}
            }),
        );
        let out = builder().build(&setup);
        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].rule, RuleId::ItemArtwork);
        assert!(out.patch.contains("data.description"));
    }

    #[test]
    fn test_migrated_document_yields_empty_patch() {
        let macro_doc = doc(DocumentKind::Macro, json!({"_id": "m1", "img": "icons/dice.svg"}));
        assert!(builder().build(&macro_doc).patch.is_empty());
    }
}
