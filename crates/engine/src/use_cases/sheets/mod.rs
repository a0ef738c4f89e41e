//! Item sheet data operations.
//!
//! The edits behind the occupation and setup sheets, without any UI: each
//! operation reads the item, edits one of its embedded lists and commits
//! the whole list back.

mod error;
mod occupation;
mod setup;

use std::cmp::Ordering;
use std::sync::Arc;

use coc7_domain::common::{is_truthy, lookup, lookup_str};
use coc7_domain::{Document, DocumentId, DocumentKind, ItemType, Patch};
use serde::Serialize;
use serde_json::Value;

use crate::infrastructure::ports::{DocumentRepo, UpdateOptions};

pub use error::SheetError;
pub use occupation::{GroupView, OccupationSheet, OccupationView, SkillDropTarget};
pub use setup::{CharacteristicMode, EraEntry, SetupSheet, SetupView};

/// Container for item sheet use cases.
pub struct SheetUseCases {
    pub occupation: Arc<OccupationSheet>,
    pub setup: Arc<SetupSheet>,
}

impl SheetUseCases {
    pub fn new(occupation: Arc<OccupationSheet>, setup: Arc<SetupSheet>) -> Self {
        Self { occupation, setup }
    }
}

/// A skill (or other item) listed on a sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedItem {
    pub id: Option<String>,
    pub name: String,
    pub item_type: Option<String>,
    pub display_name: String,
}

impl ListedItem {
    fn from_value(value: &Value) -> Self {
        let name = lookup_str(value, "name").unwrap_or_default().to_string();
        Self {
            id: lookup_str(value, "_id").map(str::to_string),
            item_type: lookup_str(value, "type").map(str::to_string),
            display_name: display_name(value),
            name,
        }
    }
}

/// `"<specialization> (<name>)"` unless the name already mentions it.
pub fn display_name(item: &Value) -> String {
    let name = lookup_str(item, "name").unwrap_or_default();
    match lookup_str(item, "data.specialization") {
        Some(special) if !special.is_empty() && !name.contains(special) => format!("{special} ({name})"),
        _ => name.to_string(),
    }
}

/// A generic "Any" specialization, which may be listed any number of times.
pub fn is_any_spec(item: &Value) -> bool {
    lookup_str(item, "type") == Some("skill")
        && lookup(item, "data.properties.special").is_some_and(is_truthy)
        && lookup_str(item, "name").is_some_and(|name| name.eq_ignore_ascii_case("any"))
}

fn same_name(a: &Value, b: &Value) -> bool {
    lookup_str(a, "name") == lookup_str(b, "name")
}

fn by_display_name(a: &ListedItem, b: &ListedItem) -> Ordering {
    a.display_name
        .to_lowercase()
        .cmp(&b.display_name.to_lowercase())
        .then_with(|| a.display_name.cmp(&b.display_name))
}

fn sorted_listing<'a>(items: impl Iterator<Item = &'a Value>) -> Vec<ListedItem> {
    let mut listed: Vec<ListedItem> = items.map(ListedItem::from_value).collect();
    listed.sort_by(by_display_name);
    listed
}

/// A list field of the item's data; a missing or non-list field reads empty.
fn list_field(doc: &Document, path: &str) -> Vec<Value> {
    doc.data_field(path)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Shared read/commit plumbing for the sheets.
struct ItemStore {
    documents: Arc<dyn DocumentRepo>,
}

impl ItemStore {
    async fn load(&self, id: &DocumentId, expected: ItemType) -> Result<Document, SheetError> {
        let doc = self
            .documents
            .get(DocumentKind::Item, id)
            .await?
            .ok_or_else(|| SheetError::ItemNotFound(id.clone()))?;
        match doc.item_type() {
            Some(found) if *found == expected => Ok(doc),
            found => Err(SheetError::WrongItemType {
                id: id.clone(),
                expected: match expected {
                    ItemType::Occupation => "occupation",
                    ItemType::Setup => "setup",
                    _ => "sheet item",
                },
                found: found.map(|t| t.as_str().to_string()).unwrap_or_default(),
            }),
        }
    }

    async fn commit(&self, id: &DocumentId, patch: Patch) -> Result<(), SheetError> {
        if patch.is_empty() {
            return Ok(());
        }
        self.documents
            .update(DocumentKind::Item, id, &patch, UpdateOptions::default())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display_name_adds_specialization() {
        let skill = json!({"name": "Rifle", "data": {"specialization": "Firearms"}});
        assert_eq!(display_name(&skill), "Firearms (Rifle)");
        let named = json!({"name": "Firearms (Rifle)", "data": {"specialization": "Firearms"}});
        assert_eq!(display_name(&named), "Firearms (Rifle)");
        assert_eq!(display_name(&json!({"name": "Spot Hidden", "data": {}})), "Spot Hidden");
    }

    #[test]
    fn test_any_spec_detection() {
        let any = json!({"name": "Any", "type": "skill", "data": {"properties": {"special": true}}});
        assert!(is_any_spec(&any));
        let plain = json!({"name": "Any", "type": "skill", "data": {"properties": {}}});
        assert!(!is_any_spec(&plain));
        let item = json!({"name": "Any", "type": "item", "data": {"properties": {"special": true}}});
        assert!(!is_any_spec(&item));
    }

    #[test]
    fn test_listing_sorts_case_insensitively() {
        let items = [json!({"name": "spot Hidden"}), json!({"name": "Climb"}), json!({"name": "Art"})];
        let names: Vec<_> = sorted_listing(items.iter())
            .into_iter()
            .map(|l| l.display_name)
            .collect();
        assert_eq!(names, vec!["Art", "Climb", "spot Hidden"]);
    }
}
