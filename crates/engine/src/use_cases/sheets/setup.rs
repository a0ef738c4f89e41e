//! Setup sheet operations.

use std::sync::Arc;

use coc7_domain::common::lookup_str;
use coc7_domain::{Document, DocumentId, ItemType, Patch};
use serde::Serialize;
use serde_json::Value;

use crate::infrastructure::ports::DocumentRepo;

use super::{is_any_spec, list_field, same_name, sorted_listing, ItemStore, ListedItem, SheetError};

/// Item types a setup may carry.
const SETUP_ITEM_TYPES: [&str; 5] = ["item", "weapon", "skill", "book", "spell"];

/// How investigators of a setup generate characteristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacteristicMode {
    Points,
    Rolls,
}

impl CharacteristicMode {
    fn path(&self) -> &'static str {
        match self {
            CharacteristicMode::Points => "data.characteristics.points.enabled",
            CharacteristicMode::Rolls => "data.characteristics.rolls.enabled",
        }
    }

    fn other(&self) -> Self {
        match self {
            CharacteristicMode::Points => CharacteristicMode::Rolls,
            CharacteristicMode::Rolls => CharacteristicMode::Points,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EraEntry {
    pub id: String,
    pub enabled: bool,
}

/// Read model of a setup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupView {
    /// Skills, sorted by display name.
    pub skills: Vec<ListedItem>,
    /// Everything that is not a skill, in stored order.
    pub other_items: Vec<ListedItem>,
    pub eras: Vec<EraEntry>,
    pub bio_sections: Vec<Value>,
}

/// Setup sheet use case.
pub struct SetupSheet {
    store: ItemStore,
}

impl SetupSheet {
    pub fn new(documents: Arc<dyn DocumentRepo>) -> Self {
        Self {
            store: ItemStore { documents },
        }
    }

    async fn load(&self, id: &DocumentId) -> Result<Document, SheetError> {
        self.store.load(id, ItemType::Setup).await
    }

    pub async fn view(&self, id: &DocumentId) -> Result<SetupView, SheetError> {
        let doc = self.load(id).await?;
        let items = list_field(&doc, "items");
        let (skills, others): (Vec<&Value>, Vec<&Value>) = items
            .iter()
            .partition(|item| lookup_str(item, "type") == Some("skill"));

        let eras = match doc.data_field("eras") {
            Some(Value::Object(eras)) => eras
                .iter()
                .map(|(id, value)| EraEntry {
                    id: id.clone(),
                    enabled: *value == Value::Bool(true),
                })
                .collect(),
            _ => Vec::new(),
        };

        Ok(SetupView {
            skills: sorted_listing(skills.into_iter()),
            other_items: others.into_iter().map(ListedItem::from_value).collect(),
            eras,
            bio_sections: list_field(&doc, "bioSections"),
        })
    }

    /// Add dropped items of the types a setup carries, skipping names already
    /// listed unless the item is a generic "Any" specialization.
    pub async fn drop_items(&self, id: &DocumentId, dropped: &[Value]) -> Result<usize, SheetError> {
        let doc = self.load(id).await?;
        let mut items = list_field(&doc, "items");
        let mut added = 0;
        for item in dropped {
            let allowed = lookup_str(item, "type").is_some_and(|t| SETUP_ITEM_TYPES.contains(&t));
            if !allowed {
                continue;
            }
            if !is_any_spec(item) && items.iter().any(|existing| same_name(existing, item)) {
                continue;
            }
            items.push(item.clone());
            added += 1;
        }
        if added > 0 {
            let mut patch = Patch::new();
            patch.set("data.items", Value::Array(items));
            self.store.commit(id, patch).await?;
        }
        Ok(added)
    }

    /// Remove an item by its `_id`. Returns false when none matches.
    pub async fn remove_item(&self, id: &DocumentId, item_id: &str) -> Result<bool, SheetError> {
        let doc = self.load(id).await?;
        let mut items = list_field(&doc, "items");
        let Some(pos) = items
            .iter()
            .position(|item| lookup_str(item, "_id") == Some(item_id))
        else {
            return Ok(false);
        };
        items.remove(pos);
        let mut patch = Patch::new();
        patch.set("data.items", Value::Array(items));
        self.store.commit(id, patch).await?;
        Ok(true)
    }

    /// Append an empty biography section.
    pub async fn add_bio_section(&self, id: &DocumentId) -> Result<usize, SheetError> {
        let doc = self.load(id).await?;
        let mut sections = list_field(&doc, "bioSections");
        sections.push(Value::Null);
        let count = sections.len();
        let mut patch = Patch::new();
        patch.set("data.bioSections", Value::Array(sections));
        self.store.commit(id, patch).await?;
        Ok(count)
    }

    pub async fn remove_bio_section(&self, id: &DocumentId, index: usize) -> Result<(), SheetError> {
        let doc = self.load(id).await?;
        let mut sections = list_field(&doc, "bioSections");
        if index >= sections.len() {
            return Err(SheetError::IndexOutOfRange {
                collection: "bioSections",
                index,
            });
        }
        sections.remove(index);
        let mut patch = Patch::new();
        patch.set("data.bioSections", Value::Array(sections));
        self.store.commit(id, patch).await
    }

    /// Switch a characteristic mode; points and rolls exclude each other.
    pub async fn set_characteristic_mode(
        &self,
        id: &DocumentId,
        mode: CharacteristicMode,
        enabled: bool,
    ) -> Result<(), SheetError> {
        self.load(id).await?;
        let mut patch = Patch::new();
        patch
            .set(mode.path(), Value::Bool(enabled))
            .set(mode.other().path(), Value::Bool(!enabled));
        self.store.commit(id, patch).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::ports::MockDocumentRepo;
    use crate::test_fixtures::{item_snapshot, skill};
    use coc7_domain::{DocumentKind, FieldEdit};
    use serde_json::json;
    use std::sync::Mutex;

    fn setup(data: Value) -> Document {
        Document::from_snapshot(DocumentKind::Item, &item_snapshot("st1", "1920s", "setup", data))
            .unwrap()
    }

    fn repo(doc: Document, commits: Arc<Mutex<Vec<Patch>>>) -> MockDocumentRepo {
        let mut repo = MockDocumentRepo::new();
        repo.expect_get().returning(move |_, _| Ok(Some(doc.clone())));
        repo.expect_update().returning(move |_, _, patch, _| {
            commits.lock().unwrap().push(patch.clone());
            Ok(())
        });
        repo
    }

    fn last_set(commits: &Arc<Mutex<Vec<Patch>>>, path: &str) -> Option<Value> {
        match commits.lock().unwrap().last().and_then(|p| p.get(path)) {
            Some(FieldEdit::Set(v)) => Some(v.clone()),
            _ => None,
        }
    }

    #[tokio::test]
    async fn test_drop_filters_types_and_duplicates() {
        let commits = Arc::new(Mutex::new(Vec::new()));
        let doc = setup(json!({"items": [skill("s1", "Credit Rating")]}));
        let sheet = SetupSheet::new(Arc::new(repo(doc, commits.clone())));

        let dropped = vec![
            skill("s2", "Credit Rating"),
            json!({"_id": "w1", "name": ".38 Revolver", "type": "weapon", "data": {}}),
            json!({"_id": "o1", "name": "Doctor", "type": "occupation", "data": {}}),
        ];
        let added = sheet.drop_items(&DocumentId::new("st1"), &dropped).await.unwrap();
        assert_eq!(added, 1);
        let items = last_set(&commits, "data.items").unwrap();
        assert_eq!(items[1]["name"], json!(".38 Revolver"));
    }

    #[tokio::test]
    async fn test_nothing_added_commits_nothing() {
        let commits = Arc::new(Mutex::new(Vec::new()));
        let sheet = SetupSheet::new(Arc::new(repo(setup(json!({})), commits.clone())));
        let added = sheet
            .drop_items(&DocumentId::new("st1"), &[json!({"name": "Deep One", "type": "creature"})])
            .await
            .unwrap();
        assert_eq!(added, 0);
        assert!(commits.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bio_sections() {
        let commits = Arc::new(Mutex::new(Vec::new()));
        let doc = setup(json!({"bioSections": ["Personal description"]}));
        let sheet = SetupSheet::new(Arc::new(repo(doc, commits.clone())));
        let id = DocumentId::new("st1");

        assert_eq!(sheet.add_bio_section(&id).await.unwrap(), 2);
        assert_eq!(last_set(&commits, "data.bioSections"), Some(json!(["Personal description", null])));

        sheet.remove_bio_section(&id, 0).await.unwrap();
        assert_eq!(last_set(&commits, "data.bioSections"), Some(json!([])));
        assert!(matches!(
            sheet.remove_bio_section(&id, 4).await,
            Err(SheetError::IndexOutOfRange { index: 4, .. })
        ));
    }

    #[tokio::test]
    async fn test_characteristic_modes_exclude_each_other() {
        let commits = Arc::new(Mutex::new(Vec::new()));
        let sheet = SetupSheet::new(Arc::new(repo(setup(json!({})), commits.clone())));
        sheet
            .set_characteristic_mode(&DocumentId::new("st1"), CharacteristicMode::Points, true)
            .await
            .unwrap();
        assert_eq!(last_set(&commits, "data.characteristics.points.enabled"), Some(json!(true)));
        assert_eq!(last_set(&commits, "data.characteristics.rolls.enabled"), Some(json!(false)));
    }

    #[tokio::test]
    async fn test_view_splits_items_and_lists_eras() {
        let commits = Arc::new(Mutex::new(Vec::new()));
        let doc = setup(json!({
            "items": [
                skill("s1", "Spot Hidden"),
                json!({"_id": "b1", "name": "Necronomicon", "type": "book", "data": {}}),
                skill("s2", "Accounting")
            ],
            "eras": {"standard": true, "pulp": false, "gaslight": {"selected": true}}
        }));
        let sheet = SetupSheet::new(Arc::new(repo(doc, commits)));
        let view = sheet.view(&DocumentId::new("st1")).await.unwrap();

        let skills: Vec<_> = view.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(skills, vec!["Accounting", "Spot Hidden"]);
        assert_eq!(view.other_items.len(), 1);
        let enabled: Vec<_> = view.eras.iter().filter(|e| e.enabled).map(|e| e.id.as_str()).collect();
        assert_eq!(enabled, vec!["standard"]);
    }

    #[tokio::test]
    async fn test_remove_item() {
        let commits = Arc::new(Mutex::new(Vec::new()));
        let doc = setup(json!({"items": [skill("s1", "Spot Hidden")]}));
        let sheet = SetupSheet::new(Arc::new(repo(doc, commits.clone())));
        assert!(sheet.remove_item(&DocumentId::new("st1"), "s1").await.unwrap());
        assert_eq!(last_set(&commits, "data.items"), Some(json!([])));
    }
}
