//! Differential update (patch) value object
//!
//! A patch is an ordered list of `(path, Set(value) | Delete)` operations.
//! Paths are unique: writing a path that is already present replaces the
//! pending edit in place (last writer wins). A `Delete` removes the field;
//! it is distinct from setting the field to `null`.
//!
//! Embedded item patches (for items owned by an actor) are carried next to
//! the operations and keyed by the embedded item's id.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::FieldPath;
use crate::error::DomainError;
use crate::ids::DocumentId;

/// Host marker prefixed to the last path segment of a deletion.
pub const DELETION_PREFIX: &str = "-=";

/// A single field edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum FieldEdit {
    Set(Value),
    Delete,
}

/// One operation of a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOp {
    pub path: FieldPath,
    pub edit: FieldEdit,
}

/// Patch for an item embedded in its owning document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedPatch {
    pub id: DocumentId,
    pub patch: Patch,
}

/// Sparse set of field-level edits for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    ops: Vec<PatchOp>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    embedded: Vec<EmbeddedPatch>,
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `path` to `value`, replacing any pending edit for the same path.
    pub fn set(&mut self, path: impl Into<FieldPath>, value: Value) -> &mut Self {
        self.upsert(path.into(), FieldEdit::Set(value));
        self
    }

    /// Mark `path` for removal, replacing any pending edit for the same path.
    pub fn delete(&mut self, path: impl Into<FieldPath>) -> &mut Self {
        self.upsert(path.into(), FieldEdit::Delete);
        self
    }

    fn upsert(&mut self, path: FieldPath, edit: FieldEdit) {
        match self.ops.iter_mut().find(|op| op.path == path) {
            Some(existing) => existing.edit = edit,
            None => self.ops.push(PatchOp { path, edit }),
        }
    }

    /// The pending edit for an exact path.
    pub fn get(&self, path: &str) -> Option<&FieldEdit> {
        self.ops
            .iter()
            .find(|op| op.path.as_str() == path)
            .map(|op| &op.edit)
    }

    /// The pending value for an exact path, if it is being set.
    pub fn pending_value(&self, path: &str) -> Option<&Value> {
        match self.get(path) {
            Some(FieldEdit::Set(value)) => Some(value),
            _ => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Merge `other` into `self`; edits from `other` win on path collision.
    pub fn merge(&mut self, other: Patch) {
        for op in other.ops {
            self.upsert(op.path, op.edit);
        }
        for embedded in other.embedded {
            self.attach_embedded(embedded.id, embedded.patch);
        }
    }

    /// Attach a patch for an embedded item. Empty patches are dropped.
    pub fn attach_embedded(&mut self, id: DocumentId, patch: Patch) {
        if patch.is_empty() {
            return;
        }
        match self.embedded.iter_mut().find(|e| e.id == id) {
            Some(existing) => existing.patch.merge(patch),
            None => self.embedded.push(EmbeddedPatch { id, patch }),
        }
    }

    pub fn ops(&self) -> &[PatchOp] {
        &self.ops
    }

    pub fn embedded(&self) -> &[EmbeddedPatch] {
        &self.embedded
    }

    /// True when no rule produced an edit; callers skip the commit.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty() && self.embedded.is_empty()
    }

    /// Number of field edits, including those of embedded patches.
    pub fn len(&self) -> usize {
        self.ops.len() + self.embedded.iter().map(|e| e.patch.len()).sum::<usize>()
    }

    /// Render the host update object.
    ///
    /// Sets use dotted keys. Deletions prefix the last segment with `-=` and
    /// carry `null`. Embedded patches are expanded into nested objects under
    /// `items`, each tagged with its `_id`.
    pub fn to_update_object(&self) -> Value {
        let mut map = Map::new();
        for op in &self.ops {
            match &op.edit {
                FieldEdit::Set(value) => {
                    map.insert(op.path.to_string(), value.clone());
                }
                FieldEdit::Delete => {
                    map.insert(deletion_key(&op.path), Value::Null);
                }
            }
        }
        if !self.embedded.is_empty() {
            let items = self
                .embedded
                .iter()
                .map(|embedded| {
                    let mut expanded = match embedded.patch.to_update_object() {
                        Value::Object(flat) => expand_object(flat),
                        _ => Map::new(),
                    };
                    expanded.insert("_id".to_string(), Value::String(embedded.id.to_string()));
                    Value::Object(expanded)
                })
                .collect();
            map.insert("items".to_string(), Value::Array(items));
        }
        Value::Object(map)
    }

    /// Apply the patch to a plain snapshot, in operation order.
    ///
    /// Missing intermediate objects are created for sets. Deleting a field
    /// that does not exist is a no-op. Sequence positions must already exist.
    pub fn apply_to(&self, target: &mut Value) -> Result<(), DomainError> {
        for op in &self.ops {
            match &op.edit {
                FieldEdit::Set(value) => set_path(target, &op.path, value.clone())?,
                FieldEdit::Delete => delete_path(target, &op.path),
            }
        }
        for embedded in &self.embedded {
            let item = target
                .get_mut("items")
                .and_then(Value::as_array_mut)
                .and_then(|items| {
                    items.iter_mut().find(|item| {
                        item.get("_id").and_then(Value::as_str) == Some(embedded.id.as_str())
                    })
                })
                .ok_or_else(|| DomainError::not_found("EmbeddedItem", embedded.id.as_str()))?;
            embedded.patch.apply_to(item)?;
        }
        Ok(())
    }
}

fn deletion_key(path: &FieldPath) -> String {
    match path.split_last() {
        ("", last) => format!("{DELETION_PREFIX}{last}"),
        (parent, last) => format!("{parent}.{DELETION_PREFIX}{last}"),
    }
}

/// Expand dotted keys into nested objects.
pub fn expand_object(flat: Map<String, Value>) -> Map<String, Value> {
    let mut root = Map::new();
    for (key, value) in flat {
        let segments: Vec<&str> = key.split('.').collect();
        insert_nested(&mut root, &segments, value);
    }
    root
}

fn insert_nested(map: &mut Map<String, Value>, segments: &[&str], value: Value) {
    match segments {
        [] => {}
        [last] => {
            map.insert(last.to_string(), value);
        }
        [first, rest @ ..] => {
            let entry = map
                .entry(first.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_nested(child, rest, value);
            }
        }
    }
}

fn descend_mut<'a>(
    value: &'a mut Value,
    segment: &str,
    path: &FieldPath,
) -> Result<&'a mut Value, DomainError> {
    if !matches!(value, Value::Object(_) | Value::Array(_)) {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Array(items) => {
            let len = items.len();
            let index = segment.parse::<usize>().map_err(|_| {
                DomainError::patch_conflict(path.as_str(), format!("'{segment}' is not a position"))
            })?;
            items.get_mut(index).ok_or_else(|| {
                DomainError::patch_conflict(
                    path.as_str(),
                    format!("position {index} out of bounds (len {len})"),
                )
            })
        }
        Value::Object(map) => {
            let entry = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !matches!(entry, Value::Object(_) | Value::Array(_)) {
                *entry = Value::Object(Map::new());
            }
            Ok(entry)
        }
        _ => Err(DomainError::patch_conflict(path.as_str(), "not a container")),
    }
}

fn set_path(root: &mut Value, path: &FieldPath, value: Value) -> Result<(), DomainError> {
    let (parent, last) = path.split_last();
    let mut current = root;
    if !parent.is_empty() {
        for segment in parent.split('.') {
            current = descend_mut(current, segment, path)?;
        }
    }
    if !matches!(current, Value::Object(_) | Value::Array(_)) {
        *current = Value::Object(Map::new());
    }
    match current {
        Value::Object(map) => {
            map.insert(last.to_string(), value);
            Ok(())
        }
        Value::Array(items) => {
            let len = items.len();
            let slot = last
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get_mut(index))
                .ok_or_else(|| {
                    DomainError::patch_conflict(
                        path.as_str(),
                        format!("position '{last}' out of bounds (len {len})"),
                    )
                })?;
            *slot = value;
            Ok(())
        }
        _ => Err(DomainError::patch_conflict(path.as_str(), "not a container")),
    }
}

fn lookup_mut<'a>(value: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get_mut(segment),
        Value::Array(items) => segment
            .parse::<usize>()
            .ok()
            .and_then(move |index| items.get_mut(index)),
        _ => None,
    })
}

fn delete_path(root: &mut Value, path: &FieldPath) {
    let (parent, last) = path.split_last();
    if let Some(Value::Object(map)) = lookup_mut(root, parent) {
        map.remove(last);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_last_writer_wins_keeps_position() {
        let mut patch = Patch::new();
        patch.set("data.a", json!(1));
        patch.set("data.b", json!(2));
        patch.set("data.a", json!(3));
        assert_eq!(patch.ops().len(), 2);
        assert_eq!(patch.ops()[0].path.as_str(), "data.a");
        assert_eq!(patch.pending_value("data.a"), Some(&json!(3)));
    }

    #[test]
    fn test_delete_overrides_pending_set() {
        let mut patch = Patch::new();
        patch.set("data.keeperNotes", json!(""));
        patch.delete("data.keeperNotes");
        assert_eq!(patch.get("data.keeperNotes"), Some(&FieldEdit::Delete));
        assert_eq!(patch.pending_value("data.keeperNotes"), None);
    }

    #[test]
    fn test_update_object_uses_deletion_markers() {
        let mut patch = Patch::new();
        patch.set("img", json!("systems/CoC7/assets/icons/a.svg"));
        patch.delete("data.cost");
        patch.delete("data.description.notes");
        patch.delete("effects");

        let update = patch.to_update_object();
        assert_eq!(update["img"], json!("systems/CoC7/assets/icons/a.svg"));
        assert_eq!(update["data.-=cost"], Value::Null);
        assert_eq!(update["data.description.-=notes"], Value::Null);
        assert_eq!(update["-=effects"], Value::Null);
    }

    #[test]
    fn test_update_object_expands_embedded_items() {
        let mut item_patch = Patch::new();
        item_patch.set("data.adjustments.experience", json!(0));
        let mut patch = Patch::new();
        patch.attach_embedded(DocumentId::new("item1"), item_patch);

        let update = patch.to_update_object();
        assert_eq!(
            update["items"],
            json!([{"_id": "item1", "data": {"adjustments": {"experience": 0}}}])
        );
    }

    #[test]
    fn test_empty_embedded_patch_is_dropped() {
        let mut patch = Patch::new();
        patch.attach_embedded(DocumentId::new("item1"), Patch::new());
        assert!(patch.is_empty());
    }

    #[test]
    fn test_len_counts_embedded_edits() {
        let mut item_patch = Patch::new();
        item_patch.set("a", json!(1)).set("b", json!(2));
        let mut patch = Patch::new();
        patch.set("img", json!("x"));
        patch.attach_embedded(DocumentId::new("i"), item_patch);
        assert_eq!(patch.len(), 3);
    }

    #[test]
    fn test_apply_creates_intermediate_objects() {
        let mut doc = json!({"data": {}});
        let mut patch = Patch::new();
        patch.set("data.conditions.dying.value", json!(true));
        patch.apply_to(&mut doc).unwrap();
        assert_eq!(doc["data"]["conditions"]["dying"]["value"], json!(true));
    }

    #[test]
    fn test_apply_sets_sequence_positions() {
        let mut doc = json!({"effects": [{"icon": "old"}, {"icon": "other"}]});
        let mut patch = Patch::new();
        patch.set("effects.1.icon", json!("new"));
        patch.set("effects.0.flags.core.statusId", json!("dead"));
        patch.apply_to(&mut doc).unwrap();
        assert_eq!(doc["effects"][1]["icon"], json!("new"));
        assert_eq!(doc["effects"][0]["flags"]["core"]["statusId"], json!("dead"));
    }

    #[test]
    fn test_apply_out_of_bounds_position_fails() {
        let mut doc = json!({"results": []});
        let mut patch = Patch::new();
        patch.set("results.0.img", json!("x"));
        assert!(matches!(
            patch.apply_to(&mut doc),
            Err(DomainError::PatchConflict { .. })
        ));
    }

    #[test]
    fn test_apply_delete_is_distinct_from_null() {
        let mut doc = json!({"data": {"status": {}, "notes": "x"}});
        let mut patch = Patch::new();
        patch.delete("data.status");
        patch.set("data.notes", Value::Null);
        patch.delete("data.never");
        patch.apply_to(&mut doc).unwrap();
        assert!(doc["data"].get("status").is_none());
        assert_eq!(doc["data"].get("notes"), Some(&Value::Null));
    }

    #[test]
    fn test_apply_embedded_patch_targets_item_by_id() {
        let mut doc = json!({"items": [{"_id": "a", "data": {}}, {"_id": "b", "data": {}}]});
        let mut item_patch = Patch::new();
        item_patch.set("data.adjustments.experience", json!(0));
        let mut patch = Patch::new();
        patch.attach_embedded(DocumentId::new("b"), item_patch);
        patch.apply_to(&mut doc).unwrap();
        assert!(doc["items"][0]["data"].get("adjustments").is_none());
        assert_eq!(doc["items"][1]["data"]["adjustments"]["experience"], json!(0));
    }

    #[test]
    fn test_expand_object_nests_dotted_keys() {
        let mut flat = Map::new();
        flat.insert("data.description.-=notes".to_string(), Value::Null);
        flat.insert("data.costs.sanity".to_string(), json!(2));
        let expanded = expand_object(flat);
        assert_eq!(
            Value::Object(expanded),
            json!({"data": {"description": {"-=notes": null}, "costs": {"sanity": 2}}})
        );
    }
}
