//! Occupation sheet operations.

use std::sync::Arc;

use coc7_domain::common::{is_truthy, lookup, lookup_str, to_js_string};
use coc7_domain::{Document, DocumentId, ItemType, Patch};
use serde::Serialize;
use serde_json::{json, Value};

use crate::infrastructure::ports::DocumentRepo;

use super::{is_any_spec, list_field, same_name, sorted_listing, ItemStore, ListedItem, SheetError};

/// Where dropped skills land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillDropTarget {
    /// The mandatory skill list.
    Main,
    /// An optional group, by position.
    Group(usize),
}

/// One optional skill group as the sheet shows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    pub options: Value,
    pub skills: Vec<ListedItem>,
    pub is_empty: bool,
}

/// Read model of an occupation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccupationView {
    pub skills: Vec<ListedItem>,
    pub groups: Vec<GroupView>,
    /// Skill point formula, e.g. `EDUx2 + (DEXx2 or STRx2)`.
    pub points_formula: String,
}

/// Occupation sheet use case.
pub struct OccupationSheet {
    store: ItemStore,
}

impl OccupationSheet {
    pub fn new(documents: Arc<dyn DocumentRepo>) -> Self {
        Self {
            store: ItemStore { documents },
        }
    }

    async fn load(&self, id: &DocumentId) -> Result<Document, SheetError> {
        self.store.load(id, ItemType::Occupation).await
    }

    pub async fn view(&self, id: &DocumentId) -> Result<OccupationView, SheetError> {
        let doc = self.load(id).await?;
        let groups = list_field(&doc, "groups")
            .iter()
            .map(|group| {
                let skills = group
                    .get("skills")
                    .and_then(Value::as_array)
                    .map(|skills| sorted_listing(skills.iter()))
                    .unwrap_or_default();
                GroupView {
                    options: group.get("options").cloned().unwrap_or(json!(0)),
                    is_empty: skills.is_empty(),
                    skills,
                }
            })
            .collect();
        Ok(OccupationView {
            skills: sorted_listing(list_field(&doc, "skills").iter()),
            groups,
            points_formula: points_formula(doc.data_field("occupationSkillPoints")),
        })
    }

    /// Add dropped skills. Non-skills are ignored; a skill already listed by
    /// name is ignored unless it is a generic "Any" specialization. Adding to
    /// the main list takes the skill out of every group.
    ///
    /// Returns how many skills were added.
    pub async fn drop_skills(
        &self,
        id: &DocumentId,
        dropped: &[Value],
        target: SkillDropTarget,
    ) -> Result<usize, SheetError> {
        let doc = self.load(id).await?;
        let mut skills = list_field(&doc, "skills");
        let mut groups = list_field(&doc, "groups");
        if let SkillDropTarget::Group(index) = target {
            if index >= groups.len() {
                return Err(SheetError::IndexOutOfRange {
                    collection: "groups",
                    index,
                });
            }
        }

        let mut added = 0;
        let mut groups_changed = false;
        for skill in dropped {
            if lookup_str(skill, "type") != Some("skill") {
                continue;
            }
            let generic = is_any_spec(skill);
            if !generic && skills.iter().any(|s| same_name(s, skill)) {
                continue;
            }
            match target {
                SkillDropTarget::Group(index) => {
                    let group_skills = group_skills_mut(&mut groups[index]).ok_or(
                        SheetError::MalformedEntry {
                            collection: "groups",
                            index,
                        },
                    )?;
                    if !generic && group_skills.iter().any(|s| same_name(s, skill)) {
                        continue;
                    }
                    group_skills.push(skill.clone());
                    groups_changed = true;
                }
                SkillDropTarget::Main => {
                    if !generic {
                        for group_skills in groups.iter_mut().filter_map(group_skills_mut) {
                            if let Some(pos) = group_skills.iter().position(|s| same_name(s, skill)) {
                                group_skills.remove(pos);
                                groups_changed = true;
                            }
                        }
                    }
                    skills.push(skill.clone());
                }
            }
            added += 1;
        }

        let mut patch = Patch::new();
        if groups_changed {
            patch.set("data.groups", Value::Array(groups));
        }
        if target == SkillDropTarget::Main && added > 0 {
            patch.set("data.skills", Value::Array(skills));
        }
        self.store.commit(id, patch).await?;
        tracing::debug!(item_id = %id, added, ?target, "Dropped skills on occupation");
        Ok(added)
    }

    pub async fn add_group(&self, id: &DocumentId) -> Result<usize, SheetError> {
        let doc = self.load(id).await?;
        let mut groups = list_field(&doc, "groups");
        groups.push(json!({"options": 0, "skills": []}));
        let count = groups.len();
        let mut patch = Patch::new();
        patch.set("data.groups", Value::Array(groups));
        self.store.commit(id, patch).await?;
        Ok(count)
    }

    pub async fn remove_group(&self, id: &DocumentId, index: usize) -> Result<(), SheetError> {
        let doc = self.load(id).await?;
        let mut groups = list_field(&doc, "groups");
        if index >= groups.len() {
            return Err(SheetError::IndexOutOfRange {
                collection: "groups",
                index,
            });
        }
        groups.remove(index);
        let mut patch = Patch::new();
        patch.set("data.groups", Value::Array(groups));
        self.store.commit(id, patch).await
    }

    /// Delete the skill at `skill_index` of group `group_index`.
    pub async fn remove_group_skill(
        &self,
        id: &DocumentId,
        group_index: usize,
        skill_index: usize,
    ) -> Result<(), SheetError> {
        let doc = self.load(id).await?;
        let mut groups = list_field(&doc, "groups");
        let group = groups.get_mut(group_index).ok_or(SheetError::IndexOutOfRange {
            collection: "groups",
            index: group_index,
        })?;
        let skills = group_skills_mut(group).ok_or(SheetError::MalformedEntry {
            collection: "groups",
            index: group_index,
        })?;
        if skill_index >= skills.len() {
            return Err(SheetError::IndexOutOfRange {
                collection: "group skills",
                index: skill_index,
            });
        }
        skills.remove(skill_index);
        let mut patch = Patch::new();
        patch.set("data.groups", Value::Array(groups));
        self.store.commit(id, patch).await
    }

    /// Remove a main-list skill by its `_id`. Returns false when no skill
    /// has that id.
    pub async fn remove_skill(&self, id: &DocumentId, skill_id: &str) -> Result<bool, SheetError> {
        let doc = self.load(id).await?;
        let mut skills = list_field(&doc, "skills");
        let Some(pos) = skills
            .iter()
            .position(|s| lookup_str(s, "_id") == Some(skill_id))
        else {
            return Ok(false);
        };
        skills.remove(pos);
        let mut patch = Patch::new();
        patch.set("data.skills", Value::Array(skills));
        self.store.commit(id, patch).await?;
        Ok(true)
    }
}

/// The `skills` list of a group, created when missing. `None` when the
/// group itself is not an object.
fn group_skills_mut(group: &mut Value) -> Option<&mut Vec<Value>> {
    let skills = group
        .as_object_mut()?
        .entry("skills")
        .or_insert_with(|| Value::Array(Vec::new()));
    if !skills.is_array() {
        *skills = Value::Array(Vec::new());
    }
    skills.as_array_mut()
}

/// `mandatory + (opt1 or opt2)` from the selected characteristics.
fn points_formula(points: Option<&Value>) -> String {
    let Some(Value::Object(points)) = points else {
        return String::new();
    };
    let mut mandatory = Vec::new();
    let mut optional = Vec::new();
    for (key, characteristic) in points {
        let Some(multiplier) = characteristic.get("multiplier").filter(|m| is_truthy(m)) else {
            continue;
        };
        if !lookup(characteristic, "selected").is_some_and(is_truthy) {
            continue;
        }
        let term = format!("{}x{}", key.to_uppercase(), to_js_string(multiplier));
        if lookup(characteristic, "optional").is_some_and(is_truthy) {
            optional.push(term);
        } else {
            mandatory.push(term);
        }
    }

    let mut formula = mandatory.join(" + ");
    match (mandatory.is_empty(), optional.is_empty()) {
        (false, false) => formula.push_str(&format!(" + ({})", optional.join(" or "))),
        (true, false) => formula.push_str(&optional.join(" or ")),
        _ => {}
    }
    formula
}
