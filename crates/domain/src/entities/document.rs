//! Document snapshot entity - a read-only view of a host document
//!
//! The host runtime owns the canonical record. The engine reads a snapshot,
//! classifies it by kind and subtype, and proposes a [`Patch`] against it.
//! System data (`data`) stays a loosely-typed tree because it spans several
//! schema versions at once; the envelope fields the rules walk (artwork,
//! token, effects, embedded items, table results) are typed.
//!
//! [`Patch`]: crate::value_objects::Patch

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::common::lookup;
use crate::error::DomainError;
use crate::ids::DocumentId;

/// Top-level document collections the engine migrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentKind {
    Actor,
    Item,
    RollTable,
    Macro,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 4] = [
        DocumentKind::Actor,
        DocumentKind::Item,
        DocumentKind::RollTable,
        DocumentKind::Macro,
    ];

    /// Host entity name, as used in compendium metadata.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Actor => "Actor",
            DocumentKind::Item => "Item",
            DocumentKind::RollTable => "RollTable",
            DocumentKind::Macro => "Macro",
        }
    }

    pub fn from_entity_name(name: &str) -> Option<Self> {
        match name {
            "Actor" => Some(DocumentKind::Actor),
            "Item" => Some(DocumentKind::Item),
            "RollTable" => Some(DocumentKind::RollTable),
            "Macro" => Some(DocumentKind::Macro),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Actor subtypes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActorType {
    Character,
    Npc,
    Creature,
    Container,
    Other(String),
}

impl ActorType {
    pub fn parse(s: &str) -> Self {
        match s {
            "character" => ActorType::Character,
            "npc" => ActorType::Npc,
            "creature" => ActorType::Creature,
            "container" => ActorType::Container,
            other => ActorType::Other(other.to_string()),
        }
    }
}

/// Item subtypes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    Archetype,
    Book,
    Chase,
    Item,
    Occupation,
    Setup,
    Skill,
    Spell,
    Status,
    Talent,
    Weapon,
    Other(String),
}

impl ItemType {
    pub fn parse(s: &str) -> Self {
        match s {
            "archetype" => ItemType::Archetype,
            "book" => ItemType::Book,
            "chase" => ItemType::Chase,
            "item" => ItemType::Item,
            "occupation" => ItemType::Occupation,
            "setup" => ItemType::Setup,
            "skill" => ItemType::Skill,
            "spell" => ItemType::Spell,
            "status" => ItemType::Status,
            "talent" => ItemType::Talent,
            "weapon" => ItemType::Weapon,
            other => ItemType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ItemType::Archetype => "archetype",
            ItemType::Book => "book",
            ItemType::Chase => "chase",
            ItemType::Item => "item",
            ItemType::Occupation => "occupation",
            ItemType::Setup => "setup",
            ItemType::Skill => "skill",
            ItemType::Spell => "spell",
            ItemType::Status => "status",
            ItemType::Talent => "talent",
            ItemType::Weapon => "weapon",
            ItemType::Other(s) => s,
        }
    }
}

/// Kind-specific subtype of a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subtype {
    Actor(ActorType),
    Item(ItemType),
    /// Tables and macros, or a document without a `type`.
    Untyped,
}

impl Subtype {
    pub fn parse(kind: DocumentKind, type_name: Option<&str>) -> Self {
        match (kind, type_name) {
            (DocumentKind::Actor, Some(t)) => Subtype::Actor(ActorType::parse(t)),
            (DocumentKind::Item, Some(t)) => Subtype::Item(ItemType::parse(t)),
            _ => Subtype::Untyped,
        }
    }
}

/// An active effect on an actor, as far as migration cares.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ActiveEffect {
    pub icon: Option<String>,
    /// `flags.core.statusId`
    pub status_id: Option<String>,
}

/// A roll table result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableResult {
    pub img: Option<String>,
}

/// Read-only snapshot of a host document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub kind: DocumentKind,
    pub id: DocumentId,
    pub name: String,
    pub subtype: Subtype,
    pub img: Option<String>,
    /// System data; `Null` when the snapshot carries none.
    pub data: Value,
    /// Prototype token, for actors.
    pub token: Option<Value>,
    pub effects: Vec<ActiveEffect>,
    /// Embedded items, for actors. Entries without an `_id` are not listed.
    pub items: Vec<Document>,
    pub results: Vec<TableResult>,
}

impl Document {
    /// Read a plain host snapshot.
    ///
    /// Fails only when the snapshot is not an object or has no string `_id`.
    pub fn from_snapshot(kind: DocumentKind, snapshot: &Value) -> Result<Self, DomainError> {
        let obj = snapshot
            .as_object()
            .ok_or_else(|| DomainError::invalid_snapshot(format!("{kind} snapshot is not an object")))?;
        let id = obj
            .get("_id")
            .and_then(Value::as_str)
            .ok_or_else(|| DomainError::invalid_snapshot(format!("{kind} snapshot has no _id")))?;
        let name = obj
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let subtype = Subtype::parse(kind, obj.get("type").and_then(Value::as_str));

        let effects = obj
            .get("effects")
            .and_then(Value::as_array)
            .map(|effects| {
                effects
                    .iter()
                    .map(|effect| ActiveEffect {
                        icon: string_field(effect, "icon"),
                        status_id: string_field(effect, "flags.core.statusId"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let items = obj
            .get("items")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| Document::from_snapshot(DocumentKind::Item, item).ok())
                    .collect()
            })
            .unwrap_or_default();

        let results = obj
            .get("results")
            .and_then(Value::as_array)
            .map(|results| {
                results
                    .iter()
                    .map(|result| TableResult {
                        img: string_field(result, "img"),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            kind,
            id: DocumentId::new(id),
            name,
            subtype,
            img: obj.get("img").and_then(Value::as_str).map(str::to_string),
            data: obj.get("data").cloned().unwrap_or(Value::Null),
            token: obj.get("token").cloned(),
            effects,
            items,
            results,
        })
    }

    /// A field of system data by dotted path, relative to `data`.
    pub fn data_field(&self, path: &str) -> Option<&Value> {
        lookup(&self.data, path)
    }

    /// True when the system data has a key at `path` (even if `null`).
    pub fn has_data_field(&self, path: &str) -> bool {
        self.data_field(path).is_some()
    }

    pub fn item_type(&self) -> Option<&ItemType> {
        match &self.subtype {
            Subtype::Item(t) => Some(t),
            _ => None,
        }
    }

    pub fn actor_type(&self) -> Option<&ActorType> {
        match &self.subtype {
            Subtype::Actor(t) => Some(t),
            _ => None,
        }
    }

    /// Prototype token artwork.
    pub fn token_img(&self) -> Option<&str> {
        self.token
            .as_ref()
            .and_then(|token| token.get("img"))
            .and_then(Value::as_str)
    }
}

fn string_field(value: &Value, path: &str) -> Option<String> {
    lookup(value, path).and_then(Value::as_str).map(str::to_string)
}
