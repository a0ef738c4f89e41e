//! Entities - host documents and compendium packs as the engine sees them

mod document;
mod pack;

pub use document::{
    ActiveEffect, ActorType, Document, DocumentKind, ItemType, Subtype, TableResult,
};
pub use pack::{PackMetadata, WORLD_PACKAGE};
