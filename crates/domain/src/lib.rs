extern crate self as coc7_domain;

pub mod common;
pub mod entities;
pub mod error;
pub mod ids;
pub mod value_objects;

// Re-export entities
pub use entities::{
    ActiveEffect, ActorType, Document, DocumentKind, ItemType, PackMetadata, Subtype,
    TableResult, WORLD_PACKAGE,
};

pub use error::DomainError;

// Re-export ID types
pub use ids::{DocumentId, MigrationRunId};

// Re-export value objects
pub use value_objects::{
    condition_for_icon_stem, ConditionId, EmbeddedPatch, FieldEdit, FieldPath, Patch, PatchOp,
    ReleaseVersion, VersionParseError, DELETION_PREFIX, STATUS_ICON_CONDITIONS,
};
