//! Value objects - Immutable objects defined by their attributes

mod condition;
mod field_path;
mod patch;
mod version;

pub use condition::{condition_for_icon_stem, ConditionId, STATUS_ICON_CONDITIONS};
pub use field_path::FieldPath;
pub use patch::{expand_object, EmbeddedPatch, FieldEdit, Patch, PatchOp, DELETION_PREFIX};
pub use version::{ReleaseVersion, VersionParseError};
