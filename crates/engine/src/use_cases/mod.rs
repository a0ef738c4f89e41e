//! Use cases - User story orchestration.
//!
//! Each module contains use cases for a specific area. Use cases hold port
//! trait objects and orchestrate reads and commits through them.

pub mod migration;
pub mod module_versions;
pub mod sheets;
pub mod update_check;

// Re-export main types
pub use migration::{MigrateWorld, MigrationOptions, MigrationReport, MigrationUseCases};
pub use sheets::SheetUseCases;
pub use update_check::{CheckForUpdate, UpdateDecision};
