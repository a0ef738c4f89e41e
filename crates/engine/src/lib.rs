//! CoC7 Engine library.
//!
//! Brings a world's stored documents up to the current system schema, decides
//! when that is needed, and serves the occupation and setup item sheets.
//!
//! ## Structure
//!
//! - `use_cases/` - Migration pipeline, update gate, item sheet operations
//! - `infrastructure/` - External dependency implementations (ports + adapters)
//! - `app` - Application composition

pub mod app;
pub mod infrastructure;
pub mod use_cases;

/// Test fixtures module for integration testing.
#[cfg(test)]
pub mod test_fixtures;

pub use app::App;
