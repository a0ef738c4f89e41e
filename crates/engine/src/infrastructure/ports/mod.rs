//! Port traits for infrastructure boundaries.
//!
//! These are the ONLY abstractions in the engine. Everything else is concrete types.
//! Ports exist for:
//! - World documents and compendium packs (the host's persistence layer)
//! - Settings storage (version tracking, rule flags)
//! - Host session facts (installed versions, user role)
//! - Clock (for testing)

mod error;
mod host;
mod repos;
mod testing;

// =============================================================================
// Repository Ports
// =============================================================================
pub use repos::{DocumentRepo, PackRepo, SettingsRepo, UpdateOptions};

// =============================================================================
// Host Ports
// =============================================================================
pub use host::HostInfoPort;

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use repos::{MockDocumentRepo, MockPackRepo, MockSettingsRepo};

#[cfg(test)]
pub use host::MockHostInfoPort;

#[cfg(test)]
pub use testing::MockClockPort;

// =============================================================================
// Testing Ports
// =============================================================================
pub use testing::ClockPort;

// =============================================================================
// Error Types
// =============================================================================
pub use error::RepoError;
