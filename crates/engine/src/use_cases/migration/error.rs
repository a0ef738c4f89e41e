//! Migration errors.

use crate::infrastructure::ports::RepoError;
use coc7_domain::DomainError;

/// Errors that abort a migration run.
///
/// Per-document failures never surface here; they land in the run report.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Migration requires a game master")]
    NotGameMaster,
    #[error("Validation error: {0}")]
    Validation(#[from] DomainError),
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
