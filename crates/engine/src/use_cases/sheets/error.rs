//! Item sheet operation errors.

use crate::infrastructure::ports::RepoError;
use coc7_domain::DocumentId;

/// Errors that can occur during item sheet operations.
#[derive(Debug, thiserror::Error)]
pub enum SheetError {
    #[error("Item not found: {0}")]
    ItemNotFound(DocumentId),
    #[error("Item {id} is a {found}, expected a {expected}")]
    WrongItemType {
        id: DocumentId,
        expected: &'static str,
        found: String,
    },
    #[error("No entry {index} in {collection}")]
    IndexOutOfRange {
        collection: &'static str,
        index: usize,
    },
    #[error("Entry {index} of {collection} is malformed")]
    MalformedEntry {
        collection: &'static str,
        index: usize,
    },
    #[error("Repository error: {0}")]
    Repo(#[from] RepoError),
}
