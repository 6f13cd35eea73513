use std::path::PathBuf;
use thiserror::Error;

use crate::types::Revision;

pub type Result<T> = std::result::Result<T, RevtreeError>;

#[derive(Debug, Error)]
pub enum RevtreeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Revision graph not found: {0}")]
    NotFound(PathBuf),

    #[error("Branch has no revisions: {0}")]
    EmptyBranch(String),

    #[error("Revision {0} appears more than once")]
    DuplicateRevision(Revision),

    #[error("Tree must be built before it is rendered")]
    NotBuilt,
}

impl RevtreeError {
    /// Whether this error means the graph source does not exist, as opposed
    /// to existing but failing to load.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RevtreeError::NotFound(_))
    }
}
