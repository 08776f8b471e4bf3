use notary_archive::{ArchiveError, UniqueKey};
use notary_ledger::LedgerError;
use thiserror::Error;

/// Errors surfaced to the collaborator layer.
///
/// An unknown identifier is not represented here: verification reports it
/// as `valid = false`.
#[derive(Debug, Error)]
pub enum NotaryError {
    /// The content stream could not be read; nothing was persisted.
    #[error("content stream unreadable: {0}")]
    Io(#[from] std::io::Error),

    /// The document (or identifier) is already archived.
    #[error("already archived: duplicate {0}")]
    Duplicate(UniqueKey),

    /// Backing storage failed; the caller may retry.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Stored data failed an integrity check.
    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl NotaryError {
    /// `true` when retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }
}

impl From<LedgerError> for NotaryError {
    fn from(e: LedgerError) -> Self {
        if e.is_transient() {
            Self::StorageUnavailable(e.to_string())
        } else {
            Self::Integrity(e.to_string())
        }
    }
}

impl From<ArchiveError> for NotaryError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::DuplicateKey(key) => Self::Duplicate(key),
            ArchiveError::Unavailable(msg) => Self::StorageUnavailable(msg),
            other => Self::Integrity(other.to_string()),
        }
    }
}

pub type NotaryResult<T> = Result<T, NotaryError>;
