use std::fmt;

/// Which uniqueness constraint an insert violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniqueKey {
    Fingerprint,
    Identifier,
}

impl fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fingerprint => f.write_str("fingerprint"),
            Self::Identifier => f.write_str("identifier"),
        }
    }
}

/// Errors from archive store operations.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    /// A unique column already holds this value.
    #[error("duplicate {0}: already archived")]
    DuplicateKey(UniqueKey),

    /// A verification referenced an archive entry that does not exist.
    #[error("archive entry {0} does not exist")]
    UnknownArchive(i64),

    /// A stored row could not be decoded.
    #[error("corrupt archive row: {0}")]
    Corrupt(String),

    /// The backing storage cannot serve the request right now.
    #[error("archive storage unavailable: {0}")]
    Unavailable(String),
}

impl From<rusqlite::Error> for ArchiveError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Unavailable(e.to_string())
    }
}

/// Result alias for archive store operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;
