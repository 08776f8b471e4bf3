use notary_types::{
    ArchiveEntry, ArchiveStats, Fingerprint, Identifier, NewArchiveEntry, NewVerification,
    VerificationEntry,
};

use crate::error::ArchiveResult;

/// Durable record of notarizations and verification attempts.
///
/// All implementations must satisfy these invariants:
/// - `insert` rejects a second entry with the same fingerprint or identifier
///   with `ArchiveError::DuplicateKey` and stores nothing.
/// - Each call is atomic; concurrent readers see either none or all of a
///   write.
/// - Nothing is ever updated or deleted.
pub trait ArchiveStore: Send + Sync {
    /// Store a new entry and return it with its assigned key.
    fn insert(&self, entry: NewArchiveEntry) -> ArchiveResult<ArchiveEntry>;

    fn find_by_identifier(&self, identifier: &Identifier) -> ArchiveResult<Option<ArchiveEntry>>;

    fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> ArchiveResult<Option<ArchiveEntry>>;

    /// Every entry, most recently submitted first (ties: highest key first).
    fn list_all(&self) -> ArchiveResult<Vec<ArchiveEntry>>;

    /// Append one row to the audit trail.
    ///
    /// A linked `archive_entry_id` must exist, otherwise
    /// `ArchiveError::UnknownArchive`.
    fn record_verification(&self, verification: NewVerification)
        -> ArchiveResult<VerificationEntry>;

    /// Audit trail of one archive entry, oldest first.
    fn verifications_for(&self, archive_id: i64) -> ArchiveResult<Vec<VerificationEntry>>;

    fn stats(&self) -> ArchiveResult<ArchiveStats>;
}
