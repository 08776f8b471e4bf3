use serde::{Deserialize, Serialize};

use crate::{Fingerprint, Identifier, Timestamp};

/// Durable metadata describing one notarized document.
///
/// `fingerprint` and `identifier` are each unique across all entries: a
/// byte-identical document, or a given ledger identifier, is archived at
/// most once.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Surrogate key assigned by the archive store.
    pub id: i64,
    pub filename: String,
    pub fingerprint: Fingerprint,
    /// Reference into the ledger.
    pub identifier: Identifier,
    pub submitted_at: Timestamp,
    pub size_bytes: u64,
    /// Filename extension without the leading dot, empty when absent.
    pub file_type: String,
    pub submitted_by: String,
}

/// An archive entry before the store has assigned its surrogate key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArchiveEntry {
    pub filename: String,
    pub fingerprint: Fingerprint,
    pub identifier: Identifier,
    pub submitted_at: Timestamp,
    pub size_bytes: u64,
    pub file_type: String,
    pub submitted_by: String,
}

impl NewArchiveEntry {
    /// Attach the store-assigned key.
    pub fn with_id(self, id: i64) -> ArchiveEntry {
        ArchiveEntry {
            id,
            filename: self.filename,
            fingerprint: self.fingerprint,
            identifier: self.identifier,
            submitted_at: self.submitted_at,
            size_bytes: self.size_bytes,
            file_type: self.file_type,
            submitted_by: self.submitted_by,
        }
    }
}

/// Extension of `filename` (text after the last `.`), or `""`.
///
/// A leading dot alone (`.bashrc`) does not count as an extension.
pub fn file_type_of(filename: &str) -> String {
    match filename.rfind('.') {
        Some(0) | None => String::new(),
        Some(pos) => filename[pos + 1..].to_string(),
    }
}

/// One verification attempt in the audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationEntry {
    pub id: i64,
    /// `None` when the presented identifier did not resolve to an archive.
    pub archive_entry_id: Option<i64>,
    /// The identifier exactly as presented by the verifier.
    pub identifier: Identifier,
    pub outcome: bool,
    pub computed_fingerprint: Fingerprint,
    pub verified_by: String,
    pub verified_at: Timestamp,
}

/// A verification attempt before the store has assigned its key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVerification {
    pub archive_entry_id: Option<i64>,
    pub identifier: Identifier,
    pub outcome: bool,
    pub computed_fingerprint: Fingerprint,
    pub verified_by: String,
    pub verified_at: Timestamp,
}

impl NewVerification {
    pub fn with_id(self, id: i64) -> VerificationEntry {
        VerificationEntry {
            id,
            archive_entry_id: self.archive_entry_id,
            identifier: self.identifier,
            outcome: self.outcome,
            computed_fingerprint: self.computed_fingerprint,
            verified_by: self.verified_by,
            verified_at: self.verified_at,
        }
    }
}

/// Aggregate counters over the archive and its audit trail.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveStats {
    pub total_archived: u64,
    pub total_verifications: u64,
    pub successful_verifications: u64,
}
