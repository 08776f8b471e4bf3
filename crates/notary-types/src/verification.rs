use serde::{Deserialize, Serialize};

use crate::{ArchiveEntry, Fingerprint, Identifier, Timestamp};

/// How a verification was performed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationMode {
    /// Identifier resolution only; no content was hashed.
    LookupOnly,
    /// Provided content was hashed and compared with the anchored fingerprint.
    ContentCheck,
}

/// Verdict of a verification call.
///
/// An unknown identifier is an ordinary outcome: `valid` is `false` and all
/// `stored_*` fields are `None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub identifier: Identifier,
    pub mode: VerificationMode,
    pub valid: bool,
    /// Anchoring time of the ledger record.
    pub timestamp: Option<Timestamp>,
    pub stored_fingerprint: Option<Fingerprint>,
    pub stored_filename: Option<String>,
    /// Fingerprint of the provided content (content-check mode only).
    pub computed_fingerprint: Option<Fingerprint>,
}

impl VerificationResult {
    /// Result for an identifier the ledger does not know.
    pub fn unresolved(
        identifier: Identifier,
        mode: VerificationMode,
        computed_fingerprint: Option<Fingerprint>,
    ) -> Self {
        Self {
            identifier,
            mode,
            valid: false,
            timestamp: None,
            stored_fingerprint: None,
            stored_filename: None,
            computed_fingerprint,
        }
    }

    /// `true` when the identifier resolved to an anchored record.
    pub fn is_resolved(&self) -> bool {
        self.stored_fingerprint.is_some()
    }
}

/// What a successful submission hands back to the collaborator layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub identifier: Identifier,
    pub fingerprint: Fingerprint,
    pub timestamp: Timestamp,
    pub archive_id: i64,
}

impl From<&ArchiveEntry> for SubmissionReceipt {
    fn from(entry: &ArchiveEntry) -> Self {
        Self {
            identifier: entry.identifier.clone(),
            fingerprint: entry.fingerprint,
            timestamp: entry.submitted_at,
            archive_id: entry.id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_has_empty_stored_fields() {
        let r = VerificationResult::unresolved(
            Identifier::new("bogus-id").unwrap(),
            VerificationMode::LookupOnly,
            None,
        );
        assert!(!r.valid);
        assert!(!r.is_resolved());
        assert!(r.timestamp.is_none());
        assert!(r.stored_filename.is_none());
    }

    #[test]
    fn mode_serializes_snake_case() {
        let json = serde_json::to_string(&VerificationMode::ContentCheck).unwrap();
        assert_eq!(json, "\"content_check\"");
    }
}
