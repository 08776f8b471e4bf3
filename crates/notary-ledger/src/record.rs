use notary_crypto::DomainHasher;
use notary_types::{Fingerprint, Identifier, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// An immutable anchoring record.
///
/// Records are hash-linked: `record_hash` covers every other field,
/// including `prev_hash`, so rewriting any anchored record breaks the chain
/// from that point on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerRecord {
    /// 1-based position in append order.
    pub seq: u64,
    pub identifier: Identifier,
    pub fingerprint: Fingerprint,
    pub filename: String,
    pub submitted_at: Timestamp,
    pub prev_hash: Option<[u8; 32]>,
    pub record_hash: [u8; 32],
}

/// What `append` hands back to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub identifier: Identifier,
    pub submitted_at: Timestamp,
    pub seq: u64,
}

impl From<&LedgerRecord> for Anchor {
    fn from(record: &LedgerRecord) -> Self {
        Self {
            identifier: record.identifier.clone(),
            submitted_at: record.submitted_at,
            seq: record.seq,
        }
    }
}

/// Everything the record hash commits to.
#[derive(Serialize)]
struct RecordBody<'a> {
    seq: u64,
    identifier: &'a Identifier,
    fingerprint: &'a Fingerprint,
    filename: &'a str,
    submitted_at: &'a Timestamp,
    prev_hash: Option<[u8; 32]>,
}

impl LedgerRecord {
    /// Build a record and seal it with its hash.
    pub(crate) fn seal(
        seq: u64,
        identifier: Identifier,
        fingerprint: Fingerprint,
        filename: String,
        submitted_at: Timestamp,
        prev_hash: Option<[u8; 32]>,
    ) -> Result<Self, LedgerError> {
        let mut record = Self {
            seq,
            identifier,
            fingerprint,
            filename,
            submitted_at,
            prev_hash,
            record_hash: [0; 32],
        };
        record.record_hash = record.compute_hash()?;
        Ok(record)
    }

    /// Recompute the hash from the record's fields.
    pub fn compute_hash(&self) -> Result<[u8; 32], LedgerError> {
        let body = RecordBody {
            seq: self.seq,
            identifier: &self.identifier,
            fingerprint: &self.fingerprint,
            filename: &self.filename,
            submitted_at: &self.submitted_at,
            prev_hash: self.prev_hash,
        };
        DomainHasher::RECORD
            .hash_json(&body)
            .map_err(|e| LedgerError::Serialization(e.to_string()))
    }

    /// Check this record's position and link against its predecessor.
    pub(crate) fn check_follows(&self, previous: Option<&LedgerRecord>) -> Result<(), LedgerError> {
        let expected_seq = previous.map_or(1, |p| p.seq + 1);
        if self.seq != expected_seq {
            return Err(LedgerError::IntegrityViolation {
                seq: self.seq,
                reason: format!("expected seq {expected_seq}, found {}", self.seq),
            });
        }

        if self.prev_hash != previous.map(|p| p.record_hash) {
            return Err(LedgerError::IntegrityViolation {
                seq: self.seq,
                reason: "previous hash link mismatch".into(),
            });
        }

        if self.compute_hash()? != self.record_hash {
            return Err(LedgerError::IntegrityViolation {
                seq: self.seq,
                reason: "record hash mismatch".into(),
            });
        }

        Ok(())
    }
}

/// Validate sequence numbering, hash links and record hashes, reporting the
/// first broken record.
pub fn validate_records(records: &[LedgerRecord]) -> Result<(), LedgerError> {
    let mut previous = None;
    for record in records {
        record.check_follows(previous)?;
        previous = Some(record);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(n: u64) -> Vec<LedgerRecord> {
        let mut out: Vec<LedgerRecord> = Vec::new();
        for seq in 1..=n {
            let prev = out.last().map(|r| r.record_hash);
            out.push(
                LedgerRecord::seal(
                    seq,
                    Identifier::from_topic_number(100_000 + seq),
                    Fingerprint::from_digest([seq as u8; 32]),
                    format!("doc-{seq}.txt"),
                    chrono::Utc::now(),
                    prev,
                )
                .unwrap(),
            );
        }
        out
    }

    #[test]
    fn sealed_chain_validates() {
        validate_records(&chain(5)).unwrap();
    }

    #[test]
    fn empty_chain_validates() {
        validate_records(&[]).unwrap();
    }

    #[test]
    fn rewritten_fingerprint_is_detected() {
        let mut records = chain(3);
        records[1].fingerprint = Fingerprint::from_digest([0xee; 32]);
        let err = validate_records(&records).unwrap_err();
        assert_eq!(
            err,
            LedgerError::IntegrityViolation {
                seq: 2,
                reason: "record hash mismatch".into()
            }
        );
    }

    #[test]
    fn removed_record_is_detected() {
        let mut records = chain(3);
        records.remove(1);
        let err = validate_records(&records).unwrap_err();
        assert!(matches!(err, LedgerError::IntegrityViolation { seq: 3, .. }));
    }

    #[test]
    fn anchor_from_record() {
        let records = chain(1);
        let anchor = Anchor::from(&records[0]);
        assert_eq!(anchor.seq, 1);
        assert_eq!(anchor.identifier, records[0].identifier);
    }
}
