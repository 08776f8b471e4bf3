use std::collections::HashMap;

use chrono::SubsecRound;
use notary_types::{Fingerprint, Identifier};
use rand::Rng;

use crate::error::LedgerError;
use crate::record::LedgerRecord;

/// Lowest topic number handed out; keeps identifiers visually uniform.
const MIN_TOPIC: u64 = 100_000;
/// Fits a signed 64-bit column in any backing database.
const MAX_TOPIC: u64 = i64::MAX as u64;

/// Records plus the identifier index, shared by every ledger backend.
///
/// Callers hold the backend's write lock across `prepare` and `commit`, so
/// identifier allocation and timestamp ordering are race-free.
#[derive(Default)]
pub(crate) struct LedgerState {
    records: Vec<LedgerRecord>,
    index: HashMap<Identifier, usize>,
}

impl LedgerState {
    /// Build the next sealed record without storing it.
    pub(crate) fn prepare(
        &self,
        fingerprint: Fingerprint,
        filename: &str,
    ) -> Result<LedgerRecord, LedgerError> {
        let last = self.records.last();
        let seq = last.map_or(1, |r| r.seq + 1);
        let prev_hash = last.map(|r| r.record_hash);

        let now = chrono::Utc::now().trunc_subsecs(3);
        let submitted_at = match last {
            Some(previous) if previous.submitted_at > now => previous.submitted_at,
            _ => now,
        };

        LedgerRecord::seal(
            seq,
            self.fresh_identifier(),
            fingerprint,
            filename.to_string(),
            submitted_at,
            prev_hash,
        )
    }

    /// Store a record that extends the chain.
    pub(crate) fn commit(&mut self, record: LedgerRecord) -> Result<(), LedgerError> {
        record.check_follows(self.records.last())?;
        if self.index.contains_key(&record.identifier) {
            return Err(LedgerError::IntegrityViolation {
                seq: record.seq,
                reason: format!("identifier {} issued twice", record.identifier),
            });
        }
        self.index.insert(record.identifier.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    pub(crate) fn get(&self, identifier: &Identifier) -> Option<&LedgerRecord> {
        self.index.get(identifier).map(|&i| &self.records[i])
    }

    pub(crate) fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    #[cfg(test)]
    pub(crate) fn records_mut(&mut self) -> &mut Vec<LedgerRecord> {
        &mut self.records
    }

    pub(crate) fn len(&self) -> u64 {
        self.records.len() as u64
    }

    fn fresh_identifier(&self) -> Identifier {
        let mut rng = rand::thread_rng();
        loop {
            let candidate = Identifier::from_topic_number(rng.gen_range(MIN_TOPIC..=MAX_TOPIC));
            if !self.index.contains_key(&candidate) {
                return candidate;
            }
        }
    }
}
