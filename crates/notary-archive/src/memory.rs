use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use notary_types::{
    ArchiveEntry, ArchiveStats, Fingerprint, Identifier, NewArchiveEntry, NewVerification,
    VerificationEntry,
};
use tracing::debug;

use crate::error::{ArchiveError, ArchiveResult, UniqueKey};
use crate::traits::ArchiveStore;

#[derive(Default)]
struct ArchiveState {
    /// Entry with key `n` lives at index `n - 1`.
    entries: Vec<ArchiveEntry>,
    by_identifier: HashMap<Identifier, usize>,
    by_fingerprint: HashMap<Fingerprint, usize>,
    verifications: Vec<VerificationEntry>,
}

impl ArchiveState {
    fn entry(&self, archive_id: i64) -> Option<&ArchiveEntry> {
        let index = usize::try_from(archive_id).ok()?.checked_sub(1)?;
        self.entries.get(index)
    }
}

/// In-memory archive store.
///
/// Intended for tests and embedding. One `RwLock` guards entries, both
/// unique indexes and the audit trail, so every write is atomic.
pub struct InMemoryArchiveStore {
    inner: RwLock<ArchiveState>,
}

impl InMemoryArchiveStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ArchiveState::default()),
        }
    }

    fn read_state(&self) -> ArchiveResult<RwLockReadGuard<'_, ArchiveState>> {
        self.inner
            .read()
            .map_err(|_| ArchiveError::Unavailable("archive read lock poisoned".into()))
    }

    fn write_state(&self) -> ArchiveResult<RwLockWriteGuard<'_, ArchiveState>> {
        self.inner
            .write()
            .map_err(|_| ArchiveError::Unavailable("archive write lock poisoned".into()))
    }
}

impl Default for InMemoryArchiveStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveStore for InMemoryArchiveStore {
    fn insert(&self, entry: NewArchiveEntry) -> ArchiveResult<ArchiveEntry> {
        let mut state = self.write_state()?;
        if state.by_fingerprint.contains_key(&entry.fingerprint) {
            return Err(ArchiveError::DuplicateKey(UniqueKey::Fingerprint));
        }
        if state.by_identifier.contains_key(&entry.identifier) {
            return Err(ArchiveError::DuplicateKey(UniqueKey::Identifier));
        }

        let index = state.entries.len();
        let stored = entry.with_id(index as i64 + 1);
        state.by_fingerprint.insert(stored.fingerprint, index);
        state.by_identifier.insert(stored.identifier.clone(), index);
        state.entries.push(stored.clone());

        debug!(archive_id = stored.id, identifier = %stored.identifier, "archive entry stored");
        Ok(stored)
    }

    fn find_by_identifier(&self, identifier: &Identifier) -> ArchiveResult<Option<ArchiveEntry>> {
        let state = self.read_state()?;
        Ok(state
            .by_identifier
            .get(identifier)
            .map(|&i| state.entries[i].clone()))
    }

    fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> ArchiveResult<Option<ArchiveEntry>> {
        let state = self.read_state()?;
        Ok(state
            .by_fingerprint
            .get(fingerprint)
            .map(|&i| state.entries[i].clone()))
    }

    fn list_all(&self) -> ArchiveResult<Vec<ArchiveEntry>> {
        let mut entries = self.read_state()?.entries.clone();
        entries.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(entries)
    }

    fn record_verification(
        &self,
        verification: NewVerification,
    ) -> ArchiveResult<VerificationEntry> {
        let mut state = self.write_state()?;
        if let Some(archive_id) = verification.archive_entry_id {
            if state.entry(archive_id).is_none() {
                return Err(ArchiveError::UnknownArchive(archive_id));
            }
        }

        let stored = verification.with_id(state.verifications.len() as i64 + 1);
        state.verifications.push(stored.clone());
        Ok(stored)
    }

    fn verifications_for(&self, archive_id: i64) -> ArchiveResult<Vec<VerificationEntry>> {
        Ok(self
            .read_state()?
            .verifications
            .iter()
            .filter(|v| v.archive_entry_id == Some(archive_id))
            .cloned()
            .collect())
    }

    fn stats(&self) -> ArchiveResult<ArchiveStats> {
        let state = self.read_state()?;
        Ok(ArchiveStats {
            total_archived: state.entries.len() as u64,
            total_verifications: state.verifications.len() as u64,
            successful_verifications: state.verifications.iter().filter(|v| v.outcome).count()
                as u64,
        })
    }
}

impl std::fmt::Debug for InMemoryArchiveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats().unwrap_or_default();
        f.debug_struct("InMemoryArchiveStore")
            .field("archived", &stats.total_archived)
            .field("verifications", &stats.total_verifications)
            .finish()
    }
}
