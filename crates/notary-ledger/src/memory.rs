use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use notary_types::{Fingerprint, Identifier};
use tracing::debug;

use crate::error::LedgerError;
use crate::record::{Anchor, LedgerRecord};
use crate::state::LedgerState;
use crate::traits::{LedgerReader, LedgerWriter};

/// In-memory ledger for tests, local demos, and embedding.
///
/// Records live only as long as the value does. Each instance is fully
/// independent, so tests and tenants never share anchoring state.
pub struct InMemoryLedger {
    inner: RwLock<LedgerState>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(LedgerState::default()),
        }
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, LedgerState>, LedgerError> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Unavailable("ledger read lock poisoned".into()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, LedgerState>, LedgerError> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Unavailable("ledger write lock poisoned".into()))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerWriter for InMemoryLedger {
    fn append(&self, fingerprint: Fingerprint, filename: &str) -> Result<Anchor, LedgerError> {
        let mut state = self.write_state()?;
        let record = state.prepare(fingerprint, filename)?;
        let anchor = Anchor::from(&record);
        state.commit(record)?;

        debug!(identifier = %anchor.identifier, seq = anchor.seq, "anchored fingerprint");
        Ok(anchor)
    }
}

impl LedgerReader for InMemoryLedger {
    fn lookup(&self, identifier: &Identifier) -> Result<Option<LedgerRecord>, LedgerError> {
        Ok(self.read_state()?.get(identifier).cloned())
    }

    fn len(&self) -> Result<u64, LedgerError> {
        Ok(self.read_state()?.len())
    }

    fn records(&self) -> Result<Vec<LedgerRecord>, LedgerError> {
        Ok(self.read_state()?.records().to_vec())
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len().unwrap_or_default();
        f.debug_struct("InMemoryLedger")
            .field("record_count", &count)
            .finish()
    }
}
