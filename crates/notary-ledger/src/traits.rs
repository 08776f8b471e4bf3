use notary_types::{Fingerprint, Identifier};

use crate::error::LedgerError;
use crate::record::{validate_records, Anchor, LedgerRecord};

/// Write boundary for anchoring.
pub trait LedgerWriter: Send + Sync {
    /// Anchor `fingerprint` under a freshly issued identifier.
    ///
    /// Appends never fail because content was seen before: identifiers are
    /// always new, so the same fingerprint may be anchored repeatedly.
    fn append(&self, fingerprint: Fingerprint, filename: &str) -> Result<Anchor, LedgerError>;
}

/// Read boundary for lookups and audits.
pub trait LedgerReader: Send + Sync {
    /// Resolve an identifier. Unknown identifiers yield `Ok(None)`.
    fn lookup(&self, identifier: &Identifier) -> Result<Option<LedgerRecord>, LedgerError>;

    /// Number of anchored records.
    fn len(&self) -> Result<u64, LedgerError>;

    fn is_empty(&self) -> Result<bool, LedgerError> {
        Ok(self.len()? == 0)
    }

    /// All records in append order.
    fn records(&self) -> Result<Vec<LedgerRecord>, LedgerError>;

    /// Re-verify the hash chain over every record.
    fn validate_chain(&self) -> Result<(), LedgerError> {
        validate_records(&self.records()?)
    }
}

/// A complete ledger backend.
pub trait Ledger: LedgerReader + LedgerWriter {}

impl<T: LedgerReader + LedgerWriter> Ledger for T {}
