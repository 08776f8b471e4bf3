//! Append-only anchoring ledger for the document notary.
//!
//! The ledger is the one component whose guarantee the whole system rests
//! on: once a fingerprint is anchored under an identifier, that record is
//! retrievable forever and never changes. This crate provides:
//! - `LedgerWriter` / `LedgerReader` trait boundaries
//! - `InMemoryLedger`, the process-local mock used by tests and embedding
//! - `FileLedger`, a CRC-framed append-only log replayed on open
//! - Hash-chain validation across all records
//!
//! Records move from absent to committed exactly once; there is no update
//! or delete path in any implementation.

pub mod error;
pub mod file;
pub mod memory;
pub mod record;
mod state;
pub mod traits;

pub use error::LedgerError;
pub use file::{FileLedger, FileLedgerConfig, SyncMode};
pub use memory::InMemoryLedger;
pub use record::{validate_records, Anchor, LedgerRecord};
pub use traits::{Ledger, LedgerReader, LedgerWriter};
