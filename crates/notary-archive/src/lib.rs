//! Archive metadata and verification audit storage for the document notary.
//!
//! The archive store is the queryable side of the system: one row per
//! notarized document (for listing, search and statistics) and one row per
//! content verification attempt (the audit trail). The ledger stays the
//! source of truth for fingerprint integrity; the archive keeps
//! denormalized copies of fingerprint and identifier for lookups.
//!
//! # Storage Backends
//!
//! All backends implement the [`ArchiveStore`] trait:
//!
//! - [`InMemoryArchiveStore`] -- lock-guarded maps for tests and embedding
//! - [`SqliteArchiveStore`] -- relational tables `users`, `archives`,
//!   `verifications` in a single SQLite database
//!
//! # Rules
//!
//! 1. `fingerprint` and `identifier` are unique across archive entries;
//!    violations surface as [`ArchiveError::DuplicateKey`].
//! 2. Every write is atomic: readers never see a partial insert.
//! 3. Archive entries and verification rows are never updated or deleted.

pub mod error;
pub mod memory;
pub mod sqlite;
pub mod traits;

#[cfg(test)]
mod conformance;

pub use error::{ArchiveError, ArchiveResult, UniqueKey};
pub use memory::InMemoryArchiveStore;
pub use sqlite::SqliteArchiveStore;
pub use traits::ArchiveStore;
