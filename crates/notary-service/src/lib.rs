//! Notarization and verification engine.
//!
//! [`NotarizationService`] is the entry point for applications embedding the
//! notary. It fingerprints content, anchors fingerprints in a ledger,
//! records archive metadata, and answers verification requests, keeping an
//! audit trail of every content check.

pub mod config;
pub mod error;
pub mod service;

pub use config::ServiceConfig;
pub use error::{NotaryError, NotaryResult};
pub use service::{ArchiveHistory, LedgerReport, NotarizationService};

// Re-export key types
pub use notary_archive::{ArchiveStore, InMemoryArchiveStore, SqliteArchiveStore, UniqueKey};
pub use notary_ledger::{FileLedger, FileLedgerConfig, InMemoryLedger, Ledger, SyncMode};
pub use notary_types::{
    ArchiveEntry, ArchiveStats, Fingerprint, Identifier, SubmissionReceipt, VerificationEntry,
    VerificationMode, VerificationResult,
};
