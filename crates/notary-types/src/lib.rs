//! Foundation types for the document notary.
//!
//! Every other notary crate depends on `notary-types`. The types here carry
//! no behaviour beyond encoding and validation; hashing lives in
//! `notary-crypto`, anchoring in `notary-ledger` and persistence in
//! `notary-archive`.
//!
//! # Key Types
//!
//! - [`Fingerprint`]: 256-bit content digest, hex-encoded at the boundary
//! - [`Identifier`]: opaque ledger-issued token for one anchored record
//! - [`ArchiveEntry`]: durable metadata row describing a notarized document
//! - [`VerificationEntry`]: one row of the verification audit trail
//! - [`VerificationResult`]: verdict returned to callers of verify

pub mod archive;
pub mod error;
pub mod fingerprint;
pub mod identifier;
pub mod verification;

pub use archive::{
    file_type_of, ArchiveEntry, ArchiveStats, NewArchiveEntry, NewVerification, VerificationEntry,
};
pub use error::TypeError;
pub use fingerprint::Fingerprint;
pub use identifier::Identifier;
pub use verification::{SubmissionReceipt, VerificationMode, VerificationResult};

/// Timestamp type used throughout the notary.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
