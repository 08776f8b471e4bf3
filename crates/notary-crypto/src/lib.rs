//! Hashing primitives for the document notary.
//!
//! Two hash families, kept apart on purpose:
//!
//! - [`HashEngine`] derives the SHA-256 content [`Fingerprint`] of a
//!   document by streaming it in bounded chunks. This is the value that gets
//!   anchored and later re-derived by verifiers.
//! - [`DomainHasher`] produces domain-separated BLAKE3 digests for internal
//!   integrity structures such as the ledger's record chain.
//!
//! All crypto operations wrap established libraries; no custom cryptography.
//!
//! [`Fingerprint`]: notary_types::Fingerprint

pub mod domain;
pub mod engine;

pub use domain::{DomainHasher, HasherError};
pub use engine::{ContentDigest, HashConfig, HashEngine};
