use std::io::Read;
use std::sync::Arc;

use chrono::{SubsecRound, Utc};
use notary_archive::{ArchiveStore, InMemoryArchiveStore, UniqueKey};
use notary_crypto::HashEngine;
use notary_ledger::{InMemoryLedger, Ledger, LedgerRecord};
use notary_types::{
    file_type_of, ArchiveEntry, ArchiveStats, Identifier, NewArchiveEntry, NewVerification,
    VerificationEntry, VerificationMode, VerificationResult,
};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ServiceConfig;
use crate::error::{NotaryError, NotaryResult};

/// Outcome of a full ledger audit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LedgerReport {
    pub records: u64,
    pub last_identifier: Option<Identifier>,
}

/// One archive entry together with its verification audit trail.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveHistory {
    pub entry: ArchiveEntry,
    pub verifications: Vec<VerificationEntry>,
}

/// The notarization engine.
///
/// Owns no global state: the ledger and archive store are handed in at
/// construction and shared behind `Arc`, so one service can serve any
/// number of concurrent callers.
pub struct NotarizationService {
    engine: HashEngine,
    ledger: Arc<dyn Ledger>,
    archive: Arc<dyn ArchiveStore>,
    config: ServiceConfig,
}

impl NotarizationService {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        archive: Arc<dyn ArchiveStore>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            engine: HashEngine::from_config(&config.hash),
            ledger,
            archive,
            config,
        }
    }

    /// A service over fresh in-memory backends.
    pub fn in_memory(config: ServiceConfig) -> Self {
        Self::new(
            Arc::new(InMemoryLedger::new()),
            Arc::new(InMemoryArchiveStore::new()),
            config,
        )
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    // ---- Notarization ----

    /// Fingerprint `content`, anchor it, and record the archive entry.
    pub fn submit<R: Read>(
        &self,
        content: R,
        filename: &str,
        actor: &str,
    ) -> NotaryResult<ArchiveEntry> {
        let filename = non_empty("filename", filename)?;
        let actor = non_empty("actor", actor)?;

        let digest = self.engine.fingerprint(content)?;
        let fingerprint = digest.fingerprint;

        if let Some(existing) = self.archive.find_by_fingerprint(&fingerprint)? {
            info!(
                fingerprint = %fingerprint.short_hex(),
                identifier = %existing.identifier,
                "submission rejected: content already archived"
            );
            return Err(NotaryError::Duplicate(UniqueKey::Fingerprint));
        }

        let anchor = self.ledger.append(fingerprint, filename)?;
        let entry = NewArchiveEntry {
            filename: filename.to_string(),
            fingerprint,
            identifier: anchor.identifier.clone(),
            submitted_at: anchor.submitted_at,
            size_bytes: digest.bytes_read,
            file_type: file_type_of(filename),
            submitted_by: actor.to_string(),
        };

        let stored = self.archive.insert(entry).map_err(|e| {
            warn!(
                identifier = %anchor.identifier,
                seq = anchor.seq,
                error = %e,
                "ledger record left without archive entry"
            );
            NotaryError::from(e)
        })?;

        info!(
            identifier = %stored.identifier,
            fingerprint = %stored.fingerprint.short_hex(),
            size_bytes = stored.size_bytes,
            actor = %stored.submitted_by,
            "document notarized"
        );
        Ok(stored)
    }

    // ---- Verification ----

    /// Verify by identifier, checking `content` against the anchored
    /// fingerprint when provided.
    pub fn verify(
        &self,
        identifier: &Identifier,
        content: Option<&mut dyn Read>,
        actor: &str,
    ) -> NotaryResult<VerificationResult> {
        match content {
            Some(reader) => self.verify_with_content(identifier, reader, actor),
            None => self.verify_by_identifier(identifier),
        }
    }

    /// Resolve an identifier without hashing anything. Leaves no audit row.
    pub fn verify_by_identifier(&self, identifier: &Identifier) -> NotaryResult<VerificationResult> {
        let result = match self.ledger.lookup(identifier)? {
            Some(record) => resolved(record, VerificationMode::LookupOnly, true, None),
            None => VerificationResult::unresolved(
                identifier.clone(),
                VerificationMode::LookupOnly,
                None,
            ),
        };
        debug!(%identifier, valid = result.valid, "lookup verification");
        Ok(result)
    }

    /// Hash `content` and compare it with the fingerprint anchored under
    /// `identifier`. Every check against an archived identifier is audited,
    /// whatever the outcome.
    pub fn verify_with_content<R: Read>(
        &self,
        identifier: &Identifier,
        content: R,
        actor: &str,
    ) -> NotaryResult<VerificationResult> {
        let actor = non_empty("actor", actor)?;
        let computed = self.engine.fingerprint(content)?.fingerprint;

        let result = match self.ledger.lookup(identifier)? {
            Some(record) => {
                let valid = record.fingerprint == computed;
                resolved(record, VerificationMode::ContentCheck, valid, Some(computed))
            }
            None => VerificationResult::unresolved(
                identifier.clone(),
                VerificationMode::ContentCheck,
                Some(computed),
            ),
        };

        let archived = self.archive.find_by_identifier(identifier)?;
        if archived.is_some() || self.config.audit_unresolved {
            self.archive.record_verification(NewVerification {
                archive_entry_id: archived.as_ref().map(|e| e.id),
                identifier: identifier.clone(),
                outcome: result.valid,
                computed_fingerprint: computed,
                verified_by: actor.to_string(),
                verified_at: Utc::now().trunc_subsecs(3),
            })?;
        }

        info!(
            %identifier,
            valid = result.valid,
            audited = archived.is_some() || self.config.audit_unresolved,
            actor,
            "content verification"
        );
        Ok(result)
    }

    // ---- Queries ----

    /// Every archive entry, newest first.
    pub fn list_archives(&self) -> NotaryResult<Vec<ArchiveEntry>> {
        Ok(self.archive.list_all()?)
    }

    pub fn stats(&self) -> NotaryResult<ArchiveStats> {
        Ok(self.archive.stats()?)
    }

    /// The archive entry for an identifier. The store is the only source
    /// for filename and fingerprint when serving downloads.
    pub fn find_archive(&self, identifier: &Identifier) -> NotaryResult<Option<ArchiveEntry>> {
        Ok(self.archive.find_by_identifier(identifier)?)
    }

    pub fn history(&self, identifier: &Identifier) -> NotaryResult<Option<ArchiveHistory>> {
        let Some(entry) = self.archive.find_by_identifier(identifier)? else {
            return Ok(None);
        };
        let verifications = self.archive.verifications_for(entry.id)?;
        Ok(Some(ArchiveHistory {
            entry,
            verifications,
        }))
    }

    /// Re-verify the ledger hash chain.
    pub fn check_ledger(&self) -> NotaryResult<LedgerReport> {
        let records = self.ledger.records()?;
        notary_ledger::validate_records(&records)?;
        let report = LedgerReport {
            records: records.len() as u64,
            last_identifier: records.last().map(|r| r.identifier.clone()),
        };
        info!(records = report.records, "ledger chain verified");
        Ok(report)
    }
}

impl std::fmt::Debug for NotarizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotarizationService")
            .field("chunk_size", &self.engine.chunk_size())
            .field("audit_unresolved", &self.config.audit_unresolved)
            .finish()
    }
}

fn resolved(
    record: LedgerRecord,
    mode: VerificationMode,
    valid: bool,
    computed_fingerprint: Option<notary_types::Fingerprint>,
) -> VerificationResult {
    VerificationResult {
        identifier: record.identifier,
        mode,
        valid,
        timestamp: Some(record.submitted_at),
        stored_fingerprint: Some(record.fingerprint),
        stored_filename: Some(record.filename),
        computed_fingerprint,
    }
}

fn non_empty<'a>(field: &str, value: &'a str) -> NotaryResult<&'a str> {
    if value.trim().is_empty() {
        return Err(NotaryError::InvalidRequest(format!("{field} must not be empty")));
    }
    Ok(value)
}
