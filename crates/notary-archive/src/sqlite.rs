use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use notary_types::{
    ArchiveEntry, ArchiveStats, Fingerprint, Identifier, NewArchiveEntry, NewVerification,
    Timestamp, VerificationEntry,
};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, info};

use crate::error::{ArchiveError, ArchiveResult, UniqueKey};
use crate::traits::ArchiveStore;

const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- Owned by the identity layer; the notary only consumes usernames as actors.
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS archives (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL,
    fingerprint TEXT UNIQUE NOT NULL,
    identifier TEXT UNIQUE NOT NULL,
    submitted_at TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    file_type TEXT NOT NULL,
    submitted_by TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_archives_submitted_at ON archives(submitted_at);

CREATE TABLE IF NOT EXISTS verifications (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    archive_id INTEGER REFERENCES archives(id),
    identifier TEXT NOT NULL,
    outcome INTEGER NOT NULL,
    computed_fingerprint TEXT NOT NULL,
    verified_by TEXT NOT NULL,
    verified_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_verifications_archive ON verifications(archive_id);
"#;

const ARCHIVE_COLUMNS: &str =
    "id, filename, fingerprint, identifier, submitted_at, size_bytes, file_type, submitted_by";

const VERIFICATION_COLUMNS: &str =
    "id, archive_id, identifier, outcome, computed_fingerprint, verified_by, verified_at";

/// SQLite-backed archive store.
///
/// A single connection behind a `Mutex` serializes access; every statement
/// runs in SQLite's implicit per-statement transaction, so inserts are
/// atomic and uniqueness is enforced by the `UNIQUE` columns.
pub struct SqliteArchiveStore {
    conn: Mutex<Connection>,
}

impl SqliteArchiveStore {
    /// Open or create a database file and run migrations.
    pub fn open(path: &Path) -> ArchiveResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ArchiveError::Unavailable(e.to_string()))?;
        }
        let store = Self::from_connection(Connection::open(path)?)?;
        info!(path = %path.display(), "archive database opened");
        Ok(store)
    }

    /// A private in-memory database, mostly for tests.
    pub fn open_in_memory() -> ArchiveResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> ArchiveResult<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> ArchiveResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ArchiveError::Unavailable("archive connection mutex poisoned".into()))
    }

    fn find_archive_where(
        &self,
        column: &str,
        value: &str,
    ) -> ArchiveResult<Option<ArchiveEntry>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {ARCHIVE_COLUMNS} FROM archives WHERE {column} = ?1");
        let raw = conn
            .query_row(&sql, params![value], RawArchive::from_row)
            .optional()?;
        raw.map(RawArchive::decode).transpose()
    }
}

impl ArchiveStore for SqliteArchiveStore {
    fn insert(&self, entry: NewArchiveEntry) -> ArchiveResult<ArchiveEntry> {
        let size = i64::try_from(entry.size_bytes)
            .map_err(|_| ArchiveError::Corrupt(format!("size {} out of range", entry.size_bytes)))?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO archives (filename, fingerprint, identifier, submitted_at, size_bytes, file_type, submitted_by)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                entry.filename,
                entry.fingerprint.to_hex(),
                entry.identifier.as_str(),
                encode_time(&entry.submitted_at),
                size,
                entry.file_type,
                entry.submitted_by,
            ],
        )
        .map_err(classify_constraint)?;

        let stored = entry.with_id(conn.last_insert_rowid());
        debug!(archive_id = stored.id, identifier = %stored.identifier, "archive row inserted");
        Ok(stored)
    }

    fn find_by_identifier(&self, identifier: &Identifier) -> ArchiveResult<Option<ArchiveEntry>> {
        self.find_archive_where("identifier", identifier.as_str())
    }

    fn find_by_fingerprint(&self, fingerprint: &Fingerprint) -> ArchiveResult<Option<ArchiveEntry>> {
        self.find_archive_where("fingerprint", &fingerprint.to_hex())
    }

    fn list_all(&self) -> ArchiveResult<Vec<ArchiveEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ARCHIVE_COLUMNS} FROM archives ORDER BY submitted_at DESC, id DESC"
        ))?;
        let raws = stmt
            .query_map([], RawArchive::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawArchive::decode).collect()
    }

    fn record_verification(
        &self,
        verification: NewVerification,
    ) -> ArchiveResult<VerificationEntry> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO verifications (archive_id, identifier, outcome, computed_fingerprint, verified_by, verified_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                verification.archive_entry_id,
                verification.identifier.as_str(),
                verification.outcome,
                verification.computed_fingerprint.to_hex(),
                verification.verified_by,
                encode_time(&verification.verified_at),
            ],
        )
        .map_err(|e| match (is_constraint(&e), verification.archive_entry_id) {
            (true, Some(archive_id)) => ArchiveError::UnknownArchive(archive_id),
            _ => e.into(),
        })?;

        Ok(verification.with_id(conn.last_insert_rowid()))
    }

    fn verifications_for(&self, archive_id: i64) -> ArchiveResult<Vec<VerificationEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {VERIFICATION_COLUMNS} FROM verifications WHERE archive_id = ?1 ORDER BY id ASC"
        ))?;
        let raws = stmt
            .query_map(params![archive_id], RawVerification::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raws.into_iter().map(RawVerification::decode).collect()
    }

    fn stats(&self) -> ArchiveResult<ArchiveStats> {
        let conn = self.conn()?;
        let count = |sql: &str| -> ArchiveResult<u64> {
            let n: i64 = conn.query_row(sql, [], |r| r.get(0))?;
            Ok(n.max(0) as u64)
        };
        Ok(ArchiveStats {
            total_archived: count("SELECT COUNT(*) FROM archives")?,
            total_verifications: count("SELECT COUNT(*) FROM verifications")?,
            successful_verifications: count(
                "SELECT COUNT(*) FROM verifications WHERE outcome = 1",
            )?,
        })
    }
}

impl std::fmt::Debug for SqliteArchiveStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteArchiveStore").finish_non_exhaustive()
    }
}

/// Columns as SQLite hands them back, before domain decoding.
struct RawArchive {
    id: i64,
    filename: String,
    fingerprint: String,
    identifier: String,
    submitted_at: String,
    size_bytes: i64,
    file_type: String,
    submitted_by: String,
}

impl RawArchive {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            filename: r.get(1)?,
            fingerprint: r.get(2)?,
            identifier: r.get(3)?,
            submitted_at: r.get(4)?,
            size_bytes: r.get(5)?,
            file_type: r.get(6)?,
            submitted_by: r.get(7)?,
        })
    }

    fn decode(self) -> ArchiveResult<ArchiveEntry> {
        Ok(ArchiveEntry {
            id: self.id,
            filename: self.filename,
            fingerprint: decode_fingerprint(&self.fingerprint)?,
            identifier: decode_identifier(self.identifier)?,
            submitted_at: decode_time(&self.submitted_at)?,
            size_bytes: u64::try_from(self.size_bytes)
                .map_err(|_| ArchiveError::Corrupt(format!("negative size {}", self.size_bytes)))?,
            file_type: self.file_type,
            submitted_by: self.submitted_by,
        })
    }
}

struct RawVerification {
    id: i64,
    archive_id: Option<i64>,
    identifier: String,
    outcome: bool,
    computed_fingerprint: String,
    verified_by: String,
    verified_at: String,
}

impl RawVerification {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            archive_id: r.get(1)?,
            identifier: r.get(2)?,
            outcome: r.get(3)?,
            computed_fingerprint: r.get(4)?,
            verified_by: r.get(5)?,
            verified_at: r.get(6)?,
        })
    }

    fn decode(self) -> ArchiveResult<VerificationEntry> {
        Ok(VerificationEntry {
            id: self.id,
            archive_entry_id: self.archive_id,
            identifier: decode_identifier(self.identifier)?,
            outcome: self.outcome,
            computed_fingerprint: decode_fingerprint(&self.computed_fingerprint)?,
            verified_by: self.verified_by,
            verified_at: decode_time(&self.verified_at)?,
        })
    }
}

/// Fixed-width RFC 3339 so lexical order in SQL equals time order.
fn encode_time(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_time(s: &str) -> ArchiveResult<Timestamp> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ArchiveError::Corrupt(format!("timestamp {s:?}: {e}")))
}

fn decode_fingerprint(s: &str) -> ArchiveResult<Fingerprint> {
    Fingerprint::from_hex(s).map_err(|e| ArchiveError::Corrupt(format!("fingerprint: {e}")))
}

fn decode_identifier(s: String) -> ArchiveResult<Identifier> {
    Identifier::new(s).map_err(|e| ArchiveError::Corrupt(e.to_string()))
}

fn is_constraint(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation
    )
}

/// Map a failed archive insert to the violated unique key, if any.
fn classify_constraint(e: rusqlite::Error) -> ArchiveError {
    if let rusqlite::Error::SqliteFailure(err, Some(message)) = &e {
        if err.code == ErrorCode::ConstraintViolation {
            if message.contains("archives.fingerprint") {
                return ArchiveError::DuplicateKey(UniqueKey::Fingerprint);
            }
            if message.contains("archives.identifier") {
                return ArchiveError::DuplicateKey(UniqueKey::Identifier);
            }
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance;

    fn store() -> SqliteArchiveStore {
        SqliteArchiveStore::open_in_memory().unwrap()
    }

    #[test]
    fn insert_and_find() {
        conformance::insert_and_find(&store());
    }

    #[test]
    fn duplicate_fingerprint_rejected() {
        conformance::duplicate_fingerprint_rejected(&store());
    }

    #[test]
    fn duplicate_identifier_rejected() {
        conformance::duplicate_identifier_rejected(&store());
    }

    #[test]
    fn list_is_newest_first() {
        conformance::list_is_newest_first(&store());
    }

    #[test]
    fn verifications_and_stats() {
        conformance::verifications_and_stats(&store());
    }

    #[test]
    fn unlinked_verification_is_counted() {
        conformance::unlinked_verification_is_counted(&store());
    }

    #[test]
    fn verification_for_unknown_archive_rejected() {
        conformance::verification_for_unknown_archive_rejected(&store());
    }

    #[test]
    fn concurrent_inserts_keep_indexes_consistent() {
        conformance::concurrent_inserts(std::sync::Arc::new(store()));
    }

    #[test]
    fn rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.db");

        let stored = {
            let store = SqliteArchiveStore::open(&path).unwrap();
            store.insert(conformance::entry(7, 0)).unwrap()
        };

        let store = SqliteArchiveStore::open(&path).unwrap();
        let found = store.find_by_identifier(&stored.identifier).unwrap().unwrap();
        assert_eq!(found, stored);
        assert_eq!(store.stats().unwrap().total_archived, 1);
    }

    #[test]
    fn timestamps_round_trip_at_millisecond_precision() {
        let store = store();
        let mut entry = conformance::entry(1, 0);
        entry.submitted_at = conformance::at(0) + chrono::Duration::milliseconds(123);
        let stored = store.insert(entry).unwrap();
        let found = store
            .find_by_fingerprint(&stored.fingerprint)
            .unwrap()
            .unwrap();
        assert_eq!(found.submitted_at, stored.submitted_at);
    }

    #[test]
    fn schema_has_three_tables() {
        let store = store();
        let conn = store.conn().unwrap();
        let mut names: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        names.sort();
        assert_eq!(names, ["archives", "users", "verifications"]);
    }
}
