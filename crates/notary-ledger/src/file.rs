use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use fs2::FileExt;
use notary_types::{Fingerprint, Identifier};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::record::{Anchor, LedgerRecord};
use crate::state::LedgerState;
use crate::traits::{LedgerReader, LedgerWriter};

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// Largest payload a frame may carry. A header claiming more is damage,
/// never a torn write.
const MAX_PAYLOAD: usize = 1 << 20;

/// Flush strategy for the ledger log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    /// `fsync` after every append. An identifier is only returned once its
    /// record is on stable storage.
    #[default]
    EveryWrite,
    /// Rely on OS page-cache buffering.
    OsDefault,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLedgerConfig {
    pub sync_mode: SyncMode,
}

struct LogState {
    records: LedgerState,
    file: File,
    /// Length of the valid prefix of the log.
    offset: u64,
}

/// Durable ledger backed by an append-only log file.
///
/// On-disk format, one frame per record:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized LedgerRecord)]
/// ```
///
/// The whole log is replayed into memory on open and re-validated as a hash
/// chain. Damage that runs to the end of the file with no intact frame after
/// it is a torn write and is cut off. Any other damage is corruption and
/// refuses to open, leaving the file untouched.
///
/// The log is held under an exclusive advisory lock for the lifetime of the
/// ledger, so a second process opening the same path gets `Unavailable`.
pub struct FileLedger {
    path: PathBuf,
    config: FileLedgerConfig,
    inner: RwLock<LogState>,
}

impl FileLedger {
    /// Open (or create) the ledger log at `path`.
    pub fn open(path: &Path, config: FileLedgerConfig) -> Result<Self, LedgerError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)?;
        file.try_lock_exclusive().map_err(|e| {
            LedgerError::Unavailable(format!(
                "ledger log {} is held by another process: {e}",
                path.display()
            ))
        })?;

        let mut log = Vec::new();
        file.read_to_end(&mut log)?;
        let file_len = log.len() as u64;
        let (recovered, valid_len) = recover(&log)?;
        if valid_len < file_len {
            warn!(
                path = %path.display(),
                valid_len,
                file_len,
                "discarding torn write at end of ledger log"
            );
            file.set_len(valid_len)?;
            file.sync_all()?;
        }

        let mut records = LedgerState::default();
        for record in recovered {
            records.commit(record)?;
        }
        info!(path = %path.display(), records = records.len(), "ledger log opened");

        Ok(Self {
            path: path.to_path_buf(),
            config,
            inner: RwLock::new(LogState {
                records,
                file,
                offset: valid_len,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte length of the log.
    pub fn log_len(&self) -> Result<u64, LedgerError> {
        Ok(self.read_state()?.offset)
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, LogState>, LedgerError> {
        self.inner
            .read()
            .map_err(|_| LedgerError::Unavailable("ledger read lock poisoned".into()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, LogState>, LedgerError> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Unavailable("ledger write lock poisoned".into()))
    }
}

impl LedgerWriter for FileLedger {
    fn append(&self, fingerprint: Fingerprint, filename: &str) -> Result<Anchor, LedgerError> {
        let mut log = self.write_state()?;
        let record = log.records.prepare(fingerprint, filename)?;
        let frame = encode_frame(&record)?;

        let start = log.offset;
        let mut written = log.file.write_all(&frame);
        if written.is_ok() && self.config.sync_mode == SyncMode::EveryWrite {
            written = log.file.sync_data();
        }
        if let Err(e) = written {
            // Cut any partial frame so the next append starts on a boundary.
            if let Err(rollback) = log.file.set_len(start) {
                warn!(error = %rollback, offset = start, "failed to roll back partial ledger frame");
            }
            return Err(e.into());
        }

        log.offset += frame.len() as u64;
        let anchor = Anchor::from(&record);
        log.records.commit(record)?;

        debug!(
            identifier = %anchor.identifier,
            seq = anchor.seq,
            offset = start,
            "anchored fingerprint"
        );
        Ok(anchor)
    }
}

impl LedgerReader for FileLedger {
    fn lookup(&self, identifier: &Identifier) -> Result<Option<LedgerRecord>, LedgerError> {
        Ok(self.read_state()?.records.get(identifier).cloned())
    }

    fn len(&self) -> Result<u64, LedgerError> {
        Ok(self.read_state()?.records.len())
    }

    fn records(&self) -> Result<Vec<LedgerRecord>, LedgerError> {
        Ok(self.read_state()?.records.records().to_vec())
    }
}

impl std::fmt::Debug for FileLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLedger")
            .field("path", &self.path)
            .field("record_count", &self.len().unwrap_or_default())
            .finish()
    }
}

fn encode_frame(record: &LedgerRecord) -> Result<Vec<u8>, LedgerError> {
    let payload =
        bincode::serialize(record).map_err(|e| LedgerError::Serialization(e.to_string()))?;
    if payload.len() > MAX_PAYLOAD {
        return Err(LedgerError::Serialization(format!(
            "ledger record is {} bytes, limit is {MAX_PAYLOAD}",
            payload.len()
        )));
    }
    let length = payload.len() as u32;

    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&length.to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

enum Frame<'a> {
    Intact { payload: &'a [u8], end: usize },
    /// The log ends inside this frame.
    Truncated,
    Damaged { reason: String, reaches_eof: bool },
}

fn read_frame(log: &[u8], at: usize) -> Frame<'_> {
    let Some(header) = log.get(at..at + HEADER_SIZE) else {
        return Frame::Truncated;
    };
    let length = u32::from_le_bytes([header[0], header[1], header[2], header[3]]) as usize;
    let expected_crc = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);

    if length == 0 {
        // Zero fill past the last write is what a crash during
        // preallocation leaves behind.
        return Frame::Damaged {
            reason: format!("zero-length frame at offset {at}"),
            reaches_eof: log[at..].iter().all(|&b| b == 0),
        };
    }
    if length > MAX_PAYLOAD {
        return Frame::Damaged {
            reason: format!("frame at offset {at} claims {length} bytes, limit is {MAX_PAYLOAD}"),
            reaches_eof: false,
        };
    }

    let end = at + HEADER_SIZE + length;
    let Some(payload) = log.get(at + HEADER_SIZE..end) else {
        return Frame::Truncated;
    };
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Frame::Damaged {
            reason: format!(
                "CRC mismatch at offset {at}: expected {expected_crc:#010x}, got {actual_crc:#010x}"
            ),
            reaches_eof: end == log.len(),
        };
    }
    Frame::Intact { payload, end }
}

fn next_intact_frame(log: &[u8], from: usize) -> Option<usize> {
    (from..log.len()).find(|&at| matches!(read_frame(log, at), Frame::Intact { .. }))
}

/// Decode every intact frame, returning the records and the length of the
/// valid prefix.
fn recover(log: &[u8]) -> Result<(Vec<LedgerRecord>, u64), LedgerError> {
    let mut records = Vec::new();
    let mut offset = 0;

    while offset < log.len() {
        let (reason, reaches_eof) = match read_frame(log, offset) {
            Frame::Intact { payload, end } => {
                let record: LedgerRecord = bincode::deserialize(payload)
                    .map_err(|e| LedgerError::Serialization(e.to_string()))?;
                records.push(record);
                offset = end;
                continue;
            }
            Frame::Truncated => (format!("log ends inside the frame at offset {offset}"), true),
            Frame::Damaged { reason, reaches_eof } => (reason, reaches_eof),
        };

        let follows = next_intact_frame(log, offset + 1);
        if reaches_eof && follows.is_none() {
            warn!(offset, %reason, "damaged final ledger frame; treating as torn write");
            break;
        }
        let reason = match follows {
            Some(at) => format!("{reason}; intact frame follows at offset {at}"),
            None => reason,
        };
        return Err(LedgerError::IntegrityViolation {
            seq: records.len() as u64 + 1,
            reason,
        });
    }

    debug!(recovered = records.len(), "ledger log recovery complete");
    Ok((records, offset as u64))
}
