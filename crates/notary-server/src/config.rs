use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notary_service::{
    ArchiveStore, FileLedger, FileLedgerConfig, InMemoryArchiveStore, InMemoryLedger, Ledger,
    NotarizationService, ServiceConfig, SqliteArchiveStore,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{ServerError, ServerResult};

/// Where anchoring records live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerBackend {
    Memory,
    #[default]
    File,
}

/// Where archive metadata and the audit trail live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveBackend {
    Memory,
    #[default]
    Sqlite,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Root for the ledger log, the archive database and retained content.
    pub data_dir: PathBuf,
    pub ledger: LedgerBackend,
    pub ledger_sync: FileLedgerConfig,
    pub archive: ArchiveBackend,
    pub max_upload_bytes: usize,
    /// Accept content checks without a named actor, audited as `anonymous`.
    pub allow_anonymous_verify: bool,
    pub service: ServiceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8085)),
            data_dir: PathBuf::from("notary-data"),
            ledger: LedgerBackend::default(),
            ledger_sync: FileLedgerConfig::default(),
            archive: ArchiveBackend::default(),
            max_upload_bytes: 64 * 1024 * 1024,
            allow_anonymous_verify: true,
            service: ServiceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger.log")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.data_dir.join("archive.db")
    }

    pub fn content_dir(&self) -> PathBuf {
        self.data_dir.join("content")
    }

    /// Open the configured backends and assemble the service.
    pub fn open_service(&self) -> ServerResult<NotarizationService> {
        let ledger: Arc<dyn Ledger> = match self.ledger {
            LedgerBackend::Memory => Arc::new(InMemoryLedger::new()),
            LedgerBackend::File => Arc::new(
                FileLedger::open(&self.ledger_path(), self.ledger_sync.clone())
                    .map_err(|e| ServerError::Config(format!("ledger: {e}")))?,
            ),
        };

        let archive: Arc<dyn ArchiveStore> = match self.archive {
            ArchiveBackend::Memory => Arc::new(InMemoryArchiveStore::new()),
            ArchiveBackend::Sqlite => {
                std::fs::create_dir_all(&self.data_dir)?;
                Arc::new(
                    SqliteArchiveStore::open(&self.archive_path())
                        .map_err(|e| ServerError::Config(format!("archive: {e}")))?,
                )
            }
        };

        info!(
            data_dir = %self.data_dir.display(),
            ledger = ?self.ledger,
            archive = ?self.archive,
            "notary backends opened"
        );
        Ok(NotarizationService::new(ledger, archive, self.service.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServerConfig::default();
        assert_eq!(c.bind_addr, "127.0.0.1:8085".parse::<SocketAddr>().unwrap());
        assert_eq!(c.ledger, LedgerBackend::File);
        assert_eq!(c.archive, ArchiveBackend::Sqlite);
        assert_eq!(c.max_upload_bytes, 64 * 1024 * 1024);
        assert!(c.allow_anonymous_verify);
        assert_eq!(c.ledger_path(), PathBuf::from("notary-data/ledger.log"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = ServerConfig::from_toml(
            r#"
            bind_addr = "0.0.0.0:9000"
            ledger = "memory"
            allow_anonymous_verify = false

            [service]
            audit_unresolved = true

            [service.hash]
            chunk_size = 8192
            "#,
        )
        .unwrap();
        assert_eq!(c.bind_addr.port(), 9000);
        assert_eq!(c.ledger, LedgerBackend::Memory);
        assert_eq!(c.archive, ArchiveBackend::Sqlite);
        assert!(!c.allow_anonymous_verify);
        assert!(c.service.audit_unresolved);
        assert_eq!(c.service.hash.chunk_size, 8192);
    }

    #[test]
    fn bad_toml_is_config_error() {
        let err = ServerConfig::from_toml("ledger = \"tape\"").unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notary.toml");
        std::fs::write(&path, "max_upload_bytes = 1024\n").unwrap();
        assert_eq!(ServerConfig::load(&path).unwrap().max_upload_bytes, 1024);
    }

    #[test]
    fn durable_backends_open_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = ServerConfig {
            data_dir: dir.path().join("nested"),
            ..ServerConfig::default()
        };
        let service = config.open_service().unwrap();
        service.submit(&b"persisted"[..], "a.txt", "alice").unwrap();
        assert!(config.ledger_path().exists());
        assert!(config.archive_path().exists());
    }
}
