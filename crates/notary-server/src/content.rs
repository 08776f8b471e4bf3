use std::fs;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use notary_crypto::HashEngine;
use notary_types::Fingerprint;
use tracing::debug;

/// Retained document bytes, addressed by fingerprint.
///
/// Blobs are laid out as `<root>/<first two hex chars>/<full hex>`. A blob
/// is written to a temporary file and renamed into place, so readers never
/// observe a partial document.
#[derive(Debug)]
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    pub fn open(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn blob_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        let hex = fingerprint.to_hex();
        self.root.join(&hex[..2]).join(hex)
    }

    pub fn exists(&self, fingerprint: &Fingerprint) -> bool {
        self.blob_path(fingerprint).is_file()
    }

    /// Store `data` under `fingerprint`. Storing an existing blob is a no-op.
    pub fn put(&self, fingerprint: &Fingerprint, data: &[u8]) -> io::Result<()> {
        self.put_reader(fingerprint, data)
    }

    /// Stream `reader` into the blob for `fingerprint` without buffering it
    /// in memory. The copy is re-fingerprinted before it is renamed into
    /// place; content that no longer matches is discarded with `InvalidData`.
    pub fn put_reader<R: Read>(&self, fingerprint: &Fingerprint, mut reader: R) -> io::Result<()> {
        let path = self.blob_path(fingerprint);
        if path.is_file() {
            return Ok(());
        }
        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "blob path has no parent"))?;
        fs::create_dir_all(dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        let bytes = io::copy(&mut reader, &mut tmp)?;
        tmp.as_file().sync_data()?;

        tmp.seek(SeekFrom::Start(0))?;
        let digest = HashEngine::default().fingerprint(&mut tmp)?;
        if digest.fingerprint != *fingerprint {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "content changed while being retained: expected {}, got {}",
                    fingerprint.short_hex(),
                    digest.fingerprint.short_hex()
                ),
            ));
        }

        tmp.persist(&path).map_err(|e| e.error)?;
        debug!(fingerprint = %fingerprint.short_hex(), bytes, "content retained");
        Ok(())
    }

    pub fn get(&self, fingerprint: &Fingerprint) -> io::Result<Option<Vec<u8>>> {
        match fs::read(self.blob_path(fingerprint)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
