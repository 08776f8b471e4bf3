use std::io::{self, Read};

use notary_types::Fingerprint;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Configuration for [`HashEngine`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HashConfig {
    /// Size of each read from the content stream, in bytes.
    pub chunk_size: usize,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            chunk_size: HashEngine::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Fingerprint of a stream together with how many bytes were consumed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentDigest {
    pub fingerprint: Fingerprint,
    pub bytes_read: u64,
}

/// Streaming SHA-256 fingerprinting.
///
/// Content is pulled from the reader `chunk_size` bytes at a time, so a
/// document never has to be resident in memory. The result depends only on
/// the byte content, never on how reads happen to be split.
#[derive(Clone, Debug)]
pub struct HashEngine {
    chunk_size: usize,
}

impl HashEngine {
    /// Matches the block size the web layer has always used for uploads.
    pub const DEFAULT_CHUNK_SIZE: usize = 4096;

    /// Create an engine reading `chunk_size` bytes per call (at least 1).
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn from_config(config: &HashConfig) -> Self {
        Self::new(config.chunk_size)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fingerprint everything `reader` yields until EOF.
    ///
    /// Fails only when the stream itself cannot be read.
    pub fn fingerprint<R: Read>(&self, mut reader: R) -> io::Result<ContentDigest> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; self.chunk_size];
        let mut bytes_read = 0u64;

        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
            bytes_read += n as u64;
        }

        Ok(ContentDigest {
            fingerprint: Fingerprint::from_digest(hasher.finalize().into()),
            bytes_read,
        })
    }

    /// Fingerprint an in-memory buffer in one shot.
    pub fn fingerprint_bytes(data: &[u8]) -> Fingerprint {
        Fingerprint::from_digest(Sha256::digest(data).into())
    }

    /// Check that `data` produces the expected fingerprint.
    pub fn matches(data: &[u8], expected: &Fingerprint) -> bool {
        Self::fingerprint_bytes(data) == *expected
    }
}

impl Default for HashEngine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHUNK_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Reader that hands out at most `max` bytes per call.
    struct Trickle<'a> {
        data: &'a [u8],
        max: usize,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.max.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
        }
    }

    #[test]
    fn known_sha256_vector() {
        let fp = HashEngine::fingerprint_bytes(b"abc");
        assert_eq!(
            fp.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn empty_input_hashes_to_sha256_of_nothing() {
        let digest = HashEngine::default().fingerprint(&b""[..]).unwrap();
        assert_eq!(digest.bytes_read, 0);
        assert_eq!(
            hex::encode(digest.fingerprint.as_bytes()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn streaming_counts_bytes() {
        let data = vec![7u8; 10_000];
        let digest = HashEngine::new(333).fingerprint(&data[..]).unwrap();
        assert_eq!(digest.bytes_read, 10_000);
        assert_eq!(digest.fingerprint, HashEngine::fingerprint_bytes(&data));
    }

    #[test]
    fn zero_chunk_size_is_clamped() {
        assert_eq!(HashEngine::new(0).chunk_size(), 1);
    }

    #[test]
    fn unreadable_stream_is_an_io_error() {
        let err = HashEngine::default().fingerprint(Broken).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn matches_detects_tampering() {
        let fp = HashEngine::fingerprint_bytes(b"original");
        assert!(HashEngine::matches(b"original", &fp));
        assert!(!HashEngine::matches(b"tampered", &fp));
    }

    proptest! {
        #[test]
        fn chunking_never_changes_the_fingerprint(
            data in proptest::collection::vec(any::<u8>(), 0..4096),
            chunk in 1usize..700,
            trickle in 1usize..97,
        ) {
            let whole = HashEngine::fingerprint_bytes(&data);
            let reader = Trickle { data: &data, max: trickle };
            let streamed = HashEngine::new(chunk).fingerprint(reader).unwrap();
            prop_assert_eq!(streamed.fingerprint, whole);
            prop_assert_eq!(streamed.bytes_read, data.len() as u64);
        }
    }
}
