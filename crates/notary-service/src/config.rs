use notary_crypto::HashConfig;
use serde::{Deserialize, Serialize};

/// Behaviour switches for [`NotarizationService`](crate::NotarizationService).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub hash: HashConfig,
    /// Also audit content checks against identifiers that resolve to no
    /// archive entry. Such rows carry no archive link.
    pub audit_unresolved: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = ServiceConfig::default();
        assert_eq!(c.hash.chunk_size, 4096);
        assert!(!c.audit_unresolved);
    }
}
