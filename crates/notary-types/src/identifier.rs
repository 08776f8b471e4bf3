use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Opaque token issued by the ledger when a fingerprint is anchored.
///
/// Identifiers follow the `shard.realm.num` shape of a distributed-ledger
/// topic reference (`0.0.<n>`), but callers must treat them as opaque: they
/// round-trip exactly as issued, are case-sensitive and are never
/// normalized.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier(String);

impl Identifier {
    /// Wrap a caller-presented identifier. Only emptiness is rejected; any
    /// other string is a valid (possibly unknown) identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypeError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(TypeError::EmptyIdentifier);
        }
        Ok(Self(raw))
    }

    /// Build the canonical ledger form for an allocated topic number.
    pub fn from_topic_number(num: u64) -> Self {
        Self(format!("0.0.{num}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({})", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Identifier {
    type Error = TypeError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl From<Identifier> for String {
    fn from(identifier: Identifier) -> Self {
        identifier.0
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_number_format() {
        assert_eq!(Identifier::from_topic_number(123456).as_str(), "0.0.123456");
    }

    #[test]
    fn empty_is_rejected() {
        assert_eq!(Identifier::new(""), Err(TypeError::EmptyIdentifier));
    }

    #[test]
    fn round_trips_without_normalization() {
        let id = Identifier::new("Topic-ABC.x").unwrap();
        assert_eq!(id.as_str(), "Topic-ABC.x");
        assert_ne!(id, Identifier::new("topic-abc.x").unwrap());
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = Identifier::from_topic_number(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0.0.7\"");
        let parsed: Identifier = serde_json::from_str("\"0.0.7\"").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn empty_string_does_not_deserialize() {
        assert!(serde_json::from_str::<Identifier>("\"\"").is_err());
    }
}
