//! Entity identity - prefixed ULID identifiers

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use ulid::Ulid;

/// Entity type prefixes for the entities this crate owns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityPrefix {
    /// Cut sheet documents and templates
    Sheet,
    /// Produced packages
    Pkg,
}

impl EntityPrefix {
    /// The prefix as it appears in rendered IDs
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::Sheet => "SHEET",
            EntityPrefix::Pkg => "PKG",
        }
    }

    /// All known prefixes
    pub fn all() -> &'static [EntityPrefix] {
        &[EntityPrefix::Sheet, EntityPrefix::Pkg]
    }
}

impl fmt::Display for EntityPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityPrefix {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHEET" => Ok(EntityPrefix::Sheet),
            "PKG" => Ok(EntityPrefix::Pkg),
            _ => Err(IdParseError::UnknownPrefix(s.to_string())),
        }
    }
}

/// Errors from parsing entity ID strings
#[derive(Debug, Error)]
pub enum IdParseError {
    #[error("Unknown entity prefix: {0}")]
    UnknownPrefix(String),

    #[error("Malformed entity ID (expected PREFIX-ULID): {0}")]
    Malformed(String),

    #[error("Invalid ULID in entity ID {id}: {message}")]
    InvalidUlid { id: String, message: String },
}

/// A unique entity identifier in `PREFIX-ULID` form (e.g. `SHEET-01JB...`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId {
    prefix: EntityPrefix,
    ulid: Ulid,
}

impl EntityId {
    /// Generate a fresh ID with the given prefix
    pub fn new(prefix: EntityPrefix) -> Self {
        Self {
            prefix,
            ulid: Ulid::new(),
        }
    }

    /// The entity type prefix
    pub fn prefix(&self) -> EntityPrefix {
        self.prefix
    }

    /// Truncated form for display: prefix plus the first 8 ULID characters
    pub fn short(&self) -> String {
        let ulid = self.ulid.to_string();
        format!("{}-{}", self.prefix, &ulid[..8])
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.ulid)
    }
}

impl FromStr for EntityId {
    type Err = IdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, ulid) = s
            .split_once('-')
            .ok_or_else(|| IdParseError::Malformed(s.to_string()))?;
        let prefix = prefix.parse()?;
        let ulid = Ulid::from_string(ulid).map_err(|e| IdParseError::InvalidUlid {
            id: s.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { prefix, ulid })
    }
}

impl serde::Serialize for EntityId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for EntityId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_roundtrip() {
        let id = EntityId::new(EntityPrefix::Sheet);
        let rendered = id.to_string();
        assert!(rendered.starts_with("SHEET-"));

        let parsed: EntityId = rendered.parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_short_form() {
        let id = EntityId::new(EntityPrefix::Pkg);
        let short = id.short();
        assert!(short.starts_with("PKG-"));
        assert_eq!(short.len(), "PKG-".len() + 8);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("SHEET".parse::<EntityId>().is_err());
        assert!("ORDER-01JB000000000000000000000000".parse::<EntityId>().is_err());
        assert!("SHEET-notaulid".parse::<EntityId>().is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let id = EntityId::new(EntityPrefix::Sheet);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));

        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
