//! Acting principal and session lookup
//!
//! Authentication itself lives in the embedding application; this crate only
//! consumes the resolved principal through the `SessionProvider` trait.

use serde::{Deserialize, Serialize};

/// Which side of the marketplace an organization sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyRole {
    Producer,
    Processor,
}

impl std::fmt::Display for PartyRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PartyRole::Producer => write!(f, "producer"),
            PartyRole::Processor => write!(f, "processor"),
        }
    }
}

impl std::str::FromStr for PartyRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "producer" => Ok(PartyRole::Producer),
            "processor" => Ok(PartyRole::Processor),
            _ => Err(format!("Unknown party role: {}", s)),
        }
    }
}

/// The authenticated actor on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Opaque user ID from the embedding application's auth layer
    pub user_id: String,

    /// Opaque organization ID
    pub organization_id: String,

    /// Producer or processor
    pub organization_type: PartyRole,
}

impl Principal {
    pub fn is_processor(&self) -> bool {
        self.organization_type == PartyRole::Processor
    }

    pub fn is_producer(&self) -> bool {
        self.organization_type == PartyRole::Producer
    }
}

/// Source of the current principal, resolved per operation
pub trait SessionProvider {
    /// The acting principal, or `None` when anonymous
    fn current_user(&self) -> Option<Principal>;
}

/// A fixed session, used by the CLI (identity file) and by tests
#[derive(Debug, Clone, Default)]
pub struct StaticSession {
    principal: Option<Principal>,
}

impl StaticSession {
    pub fn new(principal: Principal) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    /// A session with no authenticated user
    pub fn anonymous() -> Self {
        Self { principal: None }
    }
}

impl SessionProvider for StaticSession {
    fn current_user(&self) -> Option<Principal> {
        self.principal.clone()
    }
}
