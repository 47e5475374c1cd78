//! Change history ledger entries - append-only audit records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::identity::EntityId;
use crate::core::session::PartyRole;

/// Broad shape of a change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Created,
    Updated,
    StatusChanged,
}

impl std::fmt::Display for ChangeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChangeType::Created => write!(f, "created"),
            ChangeType::Updated => write!(f, "updated"),
            ChangeType::StatusChanged => write!(f, "status_changed"),
        }
    }
}

impl std::str::FromStr for ChangeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ChangeType::Created),
            "updated" => Ok(ChangeType::Updated),
            "status_changed" => Ok(ChangeType::StatusChanged),
            _ => Err(format!("Unknown change type: {}", s)),
        }
    }
}

/// Machine-assigned category for timeline filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeCategory {
    InitialCreation,
    CutAdded,
    CutRemoved,
    CutModified,
    WeightEntered,
    PackageCreated,
    NotesUpdated,
    General,
}

impl ChangeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeCategory::InitialCreation => "initial_creation",
            ChangeCategory::CutAdded => "cut_added",
            ChangeCategory::CutRemoved => "cut_removed",
            ChangeCategory::CutModified => "cut_modified",
            ChangeCategory::WeightEntered => "weight_entered",
            ChangeCategory::PackageCreated => "package_created",
            ChangeCategory::NotesUpdated => "notes_updated",
            ChangeCategory::General => "general",
        }
    }
}

impl std::fmt::Display for ChangeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ChangeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initial_creation" => Ok(ChangeCategory::InitialCreation),
            "cut_added" => Ok(ChangeCategory::CutAdded),
            "cut_removed" => Ok(ChangeCategory::CutRemoved),
            "cut_modified" => Ok(ChangeCategory::CutModified),
            "weight_entered" => Ok(ChangeCategory::WeightEntered),
            "package_created" => Ok(ChangeCategory::PackageCreated),
            "notes_updated" => Ok(ChangeCategory::NotesUpdated),
            "general" => Ok(ChangeCategory::General),
            _ => Err(format!("Unknown change category: {}", s)),
        }
    }
}

/// One immutable ledger entry
///
/// `previous_state`/`new_state` carry only the keys the recorded operation
/// read and wrote; the sole whole-document snapshot is the `created` entry,
/// which has no prior state to narrow against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Store-assigned row ID
    pub id: i64,

    pub cut_sheet_id: EntityId,
    pub processing_order_id: Option<String>,

    pub changed_by_user_id: String,
    pub changed_by_org_id: String,
    pub changed_by_role: PartyRole,

    pub change_type: ChangeType,
    pub change_category: ChangeCategory,
    pub change_summary: String,

    pub previous_state: Option<Value>,
    pub new_state: Value,

    pub changed_fields: Vec<String>,

    pub affected_cut_id: Option<String>,
    pub affected_package_id: Option<EntityId>,

    pub created_at: DateTime<Utc>,
}

/// An entry before the store assigns its ID and timestamp
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub cut_sheet_id: EntityId,
    pub processing_order_id: Option<String>,
    pub changed_by_user_id: String,
    pub changed_by_org_id: String,
    pub changed_by_role: PartyRole,
    pub change_type: ChangeType,
    pub change_category: ChangeCategory,
    pub change_summary: String,
    pub previous_state: Option<Value>,
    pub new_state: Value,
    pub changed_fields: Vec<String>,
    pub affected_cut_id: Option<String>,
    pub affected_package_id: Option<EntityId>,
}

/// Aggregate view over a document's ledger
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySummary {
    pub total_changes: usize,
    pub producer_changes: usize,
    pub processor_changes: usize,
    pub last_modified: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
}
