//! Produced packages - physical output recorded during processing

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::identity::EntityId;

/// One physical package cut and wrapped for a sheet line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducedPackage {
    pub id: EntityId,
    pub cut_sheet_id: EntityId,

    pub cut_id: String,
    pub cut_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primal_id: Option<String>,

    /// 1-based, scoped per `(cut_sheet_id, cut_id)` pair
    pub package_number: i64,

    pub quantity_in_package: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_weight_lbs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_style: Option<String>,

    /// True when the cut was a processor addition rather than a producer pick
    #[serde(default)]
    pub processor_added: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub livestock_tracking_id: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Input for recording a package; the service assigns ID and number
#[derive(Debug, Clone, Default)]
pub struct NewPackage {
    pub cut_id: String,
    pub cut_name: String,
    pub primal_id: Option<String>,
    pub quantity_in_package: i64,
    pub actual_weight_lbs: Option<f64>,
    pub thickness: Option<String>,
    pub processing_style: Option<String>,
    pub processor_added: bool,
    pub processor_notes: Option<String>,
    pub livestock_tracking_id: Option<String>,
}
