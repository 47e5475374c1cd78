//! Cut sheet documents - the shared record between producer and processor
//!
//! The producer authors a `CutSheetState`; processor-side changes are layered
//! on as overlay records (modifications, removals, additions) that never
//! destroy the producer's original selections.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::identity::EntityId;
use crate::core::session::PartyRole;
use crate::taxonomy::AnimalType;

/// Document lifecycle within this subsystem
///
/// Terminal states past submission belong to the order workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum SheetStatus {
    #[default]
    Draft,
    Submitted,
}

impl std::fmt::Display for SheetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetStatus::Draft => write!(f, "draft"),
            SheetStatus::Submitted => write!(f, "submitted"),
        }
    }
}

impl std::str::FromStr for SheetStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(SheetStatus::Draft),
            "submitted" => Ok(SheetStatus::Submitted),
            _ => Err(format!("Unknown sheet status: {}", s)),
        }
    }
}

/// How ground meat is packaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum GroundType {
    #[default]
    Bulk,
    Patties,
    Mixed,
}

impl std::fmt::Display for GroundType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroundType::Bulk => write!(f, "bulk"),
            GroundType::Patties => write!(f, "patties"),
            GroundType::Mixed => write!(f, "mixed"),
        }
    }
}

impl std::str::FromStr for GroundType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bulk" => Ok(GroundType::Bulk),
            "patties" => Ok(GroundType::Patties),
            "mixed" => Ok(GroundType::Mixed),
            _ => Err(format!("Unknown ground type: {}", s)),
        }
    }
}

/// Patty weight when ground meat is pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PattySize {
    QuarterPound,
    ThirdPound,
    HalfPound,
}

impl std::fmt::Display for PattySize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PattySize::QuarterPound => write!(f, "quarter_pound"),
            PattySize::ThirdPound => write!(f, "third_pound"),
            PattySize::HalfPound => write!(f, "half_pound"),
        }
    }
}

impl std::str::FromStr for PattySize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quarter_pound" => Ok(PattySize::QuarterPound),
            "third_pound" => Ok(PattySize::ThirdPound),
            "half_pound" => Ok(PattySize::HalfPound),
            _ => Err(format!("Unknown patty size: {}", s)),
        }
    }
}

/// Organ retention flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganFlags {
    pub heart: bool,
    pub liver: bool,
    pub tongue: bool,
    pub kidneys: bool,
    pub oxtail: bool,
    pub tripe: bool,
}

/// Beef-specific selections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeefOptions {
    pub stew_meat: bool,
    pub short_ribs: bool,
    pub soup_bones: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum BaconPreference {
    #[default]
    Sliced,
    Slab,
    Fresh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum HamPreference {
    #[default]
    Smoked,
    Fresh,
    Ground,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum ShoulderPreference {
    #[default]
    Roast,
    Steaks,
    Ground,
}

/// Pork-specific selections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PorkOptions {
    pub bacon: BaconPreference,
    pub ham: HamPreference,
    pub shoulder: ShoulderPreference,
    pub jowls: bool,
    pub fat_back: bool,
    pub lard_fat: bool,
}

/// One producer-selected cut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutSheetItem {
    pub cut_id: String,
    pub cut_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_lbs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pieces_per_package: Option<i64>,

    #[serde(default)]
    pub sort_order: i64,
}

/// One sausage flavor request (pork only)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutSheetSausage {
    pub flavor: String,
    pub pounds: f64,
}

/// The producer-authored state of a cut sheet
///
/// This is the unit templates store and `load_template` reconstructs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutSheetState {
    pub animal_type: AnimalType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hanging_weight_lbs: Option<f64>,

    #[serde(default)]
    pub ground_type: GroundType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ground_package_weight_lbs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patty_size: Option<PattySize>,

    #[serde(default)]
    pub organs: OrganFlags,

    #[serde(default)]
    pub beef: BeefOptions,

    #[serde(default)]
    pub pork: PorkOptions,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_instructions: Option<String>,

    #[serde(default)]
    pub items: Vec<CutSheetItem>,

    #[serde(default)]
    pub sausages: Vec<CutSheetSausage>,
}

impl CutSheetState {
    /// A blank state for the given species
    pub fn new(animal_type: AnimalType) -> Self {
        Self {
            animal_type,
            hanging_weight_lbs: None,
            ground_type: GroundType::default(),
            ground_package_weight_lbs: None,
            patty_size: None,
            organs: OrganFlags::default(),
            beef: BeefOptions::default(),
            pork: PorkOptions::default(),
            special_instructions: None,
            items: Vec::new(),
            sausages: Vec::new(),
        }
    }
}

/// Processor adjustment to one producer-selected cut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModificationRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_lbs: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pieces_per_package: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub modified_at: DateTime<Utc>,
}

/// Field-presence update for a modification record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutParamUpdates {
    pub thickness: Option<String>,
    pub weight_lbs: Option<f64>,
    pub pieces_per_package: Option<i64>,
    pub note: Option<String>,
}

impl CutParamUpdates {
    pub fn is_empty(&self) -> bool {
        *self == CutParamUpdates::default()
    }

    /// Field names touched by this update, for the audit entry
    pub fn changed_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if self.thickness.is_some() {
            fields.push("thickness".to_string());
        }
        if self.weight_lbs.is_some() {
            fields.push("weight_lbs".to_string());
        }
        if self.pieces_per_package.is_some() {
            fields.push("pieces_per_package".to_string());
        }
        if self.note.is_some() {
            fields.push("note".to_string());
        }
        fields
    }
}

impl ModificationRecord {
    /// A record seeded from an update with nothing prior
    pub fn from_updates(updates: &CutParamUpdates, at: DateTime<Utc>) -> Self {
        let mut record = Self {
            thickness: None,
            weight_lbs: None,
            pieces_per_package: None,
            note: None,
            modified_at: at,
        };
        record.apply(updates, at);
        record
    }

    /// Merge present fields of `updates` into this record
    pub fn apply(&mut self, updates: &CutParamUpdates, at: DateTime<Utc>) {
        if let Some(thickness) = &updates.thickness {
            self.thickness = Some(thickness.clone());
        }
        if let Some(weight) = updates.weight_lbs {
            self.weight_lbs = Some(weight);
        }
        if let Some(pieces) = updates.pieces_per_package {
            self.pieces_per_package = Some(pieces);
        }
        if let Some(note) = &updates.note {
            self.note = Some(note.clone());
        }
        self.modified_at = at;
    }
}

/// Overlay record: a cut the processor struck from the sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedCut {
    pub cut_id: String,
    pub cut_name: String,
    pub reason: String,
    pub removed_at: DateTime<Utc>,
}

/// Overlay record: a cut the processor added to the sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddedCut {
    pub cut_id: String,
    pub cut_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thickness: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pieces_per_package: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    pub added_at: DateTime<Utc>,
}

/// Input for [`AddedCut`]; the service stamps `added_at`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddCutRequest {
    pub cut_id: String,
    pub cut_name: String,
    pub thickness: Option<String>,
    pub pieces_per_package: Option<i64>,
    pub note: Option<String>,
}

/// A full cut sheet document as loaded from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutSheet {
    pub id: EntityId,

    /// `None` only for templates
    pub processing_order_id: Option<String>,

    pub producer_org_id: String,

    /// Processor the sheet is addressed to; `None` for templates
    pub processor_org_id: Option<String>,

    pub is_template: bool,
    pub template_name: Option<String>,

    pub status: SheetStatus,

    #[serde(flatten)]
    pub state: CutSheetState,

    /// Keyed by cut ID
    #[serde(default)]
    pub processor_modifications: BTreeMap<String, ModificationRecord>,

    #[serde(default)]
    pub removed_cuts: Vec<RemovedCut>,

    #[serde(default)]
    pub added_cuts: Vec<AddedCut>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processor_notes: Option<String>,

    pub last_modified_by_role: Option<PartyRole>,
    pub last_modified_by_user_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CutSheet {
    pub fn is_cut_removed(&self, cut_id: &str) -> bool {
        self.removed_cuts.iter().any(|r| r.cut_id == cut_id)
    }

    pub fn is_cut_added(&self, cut_id: &str) -> bool {
        self.added_cuts.iter().any(|a| a.cut_id == cut_id)
    }
}

/// Input for creating a cut sheet bound to an order
#[derive(Debug, Clone)]
pub struct NewCutSheet {
    pub processing_order_id: String,
    pub processor_org_id: String,
    pub state: CutSheetState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        assert_eq!("draft".parse::<SheetStatus>().unwrap(), SheetStatus::Draft);
        assert_eq!(
            "submitted".parse::<SheetStatus>().unwrap(),
            SheetStatus::Submitted
        );
        assert!("approved".parse::<SheetStatus>().is_err());
        assert_eq!(SheetStatus::Submitted.to_string(), "submitted");
    }

    #[test]
    fn test_modification_merge_keeps_absent_fields() {
        let now = Utc::now();
        let mut record = ModificationRecord::from_updates(
            &CutParamUpdates {
                thickness: Some("1in".to_string()),
                pieces_per_package: Some(2),
                ..Default::default()
            },
            now,
        );

        let later = now + chrono::Duration::seconds(5);
        record.apply(
            &CutParamUpdates {
                thickness: Some("1.5in".to_string()),
                ..Default::default()
            },
            later,
        );

        assert_eq!(record.thickness.as_deref(), Some("1.5in"));
        assert_eq!(record.pieces_per_package, Some(2));
        assert_eq!(record.modified_at, later);
    }

    #[test]
    fn test_changed_fields_names_present_keys_only() {
        let updates = CutParamUpdates {
            weight_lbs: Some(1.25),
            note: Some("thin cut".to_string()),
            ..Default::default()
        };
        assert_eq!(updates.changed_fields(), vec!["weight_lbs", "note"]);
    }

    #[test]
    fn test_state_serializes_without_empty_options() {
        let state = CutSheetState::new(AnimalType::Beef);
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("hanging_weight_lbs").is_none());
        assert_eq!(json["animal_type"], "beef");
        assert_eq!(json["ground_type"], "bulk");
    }

    #[test]
    fn test_overlay_membership_helpers() {
        let mut sheet_state = CutSheetState::new(AnimalType::Beef);
        sheet_state.items.push(CutSheetItem {
            cut_id: "ribeye".to_string(),
            cut_name: "Ribeye Steak".to_string(),
            thickness: None,
            weight_lbs: None,
            pieces_per_package: Some(2),
            sort_order: 0,
        });

        let sheet = CutSheet {
            id: crate::core::identity::EntityId::new(crate::core::identity::EntityPrefix::Sheet),
            processing_order_id: Some("order_1".to_string()),
            producer_org_id: "org_farm".to_string(),
            processor_org_id: Some("org_proc".to_string()),
            is_template: false,
            template_name: None,
            status: SheetStatus::Draft,
            state: sheet_state,
            processor_modifications: BTreeMap::new(),
            removed_cuts: vec![RemovedCut {
                cut_id: "ribeye".to_string(),
                cut_name: "Ribeye Steak".to_string(),
                reason: "out of stock".to_string(),
                removed_at: Utc::now(),
            }],
            added_cuts: Vec::new(),
            processor_notes: None,
            last_modified_by_role: None,
            last_modified_by_user_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        assert!(sheet.is_cut_removed("ribeye"));
        assert!(!sheet.is_cut_added("ribeye"));
        // The producer's original item is untouched by the overlay.
        assert_eq!(sheet.state.items.len(), 1);
    }
}
