//! Processor cut configuration - a per-processor overlay on the taxonomy

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::identity::EntityId;
use crate::taxonomy::AnimalType;

/// A processor-defined cut not present in the static taxonomy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCutDef {
    pub id: String,
    pub name: String,

    /// Primal the cut belongs under, when the processor files it somewhere
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primal_id: Option<String>,

    #[serde(default)]
    pub additional_fee: bool,
}

/// Pointer to a reusable cut sheet template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub id: EntityId,
    pub name: String,
    pub animal_type: AnimalType,
}

/// One processor organization's configuration
///
/// Absence of a row is a valid steady state: see [`ConfigLookup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorCutConfig {
    pub processor_org_id: String,

    /// Species the processor accepts
    pub enabled_animals: BTreeSet<AnimalType>,

    /// Taxonomy cuts hidden from producers
    pub disabled_cuts: BTreeSet<String>,

    pub disabled_sausage_flavors: BTreeSet<String>,

    pub custom_cuts: Vec<CustomCutDef>,

    pub default_templates: Vec<TemplateRef>,

    /// Per-cut processing fees, in cents
    pub processing_fees: BTreeMap<String, i64>,

    pub min_hanging_weight_lbs: Option<f64>,
    pub max_hanging_weight_lbs: Option<f64>,

    /// Free-form notes shown to producers building a cut sheet
    pub producer_notes: Option<String>,

    pub updated_at: DateTime<Utc>,
}

impl ProcessorCutConfig {
    /// The implicit all-enabled default used when no row exists
    pub fn default_for(processor_org_id: &str) -> Self {
        Self {
            processor_org_id: processor_org_id.to_string(),
            enabled_animals: AnimalType::ALL.into_iter().collect(),
            disabled_cuts: BTreeSet::new(),
            disabled_sausage_flavors: BTreeSet::new(),
            custom_cuts: Vec::new(),
            default_templates: Vec::new(),
            processing_fees: BTreeMap::new(),
            min_hanging_weight_lbs: None,
            max_hanging_weight_lbs: None,
            producer_notes: None,
            updated_at: Utc::now(),
        }
    }

    pub fn is_cut_disabled(&self, cut_id: &str) -> bool {
        self.disabled_cuts.contains(cut_id)
    }
}

/// Result of a configuration lookup
///
/// Distinguishes a saved row from the implicit default instead of scattering
/// nullable-with-fallback logic across callers.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLookup {
    Explicit(ProcessorCutConfig),
    Default,
}

impl ConfigLookup {
    pub fn is_default(&self) -> bool {
        matches!(self, ConfigLookup::Default)
    }

    /// Materialize the effective configuration for the given processor
    pub fn into_config(self, processor_org_id: &str) -> ProcessorCutConfig {
        match self {
            ConfigLookup::Explicit(config) => config,
            ConfigLookup::Default => ProcessorCutConfig::default_for(processor_org_id),
        }
    }
}

/// Partial configuration update
///
/// Merge is driven by field presence, not truthiness: `Some(empty)` writes an
/// explicit empty value, `None` leaves the stored field untouched. Fields
/// that are themselves optional nest a second `Option` so callers can clear
/// them (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub enabled_animals: Option<BTreeSet<AnimalType>>,
    pub disabled_cuts: Option<BTreeSet<String>>,
    pub disabled_sausage_flavors: Option<BTreeSet<String>>,
    pub custom_cuts: Option<Vec<CustomCutDef>>,
    pub default_templates: Option<Vec<TemplateRef>>,
    pub processing_fees: Option<BTreeMap<String, i64>>,
    pub min_hanging_weight_lbs: Option<Option<f64>>,
    pub max_hanging_weight_lbs: Option<Option<f64>>,
    pub producer_notes: Option<Option<String>>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == ConfigPatch::default()
    }

    /// Merge this patch into an existing configuration
    pub fn apply_to(&self, config: &mut ProcessorCutConfig) {
        if let Some(animals) = &self.enabled_animals {
            config.enabled_animals = animals.clone();
        }
        if let Some(cuts) = &self.disabled_cuts {
            config.disabled_cuts = cuts.clone();
        }
        if let Some(flavors) = &self.disabled_sausage_flavors {
            config.disabled_sausage_flavors = flavors.clone();
        }
        if let Some(custom) = &self.custom_cuts {
            config.custom_cuts = custom.clone();
        }
        if let Some(templates) = &self.default_templates {
            config.default_templates = templates.clone();
        }
        if let Some(fees) = &self.processing_fees {
            config.processing_fees = fees.clone();
        }
        if let Some(min) = self.min_hanging_weight_lbs {
            config.min_hanging_weight_lbs = min;
        }
        if let Some(max) = self.max_hanging_weight_lbs {
            config.max_hanging_weight_lbs = max;
        }
        if let Some(notes) = &self.producer_notes {
            config.producer_notes = notes.clone();
        }
        config.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ProcessorCutConfig {
        let mut config = ProcessorCutConfig::default_for("org_proc");
        config.disabled_cuts = ["ribeye".to_string(), "tomahawk".to_string()].into();
        config.producer_notes = Some("call ahead".to_string());
        config
    }

    #[test]
    fn test_patch_preserves_untouched_fields() {
        let mut config = base_config();
        let patch = ConfigPatch {
            producer_notes: Some(Some("new notes".to_string())),
            ..Default::default()
        };
        patch.apply_to(&mut config);

        assert_eq!(config.producer_notes.as_deref(), Some("new notes"));
        assert_eq!(config.disabled_cuts.len(), 2);
        assert!(config.disabled_cuts.contains("ribeye"));
    }

    #[test]
    fn test_patch_explicit_empty_is_a_write() {
        let mut config = base_config();
        config.custom_cuts.push(CustomCutDef {
            id: "house_sausage".to_string(),
            name: "House Sausage".to_string(),
            primal_id: None,
            additional_fee: true,
        });

        let patch = ConfigPatch {
            custom_cuts: Some(Vec::new()),
            ..Default::default()
        };
        patch.apply_to(&mut config);
        assert!(config.custom_cuts.is_empty());
    }

    #[test]
    fn test_patch_can_clear_optional_field() {
        let mut config = base_config();
        let patch = ConfigPatch {
            producer_notes: Some(None),
            ..Default::default()
        };
        patch.apply_to(&mut config);
        assert_eq!(config.producer_notes, None);
    }

    #[test]
    fn test_default_lookup_materializes_all_enabled() {
        let config = ConfigLookup::Default.into_config("org_x");
        assert_eq!(config.processor_org_id, "org_x");
        assert_eq!(config.enabled_animals.len(), 4);
        assert!(config.disabled_cuts.is_empty());
    }

    #[test]
    fn test_empty_patch_detection() {
        assert!(ConfigPatch::default().is_empty());
        let patch = ConfigPatch {
            min_hanging_weight_lbs: Some(None),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
