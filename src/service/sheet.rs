//! Cut sheet document operations
//!
//! Producer operations author the document; processor operations layer
//! overlay records on top of it. Processor actions never delete or rewrite
//! the producer's `cut_sheet_items` rows.

use std::collections::BTreeMap;

use chrono::Utc;
use serde_json::{json, Map, Value};

use super::{AuditOutcome, CutSheetService, ServiceError};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::config::{ProcessorCutConfig, TemplateRef};
use crate::entities::history::{ChangeCategory, ChangeType};
use crate::entities::sheet::{
    AddCutRequest, AddedCut, CutParamUpdates, CutSheet, CutSheetItem, CutSheetSausage,
    CutSheetState, ModificationRecord, NewCutSheet, RemovedCut, SheetStatus,
};
use crate::store::StoreError;
use crate::taxonomy::AnimalType;

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ServiceError> {
    serde_json::to_value(value).map_err(|e| ServiceError::Store(StoreError::Json(e)))
}

impl CutSheetService<'_> {
    /// Create a cut sheet bound to a processing order
    ///
    /// This is the one operation whose ledger entry snapshots the whole
    /// document; there is no narrower prior state to diff against.
    pub fn create_cut_sheet(
        &self,
        new: NewCutSheet,
    ) -> Result<(EntityId, AuditOutcome), ServiceError> {
        let principal = self.require_producer()?;
        if new.processing_order_id.is_empty() {
            return Err(ServiceError::OrderRequired);
        }

        let now = Utc::now();
        let sheet = CutSheet {
            id: EntityId::new(EntityPrefix::Sheet),
            processing_order_id: Some(new.processing_order_id),
            producer_org_id: principal.organization_id.clone(),
            processor_org_id: Some(new.processor_org_id),
            is_template: false,
            template_name: None,
            status: SheetStatus::Draft,
            state: new.state,
            processor_modifications: BTreeMap::new(),
            removed_cuts: Vec::new(),
            added_cuts: Vec::new(),
            processor_notes: None,
            last_modified_by_role: Some(principal.organization_type),
            last_modified_by_user_id: Some(principal.user_id.clone()),
            created_at: now,
            updated_at: now,
        };
        self.store().insert_sheet(&sheet)?;

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_type = ChangeType::Created;
        entry.change_category = ChangeCategory::InitialCreation;
        entry.change_summary = "Cut sheet created".to_string();
        entry.new_state = to_json(&sheet)?;
        Ok((sheet.id, self.record(entry)))
    }

    /// Load a document; either named party may read it
    pub fn get_sheet(&self, sheet_id: &EntityId) -> Result<CutSheet, ServiceError> {
        let principal = self.require_user()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_sheet_party(&sheet, &principal)?;
        Ok(sheet)
    }

    /// Producer draft composition; part of authoring, so not audited
    pub fn add_item(&self, sheet_id: &EntityId, item: CutSheetItem) -> Result<(), ServiceError> {
        let principal = self.require_producer()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_producer(&sheet, &principal)?;
        if sheet.status != SheetStatus::Draft {
            return Err(ServiceError::NotDraft(sheet.id));
        }
        self.store().insert_item(sheet_id, &item)?;
        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;
        Ok(())
    }

    /// Producer draft composition; pork sheets only
    pub fn add_sausage(
        &self,
        sheet_id: &EntityId,
        sausage: CutSheetSausage,
    ) -> Result<(), ServiceError> {
        let principal = self.require_producer()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_producer(&sheet, &principal)?;
        if sheet.state.animal_type != AnimalType::Pork {
            return Err(ServiceError::SausageRequiresPork);
        }
        if sheet.status != SheetStatus::Draft {
            return Err(ServiceError::NotDraft(sheet.id));
        }
        self.store().insert_sausage(sheet_id, &sausage)?;
        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;
        Ok(())
    }

    /// Move a draft into the processor's queue
    pub fn submit(&self, sheet_id: &EntityId) -> Result<AuditOutcome, ServiceError> {
        let principal = self.require_producer()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_producer(&sheet, &principal)?;
        if sheet.status == SheetStatus::Submitted {
            return Ok(AuditOutcome::Unchanged);
        }

        self.store().update_status(sheet_id, SheetStatus::Submitted)?;
        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_type = ChangeType::StatusChanged;
        entry.change_summary = "Cut sheet submitted".to_string();
        entry.previous_state = Some(json!({ "status": SheetStatus::Draft }));
        entry.new_state = json!({ "status": SheetStatus::Submitted });
        entry.changed_fields = vec!["status".to_string()];
        Ok(self.record(entry))
    }

    /// Merge parameter updates into the processor's modification overlay
    pub fn update_cut_parameters(
        &self,
        sheet_id: &EntityId,
        cut_id: &str,
        updates: &CutParamUpdates,
    ) -> Result<AuditOutcome, ServiceError> {
        let principal = self.require_processor()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_processor(&sheet, &principal)?;
        if updates.is_empty() {
            return Ok(AuditOutcome::Unchanged);
        }

        let now = Utc::now();
        let existing = sheet.processor_modifications.get(cut_id);
        let merged = match existing {
            Some(record) => {
                let mut merged = record.clone();
                merged.apply(updates, now);
                merged
            }
            None => ModificationRecord::from_updates(updates, now),
        };

        let mut previous = Map::new();
        let mut new_state = Map::new();
        if let Some(thickness) = &updates.thickness {
            previous.insert(
                "thickness".to_string(),
                json!(existing.and_then(|m| m.thickness.clone())),
            );
            new_state.insert("thickness".to_string(), json!(thickness));
        }
        if let Some(weight) = updates.weight_lbs {
            previous.insert(
                "weight_lbs".to_string(),
                json!(existing.and_then(|m| m.weight_lbs)),
            );
            new_state.insert("weight_lbs".to_string(), json!(weight));
        }
        if let Some(pieces) = updates.pieces_per_package {
            previous.insert(
                "pieces_per_package".to_string(),
                json!(existing.and_then(|m| m.pieces_per_package)),
            );
            new_state.insert("pieces_per_package".to_string(), json!(pieces));
        }
        if let Some(note) = &updates.note {
            previous.insert(
                "note".to_string(),
                json!(existing.and_then(|m| m.note.clone())),
            );
            new_state.insert("note".to_string(), json!(note));
        }

        self.store().upsert_modification(sheet_id, cut_id, &merged)?;
        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_category = ChangeCategory::CutModified;
        entry.change_summary = format!(
            "Updated cut parameters for {}",
            self.cut_display_name(&sheet, cut_id)
        );
        entry.previous_state = Some(Value::Object(previous));
        entry.new_state = Value::Object(new_state);
        entry.changed_fields = updates.changed_fields();
        entry.affected_cut_id = Some(cut_id.to_string());
        Ok(self.record(entry))
    }

    /// Strike a cut from the sheet without touching the producer's item row
    ///
    /// Idempotent: removing an already-removed cut is a successful no-op and
    /// appends nothing to the ledger.
    pub fn remove_cut(
        &self,
        sheet_id: &EntityId,
        cut_id: &str,
        cut_name: &str,
        reason: &str,
    ) -> Result<AuditOutcome, ServiceError> {
        let principal = self.require_processor()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_processor(&sheet, &principal)?;
        if sheet.is_cut_removed(cut_id) {
            return Ok(AuditOutcome::Unchanged);
        }

        let removed = RemovedCut {
            cut_id: cut_id.to_string(),
            cut_name: cut_name.to_string(),
            reason: reason.to_string(),
            removed_at: Utc::now(),
        };
        self.store().insert_removed_cut(sheet_id, &removed)?;
        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;

        let before = &sheet.removed_cuts;
        let mut after = before.clone();
        after.push(removed);

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_category = ChangeCategory::CutRemoved;
        entry.change_summary = format!("Removed {}: {}", cut_name, reason);
        entry.previous_state = Some(json!({ "removed_cuts": to_json(before)? }));
        entry.new_state = json!({ "removed_cuts": to_json(&after)? });
        entry.changed_fields = vec!["removed_cuts".to_string()];
        entry.affected_cut_id = Some(cut_id.to_string());
        Ok(self.record(entry))
    }

    /// Undo a removal by deleting the overlay entry
    ///
    /// The producer's original item row was never deleted, so there is
    /// nothing to resurrect.
    pub fn restore_cut(
        &self,
        sheet_id: &EntityId,
        cut_id: &str,
    ) -> Result<AuditOutcome, ServiceError> {
        let principal = self.require_processor()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_processor(&sheet, &principal)?;

        let Some(removed) = sheet.removed_cuts.iter().find(|r| r.cut_id == cut_id) else {
            return Ok(AuditOutcome::Unchanged);
        };

        self.store().delete_removed_cut(sheet_id, cut_id)?;
        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;

        let before = &sheet.removed_cuts;
        let after: Vec<&RemovedCut> = before.iter().filter(|r| r.cut_id != cut_id).collect();

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_category = ChangeCategory::CutAdded;
        entry.change_summary = format!("Restored {}", removed.cut_name);
        entry.previous_state = Some(json!({ "removed_cuts": to_json(before)? }));
        entry.new_state = json!({ "removed_cuts": to_json(&after)? });
        entry.changed_fields = vec!["removed_cuts".to_string()];
        entry.affected_cut_id = Some(cut_id.to_string());
        Ok(self.record(entry))
    }

    /// Add a processor-side cut to the sheet
    ///
    /// Unlike removal, adding twice is ambiguous, so a duplicate surfaces as
    /// an explicit error rather than a silent no-op.
    pub fn add_cut(
        &self,
        sheet_id: &EntityId,
        request: AddCutRequest,
    ) -> Result<AuditOutcome, ServiceError> {
        let principal = self.require_processor()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_processor(&sheet, &principal)?;
        if sheet.is_cut_added(&request.cut_id) {
            return Err(ServiceError::AlreadyAdded {
                cut_id: request.cut_id,
            });
        }

        let added = AddedCut {
            cut_id: request.cut_id.clone(),
            cut_name: request.cut_name.clone(),
            thickness: request.thickness,
            pieces_per_package: request.pieces_per_package,
            note: request.note,
            added_at: Utc::now(),
        };
        self.store().insert_added_cut(sheet_id, &added)?;
        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;

        let before = &sheet.added_cuts;
        let mut after = before.clone();
        after.push(added);

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_category = ChangeCategory::CutAdded;
        entry.change_summary = format!("Added {}", request.cut_name);
        entry.previous_state = Some(json!({ "added_cuts": to_json(before)? }));
        entry.new_state = json!({ "added_cuts": to_json(&after)? });
        entry.changed_fields = vec!["added_cuts".to_string()];
        entry.affected_cut_id = Some(request.cut_id);
        Ok(self.record(entry))
    }

    /// Overwrite the processor's notes with before/after capture
    pub fn update_processor_notes(
        &self,
        sheet_id: &EntityId,
        notes: Option<&str>,
    ) -> Result<AuditOutcome, ServiceError> {
        let principal = self.require_processor()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_processor(&sheet, &principal)?;
        if sheet.processor_notes.as_deref() == notes {
            return Ok(AuditOutcome::Unchanged);
        }

        self.store().update_processor_notes(sheet_id, notes)?;
        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_category = ChangeCategory::NotesUpdated;
        entry.change_summary = "Processor notes updated".to_string();
        entry.previous_state = Some(json!({ "processor_notes": sheet.processor_notes }));
        entry.new_state = json!({ "processor_notes": notes });
        entry.changed_fields = vec!["processor_notes".to_string()];
        Ok(self.record(entry))
    }

    /// Record the hanging weight measured at intake
    pub fn update_hanging_weight(
        &self,
        sheet_id: &EntityId,
        weight_lbs: f64,
    ) -> Result<AuditOutcome, ServiceError> {
        let principal = self.require_processor()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_processor(&sheet, &principal)?;

        let config = self
            .store()
            .get_config(&principal.organization_id)?
            .unwrap_or_else(|| ProcessorCutConfig::default_for(&principal.organization_id));
        let below = config
            .min_hanging_weight_lbs
            .is_some_and(|min| weight_lbs < min);
        let above = config
            .max_hanging_weight_lbs
            .is_some_and(|max| weight_lbs > max);
        if below || above {
            return Err(ServiceError::WeightOutOfRange {
                weight_lbs,
                min: config.min_hanging_weight_lbs,
                max: config.max_hanging_weight_lbs,
            });
        }

        if sheet.state.hanging_weight_lbs == Some(weight_lbs) {
            return Ok(AuditOutcome::Unchanged);
        }

        self.store().update_hanging_weight(sheet_id, weight_lbs)?;
        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_category = ChangeCategory::WeightEntered;
        entry.change_summary = format!("Hanging weight set to {} lbs", weight_lbs);
        entry.previous_state =
            Some(json!({ "hanging_weight_lbs": sheet.state.hanging_weight_lbs }));
        entry.new_state = json!({ "hanging_weight_lbs": weight_lbs });
        entry.changed_fields = vec!["hanging_weight_lbs".to_string()];
        Ok(self.record(entry))
    }

    // ---------------------------------------------------------------------
    // Templates
    // ---------------------------------------------------------------------

    /// Save a state as a reusable template; a distinct creation, not an update
    pub fn save_as_template(
        &self,
        state: CutSheetState,
        name: &str,
    ) -> Result<(EntityId, AuditOutcome), ServiceError> {
        let principal = self.require_producer()?;

        let now = Utc::now();
        let sheet = CutSheet {
            id: EntityId::new(EntityPrefix::Sheet),
            processing_order_id: None,
            producer_org_id: principal.organization_id.clone(),
            processor_org_id: None,
            is_template: true,
            template_name: Some(name.to_string()),
            status: SheetStatus::Draft,
            state,
            processor_modifications: BTreeMap::new(),
            removed_cuts: Vec::new(),
            added_cuts: Vec::new(),
            processor_notes: None,
            last_modified_by_role: Some(principal.organization_type),
            last_modified_by_user_id: Some(principal.user_id.clone()),
            created_at: now,
            updated_at: now,
        };
        self.store().insert_sheet(&sheet)?;

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_type = ChangeType::Created;
        entry.change_category = ChangeCategory::InitialCreation;
        entry.change_summary = format!("Template '{}' saved", name);
        entry.new_state = to_json(&sheet)?;
        Ok((sheet.id, self.record(entry)))
    }

    /// Reconstruct a fresh draft state from a template; never mutates it
    pub fn load_template(&self, template_id: &EntityId) -> Result<CutSheetState, ServiceError> {
        let principal = self.require_user()?;
        let sheet = self
            .store()
            .get_sheet(template_id)?
            .ok_or(ServiceError::TemplateNotFound(*template_id))?;
        if !sheet.is_template {
            return Err(ServiceError::NotATemplate(*template_id));
        }
        if sheet.producer_org_id != principal.organization_id {
            return Err(ServiceError::NotAuthorized(
                "template belongs to another organization".to_string(),
            ));
        }
        Ok(sheet.state)
    }

    /// Templates owned by the caller's organization
    pub fn templates_for_org(&self) -> Result<Vec<TemplateRef>, ServiceError> {
        let principal = self.require_user()?;
        Ok(self.store().list_templates(&principal.organization_id)?)
    }

    fn cut_display_name(&self, sheet: &CutSheet, cut_id: &str) -> String {
        sheet
            .state
            .items
            .iter()
            .find(|item| item.cut_id == cut_id)
            .map(|item| item.cut_name.clone())
            .or_else(|| {
                sheet
                    .added_cuts
                    .iter()
                    .find(|added| added.cut_id == cut_id)
                    .map(|added| added.cut_name.clone())
            })
            .or_else(|| self.taxonomy().find_cut(cut_id).map(|f| f.cut.name.clone()))
            .unwrap_or_else(|| cut_id.to_string())
    }
}
