//! Produced package operations
//!
//! Package numbers are assigned read-max-then-insert; the store's UNIQUE
//! index turns concurrent collisions into retryable conflicts instead of
//! duplicates, and the bounded retry here re-reads the counter.

use chrono::Utc;
use serde_json::json;

use super::{AuditOutcome, CutSheetService, ServiceError};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::history::ChangeCategory;
use crate::entities::package::{NewPackage, ProducedPackage};
use crate::store::StoreError;

const NUMBER_RETRIES: usize = 3;

impl CutSheetService<'_> {
    /// Record one physical output package for a sheet line item
    pub fn create_package(
        &self,
        sheet_id: &EntityId,
        new: NewPackage,
    ) -> Result<(EntityId, AuditOutcome), ServiceError> {
        let principal = self.require_processor()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_not_template(&sheet)?;
        self.require_sheet_processor(&sheet, &principal)?;

        let primal_id = new.primal_id.clone().or_else(|| {
            self.taxonomy()
                .find_cut(&new.cut_id)
                .map(|found| found.primal_id.to_string())
        });

        let mut package = ProducedPackage {
            id: EntityId::new(EntityPrefix::Pkg),
            cut_sheet_id: *sheet_id,
            cut_id: new.cut_id.clone(),
            cut_name: new.cut_name.clone(),
            primal_id,
            package_number: 0,
            quantity_in_package: new.quantity_in_package,
            actual_weight_lbs: new.actual_weight_lbs,
            thickness: new.thickness.clone(),
            processing_style: new.processing_style.clone(),
            processor_added: new.processor_added,
            processor_notes: new.processor_notes.clone(),
            livestock_tracking_id: new.livestock_tracking_id.clone(),
            created_at: Utc::now(),
        };

        let mut attempts = 0;
        loop {
            package.package_number = self.store().next_package_number(sheet_id, &new.cut_id)?;
            match self.store().insert_package(&package) {
                Ok(()) => break,
                Err(StoreError::PackageNumberTaken { .. }) if attempts + 1 < NUMBER_RETRIES => {
                    attempts += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        self.store()
            .touch_sheet(sheet_id, principal.organization_type, &principal.user_id)?;

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_category = ChangeCategory::PackageCreated;
        entry.change_summary = format!(
            "Package #{} of {} recorded",
            package.package_number, package.cut_name
        );
        entry.new_state = serde_json::to_value(&package)
            .map_err(|e| ServiceError::Store(StoreError::Json(e)))?;
        entry.affected_cut_id = Some(package.cut_id.clone());
        entry.affected_package_id = Some(package.id);
        Ok((package.id, self.record(entry)))
    }

    /// Set the weighed-out weight with before/after capture
    pub fn update_package_weight(
        &self,
        package_id: &EntityId,
        weight_lbs: f64,
    ) -> Result<AuditOutcome, ServiceError> {
        let principal = self.require_processor()?;
        let package = self
            .store()
            .get_package(package_id)?
            .ok_or(ServiceError::PackageNotFound(*package_id))?;
        let sheet = self.load_sheet(&package.cut_sheet_id)?;
        self.require_sheet_processor(&sheet, &principal)?;

        if package.actual_weight_lbs == Some(weight_lbs) {
            return Ok(AuditOutcome::Unchanged);
        }

        self.store().update_package_weight(package_id, weight_lbs)?;
        self.store().touch_sheet(
            &package.cut_sheet_id,
            principal.organization_type,
            &principal.user_id,
        )?;

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_summary = format!(
            "Package #{} of {} weighed at {} lbs",
            package.package_number, package.cut_name, weight_lbs
        );
        entry.previous_state =
            Some(json!({ "actual_weight_lbs": package.actual_weight_lbs }));
        entry.new_state = json!({ "actual_weight_lbs": weight_lbs });
        entry.changed_fields = vec!["actual_weight_lbs".to_string()];
        entry.affected_cut_id = Some(package.cut_id.clone());
        entry.affected_package_id = Some(package.id);
        Ok(self.record(entry))
    }

    /// Delete a package, recording the full prior row in the ledger
    pub fn delete_package(&self, package_id: &EntityId) -> Result<AuditOutcome, ServiceError> {
        let principal = self.require_processor()?;
        let package = self
            .store()
            .get_package(package_id)?
            .ok_or(ServiceError::PackageNotFound(*package_id))?;
        let sheet = self.load_sheet(&package.cut_sheet_id)?;
        self.require_sheet_processor(&sheet, &principal)?;

        self.store().delete_package(package_id)?;
        self.store().touch_sheet(
            &package.cut_sheet_id,
            principal.organization_type,
            &principal.user_id,
        )?;

        let mut entry = self.entry_base(&sheet, &principal);
        entry.change_summary = format!(
            "Package #{} of {} deleted",
            package.package_number, package.cut_name
        );
        entry.previous_state = Some(
            serde_json::to_value(&package)
                .map_err(|e| ServiceError::Store(StoreError::Json(e)))?,
        );
        entry.new_state = json!({});
        entry.changed_fields = vec!["produced_packages".to_string()];
        entry.affected_cut_id = Some(package.cut_id.clone());
        entry.affected_package_id = Some(package.id);
        Ok(self.record(entry))
    }

    /// All packages recorded for a sheet
    pub fn list_packages(
        &self,
        sheet_id: &EntityId,
    ) -> Result<Vec<ProducedPackage>, ServiceError> {
        let principal = self.require_user()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_sheet_party(&sheet, &principal)?;
        Ok(self.store().list_packages(sheet_id)?)
    }
}
