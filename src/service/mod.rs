//! Operation layer - authorization gates plus the audited mutation protocol
//!
//! Every mutating operation follows the same three steps: fetch the narrow
//! sub-state it touches, apply a pure transformation, then persist the new
//! sub-state and append exactly one history entry capturing that sub-state.
//! The two writes are sequenced, not transactional: a failed document write
//! aborts before any history write, while a failed history write after a
//! successful document write surfaces as [`AuditOutcome::Gap`] without
//! failing the primary operation.

mod config;
mod package;
mod sheet;

use serde_json::Value;
use thiserror::Error;

use crate::core::identity::EntityId;
use crate::core::session::{PartyRole, Principal, SessionProvider};
use crate::entities::history::{
    ChangeCategory, HistoryEntry, HistorySummary, NewHistoryEntry,
};
use crate::entities::sheet::CutSheet;
use crate::store::{Store, StoreError};
use crate::taxonomy::Taxonomy;

/// How the audit write of a mutation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Primary write and ledger entry both landed
    Recorded,
    /// The operation was a no-op; nothing was written or recorded
    Unchanged,
    /// The primary write landed but the ledger append failed; the document
    /// now has an audit gap operators should reconcile
    Gap { error: String },
}

impl AuditOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditOutcome::Recorded)
    }

    pub fn is_gap(&self) -> bool {
        matches!(self, AuditOutcome::Gap { .. })
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    #[error("Cut sheet not found: {0}")]
    SheetNotFound(EntityId),

    #[error("Package not found: {0}")]
    PackageNotFound(EntityId),

    #[error("Template not found: {0}")]
    TemplateNotFound(EntityId),

    #[error("Unknown cut: {0}")]
    CutNotFound(String),

    #[error("Cut {cut_id} has already been added to this sheet")]
    AlreadyAdded { cut_id: String },

    #[error("A processing order is required for a non-template cut sheet")]
    OrderRequired,

    #[error("Hanging weight {weight_lbs} lbs is outside the processor's accepted range")]
    WeightOutOfRange {
        weight_lbs: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("Operation not valid for a template: {0}")]
    IsTemplate(EntityId),

    #[error("Not a template: {0}")]
    NotATemplate(EntityId),

    #[error("Cut sheet {0} is no longer a draft")]
    NotDraft(EntityId),

    #[error("Sausage flavors only apply to pork cut sheets")]
    SausageRequiresPork,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The cut sheet subsystem's public operation surface
pub struct CutSheetService<'a> {
    store: &'a Store,
    taxonomy: &'a Taxonomy,
    session: &'a dyn SessionProvider,
}

impl<'a> CutSheetService<'a> {
    pub fn new(store: &'a Store, taxonomy: &'a Taxonomy, session: &'a dyn SessionProvider) -> Self {
        Self {
            store,
            taxonomy,
            session,
        }
    }

    pub(crate) fn store(&self) -> &Store {
        self.store
    }

    pub(crate) fn taxonomy(&self) -> &Taxonomy {
        self.taxonomy
    }

    // ---------------------------------------------------------------------
    // Authorization gates
    // ---------------------------------------------------------------------

    pub(crate) fn require_user(&self) -> Result<Principal, ServiceError> {
        self.session
            .current_user()
            .ok_or(ServiceError::NotAuthenticated)
    }

    pub(crate) fn require_processor(&self) -> Result<Principal, ServiceError> {
        let principal = self.require_user()?;
        if !principal.is_processor() {
            return Err(ServiceError::NotAuthorized(
                "requires a processor organization".to_string(),
            ));
        }
        Ok(principal)
    }

    pub(crate) fn require_producer(&self) -> Result<Principal, ServiceError> {
        let principal = self.require_user()?;
        if !principal.is_producer() {
            return Err(ServiceError::NotAuthorized(
                "requires a producer organization".to_string(),
            ));
        }
        Ok(principal)
    }

    pub(crate) fn load_sheet(&self, sheet_id: &EntityId) -> Result<CutSheet, ServiceError> {
        self.store
            .get_sheet(sheet_id)?
            .ok_or(ServiceError::SheetNotFound(*sheet_id))
    }

    /// Either party named on the sheet may read it
    pub(crate) fn require_sheet_party(
        &self,
        sheet: &CutSheet,
        principal: &Principal,
    ) -> Result<(), ServiceError> {
        let org = &principal.organization_id;
        if *org == sheet.producer_org_id || sheet.processor_org_id.as_ref() == Some(org) {
            Ok(())
        } else {
            Err(ServiceError::NotAuthorized(
                "organization is not a party to this cut sheet".to_string(),
            ))
        }
    }

    /// Only the processor the sheet is addressed to may run processor ops
    pub(crate) fn require_sheet_processor(
        &self,
        sheet: &CutSheet,
        principal: &Principal,
    ) -> Result<(), ServiceError> {
        if !principal.is_processor()
            || sheet.processor_org_id.as_ref() != Some(&principal.organization_id)
        {
            return Err(ServiceError::NotAuthorized(
                "requires the processor this cut sheet is addressed to".to_string(),
            ));
        }
        Ok(())
    }

    /// Only the owning producer may run producer ops
    pub(crate) fn require_sheet_producer(
        &self,
        sheet: &CutSheet,
        principal: &Principal,
    ) -> Result<(), ServiceError> {
        if !principal.is_producer() || sheet.producer_org_id != principal.organization_id {
            return Err(ServiceError::NotAuthorized(
                "requires the producer that owns this cut sheet".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn require_not_template(&self, sheet: &CutSheet) -> Result<(), ServiceError> {
        if sheet.is_template {
            Err(ServiceError::IsTemplate(sheet.id))
        } else {
            Ok(())
        }
    }

    // ---------------------------------------------------------------------
    // Audited mutation protocol, step 3b
    // ---------------------------------------------------------------------

    /// Append the ledger entry for an already-persisted primary write.
    ///
    /// A failure here must not fail the operation: the primary effect stands
    /// and the caller reports the gap instead.
    pub(crate) fn record(&self, entry: NewHistoryEntry) -> AuditOutcome {
        match self.store.append_history(entry) {
            Ok(_) => AuditOutcome::Recorded,
            Err(e) => AuditOutcome::Gap {
                error: e.to_string(),
            },
        }
    }

    pub(crate) fn entry_base(
        &self,
        sheet: &CutSheet,
        principal: &Principal,
    ) -> NewHistoryEntry {
        NewHistoryEntry {
            cut_sheet_id: sheet.id,
            processing_order_id: sheet.processing_order_id.clone(),
            changed_by_user_id: principal.user_id.clone(),
            changed_by_org_id: principal.organization_id.clone(),
            changed_by_role: principal.organization_type,
            change_type: crate::entities::history::ChangeType::Updated,
            change_category: ChangeCategory::General,
            change_summary: String::new(),
            previous_state: None,
            new_state: Value::Object(serde_json::Map::new()),
            changed_fields: Vec::new(),
            affected_cut_id: None,
            affected_package_id: None,
        }
    }

    // ---------------------------------------------------------------------
    // History reads
    // ---------------------------------------------------------------------

    pub fn history(&self, sheet_id: &EntityId) -> Result<Vec<HistoryEntry>, ServiceError> {
        let principal = self.require_user()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_sheet_party(&sheet, &principal)?;
        Ok(self.store.history(sheet_id)?)
    }

    pub fn history_by_category(
        &self,
        sheet_id: &EntityId,
        category: ChangeCategory,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        let principal = self.require_user()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_sheet_party(&sheet, &principal)?;
        Ok(self.store.history_by_category(sheet_id, category)?)
    }

    pub fn history_by_role(
        &self,
        sheet_id: &EntityId,
        role: PartyRole,
    ) -> Result<Vec<HistoryEntry>, ServiceError> {
        let principal = self.require_user()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_sheet_party(&sheet, &principal)?;
        Ok(self.store.history_by_role(sheet_id, role)?)
    }

    /// Aggregate over the full entry list; per-document cardinality is small
    pub fn history_summary(&self, sheet_id: &EntityId) -> Result<HistorySummary, ServiceError> {
        let entries = self.history(sheet_id)?;
        let newest = entries.first();
        Ok(HistorySummary {
            total_changes: entries.len(),
            producer_changes: entries
                .iter()
                .filter(|e| e.changed_by_role == PartyRole::Producer)
                .count(),
            processor_changes: entries
                .iter()
                .filter(|e| e.changed_by_role == PartyRole::Processor)
                .count(),
            last_modified: newest.map(|e| e.created_at),
            last_modified_by: newest.map(|e| e.changed_by_user_id.clone()),
        })
    }

    /// The full initial snapshot from the document's `created` entry
    pub fn original_state(&self, sheet_id: &EntityId) -> Result<Option<Value>, ServiceError> {
        let principal = self.require_user()?;
        let sheet = self.load_sheet(sheet_id)?;
        self.require_sheet_party(&sheet, &principal)?;
        Ok(self.store.original_state(sheet_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::StaticSession;
    use crate::entities::sheet::{CutSheetState, NewCutSheet};
    use crate::taxonomy::AnimalType;

    fn producer() -> Principal {
        Principal {
            user_id: "usr_farm".to_string(),
            organization_id: "org_farm".to_string(),
            organization_type: PartyRole::Producer,
        }
    }

    fn processor() -> Principal {
        Principal {
            user_id: "usr_proc".to_string(),
            organization_id: "org_proc".to_string(),
            organization_type: PartyRole::Processor,
        }
    }

    fn new_sheet() -> NewCutSheet {
        NewCutSheet {
            processing_order_id: "order_1".to_string(),
            processor_org_id: "org_proc".to_string(),
            state: CutSheetState::new(AnimalType::Beef),
        }
    }

    #[test]
    fn test_anonymous_session_is_rejected_first() {
        let store = Store::open_in_memory().unwrap();
        let taxonomy = Taxonomy::load().unwrap();
        let session = StaticSession::anonymous();
        let service = CutSheetService::new(&store, &taxonomy, &session);

        assert!(matches!(
            service.create_cut_sheet(new_sheet()),
            Err(ServiceError::NotAuthenticated)
        ));
    }

    #[test]
    fn test_history_write_failure_reports_gap_not_error() {
        let store = Store::open_in_memory().unwrap();
        let taxonomy = Taxonomy::load().unwrap();

        let producer_session = StaticSession::new(producer());
        let producer_service = CutSheetService::new(&store, &taxonomy, &producer_session);
        let (sheet_id, outcome) = producer_service.create_cut_sheet(new_sheet()).unwrap();
        assert!(outcome.is_recorded());

        // Sabotage the ledger after the document exists.
        store
            .conn()
            .execute_batch("DROP TABLE cut_sheet_history")
            .unwrap();

        let processor_session = StaticSession::new(processor());
        let processor_service = CutSheetService::new(&store, &taxonomy, &processor_session);
        let outcome = processor_service
            .update_processor_notes(&sheet_id, Some("trim heavy"))
            .unwrap();
        assert!(outcome.is_gap());

        // The primary write stands despite the gap.
        let sheet = store.get_sheet(&sheet_id).unwrap().unwrap();
        assert_eq!(sheet.processor_notes.as_deref(), Some("trim heavy"));
    }

    #[test]
    fn test_primary_write_failure_aborts_before_history() {
        let store = Store::open_in_memory().unwrap();
        let taxonomy = Taxonomy::load().unwrap();

        let producer_session = StaticSession::new(producer());
        let producer_service = CutSheetService::new(&store, &taxonomy, &producer_session);
        let (sheet_id, _) = producer_service.create_cut_sheet(new_sheet()).unwrap();

        // Sabotage the primary table for removals; the ledger stays intact.
        store
            .conn()
            .execute_batch("DROP TABLE sheet_removed_cuts")
            .unwrap();

        let processor_session = StaticSession::new(processor());
        let processor_service = CutSheetService::new(&store, &taxonomy, &processor_session);
        let result =
            processor_service.remove_cut(&sheet_id, "ribeye", "Ribeye Steak", "out of stock");
        assert!(matches!(result, Err(ServiceError::Store(_))));

        // No ledger entry was appended for the failed operation.
        let entries = store.history(&sheet_id).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].change_category,
            ChangeCategory::InitialCreation
        );
    }
}
