//! Shared test helpers for integration tests

#![allow(dead_code)]

use cleaver::core::identity::EntityId;
use cleaver::core::session::{PartyRole, Principal, StaticSession};
use cleaver::entities::sheet::{CutSheetItem, CutSheetState, NewCutSheet};
use cleaver::service::CutSheetService;
use cleaver::store::Store;
use cleaver::taxonomy::{AnimalType, Taxonomy};

pub const PRODUCER_ORG: &str = "org_hilltop_farm";
pub const PROCESSOR_ORG: &str = "org_valley_meats";
pub const ORDER_ID: &str = "order_1001";

pub fn producer() -> Principal {
    Principal {
        user_id: "usr_jordan".to_string(),
        organization_id: PRODUCER_ORG.to_string(),
        organization_type: PartyRole::Producer,
    }
}

pub fn processor() -> Principal {
    Principal {
        user_id: "usr_casey".to_string(),
        organization_id: PROCESSOR_ORG.to_string(),
        organization_type: PartyRole::Processor,
    }
}

pub fn producer_session() -> StaticSession {
    StaticSession::new(producer())
}

pub fn processor_session() -> StaticSession {
    StaticSession::new(processor())
}

pub fn test_store() -> Store {
    Store::open_in_memory().unwrap()
}

pub fn test_taxonomy() -> Taxonomy {
    Taxonomy::load().unwrap()
}

pub fn service<'a>(
    store: &'a Store,
    taxonomy: &'a Taxonomy,
    session: &'a StaticSession,
) -> CutSheetService<'a> {
    CutSheetService::new(store, taxonomy, session)
}

/// A beef draft addressed to the processor org
pub fn beef_sheet() -> NewCutSheet {
    NewCutSheet {
        processing_order_id: ORDER_ID.to_string(),
        processor_org_id: PROCESSOR_ORG.to_string(),
        state: CutSheetState::new(AnimalType::Beef),
    }
}

pub fn ribeye_item() -> CutSheetItem {
    CutSheetItem {
        cut_id: "ribeye".to_string(),
        cut_name: "Ribeye Steak".to_string(),
        thickness: Some("1.25in".to_string()),
        weight_lbs: None,
        pieces_per_package: Some(2),
        sort_order: 0,
    }
}

/// Create a beef sheet as the producer, returning its ID
pub fn create_beef_sheet(store: &Store, taxonomy: &Taxonomy) -> EntityId {
    let session = producer_session();
    let service = service(store, taxonomy, &session);
    let (sheet_id, outcome) = service.create_cut_sheet(beef_sheet()).unwrap();
    assert!(outcome.is_recorded());
    sheet_id
}
