//! Cut sheet mutations: overlays, idempotency, and the full lifecycle

mod common;

use cleaver::entities::config::ConfigPatch;
use cleaver::entities::history::{ChangeCategory, ChangeType};
use cleaver::entities::sheet::{AddCutRequest, CutParamUpdates, SheetStatus};
use cleaver::service::{AuditOutcome, ServiceError};
use common::*;

#[test]
fn test_remove_cut_is_idempotent() {
    let store = test_store();
    let taxonomy = test_taxonomy();
    let sheet_id = create_beef_sheet(&store, &taxonomy);

    let session = processor_session();
    let service = service(&store, &taxonomy, &session);

    let first = service
        .remove_cut(&sheet_id, "ribeye", "Ribeye Steak", "out of stock")
        .unwrap();
    assert!(first.is_recorded());

    // Second removal of the same cut: success, no new overlay row, no new
    // ledger entry.
    let second = service
        .remove_cut(&sheet_id, "ribeye", "Ribeye Steak", "still out of stock")
        .unwrap();
    assert_eq!(second, AuditOutcome::Unchanged);

    let sheet = service.get_sheet(&sheet_id).unwrap();
    assert_eq!(sheet.removed_cuts.len(), 1);
    assert_eq!(sheet.removed_cuts[0].reason, "out of stock");

    let removals = service
        .history_by_category(&sheet_id, ChangeCategory::CutRemoved)
        .unwrap();
    assert_eq!(removals.len(), 1);
}

#[test]
fn test_remove_then_restore_round_trips() {
    let store = test_store();
    let taxonomy = test_taxonomy();

    let producer_session = producer_session();
    let producer_service = service(&store, &taxonomy, &producer_session);
    let (sheet_id, _) = producer_service.create_cut_sheet(beef_sheet()).unwrap();
    producer_service.add_item(&sheet_id, ribeye_item()).unwrap();

    let session = processor_session();
    let service = service(&store, &taxonomy, &session);

    service
        .remove_cut(&sheet_id, "ribeye", "Ribeye Steak", "out of stock")
        .unwrap();
    service.restore_cut(&sheet_id, "ribeye").unwrap();

    let sheet = service.get_sheet(&sheet_id).unwrap();
    assert!(sheet.removed_cuts.is_empty());
    // The producer's original item was never touched by either call.
    assert_eq!(sheet.state.items.len(), 1);
    assert_eq!(sheet.state.items[0].cut_id, "ribeye");
    assert_eq!(sheet.state.items[0].pieces_per_package, Some(2));

    // Restoring a cut that is not removed is a quiet no-op.
    let outcome = service.restore_cut(&sheet_id, "ribeye").unwrap();
    assert_eq!(outcome, AuditOutcome::Unchanged);
}

#[test]
fn test_add_cut_twice_is_an_error() {
    let store = test_store();
    let taxonomy = test_taxonomy();
    let sheet_id = create_beef_sheet(&store, &taxonomy);

    let session = processor_session();
    let service = service(&store, &taxonomy, &session);

    let request = AddCutRequest {
        cut_id: "tri_tip".to_string(),
        cut_name: "Tri-Tip Roast".to_string(),
        thickness: None,
        pieces_per_package: Some(1),
        note: None,
    };
    service.add_cut(&sheet_id, request.clone()).unwrap();

    let result = service.add_cut(&sheet_id, request);
    assert!(matches!(
        result,
        Err(ServiceError::AlreadyAdded { cut_id }) if cut_id == "tri_tip"
    ));

    let sheet = service.get_sheet(&sheet_id).unwrap();
    assert_eq!(sheet.added_cuts.len(), 1);
}

#[test]
fn test_update_cut_parameters_merges_and_stamps() {
    let store = test_store();
    let taxonomy = test_taxonomy();
    let sheet_id = create_beef_sheet(&store, &taxonomy);

    let session = processor_session();
    let service = service(&store, &taxonomy, &session);

    service
        .update_cut_parameters(
            &sheet_id,
            "ribeye",
            &CutParamUpdates {
                thickness: Some("1in".to_string()),
                pieces_per_package: Some(2),
                ..Default::default()
            },
        )
        .unwrap();

    service
        .update_cut_parameters(
            &sheet_id,
            "ribeye",
            &CutParamUpdates {
                thickness: Some("1.5in".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let sheet = service.get_sheet(&sheet_id).unwrap();
    let record = &sheet.processor_modifications["ribeye"];
    assert_eq!(record.thickness.as_deref(), Some("1.5in"));
    // Fields absent from the second update keep their merged values.
    assert_eq!(record.pieces_per_package, Some(2));

    // The second entry's delta names only the touched key.
    let entries = service
        .history_by_category(&sheet_id, ChangeCategory::CutModified)
        .unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].changed_fields, vec!["thickness"]);
    assert_eq!(entries[0].affected_cut_id.as_deref(), Some("ribeye"));

    // An empty update is a no-op with no ledger entry.
    let outcome = service
        .update_cut_parameters(&sheet_id, "ribeye", &CutParamUpdates::default())
        .unwrap();
    assert_eq!(outcome, AuditOutcome::Unchanged);
}

#[test]
fn test_full_lifecycle_scenario() {
    let store = test_store();
    let taxonomy = test_taxonomy();

    // Producer creates a beef sheet with no hanging weight and picks ribeye.
    let producer_session = producer_session();
    let producer_service = service(&store, &taxonomy, &producer_session);
    let (sheet_id, _) = producer_service.create_cut_sheet(beef_sheet()).unwrap();
    producer_service.add_item(&sheet_id, ribeye_item()).unwrap();

    // Processor strikes the ribeye.
    let processor_session = processor_session();
    let processor_service = service(&store, &taxonomy, &processor_session);
    processor_service
        .remove_cut(&sheet_id, "ribeye", "Ribeye", "out of stock")
        .unwrap();

    let sheet = processor_service.get_sheet(&sheet_id).unwrap();
    assert!(sheet.state.hanging_weight_lbs.is_none());
    assert_eq!(sheet.removed_cuts.len(), 1);
    assert_eq!(sheet.removed_cuts[0].cut_id, "ribeye");
    assert_eq!(sheet.removed_cuts[0].reason, "out of stock");

    let history = processor_service.history(&sheet_id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].change_category, ChangeCategory::CutRemoved);
    assert_eq!(history[1].change_type, ChangeType::Created);

    let summary = processor_service.history_summary(&sheet_id).unwrap();
    assert_eq!(summary.total_changes, 2);
    assert_eq!(summary.producer_changes, 1);
    assert_eq!(summary.processor_changes, 1);
    assert_eq!(summary.last_modified_by.as_deref(), Some("usr_casey"));
}

#[test]
fn test_submit_changes_status_once() {
    let store = test_store();
    let taxonomy = test_taxonomy();

    let session = producer_session();
    let service = service(&store, &taxonomy, &session);
    let (sheet_id, _) = service.create_cut_sheet(beef_sheet()).unwrap();

    assert!(service.submit(&sheet_id).unwrap().is_recorded());
    let sheet = service.get_sheet(&sheet_id).unwrap();
    assert_eq!(sheet.status, SheetStatus::Submitted);

    // Submitting again is a no-op.
    assert_eq!(service.submit(&sheet_id).unwrap(), AuditOutcome::Unchanged);

    let entries = service.history(&sheet_id).unwrap();
    let status_changes: Vec<_> = entries
        .iter()
        .filter(|e| e.change_type == ChangeType::StatusChanged)
        .collect();
    assert_eq!(status_changes.len(), 1);
    assert_eq!(status_changes[0].changed_fields, vec!["status"]);
}

#[test]
fn test_hanging_weight_respects_config_window() {
    let store = test_store();
    let taxonomy = test_taxonomy();
    let sheet_id = create_beef_sheet(&store, &taxonomy);

    let session = processor_session();
    let service = service(&store, &taxonomy, &session);

    service
        .upsert_config(&ConfigPatch {
            min_hanging_weight_lbs: Some(Some(300.0)),
            max_hanging_weight_lbs: Some(Some(900.0)),
            ..Default::default()
        })
        .unwrap();

    assert!(matches!(
        service.update_hanging_weight(&sheet_id, 120.0),
        Err(ServiceError::WeightOutOfRange { .. })
    ));
    assert!(matches!(
        service.update_hanging_weight(&sheet_id, 1500.0),
        Err(ServiceError::WeightOutOfRange { .. })
    ));

    assert!(service
        .update_hanging_weight(&sheet_id, 645.5)
        .unwrap()
        .is_recorded());
    let sheet = service.get_sheet(&sheet_id).unwrap();
    assert_eq!(sheet.state.hanging_weight_lbs, Some(645.5));

    let entries = service
        .history_by_category(&sheet_id, ChangeCategory::WeightEntered)
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(
        entries[0].new_state["hanging_weight_lbs"],
        serde_json::json!(645.5)
    );
}

#[test]
fn test_authorization_matrix() {
    let store = test_store();
    let taxonomy = test_taxonomy();
    let sheet_id = create_beef_sheet(&store, &taxonomy);

    // The producer cannot run processor overlay operations.
    let producer_session = producer_session();
    let producer_service = service(&store, &taxonomy, &producer_session);
    assert!(matches!(
        producer_service.remove_cut(&sheet_id, "ribeye", "Ribeye", "nope"),
        Err(ServiceError::NotAuthorized(_))
    ));

    // A different processor org cannot touch the sheet either.
    let stranger = cleaver::core::session::StaticSession::new(
        cleaver::core::session::Principal {
            user_id: "usr_rival".to_string(),
            organization_id: "org_rival_meats".to_string(),
            organization_type: cleaver::core::session::PartyRole::Processor,
        },
    );
    let rival_service = service(&store, &taxonomy, &stranger);
    assert!(matches!(
        rival_service.remove_cut(&sheet_id, "ribeye", "Ribeye", "nope"),
        Err(ServiceError::NotAuthorized(_))
    ));
    assert!(matches!(
        rival_service.get_sheet(&sheet_id),
        Err(ServiceError::NotAuthorized(_))
    ));

    // Anonymous callers fail authentication before anything else.
    let anonymous = cleaver::core::session::StaticSession::anonymous();
    let anon_service = service(&store, &taxonomy, &anonymous);
    assert!(matches!(
        anon_service.get_sheet(&sheet_id),
        Err(ServiceError::NotAuthenticated)
    ));
}

#[test]
fn test_sausage_requires_pork() {
    let store = test_store();
    let taxonomy = test_taxonomy();

    let session = producer_session();
    let service = service(&store, &taxonomy, &session);
    let (beef_id, _) = service.create_cut_sheet(beef_sheet()).unwrap();

    let result = service.add_sausage(
        &beef_id,
        cleaver::entities::sheet::CutSheetSausage {
            flavor: "breakfast".to_string(),
            pounds: 10.0,
        },
    );
    assert!(matches!(result, Err(ServiceError::SausageRequiresPork)));

    let mut pork = beef_sheet();
    pork.state = cleaver::entities::sheet::CutSheetState::new(cleaver::taxonomy::AnimalType::Pork);
    let (pork_id, _) = service.create_cut_sheet(pork).unwrap();
    service
        .add_sausage(
            &pork_id,
            cleaver::entities::sheet::CutSheetSausage {
                flavor: "breakfast".to_string(),
                pounds: 10.0,
            },
        )
        .unwrap();

    let sheet = service.get_sheet(&pork_id).unwrap();
    assert_eq!(sheet.state.sausages.len(), 1);
}
