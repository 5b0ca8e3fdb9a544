use std::sync::Arc;

use super::*;
use crate::{
    persistence::MemoryStorage,
    session::OperatorSlot,
    test_support::{fault_report, fault_type},
};

#[tokio::test]
async fn confirm_dialog_closes_only_on_success() {
    let mut dialog = ConfirmDialog::new();
    assert!(!dialog.confirm(|| async { true }).await, "closed dialog ignores confirm");

    dialog.open();
    assert!(!dialog.confirm(|| async { false }).await);
    assert!(dialog.is_open());

    assert!(dialog.confirm(|| async { true }).await);
    assert!(!dialog.is_open());
}

#[test]
fn cancel_closes_without_action() {
    let mut dialog = ConfirmDialog::new();
    dialog.open();
    dialog.cancel();
    assert!(!dialog.is_open());
    assert!(!dialog.is_pending());
}

#[tokio::test]
async fn report_fault_requires_a_catalog_entry() {
    let catalog = vec![fault_type("overheat"), fault_type("door")];
    let mut dialog = ReportFaultDialog::new();
    dialog.open();
    assert!(!dialog.can_confirm());
    let mut called = false;
    assert_eq!(
        dialog
            .confirm(|_| {
                called = true;
                async { true }
            })
            .await,
        Err(ValidationError::MissingFaultType)
    );
    assert!(!called);
    assert!(dialog.is_open());

    assert_eq!(
        dialog.select_fault("flood", &catalog),
        Err(ValidationError::UnknownFaultType("flood".to_string()))
    );
    assert!(!dialog.can_confirm());

    dialog.select_fault("door", &catalog).expect("known");
    assert!(dialog.can_confirm());

    let mut sent = None;
    let confirmed = dialog
        .confirm(|key| {
            sent = Some(key);
            async { true }
        })
        .await;
    assert_eq!(confirmed, Ok(true));
    assert_eq!(sent.as_deref(), Some("door"));
    assert!(!dialog.is_open());
    assert_eq!(dialog.selected_fault(), None);
}

#[test]
fn reopening_report_dialog_clears_previous_choice() {
    let catalog = vec![fault_type("overheat")];
    let mut dialog = ReportFaultDialog::new();
    dialog.open();
    dialog.select_fault("overheat", &catalog).expect("known");
    dialog.cancel();
    dialog.open();
    assert_eq!(dialog.selected_fault(), None);
}

#[tokio::test]
async fn finish_fault_details_use_display_names() {
    let session = SessionStore::new(Arc::new(MemoryStorage::new()));
    session
        .set_operator_slot(OperatorSlot::First, "1001", "Anna Nowak")
        .expect("slot");
    session
        .set_operator_slot(OperatorSlot::Second, "1002", "Jan Kowalski")
        .expect("slot");

    let mut dialog = FinishFaultDialog::new();
    assert!(dialog.details(&session).is_none());
    dialog.open_for(fault_report(&["1001", "1002", "2000"]));

    let details = dialog.details(&session).expect("details");
    assert_eq!(details.reported_by, "Anna Nowak, Jan Kowalski, 2000");
    assert_eq!(
        details.start_time,
        format_date_time(fault_report(&[]).start_time)
    );

    assert!(!dialog.confirm(|| async { false }).await);
    assert!(dialog.is_open());
    assert!(dialog.fault().is_some());
    assert!(dialog.confirm(|| async { true }).await);
    assert!(!dialog.is_open());
    assert!(dialog.fault().is_none());
}
