//! Confirm/cancel controllers for destructive or state-changing actions.
//!
//! A dialog hands its confirm to a caller-supplied action that makes one
//! gateway round trip and resolves to `true` on success. The dialog closes
//! only then; on failure it stays open so the operator can retry or cancel.

use std::future::Future;

use chrono::{DateTime, Local, Utc};
use floor_shared::domain::{FaultReport, FaultType};
use tracing::debug;

use crate::{error::ValidationError, session::SessionStore};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmDialog {
    open: bool,
    pending: bool,
}

impl ConfirmDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn cancel(&mut self) {
        self.open = false;
        self.pending = false;
    }

    pub async fn confirm<F, Fut>(&mut self, on_confirm: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if !self.open || self.pending {
            return false;
        }
        self.pending = true;
        let success = on_confirm().await;
        self.pending = false;
        if success {
            self.open = false;
        } else {
            debug!("confirm failed; dialog stays open");
        }
        success
    }
}

/// Report-fault confirmation; a fault type from the catalog must be picked
/// before confirm is enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFaultDialog {
    dialog: ConfirmDialog,
    selected: Option<String>,
}

impl ReportFaultDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.dialog.is_open()
    }

    pub fn open(&mut self) {
        self.selected = None;
        self.dialog.open();
    }

    pub fn cancel(&mut self) {
        self.selected = None;
        self.dialog.cancel();
    }

    pub fn selected_fault(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select_fault(&mut self, key: &str, catalog: &[FaultType]) -> Result<(), ValidationError> {
        if !catalog.iter().any(|fault| fault.key == key) {
            return Err(ValidationError::UnknownFaultType(key.to_string()));
        }
        self.selected = Some(key.to_string());
        Ok(())
    }

    pub fn can_confirm(&self) -> bool {
        self.dialog.is_open() && !self.dialog.is_pending() && self.selected.is_some()
    }

    /// Fails without calling `on_confirm` when no fault type is picked.
    pub async fn confirm<F, Fut>(&mut self, on_confirm: F) -> Result<bool, ValidationError>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = bool>,
    {
        let fault_key = self
            .selected
            .clone()
            .ok_or(ValidationError::MissingFaultType)?;
        let success = self.dialog.confirm(|| on_confirm(fault_key)).await;
        if success {
            self.selected = None;
        }
        Ok(success)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultDetails {
    pub start_time: String,
    pub reported_by: String,
}

/// Finish-fault confirmation for the fault that is currently open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinishFaultDialog {
    dialog: ConfirmDialog,
    fault: Option<FaultReport>,
}

impl FinishFaultDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.dialog.is_open()
    }

    pub fn open_for(&mut self, fault: FaultReport) {
        self.fault = Some(fault);
        self.dialog.open();
    }

    pub fn cancel(&mut self) {
        self.dialog.cancel();
    }

    pub fn fault(&self) -> Option<&FaultReport> {
        self.fault.as_ref()
    }

    pub fn details(&self, session: &SessionStore) -> Option<FaultDetails> {
        self.fault.as_ref().map(|fault| FaultDetails {
            start_time: format_date_time(fault.start_time),
            reported_by: fault
                .reported_by
                .iter()
                .map(|identifier| session.display_name(identifier))
                .collect::<Vec<_>>()
                .join(", "),
        })
    }

    pub async fn confirm<F, Fut>(&mut self, on_confirm: F) -> bool
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = bool>,
    {
        if self.fault.is_none() {
            return false;
        }
        let success = self.dialog.confirm(on_confirm).await;
        if success {
            self.fault = None;
        }
        success
    }
}

pub fn format_date_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%d.%m.%Y %H:%M:%S").to_string()
}

#[cfg(test)]
#[path = "tests/dialog_tests.rs"]
mod tests;
