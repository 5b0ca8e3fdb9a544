//! Events broadcast to whatever renders the screens.

use floor_shared::domain::{CardNumber, OvenId, ProgramId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorEvent {
    /// Transient error toast.
    ErrorToast(String),
    LoggedIn {
        operators: usize,
    },
    LoggedOut,
    CardAdopted(CardNumber),
    ProgramAdopted {
        oven: OvenId,
        program: ProgramId,
    },
}

impl FloorEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::ErrorToast(message.into())
    }
}
