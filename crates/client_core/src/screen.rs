//! Screen selection for the oven and inventory flows.
//!
//! Each flow is an ordered table of `(state, guard)` rows evaluated top to
//! bottom; the first guard that holds picks the state. Views are plain
//! borrowed snapshots so the tables can be tested without any stores.

use floor_shared::domain::{has_active_process, CardNumber, OvenId, OvenProcess, ProgramId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvenScreen {
    Login,
    OvenSelection,
    Loading,
    ProgramSelection,
    ProcessList,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OvenState {
    NoOperatorLoggedIn,
    NoResourceSelected,
    LoadingProgramOrProcesses,
    /// Waiting for the program of a running/prepared process to be derived.
    NoProgramSelectedButActiveProcessExists,
    NoProgramSelectedAndNoActiveProcess,
    Ready,
}

impl OvenState {
    pub fn screen(self) -> OvenScreen {
        match self {
            Self::NoOperatorLoggedIn => OvenScreen::Login,
            Self::NoResourceSelected => OvenScreen::OvenSelection,
            Self::LoadingProgramOrProcesses | Self::NoProgramSelectedButActiveProcessExists => {
                OvenScreen::Loading
            }
            Self::NoProgramSelectedAndNoActiveProcess => OvenScreen::ProgramSelection,
            Self::Ready => OvenScreen::ProcessList,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OvenView<'a> {
    pub logged_in: bool,
    pub oven: Option<&'a OvenId>,
    pub program: Option<&'a ProgramId>,
    pub is_loading_program: bool,
    pub is_fetching_program: bool,
    pub processes_loading: bool,
    pub processes: Option<&'a [OvenProcess]>,
    /// An automatic program lookup for this oven already finished without
    /// yielding a program.
    pub auto_program_settled: bool,
}

impl OvenView<'_> {
    pub fn has_active_process(&self) -> bool {
        self.processes.is_some_and(has_active_process)
    }

    fn awaiting_auto_program(&self) -> bool {
        self.program.is_none() && self.has_active_process() && !self.auto_program_settled
    }

    /// Whether the one-shot "fetch active program" call should be issued now.
    pub fn wants_active_program(&self) -> bool {
        self.oven.is_some()
            && !self.processes_loading
            && !self.is_loading_program
            && !self.is_fetching_program
            && self.awaiting_auto_program()
    }
}

type OvenGuard = fn(&OvenView<'_>) -> bool;

const OVEN_RULES: &[(OvenState, OvenGuard)] = &[
    (OvenState::NoOperatorLoggedIn, |view| !view.logged_in),
    (OvenState::NoResourceSelected, |view| view.oven.is_none()),
    (OvenState::LoadingProgramOrProcesses, |view| {
        view.is_loading_program || view.is_fetching_program || view.processes_loading
    }),
    (OvenState::NoProgramSelectedButActiveProcessExists, |view| {
        view.awaiting_auto_program()
    }),
    (OvenState::NoProgramSelectedAndNoActiveProcess, |view| {
        view.program.is_none()
    }),
];

pub fn select_oven_state(view: &OvenView<'_>) -> OvenState {
    OVEN_RULES
        .iter()
        .find(|(_, guard)| guard(view))
        .map_or(OvenState::Ready, |(state, _)| *state)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardScreen {
    Login,
    CardSelection,
    PositionSelection,
    PositionDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    NoOperatorLoggedIn,
    NoCardSelected,
    NoPositionSelected,
    PositionSelected,
}

impl CardState {
    pub fn screen(self) -> CardScreen {
        match self {
            Self::NoOperatorLoggedIn => CardScreen::Login,
            Self::NoCardSelected => CardScreen::CardSelection,
            Self::NoPositionSelected => CardScreen::PositionSelection,
            Self::PositionSelected => CardScreen::PositionDetail,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CardView {
    pub logged_in: bool,
    pub card: Option<CardNumber>,
    pub position: Option<u32>,
}

type CardGuard = fn(&CardView) -> bool;

const CARD_RULES: &[(CardState, CardGuard)] = &[
    (CardState::NoOperatorLoggedIn, |view| !view.logged_in),
    (CardState::NoCardSelected, |view| view.card.is_none()),
    (CardState::NoPositionSelected, |view| view.position.is_none()),
];

pub fn select_card_state(view: &CardView) -> CardState {
    CARD_RULES
        .iter()
        .find(|(_, guard)| guard(view))
        .map_or(CardState::PositionSelected, |(state, _)| *state)
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
