//! Currently selected oven or inventory card. In-memory only.

use std::sync::Arc;

use floor_shared::domain::{CardNumber, OvenId, ProgramId};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OvenSelection {
    pub oven: OvenId,
    pub program: Option<ProgramId>,
    pub is_loading_program: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardSelection {
    pub card: CardNumber,
    pub warehouse: String,
    pub sector: String,
    pub position: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub oven: Option<OvenSelection>,
    pub card: Option<CardSelection>,
}

#[derive(Clone)]
pub struct SelectionStore {
    state: Arc<watch::Sender<Selection>>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Selection::default());
        Self {
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> Selection {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Selection> {
        self.state.subscribe()
    }

    pub fn oven(&self) -> Option<OvenSelection> {
        self.state.borrow().oven.clone()
    }

    pub fn card(&self) -> Option<CardSelection> {
        self.state.borrow().card.clone()
    }

    pub fn select_oven(&self, oven: OvenId) {
        debug!(%oven, "oven selected");
        self.replace(|selection| {
            selection.oven = Some(OvenSelection {
                oven,
                program: None,
                is_loading_program: false,
            });
        });
    }

    /// No-op when no oven is selected.
    pub fn select_program(&self, program: ProgramId) {
        self.replace(|selection| {
            if let Some(oven) = selection.oven.as_mut() {
                oven.program = Some(program);
                oven.is_loading_program = false;
            }
        });
    }

    pub fn set_loading_program(&self, loading: bool) {
        self.replace(|selection| {
            if let Some(oven) = selection.oven.as_mut() {
                oven.is_loading_program = loading;
            }
        });
    }

    pub fn select_card(&self, card: CardNumber, warehouse: impl Into<String>, sector: impl Into<String>) {
        debug!(%card, "card selected");
        let warehouse = warehouse.into();
        let sector = sector.into();
        self.replace(|selection| {
            selection.card = Some(CardSelection {
                card,
                warehouse,
                sector,
                position: None,
            });
        });
    }

    /// No-op when no card is selected.
    pub fn select_position(&self, position: u32) {
        self.replace(|selection| {
            if let Some(card) = selection.card.as_mut() {
                card.position = Some(position);
            }
        });
    }

    pub fn clear_position(&self) {
        self.replace(|selection| {
            if let Some(card) = selection.card.as_mut() {
                card.position = None;
            }
        });
    }

    pub fn clear_card(&self) {
        self.replace(|selection| selection.card = None);
    }

    pub fn clear_oven(&self) {
        self.replace(|selection| selection.oven = None);
    }

    pub fn clear_selection(&self) {
        self.state.send_replace(Selection::default());
    }

    /// Builds the next value from a copy and swaps it in whole, so readers
    /// never see half of an update.
    fn replace(&self, update: impl FnOnce(&mut Selection)) {
        let mut next = self.snapshot();
        update(&mut next);
        self.state.send_replace(next);
    }
}
