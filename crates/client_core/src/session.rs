//! Logged-in operators, persisted across restarts.

use std::sync::Arc;

use floor_shared::{domain::Operator, protocol::LoginResponse};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{error::ClientResult, persistence::DurableStorage};

pub const SESSION_NAMESPACE: &str = "personal-numbers";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorSlot {
    First,
    Second,
    Third,
}

impl OperatorSlot {
    pub const ALL: [OperatorSlot; 3] = [Self::First, Self::Second, Self::Third];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
            Self::Third => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub operator1: Option<Operator>,
    #[serde(default)]
    pub operator2: Option<Operator>,
    #[serde(default)]
    pub operator3: Option<Operator>,
}

impl SessionState {
    pub fn slot(&self, slot: OperatorSlot) -> Option<&Operator> {
        match slot {
            OperatorSlot::First => self.operator1.as_ref(),
            OperatorSlot::Second => self.operator2.as_ref(),
            OperatorSlot::Third => self.operator3.as_ref(),
        }
    }

    fn slot_mut(&mut self, slot: OperatorSlot) -> &mut Option<Operator> {
        match slot {
            OperatorSlot::First => &mut self.operator1,
            OperatorSlot::Second => &mut self.operator2,
            OperatorSlot::Third => &mut self.operator3,
        }
    }

    pub fn operators(&self) -> impl Iterator<Item = &Operator> {
        OperatorSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.slot(slot))
    }

    pub fn is_logged_in(&self) -> bool {
        self.operators().next().is_some()
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.operators()
            .map(|operator| operator.identifier.clone())
            .collect()
    }

    pub fn display_name(&self, identifier: &str) -> String {
        self.operators()
            .find(|operator| operator.identifier == identifier)
            .map(|operator| operator.display_name.clone())
            .unwrap_or_else(|| identifier.to_string())
    }
}

impl From<LoginResponse> for SessionState {
    fn from(value: LoginResponse) -> Self {
        Self {
            operator1: value.operator1,
            operator2: value.operator2,
            operator3: value.operator3,
        }
    }
}

/// Cheap-clone handle over the process-wide operator slots.
#[derive(Clone)]
pub struct SessionStore {
    state: Arc<watch::Sender<SessionState>>,
    storage: Arc<dyn DurableStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self {
            state: Arc::new(state),
            storage,
        }
    }

    /// Builds a store from whatever was persisted last. Unreadable records
    /// start an empty session.
    pub fn rehydrate(storage: Arc<dyn DurableStorage>) -> Self {
        let restored = match storage.load(SESSION_NAMESPACE) {
            Ok(Some(raw)) => match serde_json::from_str::<SessionState>(&raw) {
                Ok(state) => state,
                Err(err) => {
                    warn!(%err, "discarding unreadable persisted session");
                    SessionState::default()
                }
            },
            Ok(None) => SessionState::default(),
            Err(err) => {
                warn!(%err, "failed to load persisted session");
                SessionState::default()
            }
        };
        if restored.is_logged_in() {
            info!(
                operators = restored.operators().count(),
                "restored persisted session"
            );
        }
        let (state, _) = watch::channel(restored);
        Self {
            state: Arc::new(state),
            storage,
        }
    }

    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.borrow().is_logged_in()
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.state.borrow().identifiers()
    }

    pub fn display_name(&self, identifier: &str) -> String {
        self.state.borrow().display_name(identifier)
    }

    /// An identifier lives in one slot at a time: writing it here clears
    /// any other slot that held it.
    pub fn set_operator_slot(
        &self,
        slot: OperatorSlot,
        identifier: impl Into<String>,
        display_name: impl Into<String>,
    ) -> ClientResult<()> {
        let operator = Operator::new(identifier, display_name);
        let mut next = self.snapshot();
        for other in OperatorSlot::ALL.into_iter().filter(|other| *other != slot) {
            let held = next.slot_mut(other);
            if held
                .as_ref()
                .is_some_and(|held| held.identifier == operator.identifier)
            {
                *held = None;
            }
        }
        *next.slot_mut(slot) = Some(operator);
        self.replace(next)
    }

    pub fn clear_operator_slot(&self, slot: OperatorSlot) -> ClientResult<()> {
        let mut next = self.snapshot();
        *next.slot_mut(slot) = None;
        self.replace(next)
    }

    /// Writes all three slots from a login response in one step.
    pub fn apply_login(&self, response: LoginResponse) -> ClientResult<()> {
        self.replace(SessionState::from(response))
    }

    /// Empties the slots and drops the persisted record.
    pub fn logout(&self) -> ClientResult<()> {
        info!("operators logged out");
        self.state.send_replace(SessionState::default());
        self.storage.remove(SESSION_NAMESPACE).map_err(|err| {
            warn!(%err, "failed to remove persisted session");
            err
        })
    }

    /// The in-memory write always lands; a failed persist is reported to the
    /// caller afterwards.
    fn replace(&self, next: SessionState) -> ClientResult<()> {
        let encoded = serde_json::to_string(&next)?;
        self.state.send_replace(next);
        self.storage.save(SESSION_NAMESPACE, &encoded).map_err(|err| {
            warn!(%err, "failed to persist session");
            err
        })
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
