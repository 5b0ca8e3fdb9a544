use std::{sync::Arc, time::Duration};

use floor_shared::{
    error::{GatewayError, NOT_FOUND},
    locale::Locale,
};
use tokio::sync::broadcast;
use tracing::{error, info};

use crate::{
    error::{ClientError, ClientResult},
    events::FloorEvent,
    gateway::ActionGateway,
    i18n::{Dictionary, ErrorTable},
    selection::SelectionStore,
    session::{SessionState, SessionStore},
    validation::validate_credentials,
};

pub const ACTIVE_FAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const OVEN_PROCESSES_POLL_INTERVAL: Duration = Duration::from_secs(10);
pub const FAULT_TYPES_STALE_TIME: Duration = Duration::from_secs(60 * 60);

/// Refresh cadence per data kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPolicy {
    pub oven_processes: Duration,
    pub active_fault: Duration,
    pub fault_types_stale: Duration,
    pub cards_stale: Duration,
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            oven_processes: OVEN_PROCESSES_POLL_INTERVAL,
            active_fault: ACTIVE_FAULT_POLL_INTERVAL,
            fault_types_stale: FAULT_TYPES_STALE_TIME,
            cards_stale: Duration::ZERO,
        }
    }
}

/// Handles every flow needs: the gateway, both stores, the dictionary for the
/// active locale and the event channel.
pub struct FloorContext {
    gateway: Arc<dyn ActionGateway>,
    session: SessionStore,
    selection: SelectionStore,
    locale: Locale,
    dictionary: Arc<Dictionary>,
    policy: RefreshPolicy,
    events: broadcast::Sender<FloorEvent>,
}

impl FloorContext {
    pub fn new(
        gateway: Arc<dyn ActionGateway>,
        session: SessionStore,
        locale: Locale,
        policy: RefreshPolicy,
    ) -> serde_json::Result<Arc<Self>> {
        let dictionary = Arc::new(Dictionary::for_locale(locale)?);
        let (events, _) = broadcast::channel(256);
        Ok(Arc::new(Self {
            gateway,
            session,
            selection: SelectionStore::new(),
            locale,
            dictionary,
            policy,
            events,
        }))
    }

    pub fn gateway(&self) -> &Arc<dyn ActionGateway> {
        &self.gateway
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    pub fn policy(&self) -> RefreshPolicy {
        self.policy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<FloorEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: FloorEvent) {
        let _ = self.events.send(event);
    }

    /// Logs a failed user action and raises a toast with the message the
    /// table maps it to.
    pub fn report_failure(&self, action: &'static str, table: &ErrorTable, err: &ClientError) {
        let message = table.message(err);
        error!(action, error = %err, kind = ?err.kind(), "action failed");
        self.emit(FloorEvent::error(message));
    }

    /// Keypad login for up to three operators. Validation failures are
    /// returned without touching the gateway.
    pub async fn login(&self, identifiers: &[String]) -> ClientResult<()> {
        let credentials = validate_credentials(identifiers)?;
        let response = match self.gateway.login(credentials).await {
            Ok(response) => response,
            Err(err) => {
                self.report_failure("login", &self.dictionary.errors.login, &err);
                return Err(err);
            }
        };

        let state = SessionState::from(response.clone());
        if !state.is_logged_in() {
            let err = ClientError::Gateway(GatewayError::new(NOT_FOUND));
            self.report_failure("login", &self.dictionary.errors.login, &err);
            return Err(err);
        }

        let operators = state.operators().count();
        self.selection.clear_selection();
        self.session.apply_login(response)?;
        info!(operators, "operators logged in");
        self.emit(FloorEvent::LoggedIn { operators });
        Ok(())
    }

    /// Clears every operator slot and the selection from any state.
    pub fn logout(&self) -> ClientResult<()> {
        self.selection.clear_selection();
        let persisted = self.session.logout();
        self.emit(FloorEvent::LoggedOut);
        persisted
    }
}

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
