use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use floor_shared::{
    domain::{
        CardNumber, CardPosition, CardSummary, FaultId, FaultReport, FaultType, Operator, OvenId,
        OvenProcess, ProcessStatus, ProgramId, SelectOption,
    },
    locale::Locale,
    protocol::{LoginCredentials, LoginResponse},
};
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::{
    context::{FloorContext, RefreshPolicy},
    error::ClientResult,
    gateway::ActionGateway,
    persistence::MemoryStorage,
    session::{OperatorSlot, SessionStore},
};

#[derive(Default)]
pub(crate) struct Calls {
    pub login: AtomicUsize,
    pub create_card: AtomicUsize,
    pub cards: AtomicUsize,
    pub positions: AtomicUsize,
    pub delete_position: AtomicUsize,
    pub options: AtomicUsize,
    pub processes: AtomicUsize,
    pub active_program: AtomicUsize,
    pub active_fault: AtomicUsize,
    pub fault_types: AtomicUsize,
    pub report_fault: AtomicUsize,
    pub finish_fault: AtomicUsize,
}

pub(crate) fn count(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

/// Scripted gateway: each call bumps a counter and returns a clone of the
/// configured result.
pub(crate) struct MockGateway {
    pub calls: Calls,
    pub login: Mutex<ClientResult<LoginResponse>>,
    pub create_card: Mutex<ClientResult<CardNumber>>,
    pub cards: Mutex<ClientResult<Vec<CardSummary>>>,
    pub positions: Mutex<ClientResult<Vec<CardPosition>>>,
    pub delete_position: Mutex<ClientResult<()>>,
    pub warehouses: Mutex<ClientResult<Vec<SelectOption>>>,
    pub sectors: Mutex<ClientResult<Vec<SelectOption>>>,
    pub processes: Mutex<ClientResult<Vec<OvenProcess>>>,
    pub active_program: Mutex<ClientResult<Option<ProgramId>>>,
    /// Holds the active-program call until notified.
    pub program_gate: Mutex<Option<Arc<Notify>>>,
    pub active_fault: Mutex<ClientResult<Option<FaultReport>>>,
    pub fault_types: Mutex<ClientResult<Vec<FaultType>>>,
    pub report_fault: Mutex<ClientResult<()>>,
    pub finish_fault: Mutex<ClientResult<()>>,
    pub reported: Mutex<Vec<(OvenId, String, Vec<String>)>>,
}

impl MockGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Calls::default(),
            login: Mutex::new(Ok(LoginResponse {
                operator1: Some(anna()),
                ..LoginResponse::default()
            })),
            create_card: Mutex::new(Ok(CardNumber(42))),
            cards: Mutex::new(Ok(Vec::new())),
            positions: Mutex::new(Ok(Vec::new())),
            delete_position: Mutex::new(Ok(())),
            warehouses: Mutex::new(Ok(vec![option("A"), option("B")])),
            sectors: Mutex::new(Ok(vec![option("1"), option("2")])),
            processes: Mutex::new(Ok(Vec::new())),
            active_program: Mutex::new(Ok(None)),
            program_gate: Mutex::new(None),
            active_fault: Mutex::new(Ok(None)),
            fault_types: Mutex::new(Ok(vec![fault_type("overheat"), fault_type("door")])),
            report_fault: Mutex::new(Ok(())),
            finish_fault: Mutex::new(Ok(())),
            reported: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ActionGateway for MockGateway {
    async fn login(&self, _credentials: LoginCredentials) -> ClientResult<LoginResponse> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        self.login.lock().clone()
    }

    async fn create_new_card(
        &self,
        _persons: Vec<String>,
        _warehouse: String,
        _sector: String,
    ) -> ClientResult<CardNumber> {
        self.calls.create_card.fetch_add(1, Ordering::SeqCst);
        self.create_card.lock().clone()
    }

    async fn fetch_cards(&self, _persons: Vec<String>) -> ClientResult<Vec<CardSummary>> {
        self.calls.cards.fetch_add(1, Ordering::SeqCst);
        self.cards.lock().clone()
    }

    async fn fetch_card_positions(
        &self,
        _persons: Vec<String>,
        _card: CardNumber,
    ) -> ClientResult<Vec<CardPosition>> {
        self.calls.positions.fetch_add(1, Ordering::SeqCst);
        self.positions.lock().clone()
    }

    async fn delete_card_position(
        &self,
        _persons: Vec<String>,
        _card: CardNumber,
        _position: u32,
    ) -> ClientResult<()> {
        self.calls.delete_position.fetch_add(1, Ordering::SeqCst);
        self.delete_position.lock().clone()
    }

    async fn fetch_warehouse_options(&self) -> ClientResult<Vec<SelectOption>> {
        self.calls.options.fetch_add(1, Ordering::SeqCst);
        self.warehouses.lock().clone()
    }

    async fn fetch_sector_options(&self) -> ClientResult<Vec<SelectOption>> {
        self.calls.options.fetch_add(1, Ordering::SeqCst);
        self.sectors.lock().clone()
    }

    async fn fetch_oven_processes(&self, _oven: OvenId) -> ClientResult<Vec<OvenProcess>> {
        self.calls.processes.fetch_add(1, Ordering::SeqCst);
        self.processes.lock().clone()
    }

    async fn fetch_active_oven_program(&self, _oven: OvenId) -> ClientResult<Option<ProgramId>> {
        self.calls.active_program.fetch_add(1, Ordering::SeqCst);
        let gate = self.program_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.active_program.lock().clone()
    }

    async fn fetch_active_oven_fault(
        &self,
        _oven: OvenId,
        _locale: Locale,
    ) -> ClientResult<Option<FaultReport>> {
        self.calls.active_fault.fetch_add(1, Ordering::SeqCst);
        self.active_fault.lock().clone()
    }

    async fn fetch_oven_fault_types(&self) -> ClientResult<Vec<FaultType>> {
        self.calls.fault_types.fetch_add(1, Ordering::SeqCst);
        self.fault_types.lock().clone()
    }

    async fn report_oven_fault(
        &self,
        oven: OvenId,
        fault_key: String,
        operators: Vec<String>,
    ) -> ClientResult<()> {
        self.calls.report_fault.fetch_add(1, Ordering::SeqCst);
        self.reported.lock().push((oven, fault_key, operators));
        self.report_fault.lock().clone()
    }

    async fn finish_oven_fault(&self, _oven: OvenId, _operators: Vec<String>) -> ClientResult<()> {
        self.calls.finish_fault.fetch_add(1, Ordering::SeqCst);
        self.finish_fault.lock().clone()
    }
}

/// Lets spawned fetches and pollers run to completion.
pub(crate) async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

pub(crate) fn anna() -> Operator {
    Operator::new("1001", "Anna Nowak")
}

pub(crate) fn option(value: &str) -> SelectOption {
    SelectOption {
        value: value.to_string(),
        label: format!("Option {value}"),
    }
}

pub(crate) fn fault_type(key: &str) -> FaultType {
    FaultType {
        key: key.to_string(),
        translations: [("pl".to_string(), format!("{key} (pl)"))].into_iter().collect(),
    }
}

pub(crate) fn process(id: &str, status: ProcessStatus) -> OvenProcess {
    OvenProcess {
        id: id.to_string(),
        status,
        hydra_batch: format!("HB-{id}"),
        article: "ART-1".to_string(),
        start_time: None,
    }
}

pub(crate) fn position(number: u32) -> CardPosition {
    CardPosition {
        position: number,
        identifier: "1001".to_string(),
        time: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
        article_number: format!("A-{number}"),
        article_name: "Bolt".to_string(),
        quantity: 10.0,
        unit: "pcs".to_string(),
        wip: false,
        bin: String::new(),
        delivery_date: None,
    }
}

pub(crate) fn fault_report(reported_by: &[&str]) -> FaultReport {
    FaultReport {
        id: FaultId::new("F-1"),
        oven: OvenId::new("oven-1"),
        fault_key: "overheat".to_string(),
        start_time: Utc.with_ymd_and_hms(2024, 3, 1, 6, 30, 0).unwrap(),
        reported_by: reported_by.iter().map(|id| id.to_string()).collect(),
        fault_label: None,
    }
}

pub(crate) fn context(gateway: Arc<MockGateway>) -> Arc<FloorContext> {
    let session = SessionStore::new(Arc::new(MemoryStorage::new()));
    FloorContext::new(gateway, session, Locale::Pl, RefreshPolicy::default()).expect("context")
}

pub(crate) fn logged_in_context(gateway: Arc<MockGateway>) -> Arc<FloorContext> {
    let ctx = context(gateway);
    let operator = anna();
    ctx.session()
        .set_operator_slot(OperatorSlot::First, operator.identifier, operator.display_name)
        .expect("login");
    ctx
}
