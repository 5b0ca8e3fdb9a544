//! Oven flow: which screen to show, the polled data behind it, and the
//! fault actions.

use std::sync::Arc;

use floor_shared::{
    domain::{FaultReport, FaultType, OvenId, OvenProcess, ProgramId},
    locale::Locale,
};
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::{
    cache::{FetchFuture, QueryCache, QueryOptions, QueryState, Subscription},
    context::{FloorContext, RefreshPolicy},
    dialog::{FinishFaultDialog, ReportFaultDialog},
    error::{ClientResult, ValidationError},
    events::FloorEvent,
    gateway::ActionGateway,
    screen::{select_oven_state, OvenState, OvenView},
};

pub type FaultKey = (OvenId, Locale);

/// Per-kind caches for the oven screens. Cloning shares the entries.
#[derive(Clone)]
pub struct OvenCaches {
    pub processes: QueryCache<OvenId, Vec<OvenProcess>>,
    pub active_fault: QueryCache<FaultKey, Option<FaultReport>>,
    pub fault_types: QueryCache<(), Vec<FaultType>>,
}

impl OvenCaches {
    pub fn new(policy: RefreshPolicy) -> Self {
        Self {
            processes: QueryCache::new(
                "oven-processes",
                QueryOptions::polling(policy.oven_processes),
            ),
            active_fault: QueryCache::new(
                "active-oven-fault",
                QueryOptions::polling(policy.active_fault),
            ),
            fault_types: QueryCache::new(
                "oven-fault-types",
                QueryOptions::cached(policy.fault_types_stale),
            ),
        }
    }
}

#[derive(Debug, Default)]
struct ProgramLookup {
    in_flight: bool,
    settled_for: Option<OvenId>,
}

pub struct OvenFlow {
    ctx: Arc<FloorContext>,
    caches: OvenCaches,
    processes: Subscription<OvenId, Vec<OvenProcess>>,
    active_fault: Subscription<FaultKey, Option<FaultReport>>,
    fault_types: Subscription<(), Vec<FaultType>>,
    program_lookup: Arc<Mutex<ProgramLookup>>,
}

impl OvenFlow {
    pub fn new(ctx: Arc<FloorContext>) -> Self {
        let caches = OvenCaches::new(ctx.policy());
        Self::with_caches(ctx, caches)
    }

    pub fn with_caches(ctx: Arc<FloorContext>, caches: OvenCaches) -> Self {
        let processes = caches.processes.subscribe(None, processes_fetcher(ctx.gateway()));
        let active_fault = caches
            .active_fault
            .subscribe(None, active_fault_fetcher(ctx.gateway()));
        let fault_types = caches
            .fault_types
            .subscribe(None, fault_types_fetcher(ctx.gateway()));
        Self {
            ctx,
            caches,
            processes,
            active_fault,
            fault_types,
            program_lookup: Arc::new(Mutex::new(ProgramLookup::default())),
        }
    }

    pub fn context(&self) -> &Arc<FloorContext> {
        &self.ctx
    }

    pub fn caches(&self) -> &OvenCaches {
        &self.caches
    }

    /// Re-reads both stores and the caches and picks the screen. Issues the
    /// one-shot active-program lookup when the processes show work running
    /// without a program chosen.
    pub fn evaluate(&mut self) -> OvenState {
        let oven_key = self.sync_subscriptions();
        let logged_in = self.ctx.session().is_logged_in();
        let selection = self.ctx.selection().oven();
        let processes = self.processes.data();
        let (is_fetching_program, auto_program_settled) = {
            let lookup = self.program_lookup.lock();
            (
                lookup.in_flight,
                oven_key.is_some() && lookup.settled_for == oven_key,
            )
        };

        let mut view = OvenView {
            logged_in,
            oven: selection.as_ref().map(|oven| &oven.oven),
            program: selection.as_ref().and_then(|oven| oven.program.as_ref()),
            is_loading_program: selection.as_ref().is_some_and(|oven| oven.is_loading_program),
            is_fetching_program,
            processes_loading: self.processes.is_loading(),
            processes: processes.as_deref().map(Vec::as_slice),
            auto_program_settled,
        };

        if view.wants_active_program() {
            if let Some(oven) = view.oven {
                if self.spawn_active_program_lookup(oven.clone()) {
                    view.is_fetching_program = true;
                }
            }
        }
        select_oven_state(&view)
    }

    /// Mounts the polled queries on the selected oven, or disables them when
    /// nothing is selected. Returns the oven they are mounted on.
    fn sync_subscriptions(&mut self) -> Option<OvenId> {
        let oven = if self.ctx.session().is_logged_in() {
            self.ctx.selection().oven().map(|selection| selection.oven)
        } else {
            None
        };

        if self.processes.key() != oven.as_ref() {
            self.processes = self
                .caches
                .processes
                .subscribe(oven.clone(), processes_fetcher(self.ctx.gateway()));
        }

        let fault_key = oven.clone().map(|oven| (oven, self.ctx.locale()));
        if self.active_fault.key() != fault_key.as_ref() {
            self.active_fault = self
                .caches
                .active_fault
                .subscribe(fault_key, active_fault_fetcher(self.ctx.gateway()));
        }

        let wants_fault_types = oven.is_some();
        if self.fault_types.is_enabled() != wants_fault_types {
            self.fault_types = self.caches.fault_types.subscribe(
                wants_fault_types.then_some(()),
                fault_types_fetcher(self.ctx.gateway()),
            );
        }

        if oven.is_none() {
            self.program_lookup.lock().settled_for = None;
        }
        oven
    }

    /// Returns `false` when a lookup is already running.
    fn spawn_active_program_lookup(&self, oven: OvenId) -> bool {
        {
            let mut lookup = self.program_lookup.lock();
            if lookup.in_flight {
                return false;
            }
            lookup.in_flight = true;
        }
        self.ctx.selection().set_loading_program(true);
        debug!(%oven, "looking up active oven program");

        let ctx = Arc::clone(&self.ctx);
        let lookup = Arc::clone(&self.program_lookup);
        tokio::spawn(async move {
            let outcome = ctx.gateway().fetch_active_oven_program(oven.clone()).await;
            let still_selected = ctx
                .selection()
                .oven()
                .is_some_and(|selection| selection.oven == oven && selection.program.is_none());

            let adopted = match outcome {
                Ok(Some(program)) if still_selected => {
                    info!(%oven, %program, "adopted active oven program");
                    ctx.selection().select_program(program.clone());
                    ctx.emit(FloorEvent::ProgramAdopted {
                        oven: oven.clone(),
                        program,
                    });
                    true
                }
                Ok(Some(program)) => {
                    debug!(%oven, %program, "oven changed during lookup; result dropped");
                    false
                }
                Ok(None) => {
                    info!(%oven, "no active program reported; falling back to program selection");
                    false
                }
                Err(err) => {
                    error!(%oven, error = %err, "failed to fetch active oven program");
                    false
                }
            };

            if !adopted && still_selected {
                ctx.selection().set_loading_program(false);
            }
            let mut lookup = lookup.lock();
            lookup.in_flight = false;
            if !adopted {
                lookup.settled_for = Some(oven);
            }
        });
        true
    }

    pub fn select_oven(&mut self, oven: OvenId) {
        self.program_lookup.lock().settled_for = None;
        self.ctx.selection().select_oven(oven);
    }

    pub fn select_program(&self, program: ProgramId) {
        self.ctx.selection().select_program(program);
    }

    /// Back to oven selection.
    pub fn leave_oven(&mut self) {
        self.program_lookup.lock().settled_for = None;
        self.ctx.selection().clear_oven();
    }

    pub fn logout(&mut self) -> ClientResult<()> {
        let result = self.ctx.logout();
        self.program_lookup.lock().settled_for = None;
        self.sync_subscriptions();
        result
    }

    pub fn processes(&self) -> QueryState<Vec<OvenProcess>> {
        self.processes.state()
    }

    pub fn active_fault_state(&self) -> QueryState<Option<FaultReport>> {
        self.active_fault.state()
    }

    pub fn active_fault(&self) -> Option<FaultReport> {
        self.active_fault.data().and_then(|fault| (*fault).clone())
    }

    pub fn fault_types(&self) -> Option<Arc<Vec<FaultType>>> {
        self.fault_types.data()
    }

    /// Fault type keys paired with labels in the active locale.
    pub fn fault_type_labels(&self) -> Vec<(String, String)> {
        let locale = self.ctx.locale();
        self.fault_types()
            .map(|types| {
                types
                    .iter()
                    .map(|fault| (fault.key.clone(), fault.label(locale).to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Waits for the fault-type catalog, fetching it when nothing is cached.
    pub async fn load_fault_types(&self) -> ClientResult<Arc<Vec<FaultType>>> {
        if let Some(types) = self.fault_types.data() {
            return Ok(types);
        }
        let state = self.fault_types.refetch().await;
        match (state.data, state.error) {
            (Some(types), _) => Ok(types),
            (None, Some(err)) => Err(err),
            (None, None) => Err(ValidationError::NothingSelected("oven").into()),
        }
    }

    /// Localized text for a failed poll of the processes or the active
    /// fault. Polling keeps running while it is shown.
    pub fn fetch_error_message(&self) -> Option<String> {
        let err = self.processes.error().or_else(|| self.active_fault.error())?;
        Some(self.ctx.dictionary().errors.fetch.message(&err))
    }

    pub async fn refetch_processes(&self) -> QueryState<Vec<OvenProcess>> {
        self.processes.refetch().await
    }

    pub async fn refetch_active_fault(&self) -> QueryState<Option<FaultReport>> {
        self.active_fault.refetch().await
    }

    /// Waits until the processes or the active fault snapshot changes.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            changed = self.processes.changed() => changed,
            changed = self.active_fault.changed() => changed,
        }
    }

    pub async fn report_fault(&self, fault_key: String) -> bool {
        let Some(selection) = self.ctx.selection().oven() else {
            warn!("report fault without a selected oven");
            return false;
        };
        let operators = self.ctx.session().identifiers();
        let result = self
            .ctx
            .gateway()
            .report_oven_fault(selection.oven.clone(), fault_key.clone(), operators)
            .await;
        match result {
            Ok(()) => {
                info!(oven = %selection.oven, fault_key = %fault_key, "oven fault reported");
                self.caches
                    .active_fault
                    .invalidate(&(selection.oven, self.ctx.locale()));
                true
            }
            Err(err) => {
                let table = &self.ctx.dictionary().errors.fault;
                self.ctx.report_failure("report_oven_fault", table, &err);
                false
            }
        }
    }

    pub async fn finish_fault(&self) -> bool {
        let Some(selection) = self.ctx.selection().oven() else {
            warn!("finish fault without a selected oven");
            return false;
        };
        let operators = self.ctx.session().identifiers();
        let result = self
            .ctx
            .gateway()
            .finish_oven_fault(selection.oven.clone(), operators)
            .await;
        match result {
            Ok(()) => {
                info!(oven = %selection.oven, "oven fault finished");
                self.caches
                    .active_fault
                    .invalidate(&(selection.oven, self.ctx.locale()));
                true
            }
            Err(err) => {
                let table = &self.ctx.dictionary().errors.fault;
                self.ctx.report_failure("finish_oven_fault", table, &err);
                false
            }
        }
    }

    pub async fn confirm_report_fault(
        &self,
        dialog: &mut ReportFaultDialog,
    ) -> Result<bool, ValidationError> {
        dialog.confirm(|fault_key| self.report_fault(fault_key)).await
    }

    pub async fn confirm_finish_fault(&self, dialog: &mut FinishFaultDialog) -> bool {
        dialog.confirm(|| self.finish_fault()).await
    }
}

fn processes_fetcher(
    gateway: &Arc<dyn ActionGateway>,
) -> impl Fn(OvenId) -> FetchFuture<Vec<OvenProcess>> + Send + Sync + 'static {
    let gateway = Arc::clone(gateway);
    move |oven| {
        let gateway = Arc::clone(&gateway);
        async move { gateway.fetch_oven_processes(oven).await }.boxed()
    }
}

fn active_fault_fetcher(
    gateway: &Arc<dyn ActionGateway>,
) -> impl Fn(FaultKey) -> FetchFuture<Option<FaultReport>> + Send + Sync + 'static {
    let gateway = Arc::clone(gateway);
    move |(oven, locale)| {
        let gateway = Arc::clone(&gateway);
        async move { gateway.fetch_active_oven_fault(oven, locale).await }.boxed()
    }
}

fn fault_types_fetcher(
    gateway: &Arc<dyn ActionGateway>,
) -> impl Fn(()) -> FetchFuture<Vec<FaultType>> + Send + Sync + 'static {
    let gateway = Arc::clone(gateway);
    move |()| {
        let gateway = Arc::clone(&gateway);
        async move { gateway.fetch_oven_fault_types().await }.boxed()
    }
}

#[cfg(test)]
#[path = "tests/oven_tests.rs"]
mod tests;
