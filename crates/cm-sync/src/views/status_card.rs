//! Single employee status card, polled on the status cadence

use cm_core::{CmResult, Id, Seq};
use cm_models::{Employee, EmployeeStatus, EmployeeStatusSnapshot, EmployeeStatusUpdate};
use tracing::{debug, info, warn};

use crate::controller::{Envelope, Reducer, ViewController, ViewHandle};
use crate::state::{LoadTracker, ViewState};
use crate::views::{into_data, ViewDeps};

const VIEW: &str = "employee-status";

pub type EmployeeStatusView = ViewController<StatusCardReducer>;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusCardData {
    pub employee: Employee,
    pub snapshot: EmployeeStatusSnapshot,
}

impl StatusCardData {
    pub fn status(&self) -> EmployeeStatus {
        self.snapshot.status
    }
}

#[derive(Debug)]
pub enum StatusCardMsg {
    Load,
    Loaded(CmResult<(Employee, EmployeeStatusSnapshot)>),
    SetStatus(EmployeeStatusUpdate),
    StatusSet {
        requested: EmployeeStatus,
        result: CmResult<EmployeeStatusSnapshot>,
    },
}

pub struct StatusCardReducer {
    deps: ViewDeps,
    employee_id: Id,
    load: LoadTracker,
    /// Seq of the newest response written into state
    applied: Seq,
    polling: bool,
}

impl ViewController<StatusCardReducer> {
    pub fn open(deps: ViewDeps, employee_id: impl Into<Id>) -> Self {
        Self::start(
            VIEW,
            StatusCardReducer {
                deps,
                employee_id: employee_id.into(),
                load: LoadTracker::default(),
                applied: 0,
                polling: false,
            },
        )
    }

    pub fn set_status(&self, update: EmployeeStatusUpdate) -> Seq {
        self.handle().send(StatusCardMsg::SetStatus(update))
    }
}

impl StatusCardReducer {
    fn load(&mut self, state: &mut ViewState<StatusCardData>, seq: Seq, handle: &ViewHandle<StatusCardMsg>) {
        if let Some(message) = self.deps.session_error() {
            state.begin_load();
            state.load_failed(message);
            return;
        }
        if !self.load.start(seq) {
            debug!(view = VIEW, seq, "load already in flight");
            return;
        }
        let background = state.begin_load();
        debug!(view = VIEW, seq, background, employee_id = %self.employee_id, "loading");

        let client = self.deps.client.clone();
        let id = self.employee_id.clone();
        handle.request(
            seq,
            async move {
                tokio::try_join!(
                    async { into_data(client.get_employee(&id).await) },
                    async { into_data(client.get_employee_status(&id).await) },
                )
            },
            StatusCardMsg::Loaded,
        );
    }

    fn loaded(
        &mut self,
        state: &mut ViewState<StatusCardData>,
        seq: Seq,
        result: CmResult<(Employee, EmployeeStatusSnapshot)>,
        handle: &ViewHandle<StatusCardMsg>,
    ) {
        if !self.load.finish(seq) {
            debug!(view = VIEW, seq, "superseded load ignored");
            return;
        }
        match result {
            Ok((mut employee, snapshot)) => {
                if seq <= self.applied {
                    debug!(view = VIEW, seq, applied = self.applied, "load older than applied status");
                    state.refresh_succeeded();
                } else {
                    self.applied = seq;
                    if snapshot.status.is_known() {
                        employee.status = snapshot.status;
                    }
                    let data = StatusCardData { employee, snapshot };
                    if state.data.is_some() {
                        state.data = Some(data);
                        state.refresh_succeeded();
                    } else {
                        state.load_succeeded(data);
                    }
                }
                self.start_polling(handle);
            }
            Err(e) => {
                warn!(view = VIEW, seq, employee_id = %self.employee_id, error = %e, "load failed");
                state.load_failed(e.user_message());
            }
        }
    }

    fn start_polling(&mut self, handle: &ViewHandle<StatusCardMsg>) {
        if self.polling {
            return;
        }
        self.polling = true;
        info!(view = VIEW, every = ?self.deps.settings.status_interval, "polling status");
        handle.every(self.deps.settings.status_interval, || StatusCardMsg::Load);
    }

    fn set_status(&self, seq: Seq, update: EmployeeStatusUpdate, handle: &ViewHandle<StatusCardMsg>) {
        info!(view = VIEW, seq, employee_id = %self.employee_id, status = %update.status, "updating status");
        let client = self.deps.client.clone();
        let id = self.employee_id.clone();
        let requested = update.status;
        handle.request(
            seq,
            async move { into_data(client.update_employee_status(&id, &update).await) },
            move |result| StatusCardMsg::StatusSet { requested, result },
        );
    }

    fn status_set(
        &mut self,
        state: &mut ViewState<StatusCardData>,
        seq: Seq,
        requested: EmployeeStatus,
        result: CmResult<EmployeeStatusSnapshot>,
    ) {
        let mut snapshot = match result {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(view = VIEW, seq, employee_id = %self.employee_id, error = %e, "status update failed");
                state.mutation_error = Some(e.user_message());
                return;
            }
        };
        state.mutation_error = None;
        if seq <= self.applied {
            debug!(view = VIEW, seq, applied = self.applied, "stale status response ignored");
            return;
        }
        let Some(data) = state.data.as_mut() else {
            return;
        };
        if !snapshot.status.is_known() {
            snapshot.status = requested;
        }
        if snapshot.performance.is_none() {
            snapshot.performance = data.snapshot.performance;
        }
        data.employee.status = snapshot.status;
        if snapshot.last_updated.is_some() {
            data.employee.last_status_update = snapshot.last_updated;
        }
        data.snapshot = snapshot;
        self.applied = seq;
    }
}

impl Reducer for StatusCardReducer {
    type Data = StatusCardData;
    type Msg = StatusCardMsg;

    fn load_message() -> StatusCardMsg {
        StatusCardMsg::Load
    }

    fn reduce(
        &mut self,
        state: &mut ViewState<StatusCardData>,
        envelope: Envelope<StatusCardMsg>,
        handle: &ViewHandle<StatusCardMsg>,
    ) {
        let Envelope { seq, msg } = envelope;
        match msg {
            StatusCardMsg::Load => self.load(state, seq, handle),
            StatusCardMsg::Loaded(result) => self.loaded(state, seq, result, handle),
            StatusCardMsg::SetStatus(update) => self.set_status(seq, update, handle),
            StatusCardMsg::StatusSet { requested, result } => self.status_set(state, seq, requested, result),
        }
    }
}
