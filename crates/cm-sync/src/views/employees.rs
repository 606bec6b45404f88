//! Employee list with optimistic-free status mutations

use cm_core::{CmResult, Id, ListParams, Seq};
use cm_models::{Employee, EmployeeStatus, EmployeeStatusSnapshot, EmployeeStatusUpdate};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::collection::Collection;
use crate::controller::{Envelope, Reducer, ViewController, ViewHandle};
use crate::state::{LoadTracker, ViewState};
use crate::views::{into_data, log_outcome, ViewDeps};

const VIEW: &str = "employees";

pub type EmployeesView = ViewController<EmployeesReducer>;

#[derive(Debug)]
pub enum EmployeesMsg {
    Load,
    Loaded(CmResult<Vec<Employee>>),
    SetStatus {
        id: Id,
        update: EmployeeStatusUpdate,
    },
    StatusSet {
        id: Id,
        requested: EmployeeStatus,
        result: CmResult<EmployeeStatusSnapshot>,
    },
}

pub struct EmployeesReducer {
    deps: ViewDeps,
    load: LoadTracker,
}

impl ViewController<EmployeesReducer> {
    pub fn open(deps: ViewDeps) -> Self {
        Self::start(
            VIEW,
            EmployeesReducer {
                deps,
                load: LoadTracker::default(),
            },
        )
    }

    /// Ask the server to change one employee's status. State changes only
    /// once the server confirms.
    pub fn set_status(&self, id: impl Into<Id>, update: EmployeeStatusUpdate) -> Seq {
        self.handle().send(EmployeesMsg::SetStatus {
            id: id.into(),
            update,
        })
    }
}

/// Partial employee record reflecting a confirmed status change
pub(crate) fn status_patch(id: &str, requested: EmployeeStatus, snapshot: &EmployeeStatusSnapshot) -> Value {
    let status = if snapshot.status.is_known() {
        snapshot.status
    } else {
        requested
    };
    let mut patch = json!({ "id": id, "status": status });
    if let Some(at) = snapshot.last_updated {
        patch["lastStatusUpdate"] = json!(at);
    }
    patch
}

impl EmployeesReducer {
    fn load(&mut self, state: &mut ViewState<Collection<Employee>>, seq: Seq, handle: &ViewHandle<EmployeesMsg>) {
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
        info!(view = VIEW, seq, background, "loading");

        let client = self.deps.client.clone();
        handle.request(
            seq,
            async move { into_data(client.list_employees(&ListParams::new()).await) },
            EmployeesMsg::Loaded,
        );
    }

    fn loaded(&mut self, state: &mut ViewState<Collection<Employee>>, seq: Seq, result: CmResult<Vec<Employee>>) {
        if !self.load.finish(seq) {
            debug!(view = VIEW, seq, "superseded load ignored");
            return;
        }
        match result {
            Ok(employees) => {
                info!(view = VIEW, seq, count = employees.len(), "loaded");
                match state.data.as_mut() {
                    Some(data) => {
                        data.replace_all(employees, seq);
                        state.refresh_succeeded();
                    }
                    None => state.load_succeeded(Collection::from_items(employees, seq)),
                }
            }
            Err(e) => {
                warn!(view = VIEW, seq, error = %e, "load failed");
                state.load_failed(e.user_message());
            }
        }
    }

    fn set_status(&self, seq: Seq, id: Id, update: EmployeeStatusUpdate, handle: &ViewHandle<EmployeesMsg>) {
        info!(view = VIEW, seq, employee_id = %id, status = %update.status, "updating status");
        let client = self.deps.client.clone();
        let requested = update.status;
        let target = id.clone();
        handle.request(
            seq,
            async move { into_data(client.update_employee_status(&target, &update).await) },
            move |result| EmployeesMsg::StatusSet { id, requested, result },
        );
    }

    fn status_set(
        &self,
        state: &mut ViewState<Collection<Employee>>,
        seq: Seq,
        id: Id,
        requested: EmployeeStatus,
        result: CmResult<EmployeeStatusSnapshot>,
    ) {
        match result {
            Ok(snapshot) => {
                state.mutation_error = None;
                if let Some(data) = state.data.as_mut() {
                    let outcome = data.merge(&status_patch(&id, requested, &snapshot), seq);
                    log_outcome(VIEW, seq, &outcome);
                }
            }
            Err(e) => {
                warn!(view = VIEW, seq, employee_id = %id, error = %e, "status update failed");
                state.mutation_error = Some(e.user_message());
            }
        }
    }
}

impl Reducer for EmployeesReducer {
    type Data = Collection<Employee>;
    type Msg = EmployeesMsg;

    fn load_message() -> EmployeesMsg {
        EmployeesMsg::Load
    }

    fn reduce(
        &mut self,
        state: &mut ViewState<Collection<Employee>>,
        envelope: Envelope<EmployeesMsg>,
        handle: &ViewHandle<EmployeesMsg>,
    ) {
        let Envelope { seq, msg } = envelope;
        match msg {
            EmployeesMsg::Load => self.load(state, seq, handle),
            EmployeesMsg::Loaded(result) => self.loaded(state, seq, result),
            EmployeesMsg::SetStatus { id, update } => self.set_status(seq, id, update, handle),
            EmployeesMsg::StatusSet { id, requested, result } => {
                self.status_set(state, seq, id, requested, result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_status_patch_prefers_server_status() {
        let snapshot = EmployeeStatusSnapshot {
            status: EmployeeStatus::OnLeave,
            last_updated: Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()),
            performance: None,
        };
        let patch = status_patch("e1", EmployeeStatus::Active, &snapshot);
        assert_eq!(patch["id"], "e1");
        assert_eq!(patch["status"], "ON_LEAVE");
        assert!(patch["lastStatusUpdate"].as_str().unwrap().starts_with("2024-05-01T09:30:00"));
    }

    #[test]
    fn test_status_patch_falls_back_to_requested() {
        let snapshot = EmployeeStatusSnapshot {
            status: EmployeeStatus::Unknown,
            last_updated: None,
            performance: None,
        };
        let patch = status_patch("e1", EmployeeStatus::Sick, &snapshot);
        assert_eq!(patch["status"], "SICK");
        assert!(patch.get("lastStatusUpdate").is_none());
    }
}
