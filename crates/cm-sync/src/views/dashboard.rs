//! Dashboard: employees, projects and materials, with live project updates

use cm_core::{CmResult, Entity, ListParams, Seq};
use cm_models::{Employee, Material, Project};
use tracing::{debug, info, warn};

use crate::collection::Collection;
use crate::controller::{Envelope, Reducer, ViewController, ViewHandle};
use crate::feed::ChangeEvent;
use crate::state::{LoadTracker, ViewState};
use crate::views::{apply_change, into_data, open_feed, ViewDeps};

const VIEW: &str = "dashboard";

pub type DashboardView = ViewController<DashboardReducer>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardData {
    pub employees: Collection<Employee>,
    pub projects: Collection<Project>,
    pub materials: Collection<Material>,
}

type Loaded = CmResult<(Vec<Employee>, Vec<Project>, Vec<Material>)>;

#[derive(Debug)]
pub enum DashboardMsg {
    Load,
    Loaded(Loaded),
    ProjectChanged(ChangeEvent),
    FeedFailed(String),
}

pub struct DashboardReducer {
    deps: ViewDeps,
    load: LoadTracker,
    subscribed: bool,
}

impl ViewController<DashboardReducer> {
    pub fn open(deps: ViewDeps) -> Self {
        Self::start(
            VIEW,
            DashboardReducer {
                deps,
                load: LoadTracker::default(),
                subscribed: false,
            },
        )
    }
}

impl DashboardReducer {
    fn load(&mut self, state: &mut ViewState<DashboardData>, seq: Seq, handle: &ViewHandle<DashboardMsg>) {
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
            async move {
                let params = ListParams::new();
                tokio::try_join!(
                    async { into_data(client.list_employees(&params).await) },
                    async { into_data(client.list_projects(&params).await) },
                    async { into_data(client.list_materials(&params).await) },
                )
            },
            DashboardMsg::Loaded,
        );
    }

    fn loaded(
        &mut self,
        state: &mut ViewState<DashboardData>,
        seq: Seq,
        result: Loaded,
        handle: &ViewHandle<DashboardMsg>,
    ) {
        if !self.load.finish(seq) {
            debug!(view = VIEW, seq, "superseded load ignored");
            return;
        }
        match result {
            Ok((employees, projects, materials)) => {
                info!(
                    view = VIEW,
                    seq,
                    employees = employees.len(),
                    projects = projects.len(),
                    materials = materials.len(),
                    "loaded"
                );
                match state.data.as_mut() {
                    Some(data) => {
                        data.employees.replace_all(employees, seq);
                        data.projects.replace_all(projects, seq);
                        data.materials.replace_all(materials, seq);
                        state.refresh_succeeded();
                    }
                    None => state.load_succeeded(DashboardData {
                        employees: Collection::from_items(employees, seq),
                        projects: Collection::from_items(projects, seq),
                        materials: Collection::from_items(materials, seq),
                    }),
                }
                self.subscribe(handle);
            }
            Err(e) => {
                warn!(view = VIEW, seq, error = %e, "load failed");
                state.load_failed(e.user_message());
            }
        }
    }

    fn subscribe(&mut self, handle: &ViewHandle<DashboardMsg>) {
        if self.subscribed {
            return;
        }
        let Some(feed) = self.deps.realtime() else {
            return;
        };
        self.subscribed = true;
        open_feed(
            handle,
            feed,
            self.deps.settings.realtime_channel.clone(),
            Project::COLLECTION,
            DashboardMsg::ProjectChanged,
            DashboardMsg::FeedFailed,
        );
    }
}

impl Reducer for DashboardReducer {
    type Data = DashboardData;
    type Msg = DashboardMsg;

    fn load_message() -> DashboardMsg {
        DashboardMsg::Load
    }

    fn reduce(
        &mut self,
        state: &mut ViewState<DashboardData>,
        envelope: Envelope<DashboardMsg>,
        handle: &ViewHandle<DashboardMsg>,
    ) {
        let Envelope { seq, msg } = envelope;
        match msg {
            DashboardMsg::Load => self.load(state, seq, handle),
            DashboardMsg::Loaded(result) => self.loaded(state, seq, result, handle),
            DashboardMsg::ProjectChanged(event) => {
                if let Some(data) = state.data.as_mut() {
                    apply_change(VIEW, &mut data.projects, &event, seq);
                }
            }
            DashboardMsg::FeedFailed(message) => {
                self.subscribed = false;
                state.notice = Some(message);
            }
        }
    }
}
