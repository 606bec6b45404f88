//! Materials inventory and availability, polled on the inventory cadence

use cm_core::{CmResult, Id, ListParams, Seq};
use cm_models::{Material, MaterialAvailability, MaterialPatch};
use tracing::{debug, info, warn};

use crate::collection::Collection;
use crate::controller::{Envelope, Reducer, ViewController, ViewHandle};
use crate::state::{LoadTracker, ViewState};
use crate::views::{into_data, log_outcome, ViewDeps};

const VIEW: &str = "materials";

pub type MaterialsView = ViewController<MaterialsReducer>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialsData {
    pub materials: Collection<Material>,
    pub availability: Vec<MaterialAvailability>,
}

impl MaterialsData {
    pub fn availability_for(&self, material_id: &str) -> Option<&MaterialAvailability> {
        self.availability.iter().find(|row| row.material_id == material_id)
    }
}

type Loaded = CmResult<(Vec<Material>, Vec<MaterialAvailability>)>;

#[derive(Debug)]
pub enum MaterialsMsg {
    Load,
    Loaded(Loaded),
    Update { id: Id, patch: MaterialPatch },
    Updated { id: Id, result: CmResult<Material> },
}

pub struct MaterialsReducer {
    deps: ViewDeps,
    load: LoadTracker,
    polling: bool,
}

impl ViewController<MaterialsReducer> {
    pub fn open(deps: ViewDeps) -> Self {
        Self::start(
            VIEW,
            MaterialsReducer {
                deps,
                load: LoadTracker::default(),
                polling: false,
            },
        )
    }

    pub fn update_material(&self, id: impl Into<Id>, patch: MaterialPatch) -> Seq {
        self.handle().send(MaterialsMsg::Update { id: id.into(), patch })
    }
}

impl MaterialsReducer {
    fn load(&mut self, state: &mut ViewState<MaterialsData>, seq: Seq, handle: &ViewHandle<MaterialsMsg>) {
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
        debug!(view = VIEW, seq, background, "loading");

        let client = self.deps.client.clone();
        handle.request(
            seq,
            async move {
                tokio::try_join!(
                    async { into_data(client.list_materials(&ListParams::new()).await) },
                    async { into_data(client.get_material_availability().await) },
                )
            },
            MaterialsMsg::Loaded,
        );
    }

    fn loaded(&mut self, state: &mut ViewState<MaterialsData>, seq: Seq, result: Loaded, handle: &ViewHandle<MaterialsMsg>) {
        if !self.load.finish(seq) {
            debug!(view = VIEW, seq, "superseded load ignored");
            return;
        }
        match result {
            Ok((materials, availability)) => {
                debug!(view = VIEW, seq, count = materials.len(), "loaded");
                match state.data.as_mut() {
                    Some(data) => {
                        data.materials.replace_all(materials, seq);
                        data.availability = availability;
                        state.refresh_succeeded();
                    }
                    None => state.load_succeeded(MaterialsData {
                        materials: Collection::from_items(materials, seq),
                        availability,
                    }),
                }
                if !self.polling {
                    self.polling = true;
                    info!(view = VIEW, every = ?self.deps.settings.inventory_interval, "polling inventory");
                    handle.every(self.deps.settings.inventory_interval, || MaterialsMsg::Load);
                }
            }
            Err(e) => {
                warn!(view = VIEW, seq, error = %e, "load failed");
                state.load_failed(e.user_message());
            }
        }
    }

    fn update(&self, seq: Seq, id: Id, patch: MaterialPatch, handle: &ViewHandle<MaterialsMsg>) {
        info!(view = VIEW, seq, material_id = %id, "updating material");
        let client = self.deps.client.clone();
        let target = id.clone();
        handle.request(
            seq,
            async move { into_data(client.update_material(&target, &patch).await) },
            move |result| MaterialsMsg::Updated { id, result },
        );
    }

    fn updated(&self, state: &mut ViewState<MaterialsData>, seq: Seq, id: Id, result: CmResult<Material>) {
        match result {
            Ok(material) => {
                state.mutation_error = None;
                if let Some(data) = state.data.as_mut() {
                    let outcome = data.materials.upsert(material, seq);
                    log_outcome(VIEW, seq, &outcome);
                }
            }
            Err(e) => {
                warn!(view = VIEW, seq, material_id = %id, error = %e, "material update failed");
                state.mutation_error = Some(e.user_message());
            }
        }
    }
}

impl Reducer for MaterialsReducer {
    type Data = MaterialsData;
    type Msg = MaterialsMsg;

    fn load_message() -> MaterialsMsg {
        MaterialsMsg::Load
    }

    fn reduce(
        &mut self,
        state: &mut ViewState<MaterialsData>,
        envelope: Envelope<MaterialsMsg>,
        handle: &ViewHandle<MaterialsMsg>,
    ) {
        let Envelope { seq, msg } = envelope;
        match msg {
            MaterialsMsg::Load => self.load(state, seq, handle),
            MaterialsMsg::Loaded(result) => self.loaded(state, seq, result, handle),
            MaterialsMsg::Update { id, patch } => self.update(seq, id, patch, handle),
            MaterialsMsg::Updated { id, result } => self.updated(state, seq, id, result),
        }
    }
}
