//! Concrete views: dashboard, employees, employee status card, projects
//! and materials. Each is a [`ViewController`] specialised with its own
//! reducer.

use std::sync::Arc;

use cm_client::ApiClient;
use cm_core::{ApiResponse, CmError, CmResult, Entity, Seq};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::collection::{Collection, MergeOutcome};
use crate::controller::ViewHandle;
use crate::feed::{ChangeEvent, ChangeFeed, ChangeKind};
use crate::settings::SyncSettings;

mod dashboard;
mod employees;
mod materials;
mod projects;
mod status_card;

pub use dashboard::{DashboardData, DashboardMsg, DashboardReducer, DashboardView};
pub use employees::{EmployeesMsg, EmployeesReducer, EmployeesView};
pub use materials::{MaterialsData, MaterialsMsg, MaterialsReducer, MaterialsView};
pub use projects::{ProjectsData, ProjectsMsg, ProjectsReducer, ProjectsView};
pub use status_card::{EmployeeStatusView, StatusCardData, StatusCardMsg, StatusCardReducer};

/// Collaborators every view is built from
#[derive(Clone)]
pub struct ViewDeps {
    pub client: ApiClient,
    pub feed: Option<Arc<dyn ChangeFeed>>,
    pub settings: SyncSettings,
}

impl std::fmt::Debug for ViewDeps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewDeps")
            .field("client", &self.client)
            .field("feed", &self.feed.is_some())
            .field("settings", &self.settings)
            .finish()
    }
}

impl ViewDeps {
    pub fn new(client: ApiClient, settings: SyncSettings) -> Self {
        Self {
            client,
            feed: None,
            settings,
        }
    }

    pub fn with_feed(mut self, feed: Arc<dyn ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Message to show instead of loading when a required session is missing
    pub(crate) fn session_error(&self) -> Option<String> {
        if self.settings.require_session && !self.client.has_session() {
            Some(CmError::Unauthenticated.user_message())
        } else {
            None
        }
    }

    pub(crate) fn realtime(&self) -> Option<Arc<dyn ChangeFeed>> {
        if self.settings.realtime_enabled {
            self.feed.clone()
        } else {
            None
        }
    }
}

/// Collapse an API call into data or the error to surface
pub(crate) fn into_data<T>(result: CmResult<ApiResponse<T>>) -> CmResult<T> {
    result.and_then(ApiResponse::into_result)
}

/// Apply one change-feed event to a collection
pub(crate) fn apply_change<T>(
    view: &str,
    collection: &mut Collection<T>,
    event: &ChangeEvent,
    seq: Seq,
) -> MergeOutcome
where
    T: Entity + Serialize + DeserializeOwned,
{
    let outcome = match event.event {
        ChangeKind::Insert => collection.insert(&event.new, seq),
        ChangeKind::Update | ChangeKind::Delete | ChangeKind::All => collection.merge(&event.new, seq),
    };
    log_outcome(view, seq, &outcome);
    outcome
}

pub(crate) fn log_outcome(view: &str, seq: Seq, outcome: &MergeOutcome) {
    match outcome {
        MergeOutcome::Applied | MergeOutcome::Inserted => {
            debug!(view, seq, ?outcome, "update applied")
        }
        MergeOutcome::Stale { applied } => {
            debug!(view, seq, applied, "stale update ignored")
        }
        MergeOutcome::UnknownId(id) => {
            debug!(view, seq, id = %id, "update for unknown id ignored")
        }
        MergeOutcome::MissingId => warn!(view, seq, "update without id ignored"),
        MergeOutcome::Invalid(reason) => warn!(view, seq, %reason, "update rejected"),
    }
}

/// Subscribe to `collection` and forward every event into the view
pub(crate) fn open_feed<M, F, E>(
    handle: &ViewHandle<M>,
    feed: Arc<dyn ChangeFeed>,
    channel: String,
    collection: &'static str,
    on_event: F,
    on_error: E,
) where
    M: Send + 'static,
    F: Fn(ChangeEvent) -> M + Send + 'static,
    E: FnOnce(String) -> M + Send + 'static,
{
    let sender = handle.clone();
    handle.spawn(async move {
        match feed.subscribe(&channel, collection).await {
            Ok(mut stream) => {
                info!(view = sender.name(), %channel, collection, "change feed open");
                while let Some(event) = stream.next().await {
                    sender.send(on_event(event));
                }
                info!(view = sender.name(), %channel, collection, "change feed closed");
            }
            Err(e) => {
                warn!(view = sender.name(), %channel, collection, error = %e, "change feed subscription failed");
                sender.send(on_error(e.user_message()));
            }
        }
    });
}
