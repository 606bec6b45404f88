//! Project list with live updates and per-project progress polling

use std::collections::BTreeMap;

use cm_core::{CmResult, Entity, Id, ListParams, Seq, SoftDeletable};
use cm_models::{Project, ProjectCreateInput, ProjectProgressReport, ProjectUpdateInput};
use tracing::{debug, info, warn};

use crate::collection::{Collection, MergeOutcome};
use crate::controller::{Envelope, Reducer, ViewController, ViewHandle};
use crate::feed::ChangeEvent;
use crate::state::{LoadTracker, ViewState};
use crate::views::{apply_change, into_data, log_outcome, open_feed, ViewDeps};

const VIEW: &str = "projects";

pub type ProjectsView = ViewController<ProjectsReducer>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectsData {
    pub projects: Collection<Project>,
    /// Latest progress report per project
    pub progress: BTreeMap<Id, ProjectProgressReport>,
    /// Per-project progress fetch errors, cleared by the next success
    pub progress_errors: BTreeMap<Id, String>,
}

impl ProjectsData {
    /// Projects that are not soft-deleted, in collection order
    pub fn visible(&self) -> impl Iterator<Item = &Project> {
        self.projects.iter().filter(|project| !project.is_deleted())
    }
}

#[derive(Debug)]
pub enum ProjectsMsg {
    Load,
    Loaded(CmResult<Vec<Project>>),
    ProjectChanged(ChangeEvent),
    FeedFailed(String),
    PollProgress,
    ProgressLoaded {
        id: Id,
        result: CmResult<ProjectProgressReport>,
    },
    Create(ProjectCreateInput),
    Created(CmResult<Project>),
    Update {
        id: Id,
        input: ProjectUpdateInput,
    },
    Updated {
        id: Id,
        result: CmResult<Project>,
    },
}

pub struct ProjectsReducer {
    deps: ViewDeps,
    load: LoadTracker,
    subscribed: bool,
    polling: bool,
}

impl ViewController<ProjectsReducer> {
    pub fn open(deps: ViewDeps) -> Self {
        Self::start(
            VIEW,
            ProjectsReducer {
                deps,
                load: LoadTracker::default(),
                subscribed: false,
                polling: false,
            },
        )
    }

    pub fn create(&self, input: ProjectCreateInput) -> Seq {
        self.handle().send(ProjectsMsg::Create(input))
    }

    pub fn update(&self, id: impl Into<Id>, input: ProjectUpdateInput) -> Seq {
        self.handle().send(ProjectsMsg::Update { id: id.into(), input })
    }

    /// Fetch progress for every visible project now
    pub fn refresh_progress(&self) -> Seq {
        self.handle().send(ProjectsMsg::PollProgress)
    }
}

impl ProjectsReducer {
    fn load(&mut self, state: &mut ViewState<ProjectsData>, seq: Seq, handle: &ViewHandle<ProjectsMsg>) {
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
            async move { into_data(client.list_projects(&ListParams::new()).await) },
            ProjectsMsg::Loaded,
        );
    }

    fn loaded(
        &mut self,
        state: &mut ViewState<ProjectsData>,
        seq: Seq,
        result: CmResult<Vec<Project>>,
        handle: &ViewHandle<ProjectsMsg>,
    ) {
        if !self.load.finish(seq) {
            debug!(view = VIEW, seq, "superseded load ignored");
            return;
        }
        match result {
            Ok(projects) => {
                info!(view = VIEW, seq, count = projects.len(), "loaded");
                match state.data.as_mut() {
                    Some(data) => {
                        data.projects.replace_all(projects, seq);
                        state.refresh_succeeded();
                    }
                    None => state.load_succeeded(ProjectsData {
                        projects: Collection::from_items(projects, seq),
                        ..Default::default()
                    }),
                }
                self.subscribe(handle);
                self.start_polling(handle);
            }
            Err(e) => {
                warn!(view = VIEW, seq, error = %e, "load failed");
                state.load_failed(e.user_message());
            }
        }
    }

    fn subscribe(&mut self, handle: &ViewHandle<ProjectsMsg>) {
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
            ProjectsMsg::ProjectChanged,
            ProjectsMsg::FeedFailed,
        );
    }

    fn start_polling(&mut self, handle: &ViewHandle<ProjectsMsg>) {
        if self.polling {
            return;
        }
        self.polling = true;
        handle.send(ProjectsMsg::PollProgress);
        handle.every(self.deps.settings.inventory_interval, || ProjectsMsg::PollProgress);
    }

    fn poll_progress(&self, state: &ViewState<ProjectsData>, seq: Seq, handle: &ViewHandle<ProjectsMsg>) {
        let Some(data) = state.data.as_ref() else {
            return;
        };
        let ids: Vec<Id> = data.visible().map(|project| project.id.clone()).collect();
        debug!(view = VIEW, seq, projects = ids.len(), "polling progress");
        for id in ids {
            let client = self.deps.client.clone();
            let target = id.clone();
            handle.request(
                seq,
                async move { into_data(client.get_project_progress(&target).await) },
                move |result| ProjectsMsg::ProgressLoaded { id, result },
            );
        }
    }

    fn progress_loaded(
        &self,
        state: &mut ViewState<ProjectsData>,
        seq: Seq,
        id: Id,
        result: CmResult<ProjectProgressReport>,
    ) {
        let Some(data) = state.data.as_mut() else {
            return;
        };
        match result {
            Ok(report) => {
                let outcome = data.projects.merge_nested(&report.to_patch(&id), seq);
                log_outcome(VIEW, seq, &outcome);
                if outcome == MergeOutcome::Applied {
                    data.progress.insert(id.clone(), report);
                    data.progress_errors.remove(&id);
                }
            }
            Err(e) => {
                warn!(view = VIEW, seq, project_id = %id, error = %e, "progress fetch failed");
                data.progress_errors.insert(id, e.user_message());
            }
        }
    }

    fn create(&self, seq: Seq, input: ProjectCreateInput, handle: &ViewHandle<ProjectsMsg>) {
        info!(view = VIEW, seq, name = %input.name, "creating project");
        let client = self.deps.client.clone();
        handle.request(
            seq,
            async move { into_data(client.create_project(&input).await) },
            ProjectsMsg::Created,
        );
    }

    fn update(&self, seq: Seq, id: Id, input: ProjectUpdateInput, handle: &ViewHandle<ProjectsMsg>) {
        info!(view = VIEW, seq, project_id = %id, "updating project");
        let client = self.deps.client.clone();
        let target = id.clone();
        handle.request(
            seq,
            async move { into_data(client.update_project(&target, &input).await) },
            move |result| ProjectsMsg::Updated { id, result },
        );
    }

    fn saved(&self, state: &mut ViewState<ProjectsData>, seq: Seq, id: Option<&str>, result: CmResult<Project>) {
        match result {
            Ok(project) => {
                state.mutation_error = None;
                if let Some(data) = state.data.as_mut() {
                    let outcome = data.projects.upsert(project, seq);
                    log_outcome(VIEW, seq, &outcome);
                }
            }
            Err(e) => {
                warn!(view = VIEW, seq, project_id = ?id, error = %e, "project save failed");
                state.mutation_error = Some(e.user_message());
            }
        }
    }
}

impl Reducer for ProjectsReducer {
    type Data = ProjectsData;
    type Msg = ProjectsMsg;

    fn load_message() -> ProjectsMsg {
        ProjectsMsg::Load
    }

    fn reduce(
        &mut self,
        state: &mut ViewState<ProjectsData>,
        envelope: Envelope<ProjectsMsg>,
        handle: &ViewHandle<ProjectsMsg>,
    ) {
        let Envelope { seq, msg } = envelope;
        match msg {
            ProjectsMsg::Load => self.load(state, seq, handle),
            ProjectsMsg::Loaded(result) => self.loaded(state, seq, result, handle),
            ProjectsMsg::ProjectChanged(event) => {
                if let Some(data) = state.data.as_mut() {
                    apply_change(VIEW, &mut data.projects, &event, seq);
                }
            }
            ProjectsMsg::FeedFailed(message) => {
                self.subscribed = false;
                state.notice = Some(message);
            }
            ProjectsMsg::PollProgress => self.poll_progress(state, seq, handle),
            ProjectsMsg::ProgressLoaded { id, result } => self.progress_loaded(state, seq, id, result),
            ProjectsMsg::Create(input) => self.create(seq, input, handle),
            ProjectsMsg::Created(result) => self.saved(state, seq, None, result),
            ProjectsMsg::Update { id, input } => self.update(seq, id, input, handle),
            ProjectsMsg::Updated { id, result } => self.saved(state, seq, Some(&id), result),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use cm_client::mock::ScriptedTransport;
    use cm_client::{ApiClient, Method};
    use cm_core::CmError;
    use serde_json::json;

    use crate::feed::{BroadcastFeed, MockChangeFeed};
    use crate::settings::SyncSettings;

    fn scripted() -> Arc<ScriptedTransport> {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .json(
                Method::Get,
                "/api/projects",
                200,
                json!([
                    { "id": "p1", "name": "Tower" },
                    { "id": "p2", "name": "Old depot", "deletedAt": "2024-01-01T00:00:00Z" }
                ]),
            )
            .json(Method::Get, "/api/projects/p1/progress", 200, json!({ "percentage": 80.0 }));
        transport
    }

    #[tokio::test]
    async fn test_feed_subscription_failure_sets_notice() {
        let mut feed = MockChangeFeed::new();
        feed.expect_subscribe()
            .times(1)
            .returning(|_, _| Err(CmError::Transport("socket closed".into())));

        let transport = scripted();
        let deps = ViewDeps::new(ApiClient::anonymous(transport), SyncSettings::default()).with_feed(Arc::new(feed));
        let view = ProjectsView::open(deps);

        let state = view.wait_for(|s| s.notice.is_some()).await.unwrap();
        assert!(state.is_ready());
        assert!(state.error.is_none());
        assert_eq!(
            state.notice.as_deref(),
            Some("Unable to reach the server. Please try again later.")
        );
    }

    #[tokio::test]
    async fn test_realtime_disabled_skips_feed() {
        let feed = Arc::new(BroadcastFeed::default());
        let settings = SyncSettings {
            realtime_enabled: false,
            ..SyncSettings::default()
        };
        let deps = ViewDeps::new(ApiClient::anonymous(scripted()), settings).with_feed(feed.clone());
        let view = ProjectsView::open(deps);
        view.wait_for(|s| s.is_ready()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(feed.subscriber_count("project-updates", "projects"), 0);
    }

    #[tokio::test]
    async fn test_progress_polled_for_visible_projects_only() {
        let transport = scripted();
        let view = ProjectsView::open(ViewDeps::new(
            ApiClient::anonymous(transport.clone()),
            SyncSettings::default(),
        ));

        let state = view
            .wait_for(|s| s.data.as_ref().is_some_and(|d| d.progress.contains_key("p1")))
            .await
            .unwrap();
        let data = state.data.unwrap();
        assert_eq!(data.visible().count(), 1);
        assert_eq!(data.projects.get("p1").unwrap().progress.percentage_complete, 80.0);
        assert!(data.progress_errors.is_empty());
        assert_eq!(transport.request_count(Method::Get, "/api/projects/p2/progress"), 0);
    }

    #[tokio::test]
    async fn test_update_rejected_by_contract() {
        let transport = scripted();
        let view = ProjectsView::open(ViewDeps::new(
            ApiClient::anonymous(transport.clone()),
            SyncSettings::default(),
        ));
        view.wait_for(|s| s.is_ready()).await.unwrap();

        view.update("p1", ProjectUpdateInput::default());
        let state = view.wait_for(|s| s.mutation_error.is_some()).await.unwrap();
        assert!(state.mutation_error.unwrap().contains("no changes"));
        assert_eq!(transport.request_count(Method::Patch, "/api/projects/p1"), 0);
    }
}
