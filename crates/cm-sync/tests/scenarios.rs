//! End-to-end view scenarios against a scripted backend

use std::sync::Arc;
use std::time::Duration;

use cm_client::mock::ScriptedTransport;
use cm_client::{ApiClient, Method, RawResponse};
use cm_core::CmError;
use cm_models::{
    Employee, EmployeeStatus, EmployeeStatusUpdate, MaterialPatch, ProjectCreateInput, ProjectStatus,
};
use cm_sync::{
    BroadcastFeed, ChangeEvent, DashboardView, EmployeeStatusView, EmployeesView, LoadStatus, MaterialsView,
    ProjectsView, Reducer, SyncSettings, ViewController, ViewDeps, ViewState,
};
use serde_json::json;

const CHANNEL: &str = "project-updates";

fn deps(transport: &Arc<ScriptedTransport>) -> ViewDeps {
    ViewDeps::new(ApiClient::anonymous(transport.clone()), SyncSettings::default())
}

async fn settle<R, F>(view: &ViewController<R>, predicate: F) -> ViewState<R::Data>
where
    R: Reducer,
    F: FnMut(&ViewState<R::Data>) -> bool,
{
    tokio::time::timeout(Duration::from_secs(600), view.wait_for(predicate))
        .await
        .expect("view did not settle in time")
        .expect("view stopped")
}

async fn until(mut condition: impl FnMut() -> bool) {
    for _ in 0..500 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition never held");
}

fn script_dashboard(transport: &ScriptedTransport) {
    transport
        .json(
            Method::Get,
            "/api/employees",
            200,
            json!([{ "id": "e1", "firstName": "Ana", "lastName": "Ruiz", "status": "ACTIVE" }]),
        )
        .json(
            Method::Get,
            "/api/projects",
            200,
            json!([{
                "id": "p1",
                "name": "Tower",
                "status": "IN_PROGRESS",
                "progress": { "completedTasks": 2, "totalTasks": 5, "percentageComplete": 40.0 }
            }]),
        )
        .json(
            Method::Get,
            "/api/materials",
            200,
            json!([{ "id": "m1", "name": "Cement", "unit": "bag" }]),
        );
}

#[tokio::test]
async fn test_dashboard_applies_feed_patch() {
    let transport = Arc::new(ScriptedTransport::new());
    script_dashboard(&transport);
    let feed = Arc::new(BroadcastFeed::default());

    let view = DashboardView::open(deps(&transport).with_feed(feed.clone()));
    let state = settle(&view, |s| s.is_ready()).await;
    let data = state.data.unwrap();
    assert_eq!(data.employees.len(), 1);
    assert_eq!(data.projects.len(), 1);
    assert_eq!(data.materials.len(), 1);

    until(|| feed.subscriber_count(CHANNEL, "projects") == 1).await;
    feed.publish(
        CHANNEL,
        "projects",
        ChangeEvent::update(json!({ "id": "p1", "progress": { "percentageComplete": 60.0 } })),
    );

    let state = settle(&view, |s| {
        s.data
            .as_ref()
            .and_then(|d| d.projects.get("p1"))
            .is_some_and(|p| p.progress.percentage_complete == 60.0)
    })
    .await;
    let tower = state.data.as_ref().and_then(|d| d.projects.get("p1")).unwrap().clone();
    assert_eq!(tower.name, "Tower");
    assert_eq!(tower.status, ProjectStatus::InProgress);
    // the progress object is replaced whole, so omitted counters reset
    assert_eq!(tower.progress.completed_tasks, 0);
    assert_eq!(tower.progress.total_tasks, 0);
}

#[tokio::test]
async fn test_dashboard_fails_as_a_whole() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .json(Method::Get, "/api/employees", 500, json!({ "detail": "Database unavailable" }))
        .json(Method::Get, "/api/projects", 200, json!([{ "id": "p1", "name": "Tower" }]))
        .json(Method::Get, "/api/materials", 200, json!([]));

    let view = DashboardView::open(deps(&transport));
    let state = settle(&view, |s| s.is_errored()).await;
    assert!(state.data.is_none());
    assert_eq!(state.error.as_deref(), Some("Database unavailable"));
}

#[tokio::test]
async fn test_transport_failure_uses_friendly_message() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.fail(
        Method::Get,
        "/api/employees",
        CmError::Transport("connection refused".into()),
    );

    let view = EmployeesView::open(deps(&transport));
    let state = settle(&view, |s| s.is_errored()).await;
    assert_eq!(
        state.error.as_deref(),
        Some("Unable to reach the server. Please try again later.")
    );
}

#[tokio::test]
async fn test_teardown_discards_in_flight_fetch() {
    let transport = Arc::new(ScriptedTransport::new());
    let gate = transport.gated(
        Method::Get,
        "/api/employees",
        RawResponse::json(200, &json!([{ "id": "e1", "firstName": "Ana" }])),
    );

    let mut view = EmployeesView::open(deps(&transport));
    until(|| transport.request_count(Method::Get, "/api/employees") == 1).await;

    view.teardown().await;
    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = view.snapshot();
    assert_eq!(state.status, LoadStatus::Loading);
    assert!(state.data.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_stale_status_response_ignored() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.json(
        Method::Get,
        "/api/employees",
        200,
        json!([{ "id": "e1", "firstName": "Ana", "status": "ACTIVE" }]),
    );
    transport
        .delayed(
            Method::Put,
            "/api/employees/e1/status",
            Duration::from_secs(2),
            RawResponse::json(200, &json!({ "status": "ON_LEAVE" })),
        )
        .json(Method::Put, "/api/employees/e1/status", 200, json!({ "status": "SICK" }));

    let view = EmployeesView::open(deps(&transport));
    settle(&view, |s| s.is_ready()).await;

    let first = view.set_status("e1", EmployeeStatusUpdate::new(EmployeeStatus::OnLeave));
    until(|| transport.request_count(Method::Put, "/api/employees/e1/status") == 1).await;
    let second = view.set_status("e1", EmployeeStatusUpdate::new(EmployeeStatus::Sick));
    assert!(second > first);

    settle(&view, |s| {
        s.data
            .as_ref()
            .and_then(|d| d.get("e1"))
            .is_some_and(|e| e.status == EmployeeStatus::Sick)
    })
    .await;

    // Let the slower, older response land
    tokio::time::sleep(Duration::from_secs(5)).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let state = view.snapshot();
    let employee = state.data.as_ref().and_then(|d| d.get("e1")).unwrap();
    assert_eq!(employee.status, EmployeeStatus::Sick);
    assert_eq!(employee.first_name, "Ana");
    assert!(state.mutation_error.is_none());
}

#[tokio::test]
async fn test_failed_mutation_leaves_state_unchanged() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .json(
            Method::Get,
            "/api/employees",
            200,
            json!([{ "id": "e1", "firstName": "Ana", "status": "ACTIVE" }]),
        )
        .json(
            Method::Put,
            "/api/employees/e1/status",
            422,
            json!({ "detail": [{ "msg": "status transition not allowed" }] }),
        );

    let view = EmployeesView::open(deps(&transport));
    settle(&view, |s| s.is_ready()).await;
    view.set_status("e1", EmployeeStatusUpdate::new(EmployeeStatus::Terminated));

    let state = settle(&view, |s| s.mutation_error.is_some()).await;
    assert_eq!(state.mutation_error.as_deref(), Some("status transition not allowed"));
    let employee = state.data.as_ref().and_then(|d| d.get("e1")).unwrap();
    assert_eq!(employee.status, EmployeeStatus::Active);
}

#[tokio::test(start_paused = true)]
async fn test_status_card_polls_on_cadence() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .json(
            Method::Get,
            "/api/employees/e1",
            200,
            json!({ "id": "e1", "firstName": "Ana", "status": "ACTIVE" }),
        )
        .json(Method::Get, "/api/employees/e1/status", 200, json!({ "status": "ACTIVE" }))
        .json(
            Method::Get,
            "/api/employees/e1/status",
            200,
            json!({ "status": "ON_LEAVE", "lastUpdated": "2024-05-01T09:30:00Z" }),
        );

    let view = EmployeeStatusView::open(deps(&transport), "e1");
    let state = settle(&view, |s| s.is_ready()).await;
    assert_eq!(state.data.unwrap().status(), EmployeeStatus::Active);
    assert_eq!(transport.request_count(Method::Get, "/api/employees/e1/status"), 1);

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(transport.request_count(Method::Get, "/api/employees/e1/status"), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let state = settle(&view, |s| {
        s.data
            .as_ref()
            .is_some_and(|d| d.status() == EmployeeStatus::OnLeave)
    })
    .await;
    assert_eq!(transport.request_count(Method::Get, "/api/employees/e1/status"), 2);
    let data = state.data.unwrap();
    assert_eq!(data.employee.status, EmployeeStatus::OnLeave);
    assert!(state.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_background_refresh_error_keeps_data() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .json(
            Method::Get,
            "/api/materials",
            200,
            json!([{ "id": "m1", "name": "Rebar", "unit": "t", "inventory": { "currentStock": 4.0, "minimumStock": 10.0 } }]),
        )
        .json(Method::Get, "/api/materials", 503, json!({ "detail": "Service Unavailable" }))
        .json(
            Method::Get,
            "/api/materials/availability",
            200,
            json!([{ "materialId": "m1", "name": "Rebar", "available": true, "quantity": 4.0 }]),
        );

    let view = MaterialsView::open(deps(&transport));
    settle(&view, |s| s.is_ready()).await;

    tokio::time::sleep(Duration::from_secs(301)).await;
    let state = settle(&view, |s| s.notice.is_some()).await;

    assert_eq!(state.status, LoadStatus::Ready);
    assert!(state.error.is_none());
    assert_eq!(state.notice.as_deref(), Some("Service Unavailable"));
    let data = state.data.unwrap();
    assert_eq!(data.materials.len(), 1);
    assert_eq!(data.availability.len(), 1);
}

#[tokio::test]
async fn test_retry_after_error() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .json(Method::Get, "/api/projects", 503, json!({ "detail": "Service Unavailable" }))
        .json(
            Method::Get,
            "/api/projects",
            200,
            json!([{
                "id": "p1",
                "name": "Tower",
                "progress": { "completedTasks": 4, "totalTasks": 8, "percentageComplete": 50.0 }
            }]),
        )
        .json(Method::Get, "/api/projects/p1/progress", 200, json!({ "percentage": 62.5 }));

    let view = ProjectsView::open(deps(&transport));
    let state = settle(&view, |s| s.is_errored()).await;
    assert_eq!(state.error.as_deref(), Some("Service Unavailable"));

    view.retry();
    let state = settle(&view, |s| s.is_ready()).await;
    assert!(state.error.is_none());
    assert_eq!(state.data.unwrap().projects.len(), 1);

    let state = settle(&view, |s| s.data.as_ref().is_some_and(|d| d.progress.contains_key("p1"))).await;
    let data = state.data.unwrap();
    let tower = data.projects.get("p1").unwrap();
    assert_eq!(tower.progress.percentage_complete, 62.5);
    assert_eq!(tower.progress.total_tasks, 8);
    assert_eq!(tower.name, "Tower");
}

#[tokio::test]
async fn test_projects_feed_insert_and_update() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.json(Method::Get, "/api/projects", 200, json!([{ "id": "p1", "name": "Tower" }]));
    let feed = Arc::new(BroadcastFeed::default());

    let view = ProjectsView::open(deps(&transport).with_feed(feed.clone()));
    settle(&view, |s| s.is_ready()).await;
    until(|| feed.subscriber_count(CHANNEL, "projects") == 1).await;

    feed.publish(CHANNEL, "projects", ChangeEvent::insert(json!({ "id": 7, "name": "Depot" })));
    feed.publish(CHANNEL, "projects", ChangeEvent::update(json!({ "id": "ghost", "name": "Nope" })));
    feed.publish(CHANNEL, "projects", ChangeEvent::update(json!({ "id": "p1", "status": "ON_HOLD" })));

    let state = settle(&view, |s| {
        s.data.as_ref().is_some_and(|d| {
            d.projects.len() == 2 && d.projects.get("p1").is_some_and(|p| p.status == ProjectStatus::OnHold)
        })
    })
    .await;
    let data = state.data.unwrap();
    assert_eq!(data.projects.get("7").unwrap().name, "Depot");
    assert!(data.projects.get("ghost").is_none());
}

#[tokio::test]
async fn test_material_update_replaces_record() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .json(Method::Get, "/api/materials", 200, json!([{ "id": "m1", "name": "Rebar", "unit": "t" }]))
        .json(Method::Get, "/api/materials/availability", 200, json!([]))
        .json(
            Method::Patch,
            "/api/materials/m1",
            200,
            json!({ "id": "m1", "name": "Rebar", "unit": "t", "inventory": { "currentStock": 40.0 } }),
        );

    let view = MaterialsView::open(deps(&transport));
    settle(&view, |s| s.is_ready()).await;
    view.update_material("m1", MaterialPatch::stock(40.0));

    let state = settle(&view, |s| {
        s.data
            .as_ref()
            .and_then(|d| d.materials.get("m1"))
            .is_some_and(|m| m.inventory.current_stock == 40.0)
    })
    .await;
    assert!(state.mutation_error.is_none());

    let patch = transport
        .requests()
        .into_iter()
        .find(|r| r.method == Method::Patch)
        .and_then(|r| r.body)
        .unwrap();
    assert_eq!(patch["inventory"]["currentStock"], 40.0);
}

#[tokio::test]
async fn test_required_session_blocks_load() {
    let transport = Arc::new(ScriptedTransport::new());
    let settings = SyncSettings {
        require_session: true,
        ..SyncSettings::default()
    };
    let deps = ViewDeps::new(ApiClient::anonymous(transport.clone()), settings);

    let view = DashboardView::open(deps);
    let state = settle(&view, |s| s.is_errored()).await;
    assert_eq!(state.error.as_deref(), Some("Please sign in to continue."));
    assert!(transport.requests().is_empty());
}

fn depot_input() -> ProjectCreateInput {
    ProjectCreateInput::new("Depot", Employee::new("e1", "Pat", "Quinn"))
}

#[tokio::test]
async fn test_create_project_then_rejected_create() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .json(Method::Get, "/api/projects", 200, json!([{ "id": "p1", "name": "Tower" }]))
        .json(
            Method::Post,
            "/api/projects",
            201,
            json!({ "id": "p2", "name": "Depot", "status": "NOT_STARTED" }),
        )
        .json(
            Method::Post,
            "/api/projects",
            400,
            json!({ "detail": "Project name already exists" }),
        );

    let view = ProjectsView::open(deps(&transport));
    settle(&view, |s| s.is_ready()).await;

    view.create(depot_input());
    let state = settle(&view, |s| s.data.as_ref().is_some_and(|d| d.projects.len() == 2)).await;
    assert!(state.mutation_error.is_none());
    assert_eq!(state.data.as_ref().unwrap().projects.get("p2").unwrap().name, "Depot");

    let request = transport
        .requests()
        .into_iter()
        .find(|r| r.method == Method::Post)
        .unwrap();
    let body = request.body.unwrap();
    assert_eq!(body["name"], "Depot");
    assert_eq!(body["team"]["projectManager"]["id"], "e1");

    let before = state.data.unwrap();
    view.create(depot_input());
    let state = settle(&view, |s| s.mutation_error.is_some()).await;
    assert_eq!(state.mutation_error.as_deref(), Some("Project name already exists"));
    assert!(state.error.is_none());
    assert_eq!(state.data.unwrap().projects, before.projects);
}

#[tokio::test]
async fn test_create_response_older_than_feed_insert_is_ignored() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.json(Method::Get, "/api/projects", 200, json!([{ "id": "p1", "name": "Tower" }]));
    let gate = transport.gated(
        Method::Post,
        "/api/projects",
        RawResponse::json(201, &json!({ "id": "p2", "name": "Depot" })),
    );
    let feed = Arc::new(BroadcastFeed::default());

    let view = ProjectsView::open(deps(&transport).with_feed(feed.clone()));
    settle(&view, |s| s.is_ready()).await;
    until(|| feed.subscriber_count(CHANNEL, "projects") == 1).await;

    let create_seq = view.create(depot_input());
    until(|| transport.request_count(Method::Post, "/api/projects") == 1).await;

    feed.publish(
        CHANNEL,
        "projects",
        ChangeEvent::insert(json!({ "id": "p2", "name": "Depot", "status": "IN_PROGRESS" })),
    );
    let state = settle(&view, |s| s.data.as_ref().is_some_and(|d| d.projects.len() == 2)).await;
    let applied = state.data.unwrap().projects.applied_seq("p2").unwrap();
    assert!(applied > create_seq);

    gate.notify_one();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let state = view.snapshot();
    let data = state.data.unwrap();
    assert_eq!(data.projects.get("p2").unwrap().status, ProjectStatus::InProgress);
    assert_eq!(data.projects.applied_seq("p2"), Some(applied));
    assert!(state.mutation_error.is_none());
}
