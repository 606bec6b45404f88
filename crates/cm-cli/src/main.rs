//! Construct RS terminal client
//!
//! Drives the synchronized views against a live backend (or the built-in
//! demo data) and prints their derived view-models.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cm_client::{ApiClient, HttpTransport, MemorySession};
use cm_core::config::{AppConfig, LogFormat};
use cm_models::{
    EmployeeFilters, EmployeeRole, EmployeeSort, EmployeeSortField, EmployeeStatus,
    EmployeeStatusUpdate, SortDirection,
};
use cm_sync::{
    BroadcastFeed, DashboardView, EmployeeStatusView, EmployeesView, MaterialsView, ProjectsView,
    Reducer, SyncSettings, ViewController, ViewDeps, ViewState,
};

mod demo;
mod render;

#[derive(Parser, Debug)]
#[command(name = "construct")]
#[command(about = "Construction management dashboard in the terminal")]
#[command(version)]
struct Args {
    /// Backend API base URL (overrides CM_API_URL)
    #[arg(long, env = "CM_API_URL")]
    api_url: Option<String>,

    /// Print view-models as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Run against built-in sample data (no backend required)
    #[arg(long, short, global = true)]
    demo: bool,

    /// Seconds to wait for the initial load
    #[arg(long, default_value = "30", global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Headline figures plus charts
    Dashboard,
    /// Employee list
    Employees {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        department: Option<String>,
        #[arg(long)]
        project: Option<String>,
        #[arg(long, value_enum, default_value = "name")]
        sort: SortArg,
        #[arg(long)]
        desc: bool,
    },
    /// Project list with progress
    Projects,
    /// Inventory and availability
    Materials,
    /// One employee's status card, optionally changing the status
    Status {
        id: String,
        /// New status (ACTIVE, ON_LEAVE, SICK, INACTIVE, TERMINATED)
        #[arg(long)]
        set: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Keep the dashboard open and print it on every change until Ctrl-C
    Watch,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SortArg {
    Name,
    Role,
    Status,
    Department,
    HireDate,
    Efficiency,
}

impl From<SortArg> for EmployeeSortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Name => EmployeeSortField::Name,
            SortArg::Role => EmployeeSortField::Role,
            SortArg::Status => EmployeeSortField::Status,
            SortArg::Department => EmployeeSortField::Department,
            SortArg::HireDate => EmployeeSortField::HireDate,
            SortArg::Efficiency => EmployeeSortField::Efficiency,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(ref url) = args.api_url {
        config = config.with_base_url(url).context("invalid --api-url")?;
    }
    init_tracing(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        api = %config.api.base_url,
        demo = args.demo,
        "Starting Construct RS"
    );

    let feed = Arc::new(BroadcastFeed::default());
    let deps = build_deps(&config, &args, feed.clone());
    let wait = Duration::from_secs(args.timeout_secs);

    match args.command {
        Command::Dashboard => {
            let mut view = DashboardView::open(deps);
            let state = loaded(&view, wait).await?;
            let data = state.data.context("dashboard has no data")?;
            print(args.json, render::dashboard_json(&data)?, || render::dashboard(&data));
            view.teardown().await;
        }
        Command::Employees {
            status,
            role,
            department,
            project,
            sort,
            desc,
        } => {
            let filters = EmployeeFilters {
                role: role.as_deref().map(EmployeeRole::parse),
                status: status.as_deref().map(EmployeeStatus::parse),
                department,
                project_id: project,
            };
            let sort = EmployeeSort {
                field: sort.into(),
                direction: if desc { SortDirection::Desc } else { SortDirection::Asc },
            };
            let mut view = EmployeesView::open(deps);
            let state = loaded(&view, wait).await?;
            let data = state.data.context("employee list has no data")?;
            let cards = render::employee_cards(data.items(), &filters, sort);
            print(args.json, serde_json::to_string_pretty(&cards)?, || render::employees(&cards));
            view.teardown().await;
        }
        Command::Projects => {
            let mut view = ProjectsView::open(deps);
            loaded(&view, wait).await?;
            // Give the first progress poll a moment to land
            let state = settle_progress(&view, wait).await;
            let data = state.data.context("project list has no data")?;
            let cards = render::project_cards(&data, chrono::Utc::now());
            print(args.json, serde_json::to_string_pretty(&cards)?, || {
                render::projects(&cards, &data.progress_errors)
            });
            view.teardown().await;
        }
        Command::Materials => {
            let mut view = MaterialsView::open(deps);
            let state = loaded(&view, wait).await?;
            let data = state.data.context("materials have no data")?;
            print(args.json, render::materials_json(&data)?, || render::materials(&data));
            view.teardown().await;
        }
        Command::Status { id, set, note } => {
            let mut view = EmployeeStatusView::open(deps, id);
            loaded(&view, wait).await?;
            if let Some(raw) = set {
                let status = EmployeeStatus::parse(&raw);
                if !status.is_known() {
                    bail!("unknown status '{raw}'");
                }
                let mut update = EmployeeStatusUpdate::new(status);
                if let Some(note) = note {
                    update = update.with_note(note);
                }
                let seq = view.set_status(update);
                let state = within(
                    wait,
                    view.wait_for(|s| {
                        s.last_seq >= seq
                            && (s.mutation_error.is_some()
                                || s.data.as_ref().is_some_and(|d| d.status() == status))
                    }),
                )
                .await?;
                if let Some(message) = state.mutation_error {
                    bail!("status update failed: {message}");
                }
            }
            let data = view.snapshot().data.context("status card has no data")?;
            let card = render::status_card(&data);
            print(args.json, serde_json::to_string_pretty(&card)?, || render::status(&card));
            view.teardown().await;
        }
        Command::Watch => {
            let mut view = DashboardView::open(deps);
            let activity = args
                .demo
                .then(|| demo::spawn_activity(feed.clone(), config.realtime.channel.clone()));
            watch(&view, args.json).await?;
            if let Some(activity) = activity {
                activity.abort();
            }
            view.teardown().await;
        }
    }

    Ok(())
}

/// Initialize tracing/logging; output goes to stderr so stdout stays renderable
fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.default_filter.clone().into());
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

fn build_deps(config: &AppConfig, args: &Args, feed: Arc<BroadcastFeed>) -> ViewDeps {
    let session = Arc::new(MemorySession::from_token(config.session.access_token.as_deref()));
    let client = if args.demo {
        ApiClient::new(Arc::new(demo::transport()), session)
    } else {
        ApiClient::new(Arc::new(HttpTransport::new(config.api.base_url.as_str())), session)
    };
    ViewDeps::new(client, SyncSettings::from(config)).with_feed(feed)
}

async fn within<T>(limit: Duration, future: impl std::future::Future<Output = Option<T>>) -> Result<T> {
    match tokio::time::timeout(limit, future).await {
        Ok(Some(value)) => Ok(value),
        Ok(None) => bail!("view stopped unexpectedly"),
        Err(_) => bail!("timed out after {}s", limit.as_secs()),
    }
}

/// Wait for the first load to finish; a failed load becomes an error
async fn loaded<R: Reducer>(view: &ViewController<R>, limit: Duration) -> Result<ViewState<R::Data>> {
    let state = within(limit, view.wait_for(|s| s.is_ready() || s.is_errored())).await?;
    if let Some(ref error) = state.error {
        bail!("{}: {error}", view.name());
    }
    if let Some(ref notice) = state.notice {
        warn!(view = view.name(), %notice, "loaded with notice");
    }
    Ok(state)
}

async fn settle_progress(view: &ProjectsView, limit: Duration) -> ViewState<cm_sync::ProjectsData> {
    let settled = view.wait_for(|s| {
        s.data.as_ref().is_some_and(|d| {
            d.visible()
                .all(|p| d.progress.contains_key(&p.id) || d.progress_errors.contains_key(&p.id))
        })
    });
    match tokio::time::timeout(limit, settled).await {
        Ok(Some(state)) => state,
        _ => view.snapshot(),
    }
}

async fn watch(view: &DashboardView, json: bool) -> Result<()> {
    let mut states = view.subscribe();
    let mut shutdown = std::pin::pin!(shutdown_signal());

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                match (&state.data, &state.error) {
                    (Some(data), _) => {
                        print(json, render::dashboard_json(data)?, || render::dashboard(data));
                        if let Some(ref notice) = state.notice {
                            println!("! {notice}");
                        }
                    }
                    (None, Some(error)) => println!("! {error}"),
                    (None, None) => {}
                }
            }
        }
    }
    Ok(())
}

fn print(json: bool, as_json: String, as_text: impl FnOnce() -> String) {
    if json {
        println!("{as_json}");
    } else {
        println!("{}", as_text());
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
