//! # cm-sync
//!
//! Client-side data synchronization for Construct RS.
//!
//! Each view owns one state container, written only by a single reducer
//! task. Fetches, polls, change-feed events and mutation responses all
//! arrive as messages on that task's queue, stamped with a sequence number
//! from the view's [`Sequencer`]. Same-id updates with an older sequence
//! than the one already applied are discarded.
//!
//! Tearing a view down cancels every task it spawned; nothing is applied
//! to its state afterwards.

pub mod seq;
pub mod state;
pub mod merge;
pub mod collection;
pub mod feed;
pub mod settings;
pub mod controller;
pub mod views;

pub use collection::{Collection, MergeOutcome};
pub use controller::{Envelope, Reducer, ViewController, ViewHandle};
pub use feed::{BroadcastFeed, ChangeEvent, ChangeFeed, ChangeKind, ChangeStream};
pub use seq::Sequencer;
pub use settings::SyncSettings;
pub use state::{LoadStatus, LoadTracker, ViewState};
pub use views::{
    DashboardData, DashboardView, EmployeeStatusView, EmployeesView, MaterialsData, MaterialsView,
    ProjectsData, ProjectsView, StatusCardData, ViewDeps,
};
