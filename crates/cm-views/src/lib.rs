//! # cm-views
//!
//! Pure view-model derivation for Construct RS.
//!
//! Everything here is a deterministic function of its input: no I/O, no
//! clocks (callers pass `now` where time matters) and no error values.
//! Unrecognised enum values degrade to a neutral visual state.

pub mod colors;
pub mod display;
pub mod progress;
pub mod inventory;
pub mod charts;
pub mod cards;

pub use cards::{
    filter_employees, sort_employees, visible_projects, AvailabilityRow, DashboardSummary,
    EmployeeCard, MaterialRow, ProjectCard,
};
pub use charts::{ChartSeries, Dataset};
pub use colors::ColorToken;
pub use display::DisplayStatus;
pub use inventory::{display_status, low_stock, needs_reorder};
pub use progress::ProgressBucket;
