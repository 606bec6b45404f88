//! Color tokens for status values

use cm_models::{EmployeeStatus, MaterialStatus, ProjectPriority, ProjectStatus};
use serde::Serialize;

use crate::display::DisplayStatus;

/// Abstract color; renderers decide the concrete palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorToken {
    Green,
    Yellow,
    Orange,
    Blue,
    Red,
    Gray,
}

impl ColorToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorToken::Green => "green",
            ColorToken::Yellow => "yellow",
            ColorToken::Orange => "orange",
            ColorToken::Blue => "blue",
            ColorToken::Red => "red",
            ColorToken::Gray => "gray",
        }
    }

    /// Fill color used by chart renderers
    pub fn hex(&self) -> &'static str {
        match self {
            ColorToken::Green => "#4CAF50",
            ColorToken::Yellow => "#EAB308",
            ColorToken::Orange => "#FF9800",
            ColorToken::Blue => "#2196F3",
            ColorToken::Red => "#EF4444",
            ColorToken::Gray => "#9CA3AF",
        }
    }
}

impl std::fmt::Display for ColorToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn employee_status_color(status: EmployeeStatus) -> ColorToken {
    match status {
        EmployeeStatus::Active => ColorToken::Green,
        EmployeeStatus::OnLeave => ColorToken::Yellow,
        EmployeeStatus::Sick => ColorToken::Orange,
        EmployeeStatus::Inactive => ColorToken::Gray,
        EmployeeStatus::Terminated => ColorToken::Red,
        EmployeeStatus::Unknown => ColorToken::Gray,
    }
}

pub fn display_status_color(status: DisplayStatus) -> ColorToken {
    match status {
        DisplayStatus::Active => ColorToken::Green,
        DisplayStatus::Break => ColorToken::Yellow,
        DisplayStatus::Offline => ColorToken::Red,
        DisplayStatus::Meeting => ColorToken::Blue,
    }
}

pub fn project_status_color(status: ProjectStatus) -> ColorToken {
    match status {
        ProjectStatus::NotStarted => ColorToken::Gray,
        ProjectStatus::InProgress => ColorToken::Blue,
        ProjectStatus::OnHold => ColorToken::Yellow,
        ProjectStatus::Completed => ColorToken::Green,
        ProjectStatus::Cancelled => ColorToken::Red,
        ProjectStatus::Unknown => ColorToken::Gray,
    }
}

pub fn project_priority_color(priority: ProjectPriority) -> ColorToken {
    match priority {
        ProjectPriority::Low => ColorToken::Green,
        ProjectPriority::Medium => ColorToken::Yellow,
        ProjectPriority::High => ColorToken::Orange,
        ProjectPriority::Urgent => ColorToken::Red,
        ProjectPriority::Unknown => ColorToken::Gray,
    }
}

pub fn material_status_color(status: MaterialStatus) -> ColorToken {
    match status {
        MaterialStatus::Available => ColorToken::Green,
        MaterialStatus::LowStock => ColorToken::Yellow,
        MaterialStatus::OutOfStock => ColorToken::Red,
        MaterialStatus::OnOrder => ColorToken::Blue,
        MaterialStatus::Unknown => ColorToken::Gray,
    }
}
