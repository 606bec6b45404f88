//! Presence tag shown on the employee status card
//!
//! The business `EmployeeStatus` is canonical. `DisplayStatus` is derived
//! from it and never sent to the backend.

use cm_models::EmployeeStatus;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayStatus {
    Active,
    Break,
    #[default]
    Offline,
    Meeting,
}

impl DisplayStatus {
    pub const ALL: &'static [DisplayStatus] = &[
        DisplayStatus::Active,
        DisplayStatus::Break,
        DisplayStatus::Offline,
        DisplayStatus::Meeting,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayStatus::Active => "active",
            DisplayStatus::Break => "break",
            DisplayStatus::Offline => "offline",
            DisplayStatus::Meeting => "meeting",
        }
    }

    /// Parse a presence string; anything unrecognised shows as offline
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => DisplayStatus::Active,
            "break" => DisplayStatus::Break,
            "meeting" => DisplayStatus::Meeting,
            _ => DisplayStatus::Offline,
        }
    }
}

impl From<EmployeeStatus> for DisplayStatus {
    fn from(status: EmployeeStatus) -> Self {
        match status {
            EmployeeStatus::Active => DisplayStatus::Active,
            EmployeeStatus::OnLeave
            | EmployeeStatus::Sick
            | EmployeeStatus::Inactive
            | EmployeeStatus::Terminated
            | EmployeeStatus::Unknown => DisplayStatus::Offline,
        }
    }
}

impl std::fmt::Display for DisplayStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_fallback() {
        assert_eq!(DisplayStatus::parse("Break"), DisplayStatus::Break);
        assert_eq!(DisplayStatus::parse(" meeting "), DisplayStatus::Meeting);
        assert_eq!(DisplayStatus::parse("lunch"), DisplayStatus::Offline);
    }

    #[test]
    fn test_from_business_status() {
        assert_eq!(DisplayStatus::from(EmployeeStatus::Active), DisplayStatus::Active);
        assert_eq!(DisplayStatus::from(EmployeeStatus::Sick), DisplayStatus::Offline);
        assert_eq!(DisplayStatus::from(EmployeeStatus::Unknown), DisplayStatus::Offline);
    }
}
