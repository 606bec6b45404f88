//! Employee model
//!
//! Collection: employees

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use cm_core::traits::{Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::serde_util;

lenient_enum! {
    /// Employee role
    pub enum EmployeeRole {
        Manager => "MANAGER",
        Supervisor => "SUPERVISOR",
        Technician => "TECHNICIAN",
        Worker => "WORKER",
        Intern => "INTERN",
    }
}

lenient_enum! {
    /// Business status of an employee.
    ///
    /// This is the canonical status domain; the presence tags shown on the
    /// status card are derived from it in `cm-views`.
    pub enum EmployeeStatus {
        Active => "ACTIVE",
        OnLeave => "ON_LEAVE",
        Sick => "SICK",
        Inactive => "INACTIVE",
        Terminated => "TERMINATED",
    }
}

/// Performance metrics, each on a 0-100 scale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePerformance {
    #[serde(default)]
    pub efficiency: f64,
    #[serde(default)]
    pub quality_score: f64,
    #[serde(default)]
    pub safety_rating: f64,
    #[serde(default)]
    pub attendance_rate: f64,
    #[serde(default)]
    pub projects_completed: u32,
}

impl EmployeePerformance {
    /// Mean of the four scored metrics, clamped to 0-100
    pub fn overall(&self) -> f64 {
        let sum = clamp_score(self.efficiency)
            + clamp_score(self.quality_score)
            + clamp_score(self.safety_rating)
            + clamp_score(self.attendance_rate);
        sum / 4.0
    }
}

pub(crate) fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub phone_number: String,
    #[serde(default)]
    pub relationship: String,
}

/// Employee entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(with = "serde_util::id")]
    pub id: Id,

    #[serde(default, alias = "first_name")]
    pub first_name: String,

    #[serde(default, alias = "last_name")]
    pub last_name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub role: EmployeeRole,

    #[serde(default)]
    pub status: EmployeeStatus,

    #[serde(default)]
    pub department: String,

    #[serde(default, with = "serde_util::timestamp", alias = "hire_date")]
    pub hire_date: Option<DateTime<Utc>>,

    #[serde(default, alias = "phone_number")]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,

    #[serde(default)]
    pub performance: Option<EmployeePerformance>,

    /// Id of the project the employee is currently assigned to
    #[serde(default, with = "serde_util::option_id")]
    pub current_project: Option<Id>,

    #[serde(default)]
    pub skills: BTreeSet<String>,

    #[serde(default)]
    pub certifications: BTreeSet<String>,

    #[serde(default, alias = "hourly_rate")]
    pub hourly_rate: f64,

    #[serde(default, alias = "total_hours_worked")]
    pub total_hours_worked: f64,

    #[serde(default, with = "serde_util::timestamp", alias = "last_status_update")]
    pub last_status_update: Option<DateTime<Utc>>,

    #[serde(default, with = "serde_util::timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, with = "serde_util::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Server fields this client does not model, kept for round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Employee {
    /// Create an employee with minimal required fields
    pub fn new(id: impl Into<Id>, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: String::new(),
            role: EmployeeRole::Worker,
            status: EmployeeStatus::Active,
            department: String::new(),
            hire_date: None,
            phone_number: None,
            emergency_contact: None,
            performance: None,
            current_project: None,
            skills: BTreeSet::new(),
            certifications: BTreeSet::new(),
            hourly_rate: 0.0,
            total_hours_worked: 0.0,
            last_status_update: None,
            created_at: None,
            updated_at: None,
            extra: Map::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
            .trim()
            .to_string()
    }

    pub fn initials(&self) -> String {
        self.first_name
            .chars()
            .next()
            .into_iter()
            .chain(self.last_name.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn is_supervisor(&self) -> bool {
        matches!(self.role, EmployeeRole::Manager | EmployeeRole::Supervisor)
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s.eq_ignore_ascii_case(skill))
    }

    /// Labor cost of all recorded hours
    pub fn labor_cost(&self) -> f64 {
        self.hourly_rate * self.total_hours_worked
    }
}

impl Identifiable for Employee {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Timestamped for Employee {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl Entity for Employee {
    const COLLECTION: &'static str = "employees";
    const TYPE_NAME: &'static str = "Employee";
}

/// Response of `GET/PUT /api/employees/{id}/status`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeStatusSnapshot {
    pub status: EmployeeStatus,
    #[serde(with = "serde_util::timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
    /// Overall performance score (0-100), if the backend reports one
    pub performance: Option<f64>,
}

impl<'de> Deserialize<'de> for EmployeeStatusSnapshot {
    /// Accepts the full object or a bare status string
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Full {
            status: EmployeeStatus,
            #[serde(default, with = "serde_util::timestamp", alias = "last_status_update")]
            last_updated: Option<DateTime<Utc>>,
            #[serde(default)]
            performance: Option<f64>,
        }

        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Full(Full),
            Bare(EmployeeStatus),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Full(full) => Self {
                status: full.status,
                last_updated: full.last_updated,
                performance: full.performance,
            },
            Repr::Bare(status) => Self {
                status,
                last_updated: None,
                performance: None,
            },
        })
    }
}

/// Body of `PUT /api/employees/{id}/status`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeStatusUpdate {
    pub status: EmployeeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl EmployeeStatusUpdate {
    pub fn new(status: EmployeeStatus) -> Self {
        Self { status, note: None }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Client-side list filters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmployeeFilters {
    pub role: Option<EmployeeRole>,
    pub status: Option<EmployeeStatus>,
    pub department: Option<String>,
    pub project_id: Option<Id>,
}

impl EmployeeFilters {
    pub fn matches(&self, employee: &Employee) -> bool {
        if let Some(role) = self.role {
            if employee.role != role {
                return false;
            }
        }
        if let Some(status) = self.status {
            if employee.status != status {
                return false;
            }
        }
        if let Some(ref department) = self.department {
            if !employee.department.eq_ignore_ascii_case(department) {
                return false;
            }
        }
        if let Some(ref project_id) = self.project_id {
            if employee.current_project.as_deref() != Some(project_id.as_str()) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmployeeSortField {
    #[default]
    Name,
    Role,
    Status,
    Department,
    HireDate,
    Efficiency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmployeeSort {
    pub field: EmployeeSortField,
    pub direction: SortDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_employee_new() {
        let employee = Employee::new("e1", "Ada", "Lovelace");
        assert_eq!(employee.full_name(), "Ada Lovelace");
        assert_eq!(employee.initials(), "AL");
        assert_eq!(employee.status, EmployeeStatus::Active);
    }

    #[test]
    fn test_deserialize_camel_case() {
        let employee: Employee = serde_json::from_value(serde_json::json!({
            "id": "e1",
            "firstName": "Grace",
            "lastName": "Hopper",
            "role": "SUPERVISOR",
            "status": "ON_LEAVE",
            "skills": ["welding", "rigging", "welding"],
            "performance": { "efficiency": 91, "qualityScore": 80 },
            "badgeColor": "teal"
        }))
        .unwrap();

        assert_eq!(employee.role, EmployeeRole::Supervisor);
        assert_eq!(employee.status, EmployeeStatus::OnLeave);
        assert_eq!(employee.skills.len(), 2);
        assert_eq!(employee.performance.unwrap().efficiency, 91.0);
        assert_eq!(employee.extra.get("badgeColor"), Some(&serde_json::json!("teal")));
    }

    #[test]
    fn test_deserialize_backend_shape() {
        let employee: Employee = serde_json::from_value(serde_json::json!({
            "id": 7,
            "first_name": "Linus",
            "last_name": "T",
            "status": "active",
            "hire_date": "2021-06-01T00:00:00",
            "hourly_rate": 31.5
        }))
        .unwrap();

        assert_eq!(employee.id, "7");
        assert_eq!(employee.status, EmployeeStatus::Active);
        assert!(employee.hire_date.is_some());
        assert_eq!(employee.hourly_rate, 31.5);
    }

    #[test]
    fn test_unknown_status_is_lenient() {
        let employee: Employee = serde_json::from_value(serde_json::json!({
            "id": "e2",
            "status": "VACATIONING",
            "role": 3
        }))
        .unwrap();
        assert_eq!(employee.status, EmployeeStatus::Unknown);
        assert_eq!(employee.role, EmployeeRole::Unknown);
    }

    #[test]
    fn test_status_snapshot_forms() {
        let full: EmployeeStatusSnapshot = serde_json::from_value(serde_json::json!({
            "status": "SICK",
            "lastUpdated": "2024-05-01T08:00:00Z",
            "performance": 88.5
        }))
        .unwrap();
        assert_eq!(full.status, EmployeeStatus::Sick);
        assert!(full.last_updated.is_some());
        assert_eq!(full.performance, Some(88.5));

        let bare: EmployeeStatusSnapshot = serde_json::from_value(serde_json::json!("active")).unwrap();
        assert_eq!(bare.status, EmployeeStatus::Active);
        assert!(bare.last_updated.is_none());
    }

    #[test]
    fn test_status_update_body() {
        let body = serde_json::to_value(EmployeeStatusUpdate::new(EmployeeStatus::OnLeave)).unwrap();
        assert_eq!(body, serde_json::json!({ "status": "ON_LEAVE" }));
    }

    #[test]
    fn test_filters() {
        let mut employee = Employee::new("e1", "A", "B");
        employee.department = "Electrical".into();
        employee.current_project = Some("p1".into());

        let filters = EmployeeFilters {
            department: Some("electrical".into()),
            project_id: Some("p1".into()),
            ..Default::default()
        };
        assert!(filters.matches(&employee));

        let filters = EmployeeFilters {
            status: Some(EmployeeStatus::Sick),
            ..Default::default()
        };
        assert!(!filters.matches(&employee));
    }

    #[test]
    fn test_performance_overall_clamped() {
        let performance = EmployeePerformance {
            efficiency: 120.0,
            quality_score: 80.0,
            safety_rating: 100.0,
            attendance_rate: -20.0,
            projects_completed: 4,
        };
        assert_eq!(performance.overall(), 70.0);
    }
}
