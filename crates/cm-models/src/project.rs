//! Project model
//!
//! Collection: projects

use chrono::{DateTime, Utc};
use cm_core::traits::{Entity, Id, Identifiable, SoftDeletable, Timestamped};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::employee::Employee;
use crate::material::Material;
use crate::serde_util;

lenient_enum! {
    /// Project lifecycle status
    pub enum ProjectStatus {
        NotStarted => "NOT_STARTED",
        InProgress => "IN_PROGRESS",
        OnHold => "ON_HOLD",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

lenient_enum! {
    pub enum ProjectPriority {
        Low => "LOW",
        Medium => "MEDIUM",
        High => "HIGH",
        Urgent => "URGENT",
    }
}

/// Task completion.
///
/// `percentage_complete == round(100 * completed / total)` when
/// `total_tasks > 0`, else 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgress {
    #[serde(default)]
    pub completed_tasks: u32,
    #[serde(default)]
    pub total_tasks: u32,
    #[serde(default)]
    pub percentage_complete: f64,
    #[serde(default, with = "serde_util::timestamp")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ProjectProgress {
    /// Build progress from task counts, deriving the percentage
    pub fn from_tasks(completed_tasks: u32, total_tasks: u32) -> Self {
        Self {
            completed_tasks,
            total_tasks,
            percentage_complete: Self::percentage_for(completed_tasks, total_tasks),
            last_updated: None,
        }
    }

    pub fn percentage_for(completed_tasks: u32, total_tasks: u32) -> f64 {
        if total_tasks == 0 {
            0.0
        } else {
            (100.0 * f64::from(completed_tasks) / f64::from(total_tasks)).round()
        }
    }

    /// Whether the stored percentage agrees with the task counts
    pub fn is_consistent(&self) -> bool {
        self.percentage_complete == Self::percentage_for(self.completed_tasks, self.total_tasks)
    }

    pub fn remaining_tasks(&self) -> u32 {
        self.total_tasks.saturating_sub(self.completed_tasks)
    }
}

/// Budget figures; `remaining == allocated - spent` and may go negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBudget {
    #[serde(default)]
    pub allocated: f64,
    #[serde(default)]
    pub spent: f64,
    #[serde(default)]
    pub remaining: f64,
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Default for ProjectBudget {
    fn default() -> Self {
        Self::new(0.0, 0.0, default_currency())
    }
}

impl ProjectBudget {
    pub fn new(allocated: f64, spent: f64, currency: impl Into<String>) -> Self {
        Self {
            allocated,
            spent,
            remaining: allocated - spent,
            currency: currency.into(),
        }
    }

    /// Record additional spend, keeping `remaining` in step
    pub fn record_spend(&mut self, amount: f64) {
        self.spent += amount;
        self.remaining = self.allocated - self.spent;
    }

    pub fn is_over_budget(&self) -> bool {
        self.spent > self.allocated
    }

    /// Percentage of the allocation already spent; 0 when nothing is allocated
    pub fn utilization(&self) -> f64 {
        if self.allocated <= 0.0 {
            0.0
        } else {
            self.spent / self.allocated * 100.0
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMilestone {
    #[serde(with = "serde_util::id")]
    pub id: Id,
    pub title: String,
    #[serde(default, with = "serde_util::timestamp")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTimeline {
    #[serde(default, with = "serde_util::timestamp")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_util::timestamp")]
    pub planned_end_date: Option<DateTime<Utc>>,
    #[serde(default, with = "serde_util::timestamp")]
    pub actual_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub milestones: Vec<ProjectMilestone>,
}

impl ProjectTimeline {
    pub fn new(
        start_date: DateTime<Utc>,
        planned_end_date: DateTime<Utc>,
        milestones: Vec<ProjectMilestone>,
    ) -> Self {
        let mut timeline = Self {
            start_date: Some(start_date),
            planned_end_date: Some(planned_end_date),
            actual_end_date: None,
            milestones,
        };
        timeline.sort_milestones();
        timeline
    }

    /// Order milestones by due date; undated milestones go last, ties keep input order
    pub fn sort_milestones(&mut self) {
        self.milestones
            .sort_by_key(|m| (m.due_date.is_none(), m.due_date));
    }

    /// First incomplete milestone in due-date order
    pub fn next_milestone(&self) -> Option<&ProjectMilestone> {
        let mut open: Vec<&ProjectMilestone> = self.milestones.iter().filter(|m| !m.completed).collect();
        open.sort_by_key(|m| (m.due_date.is_none(), m.due_date));
        open.into_iter().next()
    }

    /// Whether the planned end has passed without the project finishing
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        match (self.planned_end_date, self.actual_end_date) {
            (Some(planned), None) => now > planned,
            _ => false,
        }
    }
}

/// Exactly one project manager plus zero or more members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeam {
    pub project_manager: Employee,
    #[serde(default)]
    pub team_members: Vec<Employee>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suppliers: Vec<String>,
}

impl ProjectTeam {
    pub fn new(project_manager: Employee) -> Self {
        Self {
            project_manager,
            team_members: Vec::new(),
            suppliers: Vec::new(),
        }
    }

    /// Manager plus distinct members
    pub fn headcount(&self) -> usize {
        1 + self
            .team_members
            .iter()
            .filter(|m| m.id != self.project_manager.id)
            .count()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMaterials {
    #[serde(default)]
    pub required: Vec<Material>,
    #[serde(default)]
    pub allocated: Vec<Material>,
    #[serde(default)]
    pub pending: Vec<Material>,
}

/// Project entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(with = "serde_util::id")]
    pub id: Id,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default)]
    pub priority: ProjectPriority,

    #[serde(default)]
    pub progress: ProjectProgress,

    #[serde(default)]
    pub budget: ProjectBudget,

    #[serde(default)]
    pub timeline: ProjectTimeline,

    #[serde(default)]
    pub team: Option<ProjectTeam>,

    #[serde(default)]
    pub materials: ProjectMaterials,

    #[serde(default, with = "serde_util::option_id")]
    pub client_id: Option<Id>,

    #[serde(default, alias = "client_name")]
    pub client_name: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, with = "serde_util::timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, with = "serde_util::timestamp")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Soft-deletion marker; projects are never removed client-side
    #[serde(default, with = "serde_util::timestamp")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Server fields this client does not model, kept for round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Project {
    /// Create a project with minimal required fields
    pub fn new(id: impl Into<Id>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            status: ProjectStatus::NotStarted,
            priority: ProjectPriority::Medium,
            progress: ProjectProgress::default(),
            budget: ProjectBudget::default(),
            timeline: ProjectTimeline::default(),
            team: None,
            materials: ProjectMaterials::default(),
            client_id: None,
            client_name: None,
            location: None,
            tags: Vec::new(),
            created_at: None,
            updated_at: None,
            deleted_at: None,
            extra: Map::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        !self.is_deleted()
            && matches!(self.status, ProjectStatus::NotStarted | ProjectStatus::InProgress)
    }

    pub fn project_manager(&self) -> Option<&Employee> {
        self.team.as_ref().map(|t| &t.project_manager)
    }
}

impl Identifiable for Project {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Timestamped for Project {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl SoftDeletable for Project {
    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

impl Entity for Project {
    const COLLECTION: &'static str = "projects";
    const TYPE_NAME: &'static str = "Project";
}

/// Body of `POST /api/projects`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 500))]
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default)]
    pub priority: ProjectPriority,

    #[serde(default)]
    pub progress: ProjectProgress,

    #[serde(default)]
    pub budget: ProjectBudget,

    #[serde(default)]
    pub timeline: ProjectTimeline,

    pub team: ProjectTeam,

    #[serde(default)]
    pub materials: ProjectMaterials,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<Id>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl ProjectCreateInput {
    pub fn new(name: impl Into<String>, project_manager: Employee) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            status: ProjectStatus::NotStarted,
            priority: ProjectPriority::Medium,
            progress: ProjectProgress::default(),
            budget: ProjectBudget::default(),
            timeline: ProjectTimeline::default(),
            team: ProjectTeam::new(project_manager),
            materials: ProjectMaterials::default(),
            client_id: None,
            client_name: None,
            location: None,
            tags: Vec::new(),
        }
    }
}

/// Body of `PATCH /api/projects/{id}`; only present fields are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdateInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<ProjectPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<ProjectProgress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<ProjectBudget>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ProjectUpdateInput {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Response of `GET /api/projects/{id}/progress`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgressReport {
    #[serde(default, alias = "progress")]
    pub percentage: f64,
    #[serde(default)]
    pub completed_tasks: Option<u32>,
    #[serde(default)]
    pub total_tasks: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ProjectProgressReport {
    /// Partial project record carrying this report, for merging into state
    pub fn to_patch(&self, project_id: &str) -> Value {
        let mut progress = Map::new();
        progress.insert("percentageComplete".into(), Value::from(self.percentage));
        if let Some(completed) = self.completed_tasks {
            progress.insert("completedTasks".into(), Value::from(completed));
        }
        if let Some(total) = self.total_tasks {
            progress.insert("totalTasks".into(), Value::from(total));
        }
        serde_json::json!({ "id": project_id, "progress": Value::Object(progress) })
    }
}
