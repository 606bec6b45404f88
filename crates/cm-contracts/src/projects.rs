//! Create and update contracts for projects

use cm_core::error::ValidationErrors;
use cm_models::{ProjectBudget, ProjectCreateInput, ProjectProgress, ProjectTimeline, ProjectUpdateInput};
use validator::Validate;

use crate::base::{check_id, check_non_negative, merge_validator_errors, Contract, ValidationResult};

const MAX_NAME_LENGTH: usize = 100;

/// Contract for `POST /api/projects`
#[derive(Debug, Default)]
pub struct CreateProjectContract;

impl CreateProjectContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<ProjectCreateInput> for CreateProjectContract {
    fn validate(&self, input: &ProjectCreateInput) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if let Err(derive_errors) = input.validate() {
            merge_validator_errors(derive_errors, &mut errors);
        }
        if !input.name.is_empty() && input.name.trim().is_empty() {
            errors.add("name", "can't be blank");
        }

        validate_progress(&input.progress, &mut errors);
        validate_budget(&input.budget, &mut errors);
        validate_timeline(&input.timeline, &mut errors);

        check_id("team.projectManager.id", &input.team.project_manager.id, &mut errors);

        if !input.status.is_known() {
            errors.add("status", "is not a recognised project status");
        }
        if !input.priority.is_known() {
            errors.add("priority", "is not a recognised project priority");
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        !matches!(attribute, "id" | "createdAt" | "updatedAt" | "deletedAt")
    }
}

/// Contract for `PATCH /api/projects/{id}`
#[derive(Debug, Default)]
pub struct UpdateProjectContract;

impl UpdateProjectContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<ProjectUpdateInput> for UpdateProjectContract {
    fn validate(&self, input: &ProjectUpdateInput) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if input.is_empty() {
            errors.add_base("Update contains no changes");
        }
        if let Some(ref name) = input.name {
            if name.trim().is_empty() {
                errors.add("name", "can't be blank");
            } else if name.chars().count() > MAX_NAME_LENGTH {
                errors.add("name", "is too long (maximum is 100 characters)");
            }
        }
        if let Some(ref progress) = input.progress {
            validate_progress(progress, &mut errors);
        }
        if let Some(ref budget) = input.budget {
            validate_budget(budget, &mut errors);
        }
        if matches!(input.status, Some(status) if !status.is_known()) {
            errors.add("status", "is not a recognised project status");
        }

        errors.into_result()
    }
}

fn validate_progress(progress: &ProjectProgress, errors: &mut ValidationErrors) {
    if progress.completed_tasks > progress.total_tasks {
        errors.add("progress.completedTasks", "cannot exceed totalTasks");
    }
    if !progress.is_consistent() {
        errors.add(
            "progress.percentageComplete",
            format!(
                "must equal {} for {}/{} tasks",
                ProjectProgress::percentage_for(progress.completed_tasks, progress.total_tasks),
                progress.completed_tasks,
                progress.total_tasks
            ),
        );
    }
}

fn validate_budget(budget: &ProjectBudget, errors: &mut ValidationErrors) {
    check_non_negative("budget.allocated", budget.allocated, errors);
    check_non_negative("budget.spent", budget.spent, errors);
    if (budget.remaining - (budget.allocated - budget.spent)).abs() > f64::EPSILON * budget.allocated.abs().max(1.0) {
        errors.add("budget.remaining", "must equal allocated - spent");
    }
    if budget.currency.trim().len() != 3 {
        errors.add("budget.currency", "must be a three-letter currency code");
    }
}

fn validate_timeline(timeline: &ProjectTimeline, errors: &mut ValidationErrors) {
    if let (Some(start), Some(end)) = (timeline.start_date, timeline.planned_end_date) {
        if end < start {
            errors.add("timeline.plannedEndDate", "must not be before startDate");
        }
    }
    for milestone in &timeline.milestones {
        if milestone.title.trim().is_empty() {
            errors.add("timeline.milestones", format!("milestone {} has no title", milestone.id));
        }
    }
}
