//! Card and row view-models rendered by the presentation layer

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use cm_models::{
    Employee, EmployeeFilters, EmployeeRole, EmployeeSort, EmployeeSortField, EmployeeStatus,
    EmployeeStatusSnapshot, Id, Material, MaterialAvailability, MaterialStatus, Project,
    ProjectPriority, ProjectProgressReport, ProjectStatus, SoftDeletable, SortDirection,
};
use serde::Serialize;

use crate::colors::{
    display_status_color, employee_status_color, material_status_color, project_priority_color,
    project_status_color, ColorToken,
};
use crate::display::DisplayStatus;
use crate::inventory::{availability_low, display_status, low_stock, needs_reorder};
use crate::progress::{bar_fill, ProgressBucket};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeCard {
    pub id: Id,
    pub name: String,
    pub initials: String,
    pub role: EmployeeRole,
    pub department: String,
    pub status: EmployeeStatus,
    pub status_color: ColorToken,
    pub display_status: DisplayStatus,
    pub display_color: ColorToken,
    /// Overall performance score, 0-100
    pub performance: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

impl EmployeeCard {
    pub fn new(employee: &Employee) -> Self {
        let display_status = DisplayStatus::from(employee.status);
        Self {
            id: employee.id.clone(),
            name: employee.full_name(),
            initials: employee.initials(),
            role: employee.role,
            department: employee.department.clone(),
            status: employee.status,
            status_color: employee_status_color(employee.status),
            display_status,
            display_color: display_status_color(display_status),
            performance: employee.performance.as_ref().map(|p| p.overall()),
            last_updated: employee.last_status_update,
        }
    }

    /// Overlay a freshly fetched status snapshot
    pub fn with_snapshot(mut self, snapshot: &EmployeeStatusSnapshot) -> Self {
        self.status = snapshot.status;
        self.status_color = employee_status_color(snapshot.status);
        self.display_status = DisplayStatus::from(snapshot.status);
        self.display_color = display_status_color(self.display_status);
        if snapshot.last_updated.is_some() {
            self.last_updated = snapshot.last_updated;
        }
        if let Some(performance) = snapshot.performance {
            self.performance = Some(bar_fill(performance));
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCard {
    pub id: Id,
    pub name: String,
    pub status: ProjectStatus,
    pub status_color: ColorToken,
    pub priority: ProjectPriority,
    pub priority_color: ColorToken,
    /// Raw percentage as reported
    pub percentage: f64,
    /// Percentage clamped for drawing
    pub bar_fill: f64,
    pub bucket: ProgressBucket,
    pub completed_tasks: u32,
    pub total_tasks: u32,
    pub budget_utilization: f64,
    pub over_budget: bool,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub overdue: bool,
}

impl ProjectCard {
    pub fn new(project: &Project, now: DateTime<Utc>) -> Self {
        let percentage = project.progress.percentage_complete;
        Self {
            id: project.id.clone(),
            name: project.name.clone(),
            status: project.status,
            status_color: project_status_color(project.status),
            priority: project.priority,
            priority_color: project_priority_color(project.priority),
            percentage,
            bar_fill: bar_fill(percentage),
            bucket: ProgressBucket::from_percentage(percentage),
            completed_tasks: project.progress.completed_tasks,
            total_tasks: project.progress.total_tasks,
            budget_utilization: project.budget.utilization(),
            over_budget: project.budget.is_over_budget(),
            start_date: project.timeline.start_date,
            due_date: project.timeline.planned_end_date,
            overdue: project.timeline.is_overdue(now),
        }
    }

    /// Overlay a polled progress report
    pub fn with_progress(mut self, report: &ProjectProgressReport) -> Self {
        self.percentage = report.percentage;
        self.bar_fill = bar_fill(report.percentage);
        self.bucket = ProgressBucket::from_percentage(report.percentage);
        if let Some(completed) = report.completed_tasks {
            self.completed_tasks = completed;
        }
        if let Some(total) = report.total_tasks {
            self.total_tasks = total;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialRow {
    pub id: Id,
    pub name: String,
    pub unit: String,
    pub current_stock: f64,
    pub minimum_stock: f64,
    pub low_stock: bool,
    pub needs_reorder: bool,
    /// Current stock priced at the preferred supplier; 0 without suppliers
    pub stock_value: f64,
    pub status: MaterialStatus,
    pub status_color: ColorToken,
}

impl From<&Material> for MaterialRow {
    fn from(material: &Material) -> Self {
        let status = display_status(material);
        Self {
            id: material.id.clone(),
            name: material.name.clone(),
            unit: material.unit.clone(),
            current_stock: material.inventory.current_stock,
            minimum_stock: material.inventory.minimum_stock,
            low_stock: low_stock(material),
            needs_reorder: needs_reorder(material),
            stock_value: material.stock_value(),
            status,
            status_color: material_status_color(status),
        }
    }
}

/// Row of the materials tracker list
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRow {
    pub name: String,
    pub available: f64,
    pub threshold: f64,
    pub on_order: f64,
    /// Highlighted when below threshold
    pub low: bool,
}

impl From<&MaterialAvailability> for AvailabilityRow {
    fn from(item: &MaterialAvailability) -> Self {
        Self {
            name: item.name.clone(),
            available: item.quantity,
            threshold: item.minimum_threshold,
            on_order: item.on_order_quantity,
            low: availability_low(item),
        }
    }
}

/// Headline figures for the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub employee_count: usize,
    pub active_employees: usize,
    pub project_count: usize,
    pub active_projects: usize,
    /// Mean completion of visible projects, 0 when there are none
    pub average_progress: f64,
    pub material_count: usize,
    pub low_stock_count: usize,
    pub reorder_count: usize,
}

impl DashboardSummary {
    pub fn compute(employees: &[Employee], projects: &[Project], materials: &[Material]) -> Self {
        let visible: Vec<&Project> = visible_projects(projects).collect();
        let average_progress = if visible.is_empty() {
            0.0
        } else {
            visible
                .iter()
                .map(|p| bar_fill(p.progress.percentage_complete))
                .sum::<f64>()
                / visible.len() as f64
        };

        Self {
            employee_count: employees.len(),
            active_employees: employees
                .iter()
                .filter(|e| e.status == EmployeeStatus::Active)
                .count(),
            project_count: visible.len(),
            active_projects: visible.iter().filter(|p| p.is_active()).count(),
            average_progress,
            material_count: materials.len(),
            low_stock_count: materials.iter().filter(|m| low_stock(m)).count(),
            reorder_count: materials.iter().filter(|m| needs_reorder(m)).count(),
        }
    }
}

/// Projects without a deletion marker, in input order
pub fn visible_projects(projects: &[Project]) -> impl Iterator<Item = &Project> {
    projects.iter().filter(|p| !p.is_deleted())
}

pub fn filter_employees<'a>(employees: &'a [Employee], filters: &EmployeeFilters) -> Vec<&'a Employee> {
    employees.iter().filter(|e| filters.matches(e)).collect()
}

/// Stable sort; missing dates and scores order before present ones
pub fn sort_employees(employees: &mut [&Employee], sort: EmployeeSort) {
    employees.sort_by(|a, b| {
        let ordering = compare_employees(a, b, sort.field);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}

fn compare_employees(a: &Employee, b: &Employee, field: EmployeeSortField) -> Ordering {
    match field {
        EmployeeSortField::Name => a
            .full_name()
            .to_lowercase()
            .cmp(&b.full_name().to_lowercase()),
        EmployeeSortField::Role => a.role.as_str().cmp(b.role.as_str()),
        EmployeeSortField::Status => a.status.as_str().cmp(b.status.as_str()),
        EmployeeSortField::Department => a
            .department
            .to_lowercase()
            .cmp(&b.department.to_lowercase()),
        EmployeeSortField::HireDate => a.hire_date.cmp(&b.hire_date),
        EmployeeSortField::Efficiency => {
            let score = |e: &Employee| e.performance.as_ref().map(|p| p.efficiency);
            match (score(a), score(b)) {
                (Some(x), Some(y)) => x.total_cmp(&y),
                (x, y) => x.is_some().cmp(&y.is_some()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use cm_models::{EmployeePerformance, MaterialInventory, MaterialSupplier, ProjectProgress};

    fn employee(id: &str, first: &str, last: &str, status: EmployeeStatus) -> Employee {
        let mut e = Employee::new(id, first, last);
        e.status = status;
        e
    }

    #[test]
    fn test_employee_card_unknown_status_degrades() {
        let card = EmployeeCard::new(&employee("e1", "Ada", "Lovelace", EmployeeStatus::Unknown));
        assert_eq!(card.status_color, ColorToken::Gray);
        assert_eq!(card.display_status, DisplayStatus::Offline);
        assert_eq!(card.display_color, ColorToken::Red);
        assert_eq!(card.performance, None);
    }

    #[test]
    fn test_employee_card_snapshot_overlay() {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 0).unwrap();
        let card = EmployeeCard::new(&employee("e1", "Ada", "Lovelace", EmployeeStatus::Sick))
            .with_snapshot(&EmployeeStatusSnapshot {
                status: EmployeeStatus::Active,
                last_updated: Some(at),
                performance: Some(87.5),
            });
        assert_eq!(card.status, EmployeeStatus::Active);
        assert_eq!(card.display_status, DisplayStatus::Active);
        assert_eq!(card.last_updated, Some(at));
        assert_eq!(card.performance, Some(87.5));
    }

    #[test]
    fn test_project_card() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let mut project = Project::new("p1", "Tower");
        project.status = ProjectStatus::InProgress;
        project.progress = ProjectProgress::from_tasks(2, 8);
        project.timeline.planned_end_date = Some(now - Duration::days(1));

        let card = ProjectCard::new(&project, now);
        assert_eq!(card.percentage, 25.0);
        assert_eq!(card.bucket, ProgressBucket::Red);
        assert!(card.overdue);

        let card = card.with_progress(&ProjectProgressReport {
            percentage: 75.0,
            completed_tasks: Some(6),
            total_tasks: None,
            extra: Default::default(),
        });
        assert_eq!(card.bucket, ProgressBucket::Blue);
        assert_eq!(card.completed_tasks, 6);
        assert_eq!(card.total_tasks, 8);
    }

    #[test]
    fn test_material_row() {
        let material =
            Material::new("m1", "Rebar", "t").with_inventory(MaterialInventory::new(5.0, 10.0));
        let row = MaterialRow::from(&material);
        assert!(row.low_stock);
        assert_eq!(row.stock_value, 0.0);
        assert_eq!(row.status, MaterialStatus::LowStock);
        assert_eq!(row.status_color, ColorToken::Yellow);
    }

    #[test]
    fn test_material_row_stock_value() {
        let mut material =
            Material::new("m1", "Rebar", "t").with_inventory(MaterialInventory::new(12.0, 10.0));
        material.suppliers = vec![MaterialSupplier {
            id: "s1".into(),
            name: "Steelworks".into(),
            contact_info: String::new(),
            price_per_unit: 2.5,
            delivery_time_in_days: 4,
            minimum_order_quantity: 1.0,
            reliability: 0.9,
        }];
        assert_eq!(MaterialRow::from(&material).stock_value, 30.0);
    }

    #[test]
    fn test_dashboard_summary() {
        let employees = vec![
            employee("e1", "Ada", "Lovelace", EmployeeStatus::Active),
            employee("e2", "Grace", "Hopper", EmployeeStatus::OnLeave),
        ];
        let mut tower = Project::new("p1", "Tower");
        tower.progress = ProjectProgress::from_tasks(1, 2);
        let mut removed = Project::new("p2", "Removed");
        removed.deleted_at = Some(Utc::now());
        let depot = Project::new("p3", "Depot");
        let materials = vec![
            Material::new("m1", "Sand", "t").with_inventory(MaterialInventory::new(1.0, 5.0)),
            Material::new("m2", "Brick", "pcs").with_inventory(MaterialInventory::new(50.0, 5.0)),
        ];

        let summary = DashboardSummary::compute(&employees, &[tower, removed, depot], &materials);
        assert_eq!(summary.employee_count, 2);
        assert_eq!(summary.active_employees, 1);
        assert_eq!(summary.project_count, 2);
        assert_eq!(summary.average_progress, 25.0);
        assert_eq!(summary.low_stock_count, 1);
    }

    #[test]
    fn test_dashboard_summary_empty() {
        let summary = DashboardSummary::compute(&[], &[], &[]);
        assert_eq!(summary, DashboardSummary::default());
    }

    #[test]
    fn test_filter_and_sort() {
        let mut ada = employee("e1", "Ada", "Lovelace", EmployeeStatus::Active);
        ada.department = "Structures".into();
        ada.performance = Some(EmployeePerformance {
            efficiency: 70.0,
            ..Default::default()
        });
        let mut grace = employee("e2", "grace", "Hopper", EmployeeStatus::Active);
        grace.department = "structures".into();
        grace.performance = Some(EmployeePerformance {
            efficiency: 95.0,
            ..Default::default()
        });
        let linus = employee("e3", "Linus", "T", EmployeeStatus::Sick);
        let all = vec![ada, grace, linus];

        let filters = EmployeeFilters {
            department: Some("STRUCTURES".into()),
            ..Default::default()
        };
        let mut filtered = filter_employees(&all, &filters);
        assert_eq!(filtered.len(), 2);

        sort_employees(
            &mut filtered,
            EmployeeSort {
                field: EmployeeSortField::Efficiency,
                direction: SortDirection::Desc,
            },
        );
        assert_eq!(filtered[0].id, "e2");

        let mut everyone: Vec<&Employee> = all.iter().collect();
        sort_employees(&mut everyone, EmployeeSort::default());
        let names: Vec<_> = everyone.iter().map(|e| e.first_name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "grace", "Linus"]);
    }
}
