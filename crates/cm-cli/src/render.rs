//! Plain-text and JSON rendering of view-models

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use cm_models::{Employee, EmployeeFilters, EmployeeSort, Id, Project};
use cm_sync::{DashboardData, MaterialsData, ProjectsData, StatusCardData};
use cm_views::charts::{employee_performance_chart, inventory_chart, material_stock_chart, project_progress_chart};
use cm_views::{
    filter_employees, sort_employees, visible_projects, AvailabilityRow, ChartSeries, DashboardSummary,
    EmployeeCard, MaterialRow, ProjectCard,
};
use serde_json::json;

const BAR_WIDTH: usize = 20;

/// `[#####...............]` for a 0-100 fill
pub fn bar(fill: f64, width: usize) -> String {
    let fill = if fill.is_nan() { 0.0 } else { fill.clamp(0.0, 100.0) };
    let filled = ((fill / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

fn chart(title: &str, series: &ChartSeries) -> Vec<String> {
    let mut lines = vec![format!("{title}:")];
    if series.is_empty() {
        lines.push("  (no data)".to_string());
        return lines;
    }
    let scale = series.max_value().max(1.0);
    let label_width = series.labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    for (index, label) in series.labels.iter().enumerate() {
        for dataset in &series.datasets {
            let value = dataset.values.get(index).copied().unwrap_or(0.0);
            lines.push(format!(
                "  {label:<label_width$}  {:<18} {} {value:.1}",
                dataset.label,
                bar(value / scale * 100.0, BAR_WIDTH),
            ));
        }
    }
    lines
}

fn visible(projects: &[Project]) -> Vec<Project> {
    visible_projects(projects).cloned().collect()
}

pub fn dashboard(data: &DashboardData) -> String {
    let summary = DashboardSummary::compute(data.employees.items(), data.projects.items(), data.materials.items());
    let mut lines = vec![
        "Construction Management Dashboard".to_string(),
        String::new(),
        format!(
            "Employees  {:>4}  ({} active)",
            summary.employee_count, summary.active_employees
        ),
        format!(
            "Projects   {:>4}  ({} active, {:.0}% average progress)",
            summary.project_count, summary.active_projects, summary.average_progress
        ),
        format!(
            "Materials  {:>4}  ({} low stock, {} to reorder)",
            summary.material_count, summary.low_stock_count, summary.reorder_count
        ),
        String::new(),
    ];
    lines.extend(chart("Project progress", &project_progress_chart(&visible(data.projects.items()))));
    lines.push(String::new());
    lines.extend(chart("Inventory levels", &material_stock_chart(data.materials.items())));
    lines.push(String::new());
    lines.extend(chart("Employee efficiency", &employee_performance_chart(data.employees.items())));
    lines.join("\n")
}

pub fn dashboard_json(data: &DashboardData) -> serde_json::Result<String> {
    let summary = DashboardSummary::compute(data.employees.items(), data.projects.items(), data.materials.items());
    let now = Utc::now();
    let projects: Vec<ProjectCard> = visible_projects(data.projects.items())
        .map(|p| ProjectCard::new(p, now))
        .collect();
    serde_json::to_string_pretty(&json!({
        "summary": summary,
        "projects": projects,
        "projectProgress": project_progress_chart(&visible(data.projects.items())),
        "inventory": material_stock_chart(data.materials.items()),
        "performance": employee_performance_chart(data.employees.items()),
    }))
}

pub fn employee_cards(employees: &[Employee], filters: &EmployeeFilters, sort: EmployeeSort) -> Vec<EmployeeCard> {
    let mut selected = filter_employees(employees, filters);
    sort_employees(&mut selected, sort);
    selected.into_iter().map(EmployeeCard::new).collect()
}

pub fn employees(cards: &[EmployeeCard]) -> String {
    if cards.is_empty() {
        return "No employees found".to_string();
    }
    let mut lines = vec![format!(
        "{:<8} {:<24} {:<12} {:<16} {:<12} {:>6}",
        "ID", "NAME", "ROLE", "DEPARTMENT", "STATUS", "PERF"
    )];
    for card in cards {
        lines.push(format!(
            "{:<8} {:<24} {:<12} {:<16} {:<12} {:>6}",
            card.id,
            card.name,
            card.role.as_str(),
            card.department,
            card.status.as_str(),
            card.performance.map_or_else(|| "-".to_string(), |p| format!("{p:.0}")),
        ));
    }
    lines.join("\n")
}

pub fn project_cards(data: &ProjectsData, now: DateTime<Utc>) -> Vec<ProjectCard> {
    data.visible()
        .map(|project| {
            let card = ProjectCard::new(project, now);
            match data.progress.get(&project.id) {
                Some(report) => card.with_progress(report),
                None => card,
            }
        })
        .collect()
}

pub fn projects(cards: &[ProjectCard], progress_errors: &BTreeMap<Id, String>) -> String {
    if cards.is_empty() {
        return "No projects found".to_string();
    }
    let mut lines = Vec::new();
    for card in cards {
        let mut flags = Vec::new();
        if card.over_budget {
            flags.push("over budget");
        }
        if card.overdue {
            flags.push("overdue");
        }
        lines.push(format!(
            "{} [{}] {} priority{}",
            card.name,
            card.status.as_str(),
            card.priority.as_str(),
            if flags.is_empty() {
                String::new()
            } else {
                format!(" ({})", flags.join(", "))
            },
        ));
        match progress_errors.get(&card.id) {
            Some(error) => lines.push(format!("  Error loading progress: {error}")),
            None => lines.push(format!(
                "  {} {:.0}%  {}/{} tasks  ({})",
                bar(card.bar_fill, BAR_WIDTH),
                card.percentage,
                card.completed_tasks,
                card.total_tasks,
                card.bucket.color().as_str(),
            )),
        }
    }
    lines.join("\n")
}

pub fn materials(data: &MaterialsData) -> String {
    let mut lines = vec![format!(
        "{:<8} {:<24} {:>10} {:>10} {:<6} {:>12} {:<14}",
        "ID", "NAME", "STOCK", "MINIMUM", "UNIT", "VALUE", "STATUS"
    )];
    for row in data.materials.iter().map(MaterialRow::from) {
        lines.push(format!(
            "{:<8} {:<24} {:>10.1} {:>10.1} {:<6} {:>12.2} {:<14}{}",
            row.id,
            row.name,
            row.current_stock,
            row.minimum_stock,
            row.unit,
            row.stock_value,
            row.status.as_str(),
            if row.needs_reorder { "  reorder" } else { "" },
        ));
    }

    lines.push(String::new());
    lines.push("Material availability:".to_string());
    if data.availability.is_empty() {
        lines.push("  (none reported)".to_string());
    }
    for row in data.availability.iter().map(AvailabilityRow::from) {
        lines.push(format!(
            "  {}{}: {:.1} available, threshold {:.1}, {:.1} on order",
            if row.low { "! " } else { "" },
            row.name,
            row.available,
            row.threshold,
            row.on_order,
        ));
    }
    lines.push(String::new());
    lines.extend(chart("Inventory levels", &inventory_chart(&data.availability)));
    lines.join("\n")
}

pub fn materials_json(data: &MaterialsData) -> serde_json::Result<String> {
    let rows: Vec<MaterialRow> = data.materials.iter().map(MaterialRow::from).collect();
    let availability: Vec<AvailabilityRow> = data.availability.iter().map(AvailabilityRow::from).collect();
    serde_json::to_string_pretty(&json!({
        "materials": rows,
        "availability": availability,
        "chart": inventory_chart(&data.availability),
    }))
}

pub fn status_card(data: &StatusCardData) -> EmployeeCard {
    EmployeeCard::new(&data.employee).with_snapshot(&data.snapshot)
}

pub fn status(card: &EmployeeCard) -> String {
    let mut lines = vec![
        format!("{} ({})", card.name, card.initials),
        format!("  Role:        {}", card.role.as_str()),
        format!("  Status:      {} [{}]", card.status.as_str(), card.status_color.as_str()),
        format!("  Presence:    {} [{}]", card.display_status.as_str(), card.display_color.as_str()),
    ];
    if let Some(performance) = card.performance {
        lines.push(format!("  Performance: {} {performance:.0}", bar(performance, BAR_WIDTH)));
    }
    if let Some(at) = card.last_updated {
        lines.push(format!("  Updated:     {}", at.format("%Y-%m-%d %H:%M UTC")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cm_models::{EmployeeStatus, EmployeeStatusSnapshot, Material, MaterialInventory, ProjectProgress};
    use cm_sync::Collection;

    #[test]
    fn test_bar() {
        assert_eq!(bar(0.0, 4), "[....]");
        assert_eq!(bar(50.0, 4), "[##..]");
        assert_eq!(bar(150.0, 4), "[####]");
        assert_eq!(bar(f64::NAN, 4), "[....]");
    }

    #[test]
    fn test_dashboard_hides_deleted_projects() {
        let mut tower = Project::new("p1", "Tower");
        tower.progress = ProjectProgress::from_tasks(1, 2);
        let mut depot = Project::new("p2", "Depot");
        depot.deleted_at = Some(Utc::now());

        let data = DashboardData {
            projects: Collection::from_items(vec![tower, depot], 1),
            ..Default::default()
        };
        let text = dashboard(&data);
        assert!(text.contains("Tower"));
        assert!(!text.contains("Depot"));
        assert!(text.contains("Projects      1"));
    }

    #[test]
    fn test_projects_show_progress_errors() {
        let cards = vec![ProjectCard::new(&Project::new("p1", "Tower"), Utc::now())];
        let errors = BTreeMap::from([("p1".to_string(), "Not Found".to_string())]);
        assert!(projects(&cards, &errors).contains("Error loading progress: Not Found"));
    }

    #[test]
    fn test_materials_flag_reorder() {
        let mut inventory = MaterialInventory::new(5.0, 10.0);
        inventory.reorder_point = 8.0;
        let data = MaterialsData {
            materials: Collection::from_items(vec![Material::new("m1", "Rebar", "t").with_inventory(inventory)], 1),
            availability: Vec::new(),
        };
        let text = materials(&data);
        assert!(text.contains("reorder"));
        assert!(text.contains("(none reported)"));
    }

    #[test]
    fn test_status_card_uses_snapshot() {
        let mut employee = Employee::new("e1", "Ana", "Ruiz");
        employee.status = EmployeeStatus::Active;
        let data = StatusCardData {
            employee,
            snapshot: EmployeeStatusSnapshot {
                status: EmployeeStatus::Sick,
                last_updated: None,
                performance: Some(91.0),
            },
        };
        let text = status(&status_card(&data));
        assert!(text.contains("SICK"));
        assert!(text.contains("offline"));
    }
}
