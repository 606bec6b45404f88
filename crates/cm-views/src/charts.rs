//! Chart series builders
//!
//! Each builder keeps input order and returns labels plus parallel
//! datasets of equal length. Empty input gives empty datasets.

use cm_models::{Employee, Material, MaterialAvailability, Project};
use serde::Serialize;

use crate::colors::ColorToken;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub key: &'static str,
    pub label: &'static str,
    pub color: ColorToken,
    pub values: Vec<f64>,
}

impl Dataset {
    fn new(key: &'static str, label: &'static str, color: ColorToken, values: Vec<f64>) -> Self {
        Self {
            key,
            label,
            color,
            values,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn dataset(&self, key: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.key == key)
    }

    /// Largest value across all datasets, 0 for an empty chart
    pub fn max_value(&self) -> f64 {
        self.datasets
            .iter()
            .flat_map(|d| d.values.iter().copied())
            .filter(|v| v.is_finite())
            .fold(0.0, f64::max)
    }
}

/// Available / minimum threshold / on order, per availability row
pub fn inventory_chart(items: &[MaterialAvailability]) -> ChartSeries {
    ChartSeries {
        labels: items.iter().map(|i| i.name.clone()).collect(),
        datasets: vec![
            Dataset::new("available", "Available", ColorToken::Green, items.iter().map(|i| i.quantity).collect()),
            Dataset::new(
                "threshold",
                "Minimum Threshold",
                ColorToken::Orange,
                items.iter().map(|i| i.minimum_threshold).collect(),
            ),
            Dataset::new("onOrder", "On Order", ColorToken::Blue, items.iter().map(|i| i.on_order_quantity).collect()),
        ],
    }
}

/// Same shape as [`inventory_chart`], from full material records.
///
/// Materials carry no order quantity, so an outstanding order is charted
/// as the amount needed to refill to maximum stock.
pub fn material_stock_chart(materials: &[Material]) -> ChartSeries {
    let on_order = |m: &Material| {
        if m.inventory.has_outstanding_order() {
            m.inventory.shortfall()
        } else {
            0.0
        }
    };
    ChartSeries {
        labels: materials.iter().map(|m| m.name.clone()).collect(),
        datasets: vec![
            Dataset::new(
                "available",
                "Available",
                ColorToken::Green,
                materials.iter().map(|m| m.inventory.current_stock).collect(),
            ),
            Dataset::new(
                "threshold",
                "Minimum Threshold",
                ColorToken::Orange,
                materials.iter().map(|m| m.inventory.minimum_stock).collect(),
            ),
            Dataset::new("onOrder", "On Order", ColorToken::Blue, materials.iter().map(on_order).collect()),
        ],
    }
}

pub fn project_progress_chart(projects: &[Project]) -> ChartSeries {
    ChartSeries {
        labels: projects.iter().map(|p| p.name.clone()).collect(),
        datasets: vec![Dataset::new(
            "progress",
            "Progress",
            ColorToken::Blue,
            projects.iter().map(|p| p.progress.percentage_complete).collect(),
        )],
    }
}

/// Efficiency per employee; employees without metrics chart as 0
pub fn employee_performance_chart(employees: &[Employee]) -> ChartSeries {
    ChartSeries {
        labels: employees.iter().map(Employee::full_name).collect(),
        datasets: vec![Dataset::new(
            "efficiency",
            "Efficiency",
            ColorToken::Green,
            employees
                .iter()
                .map(|e| e.performance.as_ref().map_or(0.0, |p| p.efficiency))
                .collect(),
        )],
    }
}
