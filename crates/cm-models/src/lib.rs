//! # cm-models
//!
//! Domain models for Construct RS.
//!
//! Pure data contracts for the entities the backend serves. Each model
//! implements the core traits from `cm-core` (Entity, Identifiable, ...).
//! Enumerated fields decode leniently: values the client does not know
//! become `Unknown` instead of failing the whole payload.

pub use cm_core::traits::{Entity, Id, Identifiable, SoftDeletable, Timestamped};

#[macro_use]
mod macros;
pub mod serde_util;

pub mod employee;
pub mod project;
pub mod material;

pub use employee::{
    EmergencyContact, Employee, EmployeeFilters, EmployeePerformance, EmployeeRole, EmployeeSort,
    EmployeeSortField, EmployeeStatus, EmployeeStatusSnapshot, EmployeeStatusUpdate, SortDirection,
};
pub use project::{
    Project, ProjectBudget, ProjectCreateInput, ProjectMaterials, ProjectMilestone, ProjectPriority,
    ProjectProgress, ProjectProgressReport, ProjectStatus, ProjectTeam, ProjectTimeline,
    ProjectUpdateInput,
};
pub use material::{
    InventoryPatch, Material, MaterialAvailability, MaterialInventory, MaterialPatch, MaterialStatus,
    MaterialSupplier,
};
