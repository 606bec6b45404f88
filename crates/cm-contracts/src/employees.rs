//! Status update contract for employees

use cm_core::error::ValidationErrors;
use cm_models::{EmployeeStatus, EmployeeStatusUpdate};

use crate::base::{Contract, ValidationResult};

const MAX_NOTE_LENGTH: usize = 500;

/// Contract for `PUT /api/employees/{id}/status`
#[derive(Debug, Default)]
pub struct EmployeeStatusContract;

impl EmployeeStatusContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<EmployeeStatusUpdate> for EmployeeStatusContract {
    fn validate(&self, update: &EmployeeStatusUpdate) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if update.status == EmployeeStatus::Unknown {
            errors.add(
                "status",
                format!(
                    "must be one of {}",
                    EmployeeStatus::ALL
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            );
        }

        if let Some(ref note) = update.note {
            if note.chars().count() > MAX_NOTE_LENGTH {
                errors.add("note", "is too long (maximum is 500 characters)");
            }
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        matches!(attribute, "status" | "note")
    }
}
