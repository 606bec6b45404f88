//! Base contract system

use std::sync::LazyLock;

use cm_core::error::ValidationErrors;
use regex::Regex;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// Ids are interpolated into URL paths, so only URL-safe characters are allowed
static ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.:-]{0,127}$").expect("valid id pattern"));

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;

    /// Check if an attribute is writable
    fn is_writable(&self, _attribute: &str) -> bool {
        true
    }
}

/// Validate an id used as a path parameter
pub fn validate_id(field: &str, id: &str) -> ValidationResult {
    let mut errors = ValidationErrors::new();
    check_id(field, id, &mut errors);
    errors.into_result()
}

pub(crate) fn check_id(field: &str, id: &str, errors: &mut ValidationErrors) {
    if id.is_empty() {
        errors.add(field, "can't be blank");
    } else if !ID_PATTERN.is_match(id) {
        errors.add(field, "is not a valid identifier");
    }
}

pub(crate) fn check_non_negative(field: &str, value: f64, errors: &mut ValidationErrors) {
    if value.is_nan() {
        errors.add(field, "is not a number");
    } else if value < 0.0 {
        errors.add(field, "must be greater than or equal to 0");
    }
}

/// Copy `validator` derive errors into the contract error collection
pub(crate) fn merge_validator_errors(source: validator::ValidationErrors, errors: &mut ValidationErrors) {
    for (field, field_errors) in source.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("is invalid ({})", error.code));
            errors.add(field.to_string(), message);
        }
    }
}
