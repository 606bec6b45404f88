//! Partial update contract for materials

use cm_core::error::ValidationErrors;
use cm_models::{MaterialPatch, MaterialStatus};

use crate::base::{check_id, check_non_negative, Contract, ValidationResult};

/// Contract for `PATCH /api/materials/{id}`
#[derive(Debug, Default)]
pub struct MaterialPatchContract;

impl MaterialPatchContract {
    pub fn new() -> Self {
        Self
    }
}

impl Contract<MaterialPatch> for MaterialPatchContract {
    fn validate(&self, patch: &MaterialPatch) -> ValidationResult {
        let mut errors = ValidationErrors::new();

        if patch.is_empty() {
            errors.add_base("Update contains no changes");
        }

        if let Some(ref name) = patch.name {
            if name.trim().is_empty() {
                errors.add("name", "can't be blank");
            } else if name.chars().count() > 255 {
                errors.add("name", "is too long (maximum is 255 characters)");
            }
        }

        if let Some(ref unit) = patch.unit {
            if unit.trim().is_empty() {
                errors.add("unit", "can't be blank");
            }
        }

        if let Some(ref inventory) = patch.inventory {
            let figures = [
                ("inventory.currentStock", inventory.current_stock),
                ("inventory.minimumStock", inventory.minimum_stock),
                ("inventory.maximumStock", inventory.maximum_stock),
                ("inventory.reorderPoint", inventory.reorder_point),
            ];
            for (field, value) in figures {
                if let Some(value) = value {
                    check_non_negative(field, value, &mut errors);
                }
            }
            if let (Some(min), Some(max)) = (inventory.minimum_stock, inventory.maximum_stock) {
                if min > max {
                    errors.add("inventory.minimumStock", "must not exceed maximumStock");
                }
            }
        }

        if let Some(ref suppliers) = patch.suppliers {
            for supplier in suppliers {
                check_id("suppliers.id", &supplier.id, &mut errors);
                check_non_negative("suppliers.pricePerUnit", supplier.price_per_unit, &mut errors);
                check_non_negative(
                    "suppliers.minimumOrderQuantity",
                    supplier.minimum_order_quantity,
                    &mut errors,
                );
                if !(0.0..=1.0).contains(&supplier.reliability) {
                    errors.add("suppliers.reliability", "must be between 0 and 1");
                }
            }
        }

        if patch.status == Some(MaterialStatus::Unknown) {
            errors.add("status", "is not a recognised material status");
        }

        errors.into_result()
    }

    fn is_writable(&self, attribute: &str) -> bool {
        !matches!(attribute, "id" | "createdAt")
    }
}
