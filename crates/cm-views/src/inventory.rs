//! Stock-level derivations

use cm_models::{Material, MaterialAvailability, MaterialStatus};

/// Current stock is below the configured minimum
pub fn low_stock(material: &Material) -> bool {
    material.inventory.current_stock < material.inventory.minimum_stock
}

/// Current stock has reached the reorder point
pub fn needs_reorder(material: &Material) -> bool {
    material.inventory.current_stock <= material.inventory.reorder_point
}

/// Same rule as [`low_stock`] for availability rows
pub fn availability_low(item: &MaterialAvailability) -> bool {
    item.quantity < item.minimum_threshold
}

/// Status derived from the inventory snapshot; the server-sent status is
/// not consulted. An outstanding order takes precedence.
pub fn display_status(material: &Material) -> MaterialStatus {
    let inventory = &material.inventory;
    if inventory.has_outstanding_order() {
        MaterialStatus::OnOrder
    } else if inventory.current_stock <= 0.0 {
        MaterialStatus::OutOfStock
    } else if low_stock(material) {
        MaterialStatus::LowStock
    } else {
        MaterialStatus::Available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use cm_models::MaterialInventory;

    fn material(current: f64, minimum: f64) -> Material {
        Material::new("m1", "Cement", "bag").with_inventory(MaterialInventory::new(current, minimum))
    }

    #[test]
    fn test_low_stock_matches_comparison() {
        for (current, minimum) in [(0.0, 0.0), (5.0, 10.0), (10.0, 10.0), (11.0, 10.0), (0.0, 1.0)] {
            let m = material(current, minimum);
            assert_eq!(low_stock(&m), current < minimum);
        }
    }

    #[test]
    fn test_fetched_low_stock_material() {
        let m: Material = serde_json::from_value(serde_json::json!({
            "id": "m1",
            "name": "Rebar",
            "inventory": { "currentStock": 5, "minimumStock": 10 }
        }))
        .unwrap();
        assert!(low_stock(&m));
        assert_eq!(display_status(&m), MaterialStatus::LowStock);
    }

    #[test]
    fn test_display_status_rules() {
        assert_eq!(display_status(&material(0.0, 10.0)), MaterialStatus::OutOfStock);
        assert_eq!(display_status(&material(20.0, 10.0)), MaterialStatus::Available);

        let mut ordered = material(0.0, 10.0);
        ordered.inventory.next_delivery_date = Some(Utc::now());
        assert_eq!(display_status(&ordered), MaterialStatus::OnOrder);
    }

    #[test]
    fn test_needs_reorder_inclusive() {
        let mut m = material(15.0, 10.0);
        m.inventory.reorder_point = 15.0;
        assert!(needs_reorder(&m));
        m.inventory.current_stock = 16.0;
        assert!(!needs_reorder(&m));
    }
}
