//! Material model
//!
//! Collection: materials

use chrono::{DateTime, Utc};
use cm_core::traits::{Entity, Id, Identifiable, Timestamped};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::serde_util;

lenient_enum! {
    /// Stock status as reported by the backend
    pub enum MaterialStatus {
        Available => "available",
        LowStock => "low_stock",
        OutOfStock => "out_of_stock",
        OnOrder => "on_order",
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSupplier {
    #[serde(with = "serde_util::id")]
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub contact_info: String,
    #[serde(default)]
    pub price_per_unit: f64,
    /// Lead time
    #[serde(default)]
    pub delivery_time_in_days: u32,
    #[serde(default)]
    pub minimum_order_quantity: f64,
    /// Reliability score in 0..=1
    #[serde(default)]
    pub reliability: f64,
}

/// Inventory snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialInventory {
    #[serde(default)]
    pub current_stock: f64,
    #[serde(default)]
    pub minimum_stock: f64,
    #[serde(default)]
    pub maximum_stock: f64,
    #[serde(default)]
    pub reorder_point: f64,
    #[serde(default, with = "serde_util::timestamp")]
    pub last_restock_date: Option<DateTime<Utc>>,
    /// Set while an order is outstanding
    #[serde(default, with = "serde_util::timestamp")]
    pub next_delivery_date: Option<DateTime<Utc>>,
}

impl MaterialInventory {
    pub fn new(current_stock: f64, minimum_stock: f64) -> Self {
        Self {
            current_stock,
            minimum_stock,
            ..Default::default()
        }
    }

    pub fn has_outstanding_order(&self) -> bool {
        self.next_delivery_date.is_some()
    }

    /// Quantity needed to refill to `maximum_stock`
    pub fn shortfall(&self) -> f64 {
        (self.maximum_stock - self.current_stock).max(0.0)
    }
}

/// Material entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(with = "serde_util::id")]
    pub id: Id,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub unit: String,

    #[serde(default)]
    pub suppliers: Vec<MaterialSupplier>,

    #[serde(default)]
    pub inventory: MaterialInventory,

    #[serde(default)]
    pub status: MaterialStatus,

    #[serde(default, with = "serde_util::timestamp")]
    pub last_updated: Option<DateTime<Utc>>,

    #[serde(default, with = "serde_util::timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    /// Server fields this client does not model, kept for round-trips
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Material {
    /// Create a material with minimal required fields
    pub fn new(id: impl Into<Id>, name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: String::new(),
            unit: unit.into(),
            suppliers: Vec::new(),
            inventory: MaterialInventory::default(),
            status: MaterialStatus::Available,
            last_updated: None,
            created_at: None,
            extra: Map::new(),
        }
    }

    pub fn with_inventory(mut self, inventory: MaterialInventory) -> Self {
        self.inventory = inventory;
        self
    }

    /// Most reliable supplier; ties go to the cheaper one
    pub fn preferred_supplier(&self) -> Option<&MaterialSupplier> {
        self.suppliers.iter().max_by(|a, b| {
            a.reliability
                .total_cmp(&b.reliability)
                .then_with(|| b.price_per_unit.total_cmp(&a.price_per_unit))
        })
    }

    /// Value of the current stock at the preferred supplier's price
    pub fn stock_value(&self) -> f64 {
        self.preferred_supplier()
            .map(|s| s.price_per_unit * self.inventory.current_stock)
            .unwrap_or(0.0)
    }
}

impl Identifiable for Material {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Timestamped for Material {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}

impl Entity for Material {
    const COLLECTION: &'static str = "materials";
    const TYPE_NAME: &'static str = "Material";
}

/// Element of `GET /api/materials/availability`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialAvailability {
    #[serde(with = "serde_util::id", alias = "id")]
    pub material_id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub available: bool,
    #[serde(default)]
    pub quantity: f64,
    #[serde(default, alias = "min_quantity")]
    pub minimum_threshold: f64,
    #[serde(default)]
    pub on_order_quantity: f64,
    #[serde(default, with = "serde_util::timestamp")]
    pub expected_delivery: Option<DateTime<Utc>>,
}

/// Partial inventory for `PATCH /api/materials/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stock: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_stock: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum_stock: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_point: Option<f64>,
}

/// Body of `PATCH /api/materials/{id}`; only present fields are sent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suppliers: Option<Vec<MaterialSupplier>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<InventoryPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<MaterialStatus>,
}

impl MaterialPatch {
    pub fn stock(current_stock: f64) -> Self {
        Self {
            inventory: Some(InventoryPatch {
                current_stock: Some(current_stock),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
