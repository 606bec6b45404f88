//! Built-in sample backend for `--demo`

use std::sync::Arc;
use std::time::Duration;

use cm_client::mock::ScriptedTransport;
use cm_client::Method;
use cm_sync::{BroadcastFeed, ChangeEvent};
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::debug;

const READ_ONLY: &str = "Demo backend is read-only";

fn employees() -> Value {
    json!([
        {
            "id": "e1", "firstName": "Ana", "lastName": "Ruiz", "role": "MANAGER",
            "status": "ACTIVE", "department": "Operations",
            "performance": { "efficiency": 92, "qualityScore": 88, "safetyRating": 97, "attendanceRate": 99 }
        },
        {
            "id": "e2", "firstName": "Tomas", "lastName": "Berg", "role": "TECHNICIAN",
            "status": "ON_LEAVE", "department": "Electrical",
            "performance": { "efficiency": 78, "qualityScore": 81, "safetyRating": 90, "attendanceRate": 85 }
        },
        {
            "id": "e3", "firstName": "Mei", "lastName": "Chen", "role": "WORKER",
            "status": "ACTIVE", "department": "Concrete"
        }
    ])
}

fn projects() -> Value {
    json!([
        {
            "id": "p1", "name": "Harbour Tower", "status": "IN_PROGRESS", "priority": "HIGH",
            "progress": { "completedTasks": 18, "totalTasks": 40, "percentageComplete": 45 },
            "budget": { "allocated": 1200000, "spent": 540000, "remaining": 660000, "currency": "USD" },
            "timeline": { "startDate": "2024-02-01T00:00:00Z", "plannedEndDate": "2026-12-31T00:00:00Z" }
        },
        {
            "id": "p2", "name": "Riverside Depot", "status": "ON_HOLD", "priority": "MEDIUM",
            "progress": { "completedTasks": 3, "totalTasks": 12, "percentageComplete": 25 },
            "budget": { "allocated": 300000, "spent": 310000, "remaining": -10000, "currency": "USD" }
        },
        {
            "id": "p3", "name": "Old Warehouse", "status": "CANCELLED",
            "deletedAt": "2024-03-10T12:00:00Z"
        }
    ])
}

fn materials() -> Value {
    json!([
        {
            "id": "m1", "name": "Cement", "unit": "bag", "status": "available",
            "inventory": { "currentStock": 420, "minimumStock": 150, "maximumStock": 800, "reorderPoint": 200 }
        },
        {
            "id": "m2", "name": "Rebar", "unit": "t", "status": "low_stock",
            "inventory": {
                "currentStock": 6, "minimumStock": 10, "maximumStock": 40, "reorderPoint": 12,
                "nextDeliveryDate": "2024-06-03T08:00:00Z"
            }
        },
        {
            "id": "m3", "name": "Plywood", "unit": "sheet", "status": "out_of_stock",
            "inventory": { "currentStock": 0, "minimumStock": 50, "maximumStock": 300, "reorderPoint": 80 }
        }
    ])
}

fn availability() -> Value {
    json!([
        { "materialId": "m1", "name": "Cement", "available": true, "quantity": 420, "minimumThreshold": 150 },
        {
            "materialId": "m2", "name": "Rebar", "available": true, "quantity": 6, "minimumThreshold": 10,
            "onOrderQuantity": 34, "expectedDelivery": "2024-06-03T08:00:00Z"
        },
        { "materialId": "m3", "name": "Plywood", "available": false, "quantity": 0, "minimumThreshold": 50 }
    ])
}

/// Transport answering every read the views issue with sample data
pub fn transport() -> ScriptedTransport {
    let transport = ScriptedTransport::new();
    let employees = employees();
    transport
        .json(Method::Get, "/api/employees", 200, employees.clone())
        .json(Method::Get, "/api/projects", 200, projects())
        .json(Method::Get, "/api/materials", 200, materials())
        .json(Method::Get, "/api/materials/availability", 200, availability());

    for employee in employees.as_array().into_iter().flatten() {
        let Some(id) = employee.get("id").and_then(Value::as_str) else {
            continue;
        };
        transport
            .json(Method::Get, &format!("/api/employees/{id}"), 200, employee.clone())
            .json(
                Method::Get,
                &format!("/api/employees/{id}/status"),
                200,
                json!({ "status": employee["status"], "lastUpdated": "2024-05-01T07:45:00Z" }),
            )
            .json(
                Method::Put,
                &format!("/api/employees/{id}/status"),
                403,
                json!({ "detail": READ_ONLY }),
            );
    }

    for (id, percentage, completed, total) in [("p1", 47.5, 19, 40), ("p2", 25.0, 3, 12)] {
        transport.json(
            Method::Get,
            &format!("/api/projects/{id}/progress"),
            200,
            json!({ "percentage": percentage, "completedTasks": completed, "totalTasks": total }),
        );
    }
    transport
        .json(Method::Post, "/api/projects", 403, json!({ "detail": READ_ONLY }))
        .json(Method::Patch, "/api/materials/m1", 403, json!({ "detail": READ_ONLY }));

    transport
}

/// Publish a progress update for the first sample project every few seconds
pub fn spawn_activity(feed: Arc<BroadcastFeed>, channel: String) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(5));
        ticker.tick().await;
        const TOTAL: u32 = 40;
        let mut completed = 18u32;
        while completed < TOTAL {
            ticker.tick().await;
            completed += 1;
            let percentage = (f64::from(completed) * 100.0 / f64::from(TOTAL)).round();
            let delivered = feed.publish(
                &channel,
                "projects",
                ChangeEvent::update(json!({
                    "id": "p1",
                    "progress": {
                        "completedTasks": completed,
                        "totalTasks": TOTAL,
                        "percentageComplete": percentage
                    }
                })),
            );
            debug!(completed, delivered, "demo progress published");
        }
    })
}
