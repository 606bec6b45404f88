//! Core traits shared by entity models and the sync layer

use chrono::{DateTime, Utc};

/// Entity identity as issued by the backend
pub type Id = String;

/// Monotonically increasing update sequence number, scoped to one view
pub type Seq = u64;

/// Trait for entities that have a stable identity
pub trait Identifiable {
    fn id(&self) -> &str;
}

/// Trait for entities with timestamps (created_at, updated_at)
pub trait Timestamped {
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
}

/// Trait for soft-deletable entities.
///
/// Deleted records stay in client state; views filter them out.
pub trait SoftDeletable {
    fn deleted_at(&self) -> Option<DateTime<Utc>>;
    fn is_deleted(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// Base trait for all domain entities
pub trait Entity: Identifiable + Clone + Send + Sync + 'static {
    /// The backend collection (table) name, also used as the realtime topic
    const COLLECTION: &'static str;

    /// Human-readable type name for log and error messages
    const TYPE_NAME: &'static str;
}
