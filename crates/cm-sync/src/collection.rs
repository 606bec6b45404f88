//! Keyed entity store with per-id sequencing

use std::collections::HashMap;

use cm_core::{Entity, Id, Seq};
use cm_models::serde_util::id_from_value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::merge;

/// Result of applying one update to a [`Collection`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Merged into an existing entity
    Applied,
    /// Added as a new entity
    Inserted,
    /// A newer update for this id was already applied
    Stale { applied: Seq },
    /// Partial update for an id not held locally
    UnknownId(Id),
    /// Update without an `id` field
    MissingId,
    /// The merged record no longer decodes as the entity type
    Invalid(String),
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        matches!(self, MergeOutcome::Applied | MergeOutcome::Inserted)
    }
}

/// Ordered entities plus the sequence number last applied to each id
#[derive(Debug, Clone, PartialEq)]
pub struct Collection<T> {
    items: Vec<T>,
    applied: HashMap<Id, Seq>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            applied: HashMap::new(),
        }
    }
}

impl<T> Collection<T>
where
    T: Entity + Serialize + DeserializeOwned,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a fetched list; duplicate ids keep the last occurrence
    pub fn from_items(items: Vec<T>, seq: Seq) -> Self {
        let mut collection = Self::new();
        for item in items {
            collection.put(item, seq);
        }
        collection
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.position(id).map(|index| &self.items[index])
    }

    pub fn applied_seq(&self, id: &str) -> Option<Seq> {
        self.applied.get(id).copied()
    }

    /// Replace contents with a refetched list issued at `seq`.
    ///
    /// Entities updated after `seq` keep their newer local version, and
    /// ones added after `seq` survive even when missing from the list.
    pub fn replace_all(&mut self, fetched: Vec<T>, seq: Seq) {
        let mut next = Self::new();
        for item in fetched {
            match self.applied.get(item.id()) {
                Some(&newer) if newer > seq => {
                    if let Some(current) = self.get(item.id()) {
                        next.put(current.clone(), newer);
                    }
                }
                _ => {
                    next.put(item, seq);
                }
            }
        }
        for item in &self.items {
            if next.position(item.id()).is_none() {
                if let Some(&newer) = self.applied.get(item.id()) {
                    if newer > seq {
                        next.put(item.clone(), newer);
                    }
                }
            }
        }
        *self = next;
    }

    /// Merge a partial record keyed by its `id` field.
    ///
    /// Top-level fields present in the patch replace the held ones whole.
    pub fn merge(&mut self, patch: &Value, seq: Seq) -> MergeOutcome {
        self.merge_with(patch, seq, merge::shallow_merge)
    }

    /// Like [`merge`](Self::merge), but nested objects in the patch are
    /// merged field by field instead of replacing the held object.
    pub fn merge_nested(&mut self, patch: &Value, seq: Seq) -> MergeOutcome {
        self.merge_with(patch, seq, merge::deep_merge)
    }

    fn merge_with(&mut self, patch: &Value, seq: Seq, apply: fn(&mut Value, &Value)) -> MergeOutcome {
        let Some(id) = patch.get("id").and_then(id_from_value) else {
            return MergeOutcome::MissingId;
        };
        if let Some(applied) = self.stale_against(&id, seq) {
            return MergeOutcome::Stale { applied };
        }
        let Some(index) = self.position(&id) else {
            return MergeOutcome::UnknownId(id);
        };

        let mut record = match serde_json::to_value(&self.items[index]) {
            Ok(record) => record,
            Err(e) => return MergeOutcome::Invalid(format!("{} {id}: {e}", T::TYPE_NAME)),
        };
        apply(&mut record, patch);

        match serde_json::from_value::<T>(record) {
            Ok(updated) => {
                self.items[index] = updated;
                self.applied.insert(id, seq);
                MergeOutcome::Applied
            }
            Err(e) => MergeOutcome::Invalid(format!("{} {id}: {e}", T::TYPE_NAME)),
        }
    }

    /// Add a full record, or merge it when the id is already held.
    ///
    /// New ids are appended, so the order of held entities follows the
    /// order in which inserts were applied. Two inserts of different ids
    /// commute on content (see [`same_entities`](Self::same_entities)) but
    /// not on order.
    pub fn insert(&mut self, record: &Value, seq: Seq) -> MergeOutcome {
        let Some(id) = record.get("id").and_then(id_from_value) else {
            return MergeOutcome::MissingId;
        };
        if self.position(&id).is_some() {
            return self.merge(record, seq);
        }
        match serde_json::from_value::<T>(record.clone()) {
            Ok(item) => {
                self.put(item, seq);
                MergeOutcome::Inserted
            }
            Err(e) => MergeOutcome::Invalid(format!("{} {id}: {e}", T::TYPE_NAME)),
        }
    }

    /// Whether both collections hold the same entities at the same applied
    /// sequence numbers, regardless of order
    pub fn same_entities(&self, other: &Self) -> bool
    where
        T: PartialEq,
    {
        self.len() == other.len()
            && self.applied == other.applied
            && self
                .items
                .iter()
                .all(|item| other.get(item.id()).is_some_and(|theirs| theirs == item))
    }

    /// Store a full record returned by the server
    pub fn upsert(&mut self, item: T, seq: Seq) -> MergeOutcome {
        if let Some(applied) = self.stale_against(item.id(), seq) {
            return MergeOutcome::Stale { applied };
        }
        if self.put(item, seq) {
            MergeOutcome::Applied
        } else {
            MergeOutcome::Inserted
        }
    }

    fn stale_against(&self, id: &str, seq: Seq) -> Option<Seq> {
        self.applied
            .get(id)
            .copied()
            .filter(|&applied| applied >= seq)
    }

    /// Returns `true` when an existing entity was replaced
    fn put(&mut self, item: T, seq: Seq) -> bool {
        let id = item.id().to_string();
        let replaced = match self.position(&id) {
            Some(index) => {
                self.items[index] = item;
                true
            }
            None => {
                self.items.push(item);
                false
            }
        };
        self.applied.insert(id, seq);
        replaced
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }
}
