//! Partial-record merging

use serde_json::Value;

/// Merge `patch` into `target` one top-level field at a time.
///
/// Every field present in the patch replaces the target field whole,
/// nested objects included. Fields absent from the patch are left
/// untouched.
pub fn shallow_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key.clone(), value.clone());
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

/// Merge `patch` into `target`, recursing into nested objects.
///
/// Any other patch value (arrays, scalars, null) replaces the target value.
/// Used for derived patches that carry only some fields of a nested object.
pub fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) if existing.is_object() && value.is_object() => {
                        deep_merge(existing, value)
                    }
                    _ => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}
