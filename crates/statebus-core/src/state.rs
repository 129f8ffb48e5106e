//! The application-defined state record.
//!
//! A state record is any JSON object; field types are not validated. Merging
//! is shallow: top-level keys in the update overwrite, everything else is
//! retained. Nested values are replaced wholesale, never merged.

/// A full or partial state record.
pub type StateMap = serde_json::Map<String, serde_json::Value>;

/// Shallow-merge `updates` onto `state`.
pub fn merge_into(state: &mut StateMap, updates: &StateMap) {
    for (key, value) in updates {
        state.insert(key.clone(), value.clone());
    }
}
