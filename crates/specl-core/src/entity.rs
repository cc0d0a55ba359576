//! Entity store capability set and the in-memory reference implementation.
//!
//! Contract evaluation only ever reads entity state: `exists`, `lookup`,
//! `count`, `get_all`. Criteria matching is conjunctive -- an instance
//! matches iff every criteria field is present on the instance and
//! structurally equal to it. Production stores may be backed by a real
//! database as long as they honor the same matching contract;
//! [`MemoryEntityStore`] is the reference used by the test suite and by
//! snapshot capture.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::snapshot::StateSnapshot;
use crate::value::Value;

/// A mapping from field name to expected value, matched conjunctively.
pub type Criteria = IndexMap<String, Value>;

/// Read-only queries over entity state.
///
/// All four operations are side-effect free; the evaluator never needs
/// write access mid-evaluation, so snapshot-isolated or read-only backends
/// are sufficient.
pub trait EntityStore {
    /// True iff at least one instance of `entity` matches `criteria`
    /// (or any instance exists, when `criteria` is absent).
    fn exists(&self, entity: &str, criteria: Option<&Criteria>) -> bool;

    /// The first instance of `entity` matching `criteria`, if any.
    fn lookup(&self, entity: &str, criteria: &Criteria) -> Option<Value>;

    /// Number of instances of `entity` matching `criteria` (all instances
    /// when `criteria` is absent).
    fn count(&self, entity: &str, criteria: Option<&Criteria>) -> usize;

    /// Every instance of `entity`, in insertion order.
    fn get_all(&self, entity: &str) -> Vec<Value>;
}

/// True iff every criteria field is present on the instance and deep-equal.
///
/// Instances are expected to be [`Value::Map`]s; anything else matches only
/// an empty criteria.
pub fn matches_criteria(instance: &Value, criteria: &Criteria) -> bool {
    criteria
        .iter()
        .all(|(field, expected)| instance.field(field) == Some(expected))
}

/// In-memory entity store keyed entity-name -> id -> instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryEntityStore {
    entities: IndexMap<String, IndexMap<String, Value>>,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) an instance under the given entity name and id.
    pub fn insert(&mut self, entity: impl Into<String>, id: impl Into<String>, instance: Value) {
        self.entities
            .entry(entity.into())
            .or_default()
            .insert(id.into(), instance);
    }

    /// Removes an instance by id. Returns the removed instance, if present.
    pub fn remove(&mut self, entity: &str, id: &str) -> Option<Value> {
        self.entities.get_mut(entity)?.shift_remove(id)
    }

    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// Captures an immutable point-in-time copy of the whole store, usable
    /// as the `old` state for postcondition evaluation.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::from_entities(self.entities.clone())
    }
}

impl crate::snapshot::SnapshotSource for MemoryEntityStore {
    fn snapshot(&self) -> StateSnapshot {
        MemoryEntityStore::snapshot(self)
    }
}

impl EntityStore for MemoryEntityStore {
    fn exists(&self, entity: &str, criteria: Option<&Criteria>) -> bool {
        self.count(entity, criteria) > 0
    }

    fn lookup(&self, entity: &str, criteria: &Criteria) -> Option<Value> {
        self.entities
            .get(entity)?
            .values()
            .find(|instance| matches_criteria(instance, criteria))
            .cloned()
    }

    fn count(&self, entity: &str, criteria: Option<&Criteria>) -> usize {
        let Some(instances) = self.entities.get(entity) else {
            return 0;
        };
        match criteria {
            Some(criteria) => instances
                .values()
                .filter(|instance| matches_criteria(instance, criteria))
                .count(),
            None => instances.len(),
        }
    }

    fn get_all(&self, entity: &str) -> Vec<Value> {
        self.entities
            .get(entity)
            .map(|instances| instances.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_map;

    fn store_with_users() -> MemoryEntityStore {
        let mut store = MemoryEntityStore::new();
        store.insert(
            "User",
            "u1",
            value_map!("id" => "u1", "email" => "ada@example.com", "active" => true),
        );
        store.insert(
            "User",
            "u2",
            value_map!("id" => "u2", "email" => "grace@example.com", "active" => false),
        );
        store
    }

    #[test]
    fn exists_without_criteria_checks_any_instance() {
        let store = store_with_users();
        assert!(store.exists("User", None));
        assert!(!store.exists("Session", None));
    }

    #[test]
    fn criteria_matching_is_conjunctive() {
        let store = store_with_users();
        let both = Criteria::from([
            ("id".to_string(), Value::from("u1")),
            ("active".to_string(), Value::from(true)),
        ]);
        assert!(store.exists("User", Some(&both)));

        let contradictory = Criteria::from([
            ("id".to_string(), Value::from("u1")),
            ("active".to_string(), Value::from(false)),
        ]);
        assert!(!store.exists("User", Some(&contradictory)));
    }

    #[test]
    fn criteria_field_must_be_present() {
        let store = store_with_users();
        let missing_field = Criteria::from([("plan".to_string(), Value::Null)]);
        assert!(!store.exists("User", Some(&missing_field)));
    }

    #[test]
    fn lookup_returns_first_match() {
        let store = store_with_users();
        let criteria = Criteria::from([("active".to_string(), Value::from(true))]);
        let found = store.lookup("User", &criteria).unwrap();
        assert_eq!(found.field("id"), Some(&Value::from("u1")));
    }

    #[test]
    fn count_with_and_without_criteria() {
        let store = store_with_users();
        assert_eq!(store.count("User", None), 2);
        let criteria = Criteria::from([("active".to_string(), Value::from(false))]);
        assert_eq!(store.count("User", Some(&criteria)), 1);
    }

    #[test]
    fn remove_then_gone() {
        let mut store = store_with_users();
        assert!(store.remove("User", "u1").is_some());
        assert_eq!(store.count("User", None), 1);
        assert!(store.remove("User", "u1").is_none());
    }

    #[test]
    fn get_all_preserves_insertion_order() {
        let store = store_with_users();
        let all = store.get_all("User");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].field("id"), Some(&Value::from("u1")));
        assert_eq!(all[1].field("id"), Some(&Value::from("u2")));
    }
}
