//! Pre-operation state snapshots for `old()` evaluation.
//!
//! A snapshot is captured once per operation, before the operation runs,
//! and is read-only thereafter. Evaluating `old(expr)` substitutes a
//! [`SnapshotStore`] view for the live entity store: queries are answered
//! only from the captured state and never fall back to live data.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::entity::{matches_criteria, Criteria, EntityStore};
use crate::value::Value;

/// An immutable point-in-time copy of entity state and named values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Entity name -> id -> instance, copied at capture time.
    entities: IndexMap<String, IndexMap<String, Value>>,
    /// Named scalar values captured alongside entity state.
    values: IndexMap<String, Value>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_entities(entities: IndexMap<String, IndexMap<String, Value>>) -> Self {
        StateSnapshot {
            entities,
            values: IndexMap::new(),
        }
    }

    /// Records a named value in the snapshot (builder style, used when
    /// assembling snapshots by hand in tests or bindings).
    pub fn with_value(mut self, name: impl Into<String>, value: Value) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    /// Records an entity instance in the snapshot (builder style).
    pub fn with_entity(
        mut self,
        entity: impl Into<String>,
        id: impl Into<String>,
        instance: Value,
    ) -> Self {
        self.entities
            .entry(entity.into())
            .or_default()
            .insert(id.into(), instance);
        self
    }

    /// A named value captured at snapshot time.
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
}

/// An entity store whose full state can be captured as a [`StateSnapshot`].
///
/// The binding layer captures one snapshot per bound call, before the
/// implementation runs, and hands it to postcondition evaluation as the
/// `old` state.
pub trait SnapshotSource: EntityStore {
    fn snapshot(&self) -> StateSnapshot;
}

/// Adapts a [`StateSnapshot`] to the [`EntityStore`] capability set.
///
/// Answers queries exclusively from the snapshot. An entity name absent
/// from the snapshot has zero instances here, even if the live store has
/// some -- that isolation is what makes `old(User.exists(...))` meaningful.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotStore<'a> {
    snapshot: &'a StateSnapshot,
}

impl<'a> SnapshotStore<'a> {
    pub fn new(snapshot: &'a StateSnapshot) -> Self {
        SnapshotStore { snapshot }
    }
}

impl EntityStore for SnapshotStore<'_> {
    fn exists(&self, entity: &str, criteria: Option<&Criteria>) -> bool {
        self.count(entity, criteria) > 0
    }

    fn lookup(&self, entity: &str, criteria: &Criteria) -> Option<Value> {
        self.snapshot
            .entities
            .get(entity)?
            .values()
            .find(|instance| matches_criteria(instance, criteria))
            .cloned()
    }

    fn count(&self, entity: &str, criteria: Option<&Criteria>) -> usize {
        let Some(instances) = self.snapshot.entities.get(entity) else {
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
        self.snapshot
            .entities
            .get(entity)
            .map(|instances| instances.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::MemoryEntityStore;
    use crate::value_map;

    #[test]
    fn snapshot_is_isolated_from_later_mutation() {
        let mut store = MemoryEntityStore::new();
        store.insert("User", "u1", value_map!("id" => "u1"));
        let snapshot = store.snapshot();

        store.insert("User", "u2", value_map!("id" => "u2"));
        store.remove("User", "u1");

        let old = SnapshotStore::new(&snapshot);
        assert_eq!(old.count("User", None), 1);
        let criteria = Criteria::from([("id".to_string(), Value::from("u1"))]);
        assert!(old.exists("User", Some(&criteria)));

        // Live store diverged the other way.
        assert!(!store.exists("User", Some(&criteria)));
    }

    #[test]
    fn absent_entity_has_no_instances() {
        let snapshot = StateSnapshot::new();
        let old = SnapshotStore::new(&snapshot);
        assert!(!old.exists("User", None));
        assert_eq!(old.count("User", None), 0);
        assert!(old.get_all("User").is_empty());
    }

    #[test]
    fn named_values_are_retrievable() {
        let snapshot = StateSnapshot::new().with_value("balance", Value::Number(40.0));
        assert_eq!(snapshot.value("balance"), Some(&Value::Number(40.0)));
        assert!(snapshot.value("missing").is_none());
    }
}
