//! Runtime value representation for contract evaluation.
//!
//! [`Value`] is the closed dynamic counterpart to the IR: every expression
//! evaluates to exactly one of these variants. Keeping the set closed (rather
//! than trafficking in `serde_json::Value` or a host-native dynamic type)
//! means coercion and equality rules are defined exhaustively in one place.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A runtime value produced or consumed by expression evaluation.
///
/// Structural equality is derived: scalars by value, lists pairwise, maps by
/// key set (`IndexMap` equality ignores insertion order). `Null` is equal
/// only to `Null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    /// A reference to a stored entity instance, by entity name and id.
    EntityRef { entity: String, id: String },
}

impl Value {
    /// Returns a human-readable description of the value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Number(_) => "Number",
            Value::Str(_) => "Str",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::EntityRef { .. } => "EntityRef",
        }
    }

    /// Looks up a named field on a map value. Any other variant has no
    /// fields; the access yields `None`.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Map(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Converts from a `serde_json::Value`. JSON objects become ordered
    /// maps; numbers that exceed f64 precision are saturated the way
    /// `as_f64` defines.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                Value::List(items.iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Converts to a `serde_json::Value` for diagnostics and trace output.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Value::EntityRef { entity, id } => serde_json::json!({
                "entity": entity,
                "id": id,
            }),
        }
    }
}

/// Renders a number the way the specification language prints it: whole
/// values without a trailing `.0`. Shared by string coercion and by every
/// codegen adapter so literals render identically everywhere.
pub fn fmt_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Number(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// Builds a [`Value::Map`] from key-value pairs, in order.
#[macro_export]
macro_rules! value_map {
    ($($key:expr => $val:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut fields = indexmap::IndexMap::new();
        $(fields.insert($key.to_string(), $crate::value::Value::from($val));)*
        $crate::value::Value::Map(fields)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_equality_ignores_key_order() {
        let mut a = IndexMap::new();
        a.insert("x".to_string(), Value::Number(1.0));
        a.insert("y".to_string(), Value::Number(2.0));
        let mut b = IndexMap::new();
        b.insert("y".to_string(), Value::Number(2.0));
        b.insert("x".to_string(), Value::Number(1.0));
        assert_eq!(Value::Map(a), Value::Map(b));
    }

    #[test]
    fn nested_structural_equality() {
        let a = value_map!("a" => 1i64, "b" => Value::List(vec![1i64.into(), 2i64.into()]));
        let b = value_map!("a" => 1i64, "b" => Value::List(vec![1i64.into(), 2i64.into()]));
        assert_eq!(a, b);

        let c = value_map!("a" => 1i64, "b" => Value::List(vec![1i64.into(), 3i64.into()]));
        assert_ne!(a, c);
    }

    #[test]
    fn null_equals_only_null() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::Number(0.0));
        assert_ne!(Value::Null, Value::Str(String::new()));
    }

    #[test]
    fn json_roundtrip() {
        let v = value_map!(
            "name" => "ada",
            "scores" => Value::List(vec![Value::Number(1.5), Value::Null]),
        );
        let back = Value::from_json(&v.to_json());
        assert_eq!(v, back);
    }

    #[test]
    fn field_access_on_non_map_is_none() {
        assert!(Value::Number(3.0).field("x").is_none());
        assert_eq!(
            value_map!("x" => 3i64).field("x"),
            Some(&Value::Number(3.0))
        );
    }
}
