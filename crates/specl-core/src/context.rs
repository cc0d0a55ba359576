//! Evaluation context: the runtime state an expression is checked against.
//!
//! A context is a bundle of borrows -- input bindings, an optional result
//! value, an optional pre-operation snapshot, lexical variable bindings, an
//! entity store, and a clock reading. Contexts are values: binding a loop
//! variable or substituting the old-state store produces a *new* derived
//! context that shares structure with its parent (a parent-linked scope
//! chain), never an in-place mutation. That keeps evaluation reentrant and
//! safe to run concurrently, one context per expression.

use indexmap::IndexMap;

use crate::entity::EntityStore;
use crate::snapshot::StateSnapshot;
use crate::value::Value;

/// A lexical scope link: one bound variable plus a parent pointer.
///
/// Quantifiers and collection higher-order forms push one binding per
/// iteration; lookup walks the chain innermost-first.
#[derive(Clone, Copy, Default)]
pub struct VarScope<'a> {
    binding: Option<(&'a str, &'a Value)>,
    parent: Option<&'a VarScope<'a>>,
}

impl<'a> VarScope<'a> {
    fn get(&self, name: &str) -> Option<&'a Value> {
        let mut scope = self;
        loop {
            if let Some((bound, value)) = scope.binding {
                if bound == name {
                    return Some(value);
                }
            }
            scope = scope.parent?;
        }
    }
}

/// The state a contract expression is evaluated against.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    /// The behavior's input, usually a map of named fields.
    pub input: &'a Value,
    /// The behavior's returned value, absent while checking preconditions.
    pub result: Option<&'a Value>,
    /// The pre-operation snapshot, required for `old()` sub-expressions.
    pub old_state: Option<&'a StateSnapshot>,
    /// Queryable entity state. Swapped for a snapshot view inside `old()`.
    pub entities: &'a dyn EntityStore,
    /// Root variable bindings supplied by the caller.
    variables: Option<&'a IndexMap<String, Value>>,
    /// Milliseconds since the epoch, read by the `now()` built-in.
    pub now: i64,
    scope: VarScope<'a>,
}

impl<'a> EvalContext<'a> {
    pub fn new(input: &'a Value, entities: &'a dyn EntityStore, now: i64) -> Self {
        EvalContext {
            input,
            result: None,
            old_state: None,
            entities,
            variables: None,
            now,
            scope: VarScope::default(),
        }
    }

    pub fn with_result(mut self, result: &'a Value) -> Self {
        self.result = Some(result);
        self
    }

    pub fn with_old_state(mut self, snapshot: &'a StateSnapshot) -> Self {
        self.old_state = Some(snapshot);
        self
    }

    pub fn with_variables(mut self, variables: &'a IndexMap<String, Value>) -> Self {
        self.variables = Some(variables);
        self
    }

    /// Resolves a variable: innermost scope bindings first, then the
    /// caller-supplied root bindings.
    pub fn lookup_var(&self, name: &str) -> Option<&Value> {
        self.scope
            .get(name)
            .or_else(|| self.variables.and_then(|vars| vars.get(name)))
    }

    /// Derives a context with one additional bound variable. The parent is
    /// untouched; the child borrows it for the duration of the iteration.
    pub fn bind<'b>(&'b self, name: &'b str, value: &'b Value) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            input: self.input,
            result: self.result,
            old_state: self.old_state,
            entities: self.entities,
            variables: self.variables,
            now: self.now,
            scope: VarScope {
                binding: Some((name, value)),
                parent: Some(&self.scope),
            },
        }
    }

    /// Derives a context whose entity queries are answered by `store`
    /// instead of the live store. Used for `old()` substitution.
    pub fn with_entities<'b>(&'b self, store: &'b dyn EntityStore) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            input: self.input,
            result: self.result,
            old_state: self.old_state,
            entities: store,
            variables: self.variables,
            now: self.now,
            scope: self.scope,
        }
    }
}
