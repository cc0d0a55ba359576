//! Pure tree-walking evaluator over the contract-expression IR.
//!
//! [`evaluate`] is total over the IR -- every node kind has a defined case --
//! and pure: it reads the context but never mutates it, and equal inputs
//! produce equal results. The only ambient read is the context clock.
//!
//! The semantics here are authoritative. Every codegen target adapter must
//! agree with this module on truthiness, implication, vacuous quantifiers,
//! deep equality, and `old()` isolation; where an adapter's host language
//! disagrees (JavaScript `==`, Python truthiness of `[]`), the adapter
//! emits whatever idiom reproduces *these* verdicts.

pub mod builtins;
pub mod coerce;
pub mod error;

use specl_core::context::EvalContext;
use specl_core::entity::Criteria;
use specl_core::expr::{ArithOp, CompareOp, ExprNode, QuantifierKind};
use specl_core::snapshot::SnapshotStore;
use specl_core::value::Value;

use coerce::{as_number, as_string, deep_equal, is_truthy};
pub use error::EvalError;

/// Evaluates a contract expression against a runtime context.
///
/// # Errors
///
/// Returns [`EvalError`] only for defects: `old()` without a snapshot, or
/// an invalid regex pattern. A false predicate is a `Value::Bool(false)`
/// result, never an error.
pub fn evaluate(node: &ExprNode, ctx: &EvalContext) -> Result<Value, EvalError> {
    match node {
        // -- Literals --
        ExprNode::Null => Ok(Value::Null),
        ExprNode::Bool(b) => Ok(Value::Bool(*b)),
        ExprNode::Number(n) => Ok(Value::Number(*n)),
        ExprNode::Str(s) => Ok(Value::Str(s.clone())),
        // A regex literal evaluates to its pattern text; compilation
        // happens at the match site.
        ExprNode::Regex(pattern) => Ok(Value::Str(pattern.clone())),
        ExprNode::ListLit(items) => Ok(Value::List(
            items
                .iter()
                .map(|item| evaluate(item, ctx))
                .collect::<Result<_, _>>()?,
        )),
        ExprNode::MapLit(fields) => {
            let mut out = indexmap::IndexMap::with_capacity(fields.len());
            for (key, value) in fields {
                out.insert(key.clone(), evaluate(value, ctx)?);
            }
            Ok(Value::Map(out))
        }

        // -- Access --
        ExprNode::Variable(name) => Ok(resolve_variable(name, ctx)),
        ExprNode::PropertyAccess { object, property } => {
            let object = evaluate(object, ctx)?;
            Ok(object.field(property).cloned().unwrap_or(Value::Null))
        }
        ExprNode::IndexAccess { object, index } => {
            let object = evaluate(object, ctx)?;
            let index = evaluate(index, ctx)?;
            Ok(index_into(&object, &index))
        }

        // -- Existence & shape --
        ExprNode::Existence { target, exists } => {
            let value = evaluate(target, ctx)?;
            Ok(Value::Bool((value != Value::Null) == *exists))
        }

        // -- String predicates --
        ExprNode::StringLength(target) => {
            let s = as_string(&evaluate(target, ctx)?);
            Ok(Value::Number(s.chars().count() as f64))
        }
        ExprNode::RegexMatch { target, pattern } => {
            let s = as_string(&evaluate(target, ctx)?);
            let pattern = as_string(&evaluate(pattern, ctx)?);
            let re = regex::Regex::new(&pattern).map_err(|err| EvalError::InvalidRegex {
                pattern,
                reason: err.to_string(),
            })?;
            Ok(Value::Bool(re.is_match(&s)))
        }
        ExprNode::StringIncludes { target, needle } => {
            string_pair(target, needle, ctx, |s, n| s.contains(n))
        }
        ExprNode::StartsWith { target, prefix } => {
            string_pair(target, prefix, ctx, |s, p| s.starts_with(p))
        }
        ExprNode::EndsWith { target, suffix } => {
            string_pair(target, suffix, ctx, |s, x| s.ends_with(x))
        }

        // -- Numeric predicates --
        ExprNode::Comparison { left, op, right } => {
            let l = as_number(&evaluate(left, ctx)?);
            let r = as_number(&evaluate(right, ctx)?);
            Ok(Value::Bool(match op {
                CompareOp::Lt => l < r,
                CompareOp::Le => l <= r,
                CompareOp::Gt => l > r,
                CompareOp::Ge => l >= r,
            }))
        }
        ExprNode::Between {
            target,
            min,
            max,
            inclusive,
        } => {
            let t = as_number(&evaluate(target, ctx)?);
            let lo = as_number(&evaluate(min, ctx)?);
            let hi = as_number(&evaluate(max, ctx)?);
            Ok(Value::Bool(if *inclusive {
                lo <= t && t <= hi
            } else {
                lo < t && t < hi
            }))
        }
        ExprNode::Arithmetic { left, op, right } => {
            let l = as_number(&evaluate(left, ctx)?);
            let r = as_number(&evaluate(right, ctx)?);
            Ok(Value::Number(match op {
                ArithOp::Add => l + r,
                ArithOp::Sub => l - r,
                ArithOp::Mul => l * r,
                ArithOp::Div => l / r,
                ArithOp::Rem => l % r,
            }))
        }

        // -- Equality & membership --
        ExprNode::EqualityCheck {
            left,
            right,
            negated,
        } => {
            let equal = deep_equal(&evaluate(left, ctx)?, &evaluate(right, ctx)?);
            Ok(Value::Bool(equal != *negated))
        }
        ExprNode::InSet {
            target,
            values,
            negated,
        } => {
            let target = evaluate(target, ctx)?;
            let mut found = false;
            for candidate in values {
                if deep_equal(&evaluate(candidate, ctx)?, &target) {
                    found = true;
                    break;
                }
            }
            Ok(Value::Bool(found != *negated))
        }

        // -- Boolean logic --
        ExprNode::LogicalAnd(operands) => {
            for operand in operands {
                if !is_truthy(&evaluate(operand, ctx)?) {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        ExprNode::LogicalOr(operands) => {
            for operand in operands {
                if is_truthy(&evaluate(operand, ctx)?) {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        ExprNode::LogicalNot(operand) => Ok(Value::Bool(!is_truthy(&evaluate(operand, ctx)?))),
        ExprNode::LogicalImplies {
            antecedent,
            consequent,
        } => {
            // Material implication: short-circuits on a false antecedent,
            // so the consequent is never evaluated in that case.
            if !is_truthy(&evaluate(antecedent, ctx)?) {
                return Ok(Value::Bool(true));
            }
            Ok(Value::Bool(is_truthy(&evaluate(consequent, ctx)?)))
        }

        // -- Collections --
        ExprNode::CollectionLength(target) => {
            let value = evaluate(target, ctx)?;
            Ok(Value::Number(match &value {
                Value::List(items) => items.len() as f64,
                Value::Map(fields) => fields.len() as f64,
                Value::Str(s) => s.chars().count() as f64,
                _ => 0.0,
            }))
        }
        ExprNode::CollectionIncludes { target, item } => {
            let collection = evaluate(target, ctx)?;
            let item = evaluate(item, ctx)?;
            Ok(Value::Bool(match &collection {
                Value::List(items) => items.iter().any(|candidate| deep_equal(candidate, &item)),
                Value::Str(s) => s.contains(&as_string(&item)),
                _ => false,
            }))
        }
        ExprNode::Every {
            collection,
            binding,
            predicate,
        } => quantify(QuantifierKind::All, collection, binding, predicate, ctx),
        ExprNode::Some_ {
            collection,
            binding,
            predicate,
        } => quantify(QuantifierKind::Any, collection, binding, predicate, ctx),
        ExprNode::Filter {
            collection,
            binding,
            predicate,
        } => {
            let items = as_items(&evaluate(collection, ctx)?);
            let mut kept = Vec::new();
            for item in items {
                let child = ctx.bind(binding, &item);
                if is_truthy(&evaluate(predicate, &child)?) {
                    kept.push(item);
                }
            }
            Ok(Value::List(kept))
        }
        ExprNode::MapEach {
            collection,
            binding,
            mapper,
        } => {
            let items = as_items(&evaluate(collection, ctx)?);
            let mut mapped = Vec::with_capacity(items.len());
            for item in items {
                let child = ctx.bind(binding, &item);
                mapped.push(evaluate(mapper, &child)?);
            }
            Ok(Value::List(mapped))
        }

        // -- Quantifiers --
        ExprNode::Quantifier {
            kind,
            collection,
            binding,
            predicate,
        } => quantify(*kind, collection, binding, predicate, ctx),

        // -- Control --
        ExprNode::Conditional {
            condition,
            then_branch,
            else_branch,
        } => {
            if is_truthy(&evaluate(condition, ctx)?) {
                evaluate(then_branch, ctx)
            } else {
                evaluate(else_branch, ctx)
            }
        }

        // -- Contract-specific --
        ExprNode::OldValue(inner) => {
            let snapshot = ctx.old_state.ok_or_else(|| EvalError::MissingOldState {
                node: Box::new(node.clone()),
            })?;
            let store = SnapshotStore::new(snapshot);
            let old_ctx = ctx.with_entities(&store);
            evaluate(inner, &old_ctx)
        }
        ExprNode::ResultValue(property) => {
            let Some(result) = ctx.result else {
                return Ok(Value::Null);
            };
            Ok(match property {
                Some(name) => result.field(name).cloned().unwrap_or(Value::Null),
                None => result.clone(),
            })
        }
        ExprNode::InputValue(property) => {
            Ok(ctx.input.field(property).cloned().unwrap_or(Value::Null))
        }

        // -- Calls --
        ExprNode::FunctionCall { name, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(builtins::call(name, &args, ctx))
        }

        // -- Entity queries --
        ExprNode::EntityExists { entity, criteria } => {
            let criteria = eval_criteria(criteria.as_deref(), ctx)?;
            Ok(Value::Bool(ctx.entities.exists(entity, criteria.as_ref())))
        }
        ExprNode::EntityLookup { entity, criteria } => {
            let criteria = eval_criteria(Some(criteria.as_ref()), ctx)?.unwrap_or_default();
            Ok(ctx
                .entities
                .lookup(entity, &criteria)
                .unwrap_or(Value::Null))
        }
        ExprNode::EntityCount { entity, criteria } => {
            let criteria = eval_criteria(criteria.as_deref(), ctx)?;
            Ok(Value::Number(
                ctx.entities.count(entity, criteria.as_ref()) as f64
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Variable resolution: bound scope variables and caller bindings first,
/// then the reserved names, then input fields. Unknown names are null --
/// identifier validation belongs to the lowering pass.
fn resolve_variable(name: &str, ctx: &EvalContext) -> Value {
    if let Some(value) = ctx.lookup_var(name) {
        return value.clone();
    }
    match name {
        "input" => ctx.input.clone(),
        "result" => ctx.result.cloned().unwrap_or(Value::Null),
        _ => ctx.input.field(name).cloned().unwrap_or(Value::Null),
    }
}

fn index_into(object: &Value, index: &Value) -> Value {
    match object {
        Value::List(items) => {
            let idx = as_number(index);
            if idx < 0.0 || idx.fract() != 0.0 {
                return Value::Null;
            }
            items.get(idx as usize).cloned().unwrap_or(Value::Null)
        }
        Value::Map(fields) => fields
            .get(as_string(index).as_str())
            .cloned()
            .unwrap_or(Value::Null),
        Value::Str(s) => {
            let idx = as_number(index);
            if idx < 0.0 || idx.fract() != 0.0 {
                return Value::Null;
            }
            s.chars()
                .nth(idx as usize)
                .map(|c| Value::Str(c.to_string()))
                .unwrap_or(Value::Null)
        }
        _ => Value::Null,
    }
}

fn string_pair(
    target: &ExprNode,
    other: &ExprNode,
    ctx: &EvalContext,
    f: impl Fn(&str, &str) -> bool,
) -> Result<Value, EvalError> {
    let target = as_string(&evaluate(target, ctx)?);
    let other = as_string(&evaluate(other, ctx)?);
    Ok(Value::Bool(f(&target, &other)))
}

/// Views a value as an iterable collection. Non-lists quantify over
/// nothing, which keeps the vacuous-truth rules intact for malformed data.
fn as_items(value: &Value) -> Vec<Value> {
    match value {
        Value::List(items) => items.clone(),
        _ => Vec::new(),
    }
}

fn quantify(
    kind: QuantifierKind,
    collection: &ExprNode,
    binding: &str,
    predicate: &ExprNode,
    ctx: &EvalContext,
) -> Result<Value, EvalError> {
    let items = as_items(&evaluate(collection, ctx)?);
    let mut matched = 0usize;
    for item in &items {
        let child = ctx.bind(binding, item);
        if is_truthy(&evaluate(predicate, &child)?) {
            matched += 1;
            // All and None cannot short-circuit on a match; Any can.
            if kind == QuantifierKind::Any {
                return Ok(Value::Bool(true));
            }
        } else if kind == QuantifierKind::All {
            return Ok(Value::Bool(false));
        }
    }
    Ok(match kind {
        QuantifierKind::All => Value::Bool(true),
        QuantifierKind::Any => Value::Bool(false),
        QuantifierKind::None => Value::Bool(matched == 0),
        QuantifierKind::Count => Value::Number(matched as f64),
    })
}

fn eval_criteria(
    criteria: Option<&ExprNode>,
    ctx: &EvalContext,
) -> Result<Option<Criteria>, EvalError> {
    let Some(criteria) = criteria else {
        return Ok(None);
    };
    match evaluate(criteria, ctx)? {
        Value::Map(fields) => Ok(Some(fields)),
        // A null criteria expression means "no criteria"; anything else is
        // an unmatched shape and matches nothing via an impossible field.
        Value::Null => Ok(None),
        other => {
            let mut impossible = Criteria::new();
            impossible.insert("__criteria".to_string(), other);
            Ok(Some(impossible))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use specl_core::entity::MemoryEntityStore;
    use specl_core::value_map;

    fn empty_store() -> MemoryEntityStore {
        MemoryEntityStore::new()
    }

    fn eval_with(input: Value, node: &ExprNode) -> Value {
        let store = empty_store();
        let ctx = EvalContext::new(&input, &store, 0);
        evaluate(node, &ctx).unwrap()
    }

    fn eval_closed(node: &ExprNode) -> Value {
        eval_with(Value::Null, node)
    }

    #[test]
    fn implication_truth_table() {
        for (a, b, expected) in [
            (true, true, true),
            (true, false, false),
            (false, true, true),
            (false, false, true),
        ] {
            let node = ExprNode::implies(ExprNode::bool(a), ExprNode::bool(b));
            assert_eq!(eval_closed(&node), Value::Bool(expected), "{a} implies {b}");
        }
    }

    #[test]
    fn implication_short_circuits_consequent() {
        // The consequent would defect (old() without snapshot) if evaluated.
        let node = ExprNode::implies(
            ExprNode::bool(false),
            ExprNode::OldValue(Box::new(ExprNode::bool(true))),
        );
        assert_eq!(eval_closed(&node), Value::Bool(true));
    }

    #[test]
    fn vacuous_quantifiers() {
        let empty = || Box::new(ExprNode::ListLit(vec![]));
        let pred = || Box::new(ExprNode::var("x"));
        let quant = |kind| ExprNode::Quantifier {
            kind,
            collection: empty(),
            binding: "x".into(),
            predicate: pred(),
        };
        assert_eq!(eval_closed(&quant(QuantifierKind::All)), Value::Bool(true));
        assert_eq!(eval_closed(&quant(QuantifierKind::Any)), Value::Bool(false));
        assert_eq!(eval_closed(&quant(QuantifierKind::None)), Value::Bool(true));
        assert_eq!(
            eval_closed(&quant(QuantifierKind::Count)),
            Value::Number(0.0)
        );
    }

    #[test]
    fn quantifier_binds_the_loop_variable() {
        let node = ExprNode::Quantifier {
            kind: QuantifierKind::Count,
            collection: Box::new(ExprNode::ListLit(vec![
                ExprNode::number(1),
                ExprNode::number(5),
                ExprNode::number(9),
            ])),
            binding: "n".into(),
            predicate: Box::new(ExprNode::Comparison {
                left: Box::new(ExprNode::var("n")),
                op: CompareOp::Gt,
                right: Box::new(ExprNode::number(3)),
            }),
        };
        assert_eq!(eval_closed(&node), Value::Number(2.0));
    }

    #[test]
    fn filter_and_map_produce_lists() {
        let collection = Box::new(ExprNode::ListLit(vec![
            ExprNode::number(1),
            ExprNode::number(2),
            ExprNode::number(3),
        ]));
        let filter = ExprNode::Filter {
            collection: collection.clone(),
            binding: "x".into(),
            predicate: Box::new(ExprNode::Comparison {
                left: Box::new(ExprNode::var("x")),
                op: CompareOp::Ge,
                right: Box::new(ExprNode::number(2)),
            }),
        };
        assert_eq!(
            eval_closed(&filter),
            Value::List(vec![Value::Number(2.0), Value::Number(3.0)])
        );

        let map = ExprNode::MapEach {
            collection,
            binding: "x".into(),
            mapper: Box::new(ExprNode::Arithmetic {
                left: Box::new(ExprNode::var("x")),
                op: ArithOp::Mul,
                right: Box::new(ExprNode::number(10)),
            }),
        };
        assert_eq!(
            eval_closed(&map),
            Value::List(vec![
                Value::Number(10.0),
                Value::Number(20.0),
                Value::Number(30.0)
            ])
        );
    }

    #[test]
    fn deep_equality_check() {
        let make_map = || {
            let mut fields = IndexMap::new();
            fields.insert("a".to_string(), ExprNode::number(1));
            fields.insert(
                "b".to_string(),
                ExprNode::ListLit(vec![ExprNode::number(1), ExprNode::number(2)]),
            );
            fields
        };
        let equal = ExprNode::equals(
            ExprNode::MapLit(make_map()),
            ExprNode::MapLit(make_map()),
        );
        assert_eq!(eval_closed(&equal), Value::Bool(true));

        let mut changed = make_map();
        changed.insert(
            "b".to_string(),
            ExprNode::ListLit(vec![ExprNode::number(1), ExprNode::number(3)]),
        );
        let unequal = ExprNode::equals(ExprNode::MapLit(make_map()), ExprNode::MapLit(changed));
        assert_eq!(eval_closed(&unequal), Value::Bool(false));
    }

    #[test]
    fn null_equality() {
        assert_eq!(
            eval_closed(&ExprNode::equals(ExprNode::null(), ExprNode::null())),
            Value::Bool(true)
        );
        assert_eq!(
            eval_closed(&ExprNode::equals(ExprNode::null(), ExprNode::number(0))),
            Value::Bool(false)
        );
    }

    #[test]
    fn between_inclusivity() {
        let between = |target: f64, inclusive| ExprNode::Between {
            target: Box::new(ExprNode::Number(target)),
            min: Box::new(ExprNode::number(1)),
            max: Box::new(ExprNode::number(10)),
            inclusive,
        };
        assert_eq!(eval_closed(&between(5.0, true)), Value::Bool(true));
        assert_eq!(eval_closed(&between(1.0, true)), Value::Bool(true));
        assert_eq!(eval_closed(&between(1.0, false)), Value::Bool(false));
        assert_eq!(eval_closed(&between(10.0, false)), Value::Bool(false));
    }

    #[test]
    fn coercion_at_comparison_leaves() {
        let node = ExprNode::Comparison {
            left: Box::new(ExprNode::string("3.5")),
            op: CompareOp::Gt,
            right: Box::new(ExprNode::number(3)),
        };
        assert_eq!(eval_closed(&node), Value::Bool(true));

        let junk = ExprNode::Comparison {
            left: Box::new(ExprNode::string("abc")),
            op: CompareOp::Ge,
            right: Box::new(ExprNode::number(0)),
        };
        assert_eq!(eval_closed(&junk), Value::Bool(true), "abc coerces to 0");
    }

    #[test]
    fn old_state_isolation() {
        let mut store = MemoryEntityStore::new();
        let snapshot = store.snapshot(); // empty: no User yet
        store.insert("User", "1", value_map!("id" => "1"));

        let input = Value::Null;
        let ctx = EvalContext::new(&input, &store, 0).with_old_state(&snapshot);

        let criteria = Some(Box::new(ExprNode::MapLit(IndexMap::from([(
            "id".to_string(),
            ExprNode::string("1"),
        )]))));
        let live = ExprNode::EntityExists {
            entity: "User".into(),
            criteria: criteria.clone(),
        };
        let old = ExprNode::OldValue(Box::new(live.clone()));

        assert_eq!(evaluate(&live, &ctx).unwrap(), Value::Bool(true));
        assert_eq!(evaluate(&old, &ctx).unwrap(), Value::Bool(false));
    }

    #[test]
    fn old_without_snapshot_is_a_defect() {
        let node = ExprNode::OldValue(Box::new(ExprNode::bool(true)));
        let store = empty_store();
        let input = Value::Null;
        let ctx = EvalContext::new(&input, &store, 0);
        let err = evaluate(&node, &ctx).unwrap_err();
        assert!(matches!(err, EvalError::MissingOldState { .. }));
    }

    #[test]
    fn nested_old_is_idempotent() {
        let mut store = MemoryEntityStore::new();
        store.insert("User", "1", value_map!("id" => "1"));
        let snapshot = store.snapshot();
        store.clear();

        let input = Value::Null;
        let ctx = EvalContext::new(&input, &store, 0).with_old_state(&snapshot);
        let node = ExprNode::OldValue(Box::new(ExprNode::OldValue(Box::new(
            ExprNode::EntityExists {
                entity: "User".into(),
                criteria: None,
            },
        ))));
        assert_eq!(evaluate(&node, &ctx).unwrap(), Value::Bool(true));
    }

    #[test]
    fn result_and_input_projection() {
        let store = empty_store();
        let input = value_map!("email" => "ada@example.com");
        let result = value_map!("success" => true, "id" => "u1");
        let ctx = EvalContext::new(&input, &store, 0).with_result(&result);

        assert_eq!(
            evaluate(&ExprNode::ResultValue(Some("id".into())), &ctx).unwrap(),
            Value::from("u1")
        );
        assert_eq!(
            evaluate(&ExprNode::ResultValue(None), &ctx).unwrap(),
            result
        );
        assert_eq!(
            evaluate(&ExprNode::InputValue("email".into()), &ctx).unwrap(),
            Value::from("ada@example.com")
        );
        assert_eq!(
            evaluate(&ExprNode::InputValue("missing".into()), &ctx).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn regex_match_and_defect() {
        let node = ExprNode::RegexMatch {
            target: Box::new(ExprNode::string("ada@example.com")),
            pattern: Box::new(ExprNode::Regex("^[^@]+@[^@]+$".into())),
        };
        assert_eq!(eval_closed(&node), Value::Bool(true));

        let bad = ExprNode::RegexMatch {
            target: Box::new(ExprNode::string("x")),
            pattern: Box::new(ExprNode::Regex("(unclosed".into())),
        };
        assert!(matches!(
            eval_closed_err(&bad),
            EvalError::InvalidRegex { .. }
        ));
    }

    fn eval_closed_err(node: &ExprNode) -> EvalError {
        let store = empty_store();
        let input = Value::Null;
        let ctx = EvalContext::new(&input, &store, 0);
        evaluate(node, &ctx).unwrap_err()
    }

    #[test]
    fn in_set_membership() {
        let node = ExprNode::InSet {
            target: Box::new(ExprNode::string("pending")),
            values: vec![
                ExprNode::string("pending"),
                ExprNode::string("active"),
            ],
            negated: false,
        };
        assert_eq!(eval_closed(&node), Value::Bool(true));

        let negated = ExprNode::InSet {
            target: Box::new(ExprNode::string("deleted")),
            values: vec![ExprNode::string("pending"), ExprNode::string("active")],
            negated: true,
        };
        assert_eq!(eval_closed(&negated), Value::Bool(true));
    }

    #[test]
    fn existence_checks() {
        let present = ExprNode::Existence {
            target: Box::new(ExprNode::string("x")),
            exists: true,
        };
        assert_eq!(eval_closed(&present), Value::Bool(true));

        let absent = ExprNode::Existence {
            target: Box::new(ExprNode::null()),
            exists: false,
        };
        assert_eq!(eval_closed(&absent), Value::Bool(true));
    }

    #[test]
    fn entity_count_and_lookup() {
        let mut store = MemoryEntityStore::new();
        store.insert("User", "u1", value_map!("id" => "u1", "active" => true));
        store.insert("User", "u2", value_map!("id" => "u2", "active" => true));
        let input = Value::Null;
        let ctx = EvalContext::new(&input, &store, 0);

        let count = ExprNode::EntityCount {
            entity: "User".into(),
            criteria: None,
        };
        assert_eq!(evaluate(&count, &ctx).unwrap(), Value::Number(2.0));

        let lookup = ExprNode::EntityLookup {
            entity: "User".into(),
            criteria: Box::new(ExprNode::MapLit(IndexMap::from([(
                "id".to_string(),
                ExprNode::string("u2"),
            )]))),
        };
        let found = evaluate(&lookup, &ctx).unwrap();
        assert_eq!(found.field("id"), Some(&Value::from("u2")));

        let missing = ExprNode::EntityLookup {
            entity: "User".into(),
            criteria: Box::new(ExprNode::MapLit(IndexMap::from([(
                "id".to_string(),
                ExprNode::string("nope"),
            )]))),
        };
        assert_eq!(evaluate(&missing, &ctx).unwrap(), Value::Null);
    }

    #[test]
    fn conditional_branches() {
        let node = ExprNode::Conditional {
            condition: Box::new(ExprNode::bool(false)),
            then_branch: Box::new(ExprNode::string("then")),
            else_branch: Box::new(ExprNode::string("else")),
        };
        assert_eq!(eval_closed(&node), Value::from("else"));
    }

    #[test]
    fn index_access_variants() {
        let list = ExprNode::ListLit(vec![ExprNode::string("a"), ExprNode::string("b")]);
        let node = ExprNode::IndexAccess {
            object: Box::new(list),
            index: Box::new(ExprNode::number(1)),
        };
        assert_eq!(eval_closed(&node), Value::from("b"));

        let oob = ExprNode::IndexAccess {
            object: Box::new(ExprNode::ListLit(vec![])),
            index: Box::new(ExprNode::number(0)),
        };
        assert_eq!(eval_closed(&oob), Value::Null);
    }

    #[test]
    fn variable_falls_back_to_input_field() {
        let input = value_map!("amount" => 25i64);
        let node = ExprNode::var("amount");
        assert_eq!(eval_with(input, &node), Value::Number(25.0));
    }
}
