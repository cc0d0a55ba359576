//! Property tests for the evaluator's algebraic laws.
//!
//! These pin the semantics every target adapter must reproduce: material
//! implication, vacuous quantifier verdicts, equality symmetry, and the
//! lenient numeric coercion.

use proptest::prelude::*;

use specl_check::evaluator::coerce::{as_number, is_truthy};
use specl_check::evaluate;
use specl_core::context::EvalContext;
use specl_core::entity::MemoryEntityStore;
use specl_core::expr::{ExprNode, QuantifierKind};
use specl_core::value::Value;

fn eval_closed(node: &ExprNode) -> Value {
    let store = MemoryEntityStore::new();
    let input = Value::Null;
    let ctx = EvalContext::new(&input, &store, 0);
    evaluate(node, &ctx).expect("closed expressions evaluate without defects")
}

/// A small generator of scalar literal nodes paired with their values.
fn scalar_node() -> impl Strategy<Value = (ExprNode, Value)> {
    prop_oneof![
        Just((ExprNode::Null, Value::Null)),
        any::<bool>().prop_map(|b| (ExprNode::Bool(b), Value::Bool(b))),
        (-1e9f64..1e9f64).prop_map(|n| (ExprNode::Number(n), Value::Number(n))),
        "[a-z]{0,8}".prop_map(|s| (ExprNode::Str(s.clone()), Value::Str(s))),
    ]
}

proptest! {
    #[test]
    fn implication_agrees_with_material_definition((a, av) in scalar_node(), (b, bv) in scalar_node()) {
        let node = ExprNode::implies(a, b);
        let expected = !is_truthy(&av) || is_truthy(&bv);
        prop_assert_eq!(eval_closed(&node), Value::Bool(expected));
    }

    #[test]
    fn false_antecedent_always_satisfies(b in any::<bool>()) {
        let node = ExprNode::implies(ExprNode::bool(false), ExprNode::bool(b));
        prop_assert_eq!(eval_closed(&node), Value::Bool(true));
    }

    #[test]
    fn equality_is_symmetric((a, _) in scalar_node(), (b, _) in scalar_node()) {
        let ab = eval_closed(&ExprNode::equals(a.clone(), b.clone()));
        let ba = eval_closed(&ExprNode::equals(b, a));
        prop_assert_eq!(ab, ba);
    }

    #[test]
    fn negated_equality_is_the_complement((a, _) in scalar_node(), (b, _) in scalar_node()) {
        let eq = eval_closed(&ExprNode::equals(a.clone(), b.clone()));
        let ne = eval_closed(&ExprNode::EqualityCheck {
            left: Box::new(a),
            right: Box::new(b),
            negated: true,
        });
        let negation = match ne {
            Value::Bool(b) => Value::Bool(!b),
            other => other,
        };
        prop_assert_eq!(eq, negation);
    }

    #[test]
    fn quantifiers_over_empty_are_vacuous(kind in prop_oneof![
        Just(QuantifierKind::All),
        Just(QuantifierKind::Any),
        Just(QuantifierKind::None),
        Just(QuantifierKind::Count),
    ]) {
        let node = ExprNode::Quantifier {
            kind,
            collection: Box::new(ExprNode::ListLit(vec![])),
            binding: "x".into(),
            predicate: Box::new(ExprNode::var("x")),
        };
        let expected = match kind {
            QuantifierKind::All => Value::Bool(true),
            QuantifierKind::Any => Value::Bool(false),
            QuantifierKind::None => Value::Bool(true),
            QuantifierKind::Count => Value::Number(0.0),
        };
        prop_assert_eq!(eval_closed(&node), expected);
    }

    #[test]
    fn all_and_any_agree_with_iterator_semantics(values in proptest::collection::vec(any::<bool>(), 0..8)) {
        let collection = Box::new(ExprNode::ListLit(
            values.iter().map(|b| ExprNode::bool(*b)).collect(),
        ));
        let quant = |kind| ExprNode::Quantifier {
            kind,
            collection: collection.clone(),
            binding: "x".into(),
            predicate: Box::new(ExprNode::var("x")),
        };
        prop_assert_eq!(
            eval_closed(&quant(QuantifierKind::All)),
            Value::Bool(values.iter().all(|b| *b))
        );
        prop_assert_eq!(
            eval_closed(&quant(QuantifierKind::Any)),
            Value::Bool(values.iter().any(|b| *b))
        );
        prop_assert_eq!(
            eval_closed(&quant(QuantifierKind::None)),
            Value::Bool(!values.iter().any(|b| *b))
        );
        prop_assert_eq!(
            eval_closed(&quant(QuantifierKind::Count)),
            Value::Number(values.iter().filter(|b| **b).count() as f64)
        );
    }

    #[test]
    fn numeric_strings_coerce_to_their_value(n in -1e6f64..1e6f64) {
        let rendered = format!("{}", n);
        prop_assert_eq!(as_number(&Value::Str(rendered)), n);
    }

    #[test]
    fn evaluation_is_deterministic((a, _) in scalar_node(), (b, _) in scalar_node()) {
        let node = ExprNode::implies(a, b);
        prop_assert_eq!(eval_closed(&node), eval_closed(&node));
    }
}
