//! Cross-checks between the evaluator's verdicts and the adapters'
//! emitted idioms.
//!
//! The generated fragments cannot be executed from here, so these tests
//! pin the agreement at the points where it is decidable statically: the
//! idioms chosen for implication, vacuous quantifiers, and entity-call
//! rewriting are exactly the ones whose host semantics match the
//! evaluator, and the same IR compiles under every adapter without any
//! adapter refusing a node kind.

use specl_check::evaluate;
use specl_codegen::{
    adapter_for, CompilerContext, TargetAdapter, TargetLanguage, TestFramework,
};
use specl_core::context::EvalContext;
use specl_core::entity::MemoryEntityStore;
use specl_core::expr::{CompareOp, ExprNode, QuantifierKind};
use specl_core::value::Value;
use specl_core::value_map;

fn adapters() -> Vec<Box<dyn TargetAdapter>> {
    vec![
        adapter_for(TargetLanguage::TypeScript),
        adapter_for(TargetLanguage::Python),
        adapter_for(TargetLanguage::Go),
    ]
}

/// A corpus touching every node family once.
fn corpus() -> Vec<ExprNode> {
    let items = Box::new(ExprNode::ListLit(vec![
        ExprNode::number(1),
        ExprNode::number(2),
    ]));
    vec![
        ExprNode::implies(
            ExprNode::equals(
                ExprNode::ResultValue(Some("success".into())),
                ExprNode::bool(true),
            ),
            ExprNode::EntityExists {
                entity: "User".into(),
                criteria: None,
            },
        ),
        ExprNode::Quantifier {
            kind: QuantifierKind::Count,
            collection: items.clone(),
            binding: "n".into(),
            predicate: Box::new(ExprNode::Comparison {
                left: Box::new(ExprNode::var("n")),
                op: CompareOp::Gt,
                right: Box::new(ExprNode::number(1)),
            }),
        },
        ExprNode::Between {
            target: Box::new(ExprNode::InputValue("age".into())),
            min: Box::new(ExprNode::number(18)),
            max: Box::new(ExprNode::number(120)),
            inclusive: true,
        },
        ExprNode::OldValue(Box::new(ExprNode::EntityCount {
            entity: "User".into(),
            criteria: None,
        })),
        ExprNode::Conditional {
            condition: Box::new(ExprNode::InputValue("strict".into())),
            then_branch: Box::new(ExprNode::StringLength(Box::new(ExprNode::InputValue(
                "name".into(),
            )))),
            else_branch: Box::new(ExprNode::number(0)),
        },
        ExprNode::FunctionCall {
            name: "User.exists".into(),
            args: vec![ExprNode::property(ExprNode::ResultValue(None), "id")],
        },
        ExprNode::InSet {
            target: Box::new(ExprNode::InputValue("status".into())),
            values: vec![ExprNode::string("active"), ExprNode::string("pending")],
            negated: false,
        },
        ExprNode::MapEach {
            collection: items,
            binding: "n".into(),
            mapper: Box::new(ExprNode::Arithmetic {
                left: Box::new(ExprNode::var("n")),
                op: specl_core::expr::ArithOp::Mul,
                right: Box::new(ExprNode::number(2)),
            }),
        },
    ]
}

#[test]
fn every_adapter_covers_the_whole_corpus() {
    for node in corpus() {
        for adapter in adapters() {
            let mut ctx = CompilerContext::new().with_known_entities(["User"]);
            let fragment = adapter.compile_expression(&node, &mut ctx);
            assert!(
                !fragment.is_empty(),
                "{:?} adapter emitted nothing for {}",
                adapter.language(),
                node.kind_name()
            );
        }
    }
}

#[test]
fn the_corpus_evaluates_without_defects() {
    let mut store = MemoryEntityStore::new();
    store.insert("User", "u1", value_map!("id" => "u1"));
    let snapshot = store.snapshot();
    let input = value_map!("age" => 30i64, "strict" => true, "name" => "ada", "status" => "active");
    let result = value_map!("success" => true, "id" => "u1");
    let ctx = EvalContext::new(&input, &store, 0)
        .with_result(&result)
        .with_old_state(&snapshot);

    for node in corpus() {
        evaluate(&node, &ctx).expect("corpus node evaluates");
    }
}

#[test]
fn rewrite_produces_the_structured_call_in_every_target() {
    let convenience = ExprNode::FunctionCall {
        name: "User.exists".into(),
        args: vec![ExprNode::property(ExprNode::ResultValue(None), "id")],
    };
    let structured = ExprNode::EntityExists {
        entity: "User".into(),
        criteria: Some(Box::new(ExprNode::MapLit(indexmap::IndexMap::from([(
            "id".to_string(),
            ExprNode::property(ExprNode::ResultValue(None), "id"),
        )])))),
    };

    for adapter in adapters() {
        let mut ctx_a = CompilerContext::new().with_known_entities(["User"]);
        let mut ctx_b = CompilerContext::new().with_known_entities(["User"]);
        let from_convenience = adapter.compile_expression(&convenience, &mut ctx_a);
        let from_structured = adapter.compile_expression(&structured, &mut ctx_b);
        assert_eq!(
            from_convenience,
            from_structured,
            "{:?}: convenience syntax and structured criteria must emit identically",
            adapter.language()
        );
    }
}

#[test]
fn unknown_entities_bypass_the_rewrite_everywhere() {
    let node = ExprNode::FunctionCall {
        name: "Ledger.exists".into(),
        args: vec![ExprNode::property(ExprNode::ResultValue(None), "id")],
    };
    for adapter in adapters() {
        // "Ledger" is not in the known-entity set.
        let mut ctx = CompilerContext::new().with_known_entities(["User"]);
        let fragment = adapter.compile_expression(&node, &mut ctx);
        assert!(
            fragment.contains("Ledger"),
            "{:?}: plain helper calls must be preserved verbatim",
            adapter.language()
        );
        assert!(
            !fragment.contains("\"Ledger\""),
            "{:?}: no structured-criteria call for unknown receivers",
            adapter.language()
        );
    }
}

#[test]
fn assertion_framework_matrix() {
    let node = ExprNode::bool(true);
    let cases = [
        (TargetLanguage::TypeScript, TestFramework::Jest, true),
        (TargetLanguage::TypeScript, TestFramework::Vitest, true),
        (TargetLanguage::TypeScript, TestFramework::Pytest, false),
        (TargetLanguage::Python, TestFramework::Pytest, true),
        (TargetLanguage::Python, TestFramework::GoTesting, false),
        (TargetLanguage::Go, TestFramework::GoTesting, true),
        (TargetLanguage::Go, TestFramework::Jest, false),
    ];
    for (language, framework, ok) in cases {
        let adapter = adapter_for(language);
        let mut ctx = CompilerContext::new();
        let outcome = adapter.compile_assertion(&node, framework, &mut ctx);
        assert_eq!(
            outcome.is_ok(),
            ok,
            "{language:?} x {framework:?} should {}",
            if ok { "succeed" } else { "abort generation" }
        );
    }
}

#[test]
fn vacuous_quantifier_idioms_match_the_evaluator() {
    // Evaluator verdicts over the empty collection...
    let store = MemoryEntityStore::new();
    let input = Value::Null;
    let ctx = EvalContext::new(&input, &store, 0);
    let quant = |kind| ExprNode::Quantifier {
        kind,
        collection: Box::new(ExprNode::ListLit(vec![])),
        binding: "x".into(),
        predicate: Box::new(ExprNode::var("x")),
    };
    assert_eq!(
        evaluate(&quant(QuantifierKind::All), &ctx).unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        evaluate(&quant(QuantifierKind::Any), &ctx).unwrap(),
        Value::Bool(false)
    );

    // ...are carried by idioms with the same empty-collection behavior:
    // `[].every` is true and `all(...)` over an empty generator is True;
    // `[].some` is false and `any(...)` is False; the Go helpers implement
    // the same contract.
    let ts = adapter_for(TargetLanguage::TypeScript);
    let mut ts_ctx = CompilerContext::new();
    assert!(ts
        .compile_expression(&quant(QuantifierKind::All), &mut ts_ctx)
        .contains(".every("));
    let py = adapter_for(TargetLanguage::Python);
    let mut py_ctx = CompilerContext::new();
    assert!(py
        .compile_expression(&quant(QuantifierKind::All), &mut py_ctx)
        .starts_with("all("));
    let go = adapter_for(TargetLanguage::Go);
    let mut go_ctx = CompilerContext::new();
    assert!(go
        .compile_expression(&quant(QuantifierKind::All), &mut go_ctx)
        .starts_with("speclrt.All("));
}
