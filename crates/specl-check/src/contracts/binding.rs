//! Assertion binding: pairing expressions with precondition/postcondition
//! semantics around an implementation call.
//!
//! [`verify_call`] is the runtime-verification entry point: it evaluates a
//! behavior's preconditions, captures a pre-call snapshot, invokes the
//! implementation while measuring elapsed duration, converts an
//! implementation error into a structured failure instead of propagating
//! it, and evaluates postconditions against a context carrying the result
//! and old state. Evaluation defects bubble as [`EvalError`]; violations
//! and implementation failures come back inside the outcome value so a
//! batch of bindings can aggregate many failures without one masking the
//! rest.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use specl_core::context::EvalContext;
use specl_core::expr::ExprNode;
use specl_core::snapshot::{SnapshotSource, StateSnapshot};
use specl_core::value::Value;

use crate::evaluator::coerce::is_truthy;
use crate::evaluator::{evaluate, EvalError};

use super::{ContractContext, ContractViolation};

/// Asserts a precondition result. No-op when the condition value is
/// truthy; otherwise a typed [`ContractViolation::Precondition`].
pub fn assert_precondition(
    condition: &Value,
    expression: &str,
    context: &ContractContext,
) -> Result<(), ContractViolation> {
    if is_truthy(condition) {
        return Ok(());
    }
    Err(ContractViolation::Precondition {
        expression: expression.to_string(),
        context: context.clone(),
    })
}

/// Asserts a postcondition result. No-op when the condition value is
/// truthy; otherwise a typed [`ContractViolation::Postcondition`].
pub fn assert_postcondition(
    condition: &Value,
    expression: &str,
    context: &ContractContext,
) -> Result<(), ContractViolation> {
    if is_truthy(condition) {
        return Ok(());
    }
    Err(ContractViolation::Postcondition {
        expression: expression.to_string(),
        context: context.clone(),
    })
}

/// One lowered contract: the IR expression plus its specification text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contract {
    pub expression: ExprNode,
    /// The literal specification text, embedded in violation messages.
    pub text: String,
}

impl Contract {
    pub fn new(expression: ExprNode, text: impl Into<String>) -> Self {
        Contract {
            expression,
            text: text.into(),
        }
    }
}

/// A behavior's contracts, ready for runtime verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckedBehavior {
    pub name: String,
    pub preconditions: Vec<Contract>,
    pub postconditions: Vec<Contract>,
}

impl CheckedBehavior {
    pub fn new(name: impl Into<String>) -> Self {
        CheckedBehavior {
            name: name.into(),
            preconditions: Vec::new(),
            postconditions: Vec::new(),
        }
    }

    pub fn require(mut self, contract: Contract) -> Self {
        self.preconditions.push(contract);
        self
    }

    pub fn ensure(mut self, contract: Contract) -> Self {
        self.postconditions.push(contract);
        self
    }
}

/// A structured implementation failure: the bound call returned an error,
/// captured instead of propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallFailure {
    pub code: String,
    pub message: String,
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// Everything captured from one bound implementation call.
#[derive(Debug)]
pub struct BehaviorOutcome {
    /// The implementation's return value, if it ran and succeeded.
    pub result: Option<Value>,
    /// The implementation's error, if it ran and failed.
    pub failure: Option<CallFailure>,
    /// Elapsed execution time of the implementation call itself.
    pub duration: Duration,
    /// Precondition and postcondition violations, in check order.
    pub violations: Vec<ContractViolation>,
    /// The pre-call snapshot used as `old` state, when the call ran.
    pub old_state: Option<StateSnapshot>,
}

impl BehaviorOutcome {
    /// True iff the implementation ran cleanly and every contract held.
    pub fn passed(&self) -> bool {
        self.failure.is_none() && self.violations.is_empty()
    }
}

/// Binds and verifies one implementation call against a behavior's
/// contracts.
///
/// Preconditions are evaluated first; if any is violated the
/// implementation is not invoked (the contract says the call is outside
/// its domain). Otherwise the store is snapshotted, the implementation
/// runs, and postconditions are evaluated with the result and the
/// snapshot as old state.
///
/// # Errors
///
/// Only evaluation defects ([`EvalError`]) propagate. An implementation
/// error becomes a [`CallFailure`] in the outcome.
pub fn verify_call<S, F, E>(
    behavior: &CheckedBehavior,
    input: &Value,
    store: &S,
    now: i64,
    implementation: F,
) -> Result<BehaviorOutcome, EvalError>
where
    S: SnapshotSource,
    F: FnOnce(&Value) -> Result<Value, E>,
    E: fmt::Display,
{
    tracing::debug!(behavior = %behavior.name, "binding implementation call");
    let mut violations = Vec::new();

    let pre_ctx = EvalContext::new(input, store, now);
    let pre_context = ContractContext::new(input.clone());
    for contract in &behavior.preconditions {
        let condition = evaluate(&contract.expression, &pre_ctx)?;
        if let Err(violation) = assert_precondition(&condition, &contract.text, &pre_context) {
            tracing::warn!(behavior = %behavior.name, expression = %contract.text, "precondition violated");
            violations.push(violation);
        }
    }
    if !violations.is_empty() {
        return Ok(BehaviorOutcome {
            result: None,
            failure: None,
            duration: Duration::ZERO,
            violations,
            old_state: None,
        });
    }

    let old_state = store.snapshot();
    let started = Instant::now();
    let call_result = implementation(input);
    let duration = started.elapsed();

    let result = match call_result {
        Ok(result) => result,
        Err(err) => {
            let failure = CallFailure {
                code: "IMPLEMENTATION_ERROR".to_string(),
                message: err.to_string(),
            };
            tracing::warn!(behavior = %behavior.name, error = %failure, "implementation failed");
            return Ok(BehaviorOutcome {
                result: None,
                failure: Some(failure),
                duration,
                violations,
                old_state: Some(old_state),
            });
        }
    };

    let post_ctx = EvalContext::new(input, store, now)
        .with_result(&result)
        .with_old_state(&old_state);
    let post_context = ContractContext::new(input.clone()).with_result(result.clone());
    for contract in &behavior.postconditions {
        let condition = evaluate(&contract.expression, &post_ctx)?;
        if let Err(violation) = assert_postcondition(&condition, &contract.text, &post_context) {
            tracing::warn!(behavior = %behavior.name, expression = %contract.text, "postcondition violated");
            violations.push(violation);
        }
    }

    Ok(BehaviorOutcome {
        result: Some(result),
        failure: None,
        duration,
        violations,
        old_state: Some(old_state),
    })
}
