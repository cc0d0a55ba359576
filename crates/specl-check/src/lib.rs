//! Runtime contract checking for specl specifications.
//!
//! This crate is the "run it now" half of the toolchain: a pure
//! tree-walking evaluator over the contract-expression IR, and the
//! assertion binding layer that pairs expressions with precondition /
//! postcondition semantics around an implementation call.
//!
//! # Modules
//!
//! - [`evaluator`] -- `evaluate(node, ctx)`, coercion rules, built-ins
//! - [`contracts`] -- violation types, enforcement modes, binding layer
//! - [`trace`] -- runtime verification trace events
//!
//! The evaluator's semantics are authoritative: the codegen target
//! adapters in `specl-codegen` must reach the same verdicts for the same
//! logical expression and context.

pub mod contracts;
pub mod evaluator;
pub mod trace;

pub use contracts::binding::{
    assert_postcondition, assert_precondition, verify_call, BehaviorOutcome, CallFailure,
    CheckedBehavior, Contract,
};
pub use contracts::{CheckMode, ContractChecker, ContractContext, ContractViolation, ViolationKind};
pub use evaluator::{evaluate, EvalError};
pub use trace::{Trace, TraceEmitter, TraceEvent, TraceEventType};
