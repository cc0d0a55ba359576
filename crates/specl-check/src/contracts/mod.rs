//! Contract violation types and enforcement policy.
//!
//! A violation is an expected, first-class outcome: the code under test
//! broke its contract. It is distinct from an evaluation defect (the
//! toolchain broke) and from an implementation failure (the call threw).
//! Callers match on the violation type to tell these apart.

pub mod binding;

use std::fmt;

use serde::{Deserialize, Serialize};
use specl_core::value::Value;

/// The kind of contract that was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    /// Checked before the behavior runs, against input and live state.
    Precondition,
    /// Checked after the behavior returns, against result and old state.
    Postcondition,
}

/// A serialized view of the evaluation context at violation time, embedded
/// in the violation message for diagnosability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractContext {
    pub input: Value,
    pub result: Option<Value>,
}

impl ContractContext {
    pub fn new(input: Value) -> Self {
        ContractContext {
            input,
            result: None,
        }
    }

    pub fn with_result(mut self, result: Value) -> Self {
        self.result = Some(result);
        self
    }
}

impl fmt::Display for ContractContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut view = serde_json::Map::new();
        view.insert("input".to_string(), self.input.to_json());
        if let Some(result) = &self.result {
            view.insert("result".to_string(), result.to_json());
        }
        write!(f, "{}", serde_json::Value::Object(view))
    }
}

/// A typed contract violation carrying the literal expression text and the
/// context it was evaluated in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum ContractViolation {
    #[error("precondition violated: {expression} | context: {context}")]
    Precondition {
        expression: String,
        context: ContractContext,
    },

    #[error("postcondition violated: {expression} | context: {context}")]
    Postcondition {
        expression: String,
        context: ContractContext,
    },
}

impl ContractViolation {
    pub fn kind(&self) -> ViolationKind {
        match self {
            ContractViolation::Precondition { .. } => ViolationKind::Precondition,
            ContractViolation::Postcondition { .. } => ViolationKind::Postcondition,
        }
    }

    /// The literal specification text of the violated expression.
    pub fn expression(&self) -> &str {
        match self {
            ContractViolation::Precondition { expression, .. }
            | ContractViolation::Postcondition { expression, .. } => expression,
        }
    }
}

/// Contract enforcement modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CheckMode {
    /// Violations are returned as errors.
    #[default]
    Strict,
    /// Violations are logged and collected but do not fail the check.
    Warn,
    /// All contract checking is bypassed.
    Skip,
}

/// Stateful checker applying an enforcement mode and collecting violations
/// up to a cap.
#[derive(Debug)]
pub struct ContractChecker {
    mode: CheckMode,
    violations: Vec<ContractViolation>,
    max_violations: usize,
}

impl Default for ContractChecker {
    fn default() -> Self {
        ContractChecker::new(CheckMode::Strict)
    }
}

impl ContractChecker {
    pub fn new(mode: CheckMode) -> Self {
        ContractChecker {
            mode,
            violations: Vec::new(),
            max_violations: 100,
        }
    }

    pub fn with_max_violations(mut self, max: usize) -> Self {
        self.max_violations = max;
        self
    }

    pub fn mode(&self) -> CheckMode {
        self.mode
    }

    /// Violations collected so far, oldest first.
    pub fn violations(&self) -> &[ContractViolation] {
        &self.violations
    }

    pub fn clear_violations(&mut self) {
        self.violations.clear();
    }

    pub fn check_precondition(
        &mut self,
        condition: &Value,
        expression: &str,
        context: &ContractContext,
    ) -> Result<(), ContractViolation> {
        self.check(ViolationKind::Precondition, condition, expression, context)
    }

    pub fn check_postcondition(
        &mut self,
        condition: &Value,
        expression: &str,
        context: &ContractContext,
    ) -> Result<(), ContractViolation> {
        self.check(ViolationKind::Postcondition, condition, expression, context)
    }

    fn check(
        &mut self,
        kind: ViolationKind,
        condition: &Value,
        expression: &str,
        context: &ContractContext,
    ) -> Result<(), ContractViolation> {
        if self.mode == CheckMode::Skip || crate::evaluator::coerce::is_truthy(condition) {
            return Ok(());
        }
        let violation = match kind {
            ViolationKind::Precondition => ContractViolation::Precondition {
                expression: expression.to_string(),
                context: context.clone(),
            },
            ViolationKind::Postcondition => ContractViolation::Postcondition {
                expression: expression.to_string(),
                context: context.clone(),
            },
        };
        tracing::warn!(expression, kind = ?kind, "contract violation");
        if self.violations.len() < self.max_violations {
            self.violations.push(violation.clone());
        }
        match self.mode {
            CheckMode::Strict => Err(violation),
            CheckMode::Warn | CheckMode::Skip => Ok(()),
        }
    }
}
