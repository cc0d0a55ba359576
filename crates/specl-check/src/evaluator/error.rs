//! Evaluation defect types.
//!
//! These are programming/lowering-pass errors, not contract violations:
//! they abort the single evaluation and surface to the caller with the
//! offending node attached. They must never be caught and reinterpreted as
//! a false predicate.

use serde::{Deserialize, Serialize};
use specl_core::expr::ExprNode;

/// A defect raised during expression evaluation.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum EvalError {
    /// `old()` was evaluated against a context with no pre-operation
    /// snapshot. The lowering pass or binding layer forgot to capture one.
    #[error("old() evaluated without a pre-operation snapshot")]
    MissingOldState { node: Box<ExprNode> },

    /// A regex-match predicate carried a pattern the regex engine rejects.
    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },
}
