//! Error types for all code-generation failure modes.
//!
//! Compilation never fails at the expression level for a structurally
//! valid IR node -- the node set is closed and every adapter covers it
//! exhaustively. What can fail is the pairing of adapter and test
//! framework; that is a toolchain defect and aborts generation for the
//! affected file rather than emitting a partially-correct assertion.

use crate::{TargetLanguage, TestFramework};

/// Code-generation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    /// The requested test framework does not belong to the adapter's
    /// target language.
    #[error("test framework {framework:?} is not emitted by the {language:?} adapter")]
    FrameworkMismatch {
        language: TargetLanguage,
        framework: TestFramework,
    },
}
