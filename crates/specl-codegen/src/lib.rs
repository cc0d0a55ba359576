//! Source-fragment generation for specl contract expressions.
//!
//! This crate is the "generate code that will run it later" half of the
//! toolchain: each target adapter walks the same closed IR as the
//! evaluator in `specl-check` and emits an idiomatic source fragment whose
//! runtime verdict matches `evaluate` exactly -- material implication,
//! vacuous quantifiers, deep equality, old-state isolation and all.
//!
//! # Modules
//!
//! - [`context`] -- per-compilation translation context
//! - [`rewrite`] -- entity-call collapse into structured criteria
//! - [`typescript`] / [`python`] / [`golang`] -- target adapters
//! - [`error`] -- code-generation failure modes
//!
//! The emitting layer downstream owns file placement and per-framework
//! boilerplate; adapters only hand it fragments plus accumulated imports.

pub mod context;
pub mod error;
pub mod golang;
pub mod python;
pub mod rewrite;
pub mod typescript;

use serde::{Deserialize, Serialize};
use specl_core::expr::ExprNode;

pub use context::CompilerContext;
pub use error::CodegenError;
pub use golang::GoAdapter;
pub use python::PythonAdapter;
pub use typescript::TypeScriptAdapter;

/// Target ecosystems with an adapter in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetLanguage {
    TypeScript,
    Python,
    Go,
}

/// Test frameworks assertions can be emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestFramework {
    Jest,
    Vitest,
    Pytest,
    GoTesting,
}

impl TestFramework {
    /// The language this framework belongs to.
    pub fn language(&self) -> TargetLanguage {
        match self {
            TestFramework::Jest | TestFramework::Vitest => TargetLanguage::TypeScript,
            TestFramework::Pytest => TargetLanguage::Python,
            TestFramework::GoTesting => TargetLanguage::Go,
        }
    }
}

/// A per-ecosystem backend emitting source fragments and assertions
/// equivalent to the evaluator's semantics.
pub trait TargetAdapter {
    fn language(&self) -> TargetLanguage;

    /// Emits an expression fragment. Infallible for a structurally valid
    /// IR -- the node set is closed and covered exhaustively.
    fn compile_expression(&self, node: &ExprNode, ctx: &mut CompilerContext) -> String;

    /// Wraps an expression fragment in a test-framework assertion
    /// statement.
    ///
    /// # Errors
    ///
    /// [`CodegenError::FrameworkMismatch`] when the framework belongs to a
    /// different target language; generation for the file should abort.
    fn compile_assertion(
        &self,
        node: &ExprNode,
        framework: TestFramework,
        ctx: &mut CompilerContext,
    ) -> Result<String, CodegenError>;
}

/// Returns the adapter for a target language.
pub fn adapter_for(language: TargetLanguage) -> Box<dyn TargetAdapter> {
    match language {
        TargetLanguage::TypeScript => Box::new(TypeScriptAdapter),
        TargetLanguage::Python => Box::new(PythonAdapter),
        TargetLanguage::Go => Box::new(GoAdapter),
    }
}

// ---------------------------------------------------------------------------
// Shared emission helpers
// ---------------------------------------------------------------------------

/// Double-quoted string literal with escapes valid in TypeScript, Python,
/// and Go interpreted strings alike.
pub(crate) fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// True for literal nodes whose host representation compares by value, so
/// adapters may use the native equality operator instead of the
/// deep-equality helper.
pub(crate) fn is_scalar_literal(node: &ExprNode) -> bool {
    matches!(
        node,
        ExprNode::Null | ExprNode::Bool(_) | ExprNode::Number(_) | ExprNode::Str(_)
    )
}

/// `snake_case` or `camelCase` to `PascalCase`, for Go field access.
pub(crate) fn pascal_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut upper_next = true;
    for c in s.chars() {
        if c == '_' || c == '-' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
