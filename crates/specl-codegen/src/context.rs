//! Per-compilation translation context.
//!
//! One context is created per behavior/assertion being compiled and
//! discarded once the source fragment is produced. Child contexts -- a
//! bound quantifier variable, entry into an `old()` sub-expression -- are
//! new values derived from the parent, never in-place mutations; the one
//! thing that flows back up is the accumulated import set, merged by
//! [`CompilerContext::absorb`].

use std::collections::BTreeSet;

use indexmap::IndexMap;

/// Translation state threaded through one compilation.
#[derive(Debug, Clone, Default)]
pub struct CompilerContext {
    /// Entity names the lowering pass resolved for this domain; gates the
    /// entity-call rewrite.
    known_entities: BTreeSet<String>,
    /// True inside an `old()` sub-expression: state reads emit against the
    /// snapshot receiver instead of the live one.
    in_old_expression: bool,
    /// Specification variable name -> emitted identifier.
    variables: IndexMap<String, String>,
    /// Import statements the emitting layer prepends once per file.
    imports: BTreeSet<String>,
}

impl CompilerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known_entities
            .extend(entities.into_iter().map(Into::into));
        self
    }

    pub fn knows_entity(&self, name: &str) -> bool {
        self.known_entities.contains(name)
    }

    pub fn in_old_expression(&self) -> bool {
        self.in_old_expression
    }

    /// The emitted identifier for a specification variable, if one was
    /// registered by an enclosing binder.
    pub fn emitted_variable(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    /// Child context with one additional bound variable.
    pub fn child_with_variable(
        &self,
        name: impl Into<String>,
        emitted: impl Into<String>,
    ) -> Self {
        let mut child = self.clone();
        child.variables.insert(name.into(), emitted.into());
        child
    }

    /// Child context flagged as inside an `old()` sub-expression.
    pub fn child_in_old(&self) -> Self {
        let mut child = self.clone();
        child.in_old_expression = true;
        child
    }

    /// Merges a child's accumulated imports back into this context.
    pub fn absorb(&mut self, child: CompilerContext) {
        self.imports.extend(child.imports);
    }

    pub fn add_import(&mut self, import: impl Into<String>) {
        self.imports.insert(import.into());
    }

    pub fn imports(&self) -> &BTreeSet<String> {
        &self.imports
    }
}
