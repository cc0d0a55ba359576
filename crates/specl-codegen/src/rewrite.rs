//! Entity-call rewrite: specification convenience syntax to structured
//! criteria.
//!
//! Specification authors write `User.exists(result.id)`; generated source
//! must call the entity store with a structured criteria mapping,
//! `exists("User", { id: result.id })`. The evaluator never needs this --
//! lowering hands it criteria as structured data -- so this is the one
//! compiler-only transformation in the toolchain.
//!
//! The rewrite fires only when the receiver is a known entity name and the
//! method is `exists`, `lookup`, or `count`. A lone property-access
//! argument becomes a single-field criteria keyed by the accessed
//! property's name; an argument that is already a map literal passes
//! through as the criteria (which makes the rewrite a fixed point). A
//! non-property-access argument or more than one argument leaves the call
//! unrewritten -- an explicit no-op, not a guessed multi-field mapping.

use indexmap::IndexMap;
use specl_core::expr::ExprNode;

use crate::context::CompilerContext;

/// Attempts to collapse `Entity.method(arg)` into a structured entity
/// query node. Returns `None` when the call must be emitted verbatim.
pub fn rewrite_entity_call(
    name: &str,
    args: &[ExprNode],
    ctx: &CompilerContext,
) -> Option<ExprNode> {
    let (entity, method) = name.split_once('.')?;
    if !ctx.knows_entity(entity) {
        return None;
    }

    let criteria = match args {
        [] => None,
        [ExprNode::MapLit(fields)] => Some(Box::new(ExprNode::MapLit(fields.clone()))),
        [arg @ ExprNode::PropertyAccess { property, .. }] => {
            let mut fields = IndexMap::new();
            fields.insert(property.clone(), arg.clone());
            Some(Box::new(ExprNode::MapLit(fields)))
        }
        // Ambiguous shapes stay untouched.
        _ => return None,
    };

    match (method, criteria) {
        ("exists", criteria) => Some(ExprNode::EntityExists {
            entity: entity.to_string(),
            criteria,
        }),
        ("count", criteria) => Some(ExprNode::EntityCount {
            entity: entity.to_string(),
            criteria,
        }),
        ("lookup", Some(criteria)) => Some(ExprNode::EntityLookup {
            entity: entity.to_string(),
            criteria,
        }),
        _ => None,
    }
}
