//! IR node model for contract expressions.
//!
//! Defines the complete expression vocabulary as a closed tagged union.
//! Every contract expression produced by the lowering pass is one
//! [`ExprNode`] tree; the evaluator and every codegen target adapter
//! dispatch over the same set of kinds, so adding a variant here forces
//! both sides to handle it exhaustively.
//!
//! Nodes carry only the data needed to evaluate or compile them. Source
//! positions and type annotations belong to the lowering pass and are not
//! represented at this layer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Operator sub-enums
// ---------------------------------------------------------------------------

/// Ordering comparison operators.
///
/// Equality is a separate node kind ([`ExprNode::EqualityCheck`]) because it
/// uses deep structural equality rather than numeric comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    /// The operator's conventional infix spelling (`<`, `<=`, `>`, `>=`).
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    /// The operator's conventional infix spelling (`+`, `-`, `*`, `/`, `%`).
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        }
    }
}

/// Specification-level quantifier kinds.
///
/// Semantically equivalent to the collection higher-order forms but reserved
/// for "for all / exists / none / count where" phrasing. Over an empty
/// collection: `All` is true, `Any` is false, `None` is true, `Count` is 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantifierKind {
    All,
    Any,
    None,
    Count,
}

// ---------------------------------------------------------------------------
// Expression nodes
// ---------------------------------------------------------------------------

/// A contract expression in normalized intermediate form.
///
/// The set of kinds is closed: the evaluator (`specl-check`) and every
/// target adapter (`specl-codegen`) match exhaustively over it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprNode {
    // -- Literals --
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// A regular-expression pattern literal. Evaluates to the pattern
    /// string; compiled lazily at the regex-match site.
    Regex(String),
    ListLit(Vec<ExprNode>),
    /// Map literal with deterministic key order.
    MapLit(IndexMap<String, ExprNode>),

    // -- Access --
    /// A named variable: a quantifier binding, a context variable, or an
    /// input field by fallback.
    Variable(String),
    PropertyAccess {
        object: Box<ExprNode>,
        property: String,
    },
    IndexAccess {
        object: Box<ExprNode>,
        index: Box<ExprNode>,
    },

    // -- Existence & shape --
    /// `exists` true asserts the target is non-null; false asserts null.
    Existence {
        target: Box<ExprNode>,
        exists: bool,
    },

    // -- String predicates --
    StringLength(Box<ExprNode>),
    RegexMatch {
        target: Box<ExprNode>,
        pattern: Box<ExprNode>,
    },
    StringIncludes {
        target: Box<ExprNode>,
        needle: Box<ExprNode>,
    },
    StartsWith {
        target: Box<ExprNode>,
        prefix: Box<ExprNode>,
    },
    EndsWith {
        target: Box<ExprNode>,
        suffix: Box<ExprNode>,
    },

    // -- Numeric predicates --
    Comparison {
        left: Box<ExprNode>,
        op: CompareOp,
        right: Box<ExprNode>,
    },
    /// `inclusive` true checks `min <= target <= max`; false is strict on
    /// both ends.
    Between {
        target: Box<ExprNode>,
        min: Box<ExprNode>,
        max: Box<ExprNode>,
        inclusive: bool,
    },
    Arithmetic {
        left: Box<ExprNode>,
        op: ArithOp,
        right: Box<ExprNode>,
    },

    // -- Equality & membership --
    /// Deep structural equality. Scalars by value; lists pairwise; maps by
    /// key set. Null is equal only to null.
    EqualityCheck {
        left: Box<ExprNode>,
        right: Box<ExprNode>,
        negated: bool,
    },
    InSet {
        target: Box<ExprNode>,
        values: Vec<ExprNode>,
        negated: bool,
    },

    // -- Boolean logic --
    LogicalAnd(Vec<ExprNode>),
    LogicalOr(Vec<ExprNode>),
    LogicalNot(Box<ExprNode>),
    /// Material implication: false antecedent makes the whole true.
    LogicalImplies {
        antecedent: Box<ExprNode>,
        consequent: Box<ExprNode>,
    },

    // -- Collections --
    CollectionLength(Box<ExprNode>),
    CollectionIncludes {
        target: Box<ExprNode>,
        item: Box<ExprNode>,
    },
    Every {
        collection: Box<ExprNode>,
        binding: String,
        predicate: Box<ExprNode>,
    },
    Some_ {
        collection: Box<ExprNode>,
        binding: String,
        predicate: Box<ExprNode>,
    },
    Filter {
        collection: Box<ExprNode>,
        binding: String,
        predicate: Box<ExprNode>,
    },
    MapEach {
        collection: Box<ExprNode>,
        binding: String,
        mapper: Box<ExprNode>,
    },

    // -- Quantifiers --
    Quantifier {
        kind: QuantifierKind,
        collection: Box<ExprNode>,
        binding: String,
        predicate: Box<ExprNode>,
    },

    // -- Control --
    Conditional {
        condition: Box<ExprNode>,
        then_branch: Box<ExprNode>,
        else_branch: Box<ExprNode>,
    },

    // -- Contract-specific --
    /// Evaluate the inner expression against the pre-operation snapshot.
    /// Requires the context to carry one; evaluating without a snapshot is
    /// a defect, not a false predicate.
    OldValue(Box<ExprNode>),
    /// The behavior's returned value, or one property of it.
    ResultValue(Option<String>),
    /// One field of the behavior's input.
    InputValue(String),

    // -- Calls --
    FunctionCall {
        name: String,
        args: Vec<ExprNode>,
    },

    // -- Entity queries --
    EntityExists {
        entity: String,
        criteria: Option<Box<ExprNode>>,
    },
    EntityLookup {
        entity: String,
        criteria: Box<ExprNode>,
    },
    EntityCount {
        entity: String,
        criteria: Option<Box<ExprNode>>,
    },
}

// Builder shorthands, mostly for tests and for the entity-call rewrite.
impl ExprNode {
    pub fn null() -> Self {
        ExprNode::Null
    }

    pub fn bool(v: bool) -> Self {
        ExprNode::Bool(v)
    }

    pub fn number(v: impl Into<f64>) -> Self {
        ExprNode::Number(v.into())
    }

    pub fn string(v: impl Into<String>) -> Self {
        ExprNode::Str(v.into())
    }

    pub fn var(name: impl Into<String>) -> Self {
        ExprNode::Variable(name.into())
    }

    pub fn property(object: ExprNode, property: impl Into<String>) -> Self {
        ExprNode::PropertyAccess {
            object: Box::new(object),
            property: property.into(),
        }
    }

    pub fn implies(antecedent: ExprNode, consequent: ExprNode) -> Self {
        ExprNode::LogicalImplies {
            antecedent: Box::new(antecedent),
            consequent: Box::new(consequent),
        }
    }

    pub fn equals(left: ExprNode, right: ExprNode) -> Self {
        ExprNode::EqualityCheck {
            left: Box::new(left),
            right: Box::new(right),
            negated: false,
        }
    }

    /// A human-oriented kind label, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ExprNode::Null => "Null",
            ExprNode::Bool(_) => "Bool",
            ExprNode::Number(_) => "Number",
            ExprNode::Str(_) => "Str",
            ExprNode::Regex(_) => "Regex",
            ExprNode::ListLit(_) => "ListLit",
            ExprNode::MapLit(_) => "MapLit",
            ExprNode::Variable(_) => "Variable",
            ExprNode::PropertyAccess { .. } => "PropertyAccess",
            ExprNode::IndexAccess { .. } => "IndexAccess",
            ExprNode::Existence { .. } => "Existence",
            ExprNode::StringLength(_) => "StringLength",
            ExprNode::RegexMatch { .. } => "RegexMatch",
            ExprNode::StringIncludes { .. } => "StringIncludes",
            ExprNode::StartsWith { .. } => "StartsWith",
            ExprNode::EndsWith { .. } => "EndsWith",
            ExprNode::Comparison { .. } => "Comparison",
            ExprNode::Between { .. } => "Between",
            ExprNode::Arithmetic { .. } => "Arithmetic",
            ExprNode::EqualityCheck { .. } => "EqualityCheck",
            ExprNode::InSet { .. } => "InSet",
            ExprNode::LogicalAnd(_) => "LogicalAnd",
            ExprNode::LogicalOr(_) => "LogicalOr",
            ExprNode::LogicalNot(_) => "LogicalNot",
            ExprNode::LogicalImplies { .. } => "LogicalImplies",
            ExprNode::CollectionLength(_) => "CollectionLength",
            ExprNode::CollectionIncludes { .. } => "CollectionIncludes",
            ExprNode::Every { .. } => "Every",
            ExprNode::Some_ { .. } => "Some",
            ExprNode::Filter { .. } => "Filter",
            ExprNode::MapEach { .. } => "MapEach",
            ExprNode::Quantifier { .. } => "Quantifier",
            ExprNode::Conditional { .. } => "Conditional",
            ExprNode::OldValue(_) => "OldValue",
            ExprNode::ResultValue(_) => "ResultValue",
            ExprNode::InputValue(_) => "InputValue",
            ExprNode::FunctionCall { .. } => "FunctionCall",
            ExprNode::EntityExists { .. } => "EntityExists",
            ExprNode::EntityLookup { .. } => "EntityLookup",
            ExprNode::EntityCount { .. } => "EntityCount",
        }
    }
}
