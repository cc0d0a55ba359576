pub mod context;
pub mod entity;
pub mod expr;
pub mod snapshot;
pub mod value;

// Re-export commonly used types
pub use context::{EvalContext, VarScope};
pub use entity::{Criteria, EntityStore, MemoryEntityStore};
pub use expr::{ArithOp, CompareOp, ExprNode, QuantifierKind};
pub use snapshot::{SnapshotSource, SnapshotStore, StateSnapshot};
pub use value::Value;
