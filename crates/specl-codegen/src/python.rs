//! Python code emitter.
//!
//! Emits fragments for pytest suites. Python's `==` is already deep, and
//! `all()`/`any()` over empty generators give the vacuous-truth verdicts,
//! so most operators map directly; regex and floor/ceil pull in stdlib
//! imports recorded on the compiler context.

use specl_core::expr::{ExprNode, QuantifierKind};
use specl_core::value::fmt_number;

use crate::context::CompilerContext;
use crate::error::CodegenError;
use crate::rewrite::rewrite_entity_call;
use crate::{quote, TargetAdapter, TargetLanguage, TestFramework};

const RUNTIME_IMPORT: &str = "from specl_runtime import get_entity_store";

/// Emits IR as Python source fragments.
pub struct PythonAdapter;

impl TargetAdapter for PythonAdapter {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Python
    }

    fn compile_expression(&self, node: &ExprNode, ctx: &mut CompilerContext) -> String {
        self.expr(node, ctx)
    }

    fn compile_assertion(
        &self,
        node: &ExprNode,
        framework: TestFramework,
        ctx: &mut CompilerContext,
    ) -> Result<String, CodegenError> {
        match framework {
            TestFramework::Pytest => Ok(format!("assert {}", self.expr(node, ctx))),
            other => Err(CodegenError::FrameworkMismatch {
                language: TargetLanguage::Python,
                framework: other,
            }),
        }
    }
}

impl PythonAdapter {
    fn expr(&self, node: &ExprNode, ctx: &mut CompilerContext) -> String {
        match node {
            // -- Literals --
            ExprNode::Null => "None".to_string(),
            ExprNode::Bool(true) => "True".to_string(),
            ExprNode::Bool(false) => "False".to_string(),
            ExprNode::Number(n) => fmt_number(*n),
            ExprNode::Str(s) => quote(s),
            ExprNode::Regex(pattern) => quote(pattern),
            ExprNode::ListLit(items) => {
                let items: Vec<String> = items.iter().map(|item| self.expr(item, ctx)).collect();
                format!("[{}]", items.join(", "))
            }
            ExprNode::MapLit(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(key, value)| format!("{}: {}", quote(key), self.expr(value, ctx)))
                    .collect();
                format!("{{{}}}", fields.join(", "))
            }

            // -- Access --
            ExprNode::Variable(name) => ctx
                .emitted_variable(name)
                .map(str::to_string)
                .unwrap_or_else(|| name.clone()),
            ExprNode::PropertyAccess { object, property } => {
                format!("{}.{}", self.expr(object, ctx), property)
            }
            ExprNode::IndexAccess { object, index } => {
                format!("{}[{}]", self.expr(object, ctx), self.expr(index, ctx))
            }

            // -- Existence & shape --
            ExprNode::Existence { target, exists } => {
                let target = self.expr(target, ctx);
                if *exists {
                    format!("({target} is not None)")
                } else {
                    format!("({target} is None)")
                }
            }

            // -- String predicates --
            ExprNode::StringLength(target) => format!("len({})", self.expr(target, ctx)),
            ExprNode::RegexMatch { target, pattern } => {
                ctx.add_import("import re");
                format!(
                    "re.search({}, {}) is not None",
                    self.expr(pattern, ctx),
                    self.expr(target, ctx)
                )
            }
            ExprNode::StringIncludes { target, needle } => {
                format!(
                    "({} in {})",
                    self.expr(needle, ctx),
                    self.expr(target, ctx)
                )
            }
            ExprNode::StartsWith { target, prefix } => {
                format!(
                    "{}.startswith({})",
                    self.expr(target, ctx),
                    self.expr(prefix, ctx)
                )
            }
            ExprNode::EndsWith { target, suffix } => {
                format!(
                    "{}.endswith({})",
                    self.expr(target, ctx),
                    self.expr(suffix, ctx)
                )
            }

            // -- Numeric predicates --
            ExprNode::Comparison { left, op, right } => {
                format!(
                    "({} {} {})",
                    self.expr(left, ctx),
                    op.symbol(),
                    self.expr(right, ctx)
                )
            }
            ExprNode::Between {
                target,
                min,
                max,
                inclusive,
            } => {
                let target = self.expr(target, ctx);
                let min = self.expr(min, ctx);
                let max = self.expr(max, ctx);
                if *inclusive {
                    format!("({min} <= {target} <= {max})")
                } else {
                    format!("({min} < {target} < {max})")
                }
            }
            ExprNode::Arithmetic { left, op, right } => {
                format!(
                    "({} {} {})",
                    self.expr(left, ctx),
                    op.symbol(),
                    self.expr(right, ctx)
                )
            }

            // -- Equality & membership --
            ExprNode::EqualityCheck {
                left,
                right,
                negated,
            } => {
                let op = if *negated { "!=" } else { "==" };
                format!(
                    "({} {op} {})",
                    self.expr(left, ctx),
                    self.expr(right, ctx)
                )
            }
            ExprNode::InSet {
                target,
                values,
                negated,
            } => {
                let rendered: Vec<String> =
                    values.iter().map(|value| self.expr(value, ctx)).collect();
                let op = if *negated { "not in" } else { "in" };
                format!(
                    "({} {op} [{}])",
                    self.expr(target, ctx),
                    rendered.join(", ")
                )
            }

            // -- Boolean logic --
            ExprNode::LogicalAnd(operands) => self.connective(operands, "and", "True", ctx),
            ExprNode::LogicalOr(operands) => self.connective(operands, "or", "False", ctx),
            ExprNode::LogicalNot(operand) => format!("not ({})", self.expr(operand, ctx)),
            ExprNode::LogicalImplies {
                antecedent,
                consequent,
            } => {
                format!(
                    "((not ({})) or {})",
                    self.expr(antecedent, ctx),
                    self.expr(consequent, ctx)
                )
            }

            // -- Collections --
            ExprNode::CollectionLength(target) => format!("len({})", self.expr(target, ctx)),
            ExprNode::CollectionIncludes { target, item } => {
                format!(
                    "({} in {})",
                    self.expr(item, ctx),
                    self.expr(target, ctx)
                )
            }
            ExprNode::Every {
                collection,
                binding,
                predicate,
            } => self.comprehension("all", collection, binding, predicate, ctx),
            ExprNode::Some_ {
                collection,
                binding,
                predicate,
            } => self.comprehension("any", collection, binding, predicate, ctx),
            ExprNode::Filter {
                collection,
                binding,
                predicate,
            } => {
                let collection = self.expr(collection, ctx);
                let mut child = ctx.child_with_variable(binding, binding);
                let predicate = self.expr(predicate, &mut child);
                ctx.absorb(child);
                format!("[{binding} for {binding} in {collection} if {predicate}]")
            }
            ExprNode::MapEach {
                collection,
                binding,
                mapper,
            } => {
                let collection = self.expr(collection, ctx);
                let mut child = ctx.child_with_variable(binding, binding);
                let mapper = self.expr(mapper, &mut child);
                ctx.absorb(child);
                format!("[{mapper} for {binding} in {collection}]")
            }

            // -- Quantifiers --
            ExprNode::Quantifier {
                kind,
                collection,
                binding,
                predicate,
            } => match kind {
                QuantifierKind::All => {
                    self.comprehension("all", collection, binding, predicate, ctx)
                }
                QuantifierKind::Any => {
                    self.comprehension("any", collection, binding, predicate, ctx)
                }
                QuantifierKind::None => format!(
                    "not {}",
                    self.comprehension("any", collection, binding, predicate, ctx)
                ),
                QuantifierKind::Count => {
                    let collection = self.expr(collection, ctx);
                    let mut child = ctx.child_with_variable(binding, binding);
                    let predicate = self.expr(predicate, &mut child);
                    ctx.absorb(child);
                    format!("sum(1 for {binding} in {collection} if {predicate})")
                }
            },

            // -- Control --
            ExprNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                format!(
                    "({} if {} else {})",
                    self.expr(then_branch, ctx),
                    self.expr(condition, ctx),
                    self.expr(else_branch, ctx)
                )
            }

            // -- Contract-specific --
            ExprNode::OldValue(inner) => {
                let mut child = ctx.child_in_old();
                let fragment = self.expr(inner, &mut child);
                ctx.absorb(child);
                fragment
            }
            // old() substitutes the entity store only; input and result
            // reads stay live, matching the evaluator's derived context.
            ExprNode::ResultValue(property) => match property {
                Some(name) => format!("result.{name}"),
                None => "result".to_string(),
            },
            ExprNode::InputValue(property) => format!("input_data.{property}"),

            // -- Calls --
            ExprNode::FunctionCall { name, args } => {
                if let Some(rewritten) = rewrite_entity_call(name, args, ctx) {
                    return self.expr(&rewritten, ctx);
                }
                self.function_call(name, args, ctx)
            }

            // -- Entity queries --
            ExprNode::EntityExists { entity, criteria } => {
                self.entity_query("exists", entity, criteria.as_deref(), ctx)
            }
            ExprNode::EntityLookup { entity, criteria } => {
                self.entity_query("lookup", entity, Some(criteria), ctx)
            }
            ExprNode::EntityCount { entity, criteria } => {
                self.entity_query("count", entity, criteria.as_deref(), ctx)
            }
        }
    }

    fn connective(
        &self,
        operands: &[ExprNode],
        op: &str,
        empty: &str,
        ctx: &mut CompilerContext,
    ) -> String {
        if operands.is_empty() {
            return empty.to_string();
        }
        let rendered: Vec<String> = operands
            .iter()
            .map(|operand| self.expr(operand, ctx))
            .collect();
        format!("({})", rendered.join(&format!(" {op} ")))
    }

    fn comprehension(
        &self,
        reducer: &str,
        collection: &ExprNode,
        binding: &str,
        predicate: &ExprNode,
        ctx: &mut CompilerContext,
    ) -> String {
        let collection = self.expr(collection, ctx);
        let mut child = ctx.child_with_variable(binding, binding);
        let predicate = self.expr(predicate, &mut child);
        ctx.absorb(child);
        format!("{reducer}({predicate} for {binding} in {collection})")
    }

    fn entity_query(
        &self,
        method: &str,
        entity: &str,
        criteria: Option<&ExprNode>,
        ctx: &mut CompilerContext,
    ) -> String {
        let receiver = if ctx.in_old_expression() {
            format!("old.entity({})", quote(entity))
        } else {
            ctx.add_import(RUNTIME_IMPORT);
            format!("get_entity_store({})", quote(entity))
        };
        match criteria {
            Some(criteria) => {
                let criteria = self.expr(criteria, ctx);
                format!("{receiver}.{method}({criteria})")
            }
            None => format!("{receiver}.{method}()"),
        }
    }

    fn function_call(&self, name: &str, args: &[ExprNode], ctx: &mut CompilerContext) -> String {
        let rendered: Vec<String> = args.iter().map(|arg| self.expr(arg, ctx)).collect();
        match (name, rendered.as_slice()) {
            ("now", []) => {
                ctx.add_import("import time");
                "int(time.time() * 1000)".to_string()
            }
            ("length" | "count", [target]) => format!("len({target})"),
            ("sum", [target]) => format!("sum({target})"),
            ("min", _) => format!("min({})", rendered.join(", ")),
            ("max", _) => format!("max({})", rendered.join(", ")),
            ("abs", [target]) => format!("abs({target})"),
            ("round", [target]) => format!("round({target})"),
            ("floor", [target]) => {
                ctx.add_import("import math");
                format!("math.floor({target})")
            }
            ("ceil", [target]) => {
                ctx.add_import("import math");
                format!("math.ceil({target})")
            }
            ("between", [target, min, max]) => format!("({min} <= {target} <= {max})"),
            // Declarative markers: always-true in generated suites too.
            ("timing_safe_comparison" | "never_appears_in", _) => "True".to_string(),
            _ => format!("{name}({})", rendered.join(", ")),
        }
    }
}
