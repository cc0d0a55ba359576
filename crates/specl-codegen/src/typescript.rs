//! TypeScript code emitter.
//!
//! Emits fragments for Jest and Vitest test suites. JavaScript's native
//! `===` only agrees with the evaluator's deep equality for scalars, so
//! structural comparisons go through the runtime's `deepEqual` helper;
//! quantifiers map onto `every`/`some`/`filter`, whose empty-array
//! behavior matches the vacuous-truth rules exactly.

use specl_core::expr::{ExprNode, QuantifierKind};
use specl_core::value::fmt_number;

use crate::context::CompilerContext;
use crate::error::CodegenError;
use crate::rewrite::rewrite_entity_call;
use crate::{is_scalar_literal, quote, TargetAdapter, TargetLanguage, TestFramework};

const RUNTIME_MODULE: &str = "@specl/runtime";

/// Emits IR as TypeScript source fragments.
pub struct TypeScriptAdapter;

impl TargetAdapter for TypeScriptAdapter {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::TypeScript
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
            TestFramework::Jest | TestFramework::Vitest => {
                Ok(format!("expect({}).toBe(true);", self.expr(node, ctx)))
            }
            other => Err(CodegenError::FrameworkMismatch {
                language: TargetLanguage::TypeScript,
                framework: other,
            }),
        }
    }
}

impl TypeScriptAdapter {
    fn expr(&self, node: &ExprNode, ctx: &mut CompilerContext) -> String {
        match node {
            // -- Literals --
            ExprNode::Null => "null".to_string(),
            ExprNode::Bool(b) => b.to_string(),
            ExprNode::Number(n) => fmt_number(*n),
            ExprNode::Str(s) => quote(s),
            ExprNode::Regex(pattern) => regex_literal(pattern),
            ExprNode::ListLit(items) => {
                let items: Vec<String> = items.iter().map(|item| self.expr(item, ctx)).collect();
                format!("[{}]", items.join(", "))
            }
            ExprNode::MapLit(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(key, value)| format!("{}: {}", quote(key), self.expr(value, ctx)))
                    .collect();
                format!("{{ {} }}", fields.join(", "))
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
                    format!("({target} !== null && {target} !== undefined)")
                } else {
                    format!("({target} === null || {target} === undefined)")
                }
            }

            // -- String predicates --
            ExprNode::StringLength(target) => format!("{}.length", self.expr(target, ctx)),
            ExprNode::RegexMatch { target, pattern } => {
                let target = self.expr(target, ctx);
                match pattern.as_ref() {
                    ExprNode::Regex(p) => format!("{}.test({target})", regex_literal(p)),
                    other => format!("new RegExp({}).test({target})", self.expr(other, ctx)),
                }
            }
            ExprNode::StringIncludes { target, needle } => {
                format!(
                    "{}.includes({})",
                    self.expr(target, ctx),
                    self.expr(needle, ctx)
                )
            }
            ExprNode::StartsWith { target, prefix } => {
                format!(
                    "{}.startsWith({})",
                    self.expr(target, ctx),
                    self.expr(prefix, ctx)
                )
            }
            ExprNode::EndsWith { target, suffix } => {
                format!(
                    "{}.endsWith({})",
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
                    format!("({target} >= {min} && {target} <= {max})")
                } else {
                    format!("({target} > {min} && {target} < {max})")
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
                let l = self.expr(left, ctx);
                let r = self.expr(right, ctx);
                if is_scalar_literal(left) || is_scalar_literal(right) {
                    let op = if *negated { "!==" } else { "===" };
                    format!("({l} {op} {r})")
                } else {
                    let call = self.deep_equal(ctx, &l, &r);
                    if *negated {
                        format!("!{call}")
                    } else {
                        call
                    }
                }
            }
            ExprNode::InSet {
                target,
                values,
                negated,
            } => {
                let target = self.expr(target, ctx);
                let all_scalar = values.iter().all(is_scalar_literal);
                let rendered: Vec<String> =
                    values.iter().map(|value| self.expr(value, ctx)).collect();
                let list = format!("[{}]", rendered.join(", "));
                let membership = if all_scalar {
                    format!("{list}.includes({target})")
                } else {
                    ctx.add_import(runtime_import("deepEqual"));
                    format!("{list}.some((candidate) => deepEqual(candidate, {target}))")
                };
                if *negated {
                    format!("!{membership}")
                } else {
                    membership
                }
            }

            // -- Boolean logic --
            ExprNode::LogicalAnd(operands) => self.connective(operands, "&&", "true", ctx),
            ExprNode::LogicalOr(operands) => self.connective(operands, "||", "false", ctx),
            ExprNode::LogicalNot(operand) => format!("!({})", self.expr(operand, ctx)),
            ExprNode::LogicalImplies {
                antecedent,
                consequent,
            } => {
                format!(
                    "(!({}) || {})",
                    self.expr(antecedent, ctx),
                    self.expr(consequent, ctx)
                )
            }

            // -- Collections --
            ExprNode::CollectionLength(target) => format!("{}.length", self.expr(target, ctx)),
            ExprNode::CollectionIncludes { target, item } => {
                let target = self.expr(target, ctx);
                let rendered = self.expr(item, ctx);
                if is_scalar_literal(item) {
                    format!("{target}.includes({rendered})")
                } else {
                    ctx.add_import(runtime_import("deepEqual"));
                    format!("{target}.some((candidate) => deepEqual(candidate, {rendered}))")
                }
            }
            ExprNode::Every {
                collection,
                binding,
                predicate,
            } => self.higher_order(collection, binding, predicate, "every", ctx),
            ExprNode::Some_ {
                collection,
                binding,
                predicate,
            } => self.higher_order(collection, binding, predicate, "some", ctx),
            ExprNode::Filter {
                collection,
                binding,
                predicate,
            } => self.higher_order(collection, binding, predicate, "filter", ctx),
            ExprNode::MapEach {
                collection,
                binding,
                mapper,
            } => self.higher_order(collection, binding, mapper, "map", ctx),

            // -- Quantifiers --
            ExprNode::Quantifier {
                kind,
                collection,
                binding,
                predicate,
            } => match kind {
                QuantifierKind::All => {
                    self.higher_order(collection, binding, predicate, "every", ctx)
                }
                QuantifierKind::Any => {
                    self.higher_order(collection, binding, predicate, "some", ctx)
                }
                QuantifierKind::None => format!(
                    "!{}",
                    self.higher_order(collection, binding, predicate, "some", ctx)
                ),
                QuantifierKind::Count => format!(
                    "{}.length",
                    self.higher_order(collection, binding, predicate, "filter", ctx)
                ),
            },

            // -- Control --
            ExprNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                format!(
                    "({} ? {} : {})",
                    self.expr(condition, ctx),
                    self.expr(then_branch, ctx),
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
            ExprNode::InputValue(property) => format!("input.{property}"),

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

    fn higher_order(
        &self,
        collection: &ExprNode,
        binding: &str,
        body: &ExprNode,
        method: &str,
        ctx: &mut CompilerContext,
    ) -> String {
        let collection = self.expr(collection, ctx);
        let mut child = ctx.child_with_variable(binding, binding);
        let body = self.expr(body, &mut child);
        ctx.absorb(child);
        format!("{collection}.{method}(({binding}) => {body})")
    }

    fn deep_equal(&self, ctx: &mut CompilerContext, left: &str, right: &str) -> String {
        ctx.add_import(runtime_import("deepEqual"));
        format!("deepEqual({left}, {right})")
    }

    fn entity_query(
        &self,
        method: &str,
        entity: &str,
        criteria: Option<&ExprNode>,
        ctx: &mut CompilerContext,
    ) -> String {
        let receiver = if ctx.in_old_expression() {
            ctx.add_import(runtime_import("oldEntities"));
            "oldEntities"
        } else {
            ctx.add_import(runtime_import("entities"));
            "entities"
        };
        match criteria {
            Some(criteria) => {
                let criteria = self.expr(criteria, ctx);
                format!("{receiver}.{method}({}, {criteria})", quote(entity))
            }
            None => format!("{receiver}.{method}({})", quote(entity)),
        }
    }

    fn function_call(&self, name: &str, args: &[ExprNode], ctx: &mut CompilerContext) -> String {
        let rendered: Vec<String> = args.iter().map(|arg| self.expr(arg, ctx)).collect();
        match (name, rendered.as_slice()) {
            ("now", []) => "Date.now()".to_string(),
            ("length" | "count", [target]) => format!("{target}.length"),
            ("sum", [target]) => {
                format!("{target}.reduce((total, item) => total + item, 0)")
            }
            ("min", [target]) => format!("Math.min(...{target})"),
            ("max", [target]) => format!("Math.max(...{target})"),
            ("min", _) => format!("Math.min({})", rendered.join(", ")),
            ("max", _) => format!("Math.max({})", rendered.join(", ")),
            ("abs", [target]) => format!("Math.abs({target})"),
            ("round", [target]) => format!("Math.round({target})"),
            ("floor", [target]) => format!("Math.floor({target})"),
            ("ceil", [target]) => format!("Math.ceil({target})"),
            ("between", [target, min, max]) => {
                format!("({target} >= {min} && {target} <= {max})")
            }
            // Declarative markers: always-true in generated suites too.
            ("timing_safe_comparison" | "never_appears_in", _) => "true".to_string(),
            _ => format!("{name}({})", rendered.join(", ")),
        }
    }
}

fn regex_literal(pattern: &str) -> String {
    format!("/{}/", pattern.replace('/', "\\/"))
}

fn runtime_import(symbol: &str) -> String {
    format!("import {{ {symbol} }} from \"{RUNTIME_MODULE}\";")
}
