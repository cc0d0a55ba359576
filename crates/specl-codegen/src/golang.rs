//! Go code emitter.
//!
//! Emits fragments for `testing`-based suites. Go has no comprehensions or
//! ternary operator, so quantifiers, membership, and conditionals route
//! through the `speclrt` runtime helpers, which preserve the evaluator's
//! vacuous-truth semantics; deep equality uses `reflect.DeepEqual`.
//! Property names are emitted in PascalCase to follow Go's exported-field
//! convention for generated model structs.

use specl_core::expr::{ExprNode, QuantifierKind};
use specl_core::value::fmt_number;

use crate::context::CompilerContext;
use crate::error::CodegenError;
use crate::rewrite::rewrite_entity_call;
use crate::{is_scalar_literal, pascal_case, quote, TargetAdapter, TargetLanguage, TestFramework};

const RUNTIME_IMPORT: &str = "speclrt \"specl.dev/runtime-go/speclrt\"";

/// Emits IR as Go source fragments.
pub struct GoAdapter;

impl TargetAdapter for GoAdapter {
    fn language(&self) -> TargetLanguage {
        TargetLanguage::Go
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
            TestFramework::GoTesting => {
                let fragment = self.expr(node, ctx);
                Ok(format!(
                    "if !({fragment}) {{\n\tt.Errorf(\"assertion failed: %s\", {})\n}}",
                    quote(&fragment)
                ))
            }
            other => Err(CodegenError::FrameworkMismatch {
                language: TargetLanguage::Go,
                framework: other,
            }),
        }
    }
}

impl GoAdapter {
    fn expr(&self, node: &ExprNode, ctx: &mut CompilerContext) -> String {
        match node {
            // -- Literals --
            ExprNode::Null => "nil".to_string(),
            ExprNode::Bool(b) => b.to_string(),
            ExprNode::Number(n) => fmt_number(*n),
            ExprNode::Str(s) => quote(s),
            ExprNode::Regex(pattern) => quote(pattern),
            ExprNode::ListLit(items) => {
                let items: Vec<String> = items.iter().map(|item| self.expr(item, ctx)).collect();
                format!("[]any{{{}}}", items.join(", "))
            }
            ExprNode::MapLit(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|(key, value)| format!("{}: {}", quote(key), self.expr(value, ctx)))
                    .collect();
                format!("map[string]any{{{}}}", fields.join(", "))
            }

            // -- Access --
            ExprNode::Variable(name) => ctx
                .emitted_variable(name)
                .map(str::to_string)
                .unwrap_or_else(|| name.clone()),
            ExprNode::PropertyAccess { object, property } => {
                format!("{}.{}", self.expr(object, ctx), pascal_case(property))
            }
            ExprNode::IndexAccess { object, index } => {
                format!("{}[{}]", self.expr(object, ctx), self.expr(index, ctx))
            }

            // -- Existence & shape --
            ExprNode::Existence { target, exists } => {
                let target = self.expr(target, ctx);
                if *exists {
                    format!("({target} != nil)")
                } else {
                    format!("({target} == nil)")
                }
            }

            // -- String predicates --
            ExprNode::StringLength(target) => format!("len({})", self.expr(target, ctx)),
            ExprNode::RegexMatch { target, pattern } => {
                ctx.add_import("\"regexp\"");
                format!(
                    "regexp.MustCompile({}).MatchString({})",
                    self.expr(pattern, ctx),
                    self.expr(target, ctx)
                )
            }
            ExprNode::StringIncludes { target, needle } => {
                ctx.add_import("\"strings\"");
                format!(
                    "strings.Contains({}, {})",
                    self.expr(target, ctx),
                    self.expr(needle, ctx)
                )
            }
            ExprNode::StartsWith { target, prefix } => {
                ctx.add_import("\"strings\"");
                format!(
                    "strings.HasPrefix({}, {})",
                    self.expr(target, ctx),
                    self.expr(prefix, ctx)
                )
            }
            ExprNode::EndsWith { target, suffix } => {
                ctx.add_import("\"strings\"");
                format!(
                    "strings.HasSuffix({}, {})",
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
                    let op = if *negated { "!=" } else { "==" };
                    format!("({l} {op} {r})")
                } else {
                    ctx.add_import("\"reflect\"");
                    let call = format!("reflect.DeepEqual({l}, {r})");
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
                ctx.add_import(RUNTIME_IMPORT);
                let rendered: Vec<String> =
                    values.iter().map(|value| self.expr(value, ctx)).collect();
                let call = format!(
                    "speclrt.OneOf({}, []any{{{}}})",
                    self.expr(target, ctx),
                    rendered.join(", ")
                );
                if *negated {
                    format!("!{call}")
                } else {
                    call
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
            ExprNode::CollectionLength(target) => format!("len({})", self.expr(target, ctx)),
            ExprNode::CollectionIncludes { target, item } => {
                ctx.add_import(RUNTIME_IMPORT);
                format!(
                    "speclrt.Contains({}, {})",
                    self.expr(target, ctx),
                    self.expr(item, ctx)
                )
            }
            ExprNode::Every {
                collection,
                binding,
                predicate,
            } => self.helper_loop("All", collection, binding, predicate, "bool", ctx),
            ExprNode::Some_ {
                collection,
                binding,
                predicate,
            } => self.helper_loop("Any", collection, binding, predicate, "bool", ctx),
            ExprNode::Filter {
                collection,
                binding,
                predicate,
            } => self.helper_loop("Filter", collection, binding, predicate, "bool", ctx),
            ExprNode::MapEach {
                collection,
                binding,
                mapper,
            } => self.helper_loop("Map", collection, binding, mapper, "any", ctx),

            // -- Quantifiers --
            ExprNode::Quantifier {
                kind,
                collection,
                binding,
                predicate,
            } => match kind {
                QuantifierKind::All => {
                    self.helper_loop("All", collection, binding, predicate, "bool", ctx)
                }
                QuantifierKind::Any => {
                    self.helper_loop("Any", collection, binding, predicate, "bool", ctx)
                }
                QuantifierKind::None => format!(
                    "!{}",
                    self.helper_loop("Any", collection, binding, predicate, "bool", ctx)
                ),
                QuantifierKind::Count => {
                    self.helper_loop("Count", collection, binding, predicate, "bool", ctx)
                }
            },

            // -- Control --
            ExprNode::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                ctx.add_import(RUNTIME_IMPORT);
                format!(
                    "speclrt.Ternary({}, {}, {})",
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
                Some(name) => format!("result.{}", pascal_case(name)),
                None => "result".to_string(),
            },
            ExprNode::InputValue(property) => format!("input.{}", pascal_case(property)),

            // -- Calls --
            ExprNode::FunctionCall { name, args } => {
                if let Some(rewritten) = rewrite_entity_call(name, args, ctx) {
                    return self.expr(&rewritten, ctx);
                }
                self.function_call(name, args, ctx)
            }

            // -- Entity queries --
            ExprNode::EntityExists { entity, criteria } => {
                self.entity_query("Exists", entity, criteria.as_deref(), ctx)
            }
            ExprNode::EntityLookup { entity, criteria } => {
                self.entity_query("Lookup", entity, Some(criteria), ctx)
            }
            ExprNode::EntityCount { entity, criteria } => {
                self.entity_query("Count", entity, criteria.as_deref(), ctx)
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

    fn helper_loop(
        &self,
        helper: &str,
        collection: &ExprNode,
        binding: &str,
        body: &ExprNode,
        return_type: &str,
        ctx: &mut CompilerContext,
    ) -> String {
        ctx.add_import(RUNTIME_IMPORT);
        let collection = self.expr(collection, ctx);
        let mut child = ctx.child_with_variable(binding, binding);
        let body = self.expr(body, &mut child);
        ctx.absorb(child);
        format!(
            "speclrt.{helper}({collection}, func({binding} any) {return_type} {{ return {body} }})"
        )
    }

    fn entity_query(
        &self,
        method: &str,
        entity: &str,
        criteria: Option<&ExprNode>,
        ctx: &mut CompilerContext,
    ) -> String {
        let receiver = if ctx.in_old_expression() {
            "oldEntities"
        } else {
            "entities"
        };
        let criteria = match criteria {
            Some(criteria) => self.expr(criteria, ctx),
            None => "nil".to_string(),
        };
        format!("{receiver}.{method}({}, {criteria})", quote(entity))
    }

    fn function_call(&self, name: &str, args: &[ExprNode], ctx: &mut CompilerContext) -> String {
        let rendered: Vec<String> = args.iter().map(|arg| self.expr(arg, ctx)).collect();
        match (name, rendered.as_slice()) {
            ("now", []) => {
                ctx.add_import("\"time\"");
                "time.Now().UnixMilli()".to_string()
            }
            ("length" | "count", [target]) => format!("len({target})"),
            ("sum", [target]) => {
                ctx.add_import(RUNTIME_IMPORT);
                format!("speclrt.Sum({target})")
            }
            ("min", [target]) => {
                ctx.add_import(RUNTIME_IMPORT);
                format!("speclrt.Min({target})")
            }
            ("max", [target]) => {
                ctx.add_import(RUNTIME_IMPORT);
                format!("speclrt.Max({target})")
            }
            ("abs", [target]) => {
                ctx.add_import("\"math\"");
                format!("math.Abs({target})")
            }
            ("round", [target]) => {
                ctx.add_import("\"math\"");
                format!("math.Round({target})")
            }
            ("floor", [target]) => {
                ctx.add_import("\"math\"");
                format!("math.Floor({target})")
            }
            ("ceil", [target]) => {
                ctx.add_import("\"math\"");
                format!("math.Ceil({target})")
            }
            ("between", [target, min, max]) => {
                format!("({target} >= {min} && {target} <= {max})")
            }
            // Declarative markers: always-true in generated suites too.
            ("timing_safe_comparison" | "never_appears_in", _) => "true".to_string(),
            _ => format!("{name}({})", rendered.join(", ")),
        }
    }
}
