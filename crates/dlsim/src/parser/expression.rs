use std::hash::Hash;

use crate::context_width::{context_width, self_width};
use crate::ir::{BinaryOp, BitAccess};
use crate::logic_tree::{NodeId, SLTNode, SLTNodeArena};
use crate::parser::ParserError;
use crate::syntax::{Expr, Select};

/// Resolves `[i]` or `[msb:lsb]` on a variable of `width` bits.
pub(crate) fn select_access(
    module: &str,
    name: &str,
    select: &Select,
    width: usize,
) -> Result<BitAccess, ParserError> {
    let (lsb, msb) = match *select {
        Select::Bit(index) => (index, index),
        Select::Range(msb, lsb) => (lsb, msb),
    };
    if lsb > msb || msb >= width {
        let range = match *select {
            Select::Bit(index) => format!("[{}]", index),
            Select::Range(msb, lsb) => format!("[{}:{}]", msb, lsb),
        };
        return Err(ParserError::BitRangeOutOfBounds {
            module: module.to_string(),
            name: name.to_string(),
            range,
            width,
        });
    }
    Ok(BitAccess::new(lsb, msb))
}

/// Lowers AST expressions into an arena, resolving names through `resolve`.
///
/// The same lowerer serves module bodies (addressed by `VarId`) and instance
/// port bindings (addressed by `GlueAddr`).
pub(crate) struct ExprLowerer<'a, A, F> {
    pub arena: &'a mut SLTNodeArena<A>,
    pub module: &'a str,
    pub resolve: F,
}

impl<A, F> ExprLowerer<'_, A, F>
where
    A: Hash + Eq + Clone,
    F: Fn(&str) -> Option<(A, usize)>,
{
    /// Lowers `expr` in a context of `width` bits and truncates the result to it.
    pub fn lower_to(&mut self, expr: &Expr, width: usize) -> Result<NodeId, ParserError> {
        let node = self.lower(expr, width)?;
        Ok(self.truncate(node, width))
    }

    pub fn truncate(&mut self, node: NodeId, width: usize) -> NodeId {
        if self.arena.width(node) > width {
            self.arena.alloc(SLTNode::Slice {
                expr: node,
                access: BitAccess::full(width),
            })
        } else {
            node
        }
    }

    fn var(&self, name: &str) -> Result<(A, usize), ParserError> {
        (self.resolve)(name).ok_or_else(|| ParserError::UnknownVariable {
            module: self.module.to_string(),
            name: name.to_string(),
        })
    }

    fn self_width(&self, expr: &Expr) -> Result<usize, ParserError> {
        self_width(expr, &|name: &str| (self.resolve)(name).map(|(_, w)| w)).map_err(|name| {
            ParserError::UnknownVariable {
                module: self.module.to_string(),
                name,
            }
        })
    }

    fn context_width(&self, expr: &Expr, parent: usize) -> Result<usize, ParserError> {
        context_width(expr, parent, &|name: &str| {
            (self.resolve)(name).map(|(_, w)| w)
        })
        .map_err(|name| ParserError::UnknownVariable {
            module: self.module.to_string(),
            name,
        })
    }

    fn signed_operand_width(&self, expr: &Expr) -> Result<usize, ParserError> {
        Ok(match expr {
            Expr::Number(lit) => lit.width + 1,
            _ => self.self_width(expr)?,
        })
    }

    /// Lowers one side of a signed comparison and sign-extends it to `width`.
    fn lower_signed_operand(&mut self, expr: &Expr, width: usize) -> Result<NodeId, ParserError> {
        if let Expr::Number(lit) = expr {
            return Ok(self.arena.alloc(SLTNode::Constant(lit.value.clone(), width)));
        }
        let node = self.lower(expr, width)?;
        if self.arena.width(node) < width {
            Ok(self.arena.alloc(SLTNode::Extend {
                expr: node,
                width,
                signed: true,
            }))
        } else {
            Ok(node)
        }
    }

    /// Lowers `expr` where the parent asks for `parent` bits (0 means self-determined).
    pub fn lower(&mut self, expr: &Expr, parent: usize) -> Result<NodeId, ParserError> {
        let node = match expr {
            Expr::Ident(name) => {
                let (variable, width) = self.var(name)?;
                SLTNode::Input {
                    variable,
                    access: BitAccess::full(width),
                }
            }
            Expr::Select(name, select) => {
                let (variable, width) = self.var(name)?;
                SLTNode::Input {
                    variable,
                    access: select_access(self.module, name, select, width)?,
                }
            }
            Expr::Number(lit) => SLTNode::Constant(lit.value.clone(), lit.width),
            Expr::Unary(op, inner) => {
                if op.is_boolean() {
                    let inner = self.lower(inner, 0)?;
                    SLTNode::Unary(*op, inner, 1)
                } else {
                    let width = self.context_width(expr, parent)?;
                    let inner = self.lower(inner, width)?;
                    SLTNode::Unary(*op, inner, width)
                }
            }
            Expr::Binary(lhs, op, rhs) => {
                if matches!(op, BinaryOp::LogicAnd | BinaryOp::LogicOr) {
                    let lhs = self.lower(lhs, 0)?;
                    let rhs = self.lower(rhs, 0)?;
                    SLTNode::Binary(lhs, *op, rhs, 1)
                } else if op.is_signed_compare() {
                    // Number literals are magnitudes: give them a zero sign bit.
                    let operand_width = self
                        .signed_operand_width(lhs)?
                        .max(self.signed_operand_width(rhs)?);
                    let lhs = self.lower_signed_operand(lhs, operand_width)?;
                    let rhs = self.lower_signed_operand(rhs, operand_width)?;
                    SLTNode::Binary(lhs, *op, rhs, 1)
                } else if op.is_boolean() {
                    // Comparison operands share the wider of their two widths.
                    let operand_width = self.self_width(lhs)?.max(self.self_width(rhs)?);
                    let lhs = self.lower(lhs, operand_width)?;
                    let rhs = self.lower(rhs, operand_width)?;
                    SLTNode::Binary(lhs, *op, rhs, 1)
                } else if op.is_shift() {
                    let width = self.context_width(expr, parent)?;
                    // `>>>` takes its sign from the left operand's own width.
                    let lhs = if *op == BinaryOp::Sar {
                        self.lower(lhs, 0)?
                    } else {
                        self.lower(lhs, width)?
                    };
                    let rhs = self.lower(rhs, 0)?;
                    SLTNode::Binary(lhs, *op, rhs, width)
                } else {
                    let width = self.context_width(expr, parent)?;
                    let lhs = self.lower(lhs, width)?;
                    let rhs = self.lower(rhs, width)?;
                    SLTNode::Binary(lhs, *op, rhs, width)
                }
            }
            Expr::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let width = self.context_width(expr, parent)?;
                let cond = self.lower(cond, 0)?;
                let then_expr = self.lower(then_expr, width)?;
                let else_expr = self.lower(else_expr, width)?;
                SLTNode::Mux {
                    cond,
                    then_expr,
                    else_expr,
                    width,
                }
            }
            Expr::Concat(parts) => {
                let mut nodes = Vec::with_capacity(parts.len());
                for part in parts {
                    nodes.push(self.lower(part, 0)?);
                }
                SLTNode::Concat(nodes)
            }
            Expr::Replicate(count, inner) => {
                if *count == 0 {
                    return Err(ParserError::InvalidExpression {
                        module: self.module.to_string(),
                        reason: "replication count must be at least 1".to_string(),
                    });
                }
                let inner = self.lower(inner, 0)?;
                SLTNode::Concat(vec![inner; *count])
            }
            Expr::Extend {
                expr,
                width,
                signed,
            } => {
                let inner = self.lower(expr, 0)?;
                SLTNode::Extend {
                    expr: inner,
                    width: *width,
                    signed: *signed,
                }
            }
        };
        Ok(self.arena.alloc(node))
    }
}
