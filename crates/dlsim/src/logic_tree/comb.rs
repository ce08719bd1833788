use std::fmt;
use std::hash::Hash;

use num_bigint::BigUint;

use crate::HashMap;
use crate::HashSet;
use crate::ir::{BinaryOp, BitAccess, UnaryOp, VarAtomBase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// Hash-consing arena of expression nodes. Structurally equal nodes share one
/// [`NodeId`], so common subexpressions are evaluated once per run.
#[derive(Debug, Clone)]
pub struct SLTNodeArena<A> {
    pub nodes: Vec<SLTNode<A>>,
    pub cache: HashMap<SLTNode<A>, NodeId>,
}

impl<A: PartialEq> PartialEq for SLTNodeArena<A> {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
    }
}

impl<A: Eq> Eq for SLTNodeArena<A> {}

impl<A> SLTNodeArena<A> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            cache: HashMap::default(),
        }
    }

    pub fn alloc(&mut self, node: SLTNode<A>) -> NodeId
    where
        A: Hash + Eq + Clone,
    {
        if let Some(id) = self.cache.get(&node) {
            return *id;
        }
        let id = NodeId(self.nodes.len());
        self.cache.insert(node.clone(), id);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &SLTNode<A> {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Result width of the node, in bits.
    pub fn width(&self, id: NodeId) -> usize {
        match self.get(id) {
            SLTNode::Input { access, .. } => access.width(),
            SLTNode::Constant(_, width) => *width,
            SLTNode::Binary(_, _, _, width) => *width,
            SLTNode::Unary(_, _, width) => *width,
            SLTNode::Mux { width, .. } => *width,
            SLTNode::Concat(parts) => parts.iter().map(|part| self.width(*part)).sum(),
            SLTNode::Slice { access, .. } => access.width(),
            SLTNode::Extend { width, .. } => *width,
        }
    }

    pub fn display(&self, id: NodeId) -> NodeDisplay<'_, A> {
        NodeDisplay { arena: self, id }
    }
}

impl<A> Default for SLTNodeArena<A> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct NodeDisplay<'a, A> {
    arena: &'a SLTNodeArena<A>,
    id: NodeId,
}

impl<A: fmt::Display> fmt::Display for NodeDisplay<'_, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.arena.get(self.id).fmt_expression(f, self.arena)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SLTNode<A> {
    Input {
        variable: A,
        access: BitAccess,
    },
    /// Value and width.
    Constant(BigUint, usize),
    /// Operands, operator and result width.
    Binary(NodeId, BinaryOp, NodeId, usize),
    Unary(UnaryOp, NodeId, usize),
    Mux {
        cond: NodeId,
        then_expr: NodeId,
        else_expr: NodeId,
        width: usize,
    },
    /// Parts in MSB-first order.
    Concat(Vec<NodeId>),
    Slice {
        expr: NodeId,
        access: BitAccess,
    },
    Extend {
        expr: NodeId,
        width: usize,
        signed: bool,
    },
}

impl<A> SLTNode<A> {
    /// Maps the address type A to B recursively throughout the tree.
    pub fn map_addr<B, F>(
        &self,
        id: NodeId,
        arena: &SLTNodeArena<A>,
        target_arena: &mut SLTNodeArena<B>,
        cache: &mut HashMap<NodeId, NodeId>,
        f: &F,
    ) -> NodeId
    where
        A: Hash + Eq + Clone,
        B: Hash + Eq + Clone,
        F: Fn(&A) -> B,
    {
        if let Some(mapped_id) = cache.get(&id) {
            return *mapped_id;
        }
        let mut map = |child: NodeId, target_arena: &mut SLTNodeArena<B>| {
            arena
                .get(child)
                .map_addr(child, arena, target_arena, cache, f)
        };
        let node = match self {
            SLTNode::Input { variable, access } => SLTNode::Input {
                variable: f(variable),
                access: *access,
            },
            SLTNode::Constant(value, width) => SLTNode::Constant(value.clone(), *width),
            SLTNode::Binary(lhs, op, rhs, width) => {
                let lhs = map(*lhs, target_arena);
                let rhs = map(*rhs, target_arena);
                SLTNode::Binary(lhs, *op, rhs, *width)
            }
            SLTNode::Unary(op, inner, width) => {
                SLTNode::Unary(*op, map(*inner, target_arena), *width)
            }
            SLTNode::Mux {
                cond,
                then_expr,
                else_expr,
                width,
            } => {
                let cond = map(*cond, target_arena);
                let then_expr = map(*then_expr, target_arena);
                let else_expr = map(*else_expr, target_arena);
                SLTNode::Mux {
                    cond,
                    then_expr,
                    else_expr,
                    width: *width,
                }
            }
            SLTNode::Concat(parts) => {
                SLTNode::Concat(parts.iter().map(|p| map(*p, target_arena)).collect())
            }
            SLTNode::Slice { expr, access } => SLTNode::Slice {
                expr: map(*expr, target_arena),
                access: *access,
            },
            SLTNode::Extend {
                expr,
                width,
                signed,
            } => SLTNode::Extend {
                expr: map(*expr, target_arena),
                width: *width,
                signed: *signed,
            },
        };
        let mapped = target_arena.alloc(node);
        cache.insert(id, mapped);
        mapped
    }

    pub fn fmt_expression(
        &self,
        f: &mut fmt::Formatter<'_>,
        arena: &SLTNodeArena<A>,
    ) -> fmt::Result
    where
        A: fmt::Display,
    {
        match self {
            SLTNode::Input { variable, access } => write!(f, "{}{}", variable, access),
            SLTNode::Constant(val, width) => write!(f, "{}'h{:x}", width, val),
            SLTNode::Binary(lhs, op, rhs, _) => {
                write!(f, "(")?;
                arena.get(*lhs).fmt_expression(f, arena)?;
                write!(f, " {} ", op.symbol())?;
                arena.get(*rhs).fmt_expression(f, arena)?;
                write!(f, ")")
            }
            SLTNode::Unary(op, inner, _) => {
                write!(f, "{}(", op.symbol())?;
                arena.get(*inner).fmt_expression(f, arena)?;
                write!(f, ")")
            }
            SLTNode::Mux {
                cond,
                then_expr,
                else_expr,
                ..
            } => {
                write!(f, "(")?;
                arena.get(*cond).fmt_expression(f, arena)?;
                write!(f, " ? ")?;
                arena.get(*then_expr).fmt_expression(f, arena)?;
                write!(f, " : ")?;
                arena.get(*else_expr).fmt_expression(f, arena)?;
                write!(f, ")")
            }
            SLTNode::Concat(parts) => {
                write!(f, "{{")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    arena.get(*part).fmt_expression(f, arena)?;
                }
                write!(f, "}}")
            }
            SLTNode::Slice { expr, access } => {
                arena.get(*expr).fmt_expression(f, arena)?;
                write!(f, "{}", access)
            }
            SLTNode::Extend {
                expr,
                width,
                signed,
            } => {
                let name = if *signed { "sext" } else { "zext" };
                write!(f, "{}<{}>(", name, width)?;
                arena.get(*expr).fmt_expression(f, arena)?;
                write!(f, ")")
            }
        }
    }
}

/// One combinational assignment: `target = expr`, reading `sources`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicPath<A: Hash + Eq + Clone> {
    pub target: VarAtomBase<A>,
    pub sources: HashSet<VarAtomBase<A>>,
    pub expr: NodeId,
}

impl<A: fmt::Display + Hash + Eq + Clone> fmt::Display for LogicPath<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target)
    }
}

impl<A: Hash + Eq + Clone> LogicPath<A> {
    /// Builds a path whose sources are every input read by `expr`.
    pub fn new(target: VarAtomBase<A>, expr: NodeId, arena: &SLTNodeArena<A>) -> Self {
        let mut sources = HashSet::default();
        collect_inputs(expr, arena, &mut sources);
        Self {
            target,
            sources,
            expr,
        }
    }

    pub fn map_addr<B: Hash + Eq + Clone, F>(
        &self,
        arena: &SLTNodeArena<A>,
        target_arena: &mut SLTNodeArena<B>,
        cache: &mut HashMap<NodeId, NodeId>,
        f: &F,
    ) -> LogicPath<B>
    where
        F: Fn(&A) -> B,
    {
        LogicPath {
            target: VarAtomBase {
                id: f(&self.target.id),
                access: self.target.access,
            },
            sources: self
                .sources
                .iter()
                .map(|s| VarAtomBase {
                    id: f(&s.id),
                    access: s.access,
                })
                .collect(),
            expr: arena
                .get(self.expr)
                .map_addr(self.expr, arena, target_arena, cache, f),
        }
    }
}

/// Collects every variable bit range read by the tree rooted at `node`.
fn collect_inputs<A: Hash + Eq + Clone>(
    node: NodeId,
    arena: &SLTNodeArena<A>,
    out: &mut HashSet<VarAtomBase<A>>,
) {
    match arena.get(node) {
        SLTNode::Input { variable, access } => {
            out.insert(VarAtomBase {
                id: variable.clone(),
                access: *access,
            });
        }
        SLTNode::Constant(..) => {}
        SLTNode::Binary(lhs, _, rhs, _) => {
            collect_inputs(*lhs, arena, out);
            collect_inputs(*rhs, arena, out);
        }
        SLTNode::Unary(_, inner, _) => collect_inputs(*inner, arena, out),
        SLTNode::Mux {
            cond,
            then_expr,
            else_expr,
            ..
        } => {
            collect_inputs(*cond, arena, out);
            collect_inputs(*then_expr, arena, out);
            collect_inputs(*else_expr, arena, out);
        }
        SLTNode::Concat(parts) => {
            for part in parts {
                collect_inputs(*part, arena, out);
            }
        }
        SLTNode::Slice { expr, .. } | SLTNode::Extend { expr, .. } => {
            collect_inputs(*expr, arena, out)
        }
    }
}
