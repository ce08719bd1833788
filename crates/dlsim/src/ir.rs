use crate::HashMap;
use crate::logic_tree::{LogicPath, SLTNodeArena};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct VarId(pub usize);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "var{}", self.0)
    }
}

/// Direction of a module port as seen from outside the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    Input,
    Output,
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Input => write!(f, "input"),
            PortDirection::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VarKind {
    Port(PortDirection),
    Var,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableInfo {
    pub name: String,
    pub width: usize,
    pub id: VarId,
    pub kind: VarKind,
}

impl VariableInfo {
    pub fn direction(&self) -> Option<PortDirection> {
        match self.kind {
            VarKind::Port(dir) => Some(dir),
            VarKind::Var => None,
        }
    }
}

/// Public description of a top-level pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinInfo {
    pub name: String,
    pub width: usize,
    pub direction: PortDirection,
}

/// A pre-resolved handle to a top-level pin.
///
/// Obtained once through [`Simulator::pin`](crate::Simulator::pin); reads and
/// writes through a `PinRef` skip the name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PinRef {
    pub(crate) index: usize,
    pub(crate) slot: usize,
    pub width: usize,
    pub direction: PortDirection,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct InstanceId(pub usize);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inst{}", self.0)
    }
}

/// Instance names from the top module down; empty for the top itself.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct InstancePath(pub Vec<String>);

impl InstancePath {
    pub fn child(&self, name: &str) -> InstancePath {
        let mut path = self.0.clone();
        path.push(name.to_string());
        InstancePath(path)
    }
}

impl fmt::Display for InstancePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AbsoluteAddr {
    pub instance_id: InstanceId,
    pub var_id: VarId,
}

impl fmt::Display for AbsoluteAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AbsoluteAddr({}, {})", self.instance_id, self.var_id)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct BitAccess {
    pub lsb: usize,
    pub msb: usize,
}

impl BitAccess {
    pub fn new(lsb: usize, msb: usize) -> Self {
        debug_assert!(lsb <= msb, "lsb must be less than or equal to msb");
        Self { lsb, msb }
    }

    pub fn full(width: usize) -> Self {
        Self::new(0, width - 1)
    }

    pub fn width(&self) -> usize {
        self.msb - self.lsb + 1
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.msb < other.lsb || other.msb < self.lsb)
    }
}

impl fmt::Display for BitAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lsb == self.msb {
            write!(f, "[{}]", self.lsb)
        } else {
            write!(f, "[{}:{}]", self.msb, self.lsb)
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct VarAtomBase<A> {
    pub id: A,
    pub access: BitAccess,
}

impl<A> VarAtomBase<A> {
    pub fn new(id: A, lsb: usize, msb: usize) -> Self {
        Self {
            id,
            access: BitAccess { lsb, msb },
        }
    }
}

impl<A> fmt::Display for VarAtomBase<A>
where
    A: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.id, self.access)
    }
}

pub type VarAtom = VarAtomBase<VarId>;

/// Address used while lowering the port bindings of one instance: a variable
/// of the instantiating module or of the instantiated child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlueAddr {
    Parent(VarId),
    Child(VarId),
}

impl fmt::Display for GlueAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GlueAddr::Parent(var_id) => write!(f, "GlueAddr::Parent({})", var_id),
            GlueAddr::Child(var_id) => write!(f, "GlueAddr::Child({})", var_id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlueBlock {
    pub instance_name: String,
    pub module_name: String,
    pub paths: Vec<LogicPath<GlueAddr>>,
    pub arena: SLTNodeArena<GlueAddr>,
}

/// One module after lowering, addressed by its own [`VarId`]s.
#[derive(Clone, Debug)]
pub struct SimModule {
    pub name: String,
    pub variables: Vec<VariableInfo>,
    pub comb_blocks: Vec<LogicPath<VarId>>,
    pub arena: SLTNodeArena<VarId>,
    pub glue_blocks: Vec<GlueBlock>,
}

/// The fully flattened and scheduled circuit.
#[derive(Debug, Clone)]
pub struct Program {
    pub top: String,
    /// Assignments in evaluation order.
    pub eval_comb: Vec<LogicPath<AbsoluteAddr>>,
    pub arena: SLTNodeArena<AbsoluteAddr>,
    pub instance_ids: HashMap<InstancePath, InstanceId>,
    pub instance_module: HashMap<InstanceId, String>,
    pub module_variables: HashMap<String, Vec<VariableInfo>>,
}

impl Program {
    pub const TOP: InstanceId = InstanceId(0);

    pub fn get_addr(&self, instance_path: &[&str], var: &str) -> Option<AbsoluteAddr> {
        let path = InstancePath(instance_path.iter().map(|s| s.to_string()).collect());
        let instance_id = *self.instance_ids.get(&path)?;
        let module_name = self.instance_module.get(&instance_id)?;
        let info = self
            .module_variables
            .get(module_name)?
            .iter()
            .find(|info| info.name == var)?;
        Some(AbsoluteAddr {
            instance_id,
            var_id: info.id,
        })
    }

    /// Resolves a dotted hierarchical name such as `alu.adder.sum`.
    pub fn resolve_path(&self, path: &str) -> Option<AbsoluteAddr> {
        let parts: Vec<&str> = path.split('.').collect();
        let (var, instances) = parts.split_last()?;
        self.get_addr(instances, var)
    }

    pub fn instance_path(&self, instance_id: InstanceId) -> Option<&InstancePath> {
        self.instance_ids
            .iter()
            .find(|(_, id)| **id == instance_id)
            .map(|(path, _)| path)
    }

    pub fn get_path(&self, addr: &AbsoluteAddr) -> String {
        let mut res: Vec<String> = self
            .instance_path(addr.instance_id)
            .map(|p| p.0.clone())
            .unwrap_or_default();
        match self.get_variable_info(addr) {
            Some(info) => res.push(info.name.clone()),
            None => res.push(addr.var_id.to_string()),
        }
        res.join(".")
    }

    pub fn get_variable_info(&self, addr: &AbsoluteAddr) -> Option<&VariableInfo> {
        let module_name = self.instance_module.get(&addr.instance_id)?;
        self.module_variables.get(module_name)?.get(addr.var_id.0)
    }

    /// Ports of the top module in declaration order.
    pub fn top_ports(&self) -> Vec<(AbsoluteAddr, &VariableInfo)> {
        self.module_variables
            .get(&self.top)
            .map(|vars| {
                vars.iter()
                    .filter(|info| matches!(info.kind, VarKind::Port(_)))
                    .map(|info| {
                        (
                            AbsoluteAddr {
                                instance_id: Self::TOP,
                                var_id: info.id,
                            },
                            info,
                        )
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every net of every instance, ordered by instance then declaration.
    pub fn all_addrs(&self) -> Vec<AbsoluteAddr> {
        let mut instances: Vec<_> = self.instance_module.iter().collect();
        instances.sort_by_key(|(id, _)| **id);
        let mut addrs = Vec::new();
        for (instance_id, module_name) in instances {
            if let Some(vars) = self.module_variables.get(module_name) {
                addrs.extend(vars.iter().map(|info| AbsoluteAddr {
                    instance_id: *instance_id,
                    var_id: info.id,
                }));
            }
        }
        addrs
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Shl, // Logical Shift Left (<<)
    Shr, // Logical Shift Right (>>)
    Sar, // Arithmetic Shift Right (>>>)
    Eq,
    Ne,
    LtU,
    LtS, // Less Than (Unsigned / Signed)
    LeU,
    LeS, // Less Equal
    GtU,
    GtS, // Greater Than
    GeU,
    GeS, // Greater Equal
    LogicAnd,
    LogicOr,
}

impl BinaryOp {
    /// Operators whose result is a single bit regardless of context.
    pub fn is_boolean(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq
                | BinaryOp::Ne
                | BinaryOp::LtU
                | BinaryOp::LtS
                | BinaryOp::LeU
                | BinaryOp::LeS
                | BinaryOp::GtU
                | BinaryOp::GtS
                | BinaryOp::GeU
                | BinaryOp::GeS
                | BinaryOp::LogicAnd
                | BinaryOp::LogicOr
        )
    }

    pub fn is_signed_compare(&self) -> bool {
        matches!(
            self,
            BinaryOp::LtS | BinaryOp::LeS | BinaryOp::GtS | BinaryOp::GeS
        )
    }

    pub fn is_shift(&self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr | BinaryOp::Sar)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Sar => ">>>",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::LtU => "<",
            BinaryOp::LtS => "<s",
            BinaryOp::LeU => "<=",
            BinaryOp::LeS => "<=s",
            BinaryOp::GtU => ">",
            BinaryOp::GtS => ">s",
            BinaryOp::GeU => ">=",
            BinaryOp::GeS => ">=s",
            BinaryOp::LogicAnd => "&&",
            BinaryOp::LogicOr => "||",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            BinaryOp::Add => "Add",
            BinaryOp::Sub => "Sub",
            BinaryOp::Mul => "Mul",
            BinaryOp::And => "And",
            BinaryOp::Or => "Or",
            BinaryOp::Xor => "Xor",
            BinaryOp::Shl => "Shl",
            BinaryOp::Shr => "Shr",
            BinaryOp::Sar => "Sar",
            BinaryOp::Eq => "Eq",
            BinaryOp::Ne => "Ne",
            BinaryOp::LtU => "LtU",
            BinaryOp::LtS => "LtS",
            BinaryOp::LeU => "LeU",
            BinaryOp::LeS => "LeS",
            BinaryOp::GtU => "GtU",
            BinaryOp::GtS => "GtS",
            BinaryOp::GeU => "GeU",
            BinaryOp::GeS => "GeS",
            BinaryOp::LogicAnd => "LogicAnd",
            BinaryOp::LogicOr => "LogicOr",
        };
        write!(f, "{}", op_str)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Minus,
    BitNot,
    LogicNot,
    And,
    Or,
    Xor,
}

impl UnaryOp {
    /// Logical negation and the reductions produce a single bit.
    pub fn is_boolean(&self) -> bool {
        !matches!(self, UnaryOp::Minus | UnaryOp::BitNot)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::BitNot => "~",
            UnaryOp::LogicNot => "!",
            UnaryOp::And => "&", // reduction
            UnaryOp::Or => "|",
            UnaryOp::Xor => "^",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            UnaryOp::Minus => "Minus",
            UnaryOp::BitNot => "BitNot",
            UnaryOp::LogicNot => "LogicNot",
            UnaryOp::And => "And",
            UnaryOp::Or => "Or",
            UnaryOp::Xor => "Xor",
        };
        write!(f, "{}", op_str)
    }
}
