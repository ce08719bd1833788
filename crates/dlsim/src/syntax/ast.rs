use num_bigint::BigUint;

use crate::ir::{BinaryOp, PortDirection, UnaryOp};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub modules: Vec<ModuleDecl>,
}

impl SourceFile {
    pub fn module(&self, name: &str) -> Option<&ModuleDecl> {
        self.modules.iter().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    pub name: String,
    pub ports: Vec<PortDecl>,
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortDecl {
    pub name: String,
    pub direction: PortDirection,
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Var(VarDecl),
    Assign(AssignStmt),
    Inst(InstDecl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub name: String,
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignStmt {
    pub target: Target,
    pub expr: Expr,
}

/// Left-hand side of an assignment or an output port binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub name: String,
    pub select: Option<Select>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Select {
    Bit(usize),
    /// `[msb:lsb]`
    Range(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstDecl {
    pub name: String,
    pub module: String,
    pub connections: Vec<Connection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub port: String,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub value: BigUint,
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(String),
    Select(String, Select),
    Number(Literal),
    Unary(UnaryOp, Box<Expr>),
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    Concat(Vec<Expr>),
    Replicate(usize, Box<Expr>),
    /// `$sext` / `$zext`
    Extend {
        expr: Box<Expr>,
        width: usize,
        signed: bool,
    },
}

impl Expr {
    /// The assignable form of this expression, if it has one.
    pub fn as_target(&self) -> Option<Target> {
        match self {
            Expr::Ident(name) => Some(Target {
                name: name.clone(),
                select: None,
            }),
            Expr::Select(name, select) => Some(Target {
                name: name.clone(),
                select: Some(*select),
            }),
            _ => None,
        }
    }
}
