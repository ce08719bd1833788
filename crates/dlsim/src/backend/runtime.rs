use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};
use thiserror::Error;

use crate::HashMap;
use crate::ir::{BinaryOp, BitAccess, Program, UnaryOp};
use crate::logic_tree::{NodeId, SLTNode, SLTNodeArena};
use crate::value::{Bits, mask};

use super::MemoryLayout;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulatorErrorCode {
    #[error("Internal Error: {0}")]
    InternalError(String),
}

/// One scheduled assignment, addressed by slot.
#[derive(Debug, Clone)]
struct Step {
    slot: usize,
    access: BitAccess,
    expr: NodeId,
}

/// Interprets a scheduled program over two copies of the net store.
///
/// `memory` is the stable region that pins are read from and written to.
/// `eval_comb` evaluates into `working`; `commit` swaps the regions once the
/// caller has accepted the result.
pub struct InterpreterBackend {
    layout: MemoryLayout,
    arena: SLTNodeArena<usize>,
    steps: Vec<Step>,
    memory: Vec<Bits>,
    working: Vec<Bits>,
}

impl InterpreterBackend {
    pub fn new(program: &Program) -> Result<Self, SimulatorErrorCode> {
        let layout = MemoryLayout::build(program);

        // Every address the program touches must have a slot.
        for path in &program.eval_comb {
            for addr in std::iter::once(&path.target.id).chain(path.sources.iter().map(|s| &s.id)) {
                if layout.slot(addr).is_none() {
                    return Err(SimulatorErrorCode::InternalError(format!(
                        "no storage for {}",
                        program.get_path(addr)
                    )));
                }
            }
        }

        let mut arena = SLTNodeArena::new();
        let mut cache = HashMap::default();
        let to_slot = |addr: &crate::ir::AbsoluteAddr| layout.slot(addr).unwrap_or(usize::MAX);
        let steps = program
            .eval_comb
            .iter()
            .map(|path| {
                let path = path.map_addr(&program.arena, &mut arena, &mut cache, &to_slot);
                Step {
                    slot: path.target.id,
                    access: path.target.access,
                    expr: path.expr,
                }
            })
            .collect();

        let memory: Vec<Bits> = layout.widths.iter().map(|w| Bits::zero(*w)).collect();
        log::debug!(
            "interpreter backend: {} slots, {} steps, {} expression nodes",
            layout.len(),
            program.eval_comb.len(),
            arena.len()
        );
        Ok(Self {
            working: memory.clone(),
            memory,
            layout,
            arena,
            steps,
        })
    }

    pub fn layout(&self) -> &MemoryLayout {
        &self.layout
    }

    /// Recomputes every driven net into the working region.
    ///
    /// The stable region is untouched until [`commit`](Self::commit).
    pub fn eval_comb(&mut self) -> Result<(), SimulatorErrorCode> {
        self.working.clone_from(&self.memory);
        let mut memo: Vec<Option<Bits>> = vec![None; self.arena.len()];
        for step in &self.steps {
            let value = eval_node(step.expr, &self.arena, &self.working, &mut memo)?;
            let value = value.resize(step.access.width());
            let net = self.working.get_mut(step.slot).ok_or_else(|| {
                SimulatorErrorCode::InternalError(format!("slot {} out of range", step.slot))
            })?;
            net.write_slice(step.access.lsb, &value);
        }
        Ok(())
    }

    /// Publishes the last [`eval_comb`](Self::eval_comb) result.
    pub fn commit(&mut self) {
        std::mem::swap(&mut self.memory, &mut self.working);
    }

    /// A net as computed by the last evaluation, before it is committed.
    pub fn get_pending(&self, slot: usize) -> &Bits {
        &self.working[slot]
    }

    pub fn get(&self, slot: usize) -> &Bits {
        &self.memory[slot]
    }

    pub fn set(&mut self, slot: usize, value: Bits) {
        debug_assert_eq!(value.width(), self.layout.widths[slot]);
        self.memory[slot] = value;
    }
}

fn internal(msg: impl Into<String>) -> SimulatorErrorCode {
    SimulatorErrorCode::InternalError(msg.into())
}

fn shift_amount(amount: &Bits) -> Option<usize> {
    amount.value().to_usize()
}

fn eval_node(
    id: NodeId,
    arena: &SLTNodeArena<usize>,
    memory: &[Bits],
    memo: &mut [Option<Bits>],
) -> Result<Bits, SimulatorErrorCode> {
    if let Some(Some(value)) = memo.get(id.0) {
        return Ok(value.clone());
    }
    let value = match arena.get(id) {
        SLTNode::Input { variable, access } => memory
            .get(*variable)
            .ok_or_else(|| internal(format!("slot {} out of range", variable)))?
            .slice(access.lsb, access.msb),
        SLTNode::Constant(value, width) => Bits::truncate(value.clone(), *width),
        SLTNode::Binary(lhs, op, rhs, width) => {
            let a = eval_node(*lhs, arena, memory, memo)?;
            let b = eval_node(*rhs, arena, memory, memo)?;
            eval_binary(&a, *op, &b, *width)
        }
        SLTNode::Unary(op, inner, width) => {
            let a = eval_node(*inner, arena, memory, memo)?;
            eval_unary(*op, &a, *width)
        }
        SLTNode::Mux {
            cond,
            then_expr,
            else_expr,
            width,
        } => {
            let cond = eval_node(*cond, arena, memory, memo)?;
            let chosen = if cond.is_zero() { else_expr } else { then_expr };
            eval_node(*chosen, arena, memory, memo)?.resize(*width)
        }
        SLTNode::Concat(parts) => {
            let mut acc = BigUint::zero();
            let mut total = 0;
            for part in parts {
                let bits = eval_node(*part, arena, memory, memo)?;
                acc = (acc << bits.width()) | bits.value();
                total += bits.width();
            }
            Bits::truncate(acc, total)
        }
        SLTNode::Slice { expr, access } => {
            eval_node(*expr, arena, memory, memo)?.slice(access.lsb, access.msb)
        }
        SLTNode::Extend {
            expr,
            width,
            signed,
        } => {
            let inner = eval_node(*expr, arena, memory, memo)?;
            if *signed {
                inner.sign_extend(*width)
            } else {
                inner.resize(*width)
            }
        }
    };
    if let Some(slot) = memo.get_mut(id.0) {
        *slot = Some(value.clone());
    }
    Ok(value)
}

fn eval_binary(a: &Bits, op: BinaryOp, b: &Bits, width: usize) -> Bits {
    let wrap = |value: BigUint| Bits::truncate(value, width);
    match op {
        BinaryOp::Add => wrap(a.value() + b.value()),
        BinaryOp::Sub => {
            let modulus = mask(width) + 1u32;
            let rhs = b.value() % &modulus;
            wrap((a.value() % &modulus) + &modulus - rhs)
        }
        BinaryOp::Mul => wrap(a.value() * b.value()),
        BinaryOp::And => wrap(a.value() & b.value()),
        BinaryOp::Or => wrap(a.value() | b.value()),
        BinaryOp::Xor => wrap(a.value() ^ b.value()),
        BinaryOp::Shl => match shift_amount(b) {
            Some(n) if n < width => wrap(a.value() << n),
            _ => Bits::zero(width),
        },
        BinaryOp::Shr => match shift_amount(b) {
            Some(n) if n < width => wrap(a.value() >> n),
            _ => Bits::zero(width),
        },
        BinaryOp::Sar => {
            let extended = a.sign_extend(width.max(a.width()));
            let fill = if a.is_negative() { mask(width) } else { BigUint::zero() };
            match shift_amount(b) {
                Some(n) if n < width => {
                    let shifted = extended.value() >> n;
                    let sign_bits = if fill.is_zero() {
                        fill
                    } else {
                        fill ^ mask(width - n)
                    };
                    wrap(shifted | sign_bits)
                }
                _ => wrap(fill),
            }
        }
        BinaryOp::Eq => Bits::from_bool(a.value() == b.value()),
        BinaryOp::Ne => Bits::from_bool(a.value() != b.value()),
        BinaryOp::LtU => Bits::from_bool(a.value() < b.value()),
        BinaryOp::LeU => Bits::from_bool(a.value() <= b.value()),
        BinaryOp::GtU => Bits::from_bool(a.value() > b.value()),
        BinaryOp::GeU => Bits::from_bool(a.value() >= b.value()),
        BinaryOp::LtS => Bits::from_bool(a.to_bigint() < b.to_bigint()),
        BinaryOp::LeS => Bits::from_bool(a.to_bigint() <= b.to_bigint()),
        BinaryOp::GtS => Bits::from_bool(a.to_bigint() > b.to_bigint()),
        BinaryOp::GeS => Bits::from_bool(a.to_bigint() >= b.to_bigint()),
        BinaryOp::LogicAnd => Bits::from_bool(!a.is_zero() && !b.is_zero()),
        BinaryOp::LogicOr => Bits::from_bool(!a.is_zero() || !b.is_zero()),
    }
}

fn eval_unary(op: UnaryOp, a: &Bits, width: usize) -> Bits {
    match op {
        UnaryOp::Minus => {
            let modulus = mask(width) + 1u32;
            Bits::truncate(&modulus - (a.value() % &modulus), width)
        }
        UnaryOp::BitNot => Bits::truncate(mask(width) ^ (a.value() & mask(width)), width),
        UnaryOp::LogicNot => Bits::from_bool(a.is_zero()),
        UnaryOp::And => Bits::from_bool(*a.value() == mask(a.width())),
        UnaryOp::Or => Bits::from_bool(!a.is_zero()),
        UnaryOp::Xor => Bits::from_bool(a.value().count_ones() % 2 == 1),
    }
}
