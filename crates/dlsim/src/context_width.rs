use crate::syntax::{Expr, Select};

/// Width an expression has on its own, before any surrounding context widens it.
///
/// `lookup` returns the declared width of a name, or `None` if it is unknown;
/// the unknown name is returned as the error.
pub fn self_width<F>(expr: &Expr, lookup: &F) -> Result<usize, String>
where
    F: Fn(&str) -> Option<usize>,
{
    Ok(match expr {
        Expr::Ident(name) => lookup(name).ok_or_else(|| name.clone())?,
        Expr::Select(name, select) => {
            lookup(name).ok_or_else(|| name.clone())?;
            select_width(select)
        }
        Expr::Number(lit) => lit.width,
        Expr::Unary(op, inner) => {
            if op.is_boolean() {
                1
            } else {
                self_width(inner, lookup)?
            }
        }
        Expr::Binary(lhs, op, rhs) => {
            if op.is_boolean() {
                1
            } else if op.is_shift() {
                self_width(lhs, lookup)?
            } else {
                self_width(lhs, lookup)?.max(self_width(rhs, lookup)?)
            }
        }
        Expr::Ternary {
            then_expr,
            else_expr,
            ..
        } => self_width(then_expr, lookup)?.max(self_width(else_expr, lookup)?),
        Expr::Concat(parts) => {
            let mut total = 0;
            for part in parts {
                total += self_width(part, lookup)?;
            }
            total
        }
        Expr::Replicate(count, inner) => count * self_width(inner, lookup)?,
        Expr::Extend { width, .. } => *width,
    })
}

pub fn select_width(select: &Select) -> usize {
    match select {
        Select::Bit(_) => 1,
        Select::Range(msb, lsb) => msb.saturating_sub(*lsb) + 1,
    }
}

/// Width at which an operator node is evaluated, given the width its parent
/// asks for. Boolean operators always produce one bit.
pub fn context_width<F>(expr: &Expr, parent_width: usize, lookup: &F) -> Result<usize, String>
where
    F: Fn(&str) -> Option<usize>,
{
    Ok(match expr {
        Expr::Unary(op, _) if op.is_boolean() => 1,
        Expr::Binary(_, op, _) if op.is_boolean() => 1,
        Expr::Unary(..) | Expr::Binary(..) | Expr::Ternary { .. } => {
            parent_width.max(self_width(expr, lookup)?)
        }
        _ => self_width(expr, lookup)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;
    use crate::syntax::{AssignStmt, Item};

    fn width_of(source_expr: &str, parent: usize) -> usize {
        let source = format!(
            "module M (a: input logic<8>, b: input logic<4>, y: output logic) {{ assign y = {}; }}",
            source_expr
        );
        let file = parse(&source).unwrap();
        let Item::Assign(AssignStmt { expr, .. }) = &file.modules[0].items[0] else {
            panic!("expected an assignment");
        };
        let lookup = |name: &str| match name {
            "a" => Some(8),
            "b" => Some(4),
            _ => None,
        };
        context_width(expr, parent, &lookup).unwrap()
    }

    #[test]
    fn arithmetic_takes_the_wider_of_context_and_operands() {
        assert_eq!(width_of("a + b", 0), 8);
        assert_eq!(width_of("a + b", 16), 16);
        assert_eq!(width_of("{a, b} & a", 4), 12);
        assert_eq!(width_of("{a + b}", 16), 8);
    }

    #[test]
    fn comparisons_and_reductions_are_one_bit() {
        assert_eq!(width_of("a < b", 16), 1);
        assert_eq!(width_of("&a", 16), 1);
        assert_eq!(width_of("!a", 16), 1);
    }

    #[test]
    fn shifts_follow_the_left_operand() {
        assert_eq!(width_of("b << a", 0), 4);
        assert_eq!(width_of("b << a", 8), 8);
    }

    #[test]
    fn unknown_name_is_reported() {
        let file = parse("module M () { assign y = q + 1; }").unwrap();
        let Item::Assign(AssignStmt { expr, .. }) = &file.modules[0].items[0] else {
            panic!("expected an assignment");
        };
        assert_eq!(self_width(expr, &|_: &str| None), Err("q".to_string()));
    }
}
