//! Operator tables for folding literal operands.
//!
//! Keyed by operator and the kinds of both literals. A missing entry means
//! the operator is unavailable for that pair.

use std::collections::HashMap;

use lazy_static::lazy_static;
use num_bigint::BigInt;

use crate::{
    errors::errors::{Diagnostics, ErrorImpl},
    Position,
};

use super::{
    expressions::{BinaryOperator, Expr, ExprKind, UnaryOperator},
    numeric::{int_is_zero, FloatValue},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Bool,
    Int,
    Float,
}

impl LiteralKind {
    pub fn of(expr: &Expr) -> Option<LiteralKind> {
        match expr.kind {
            ExprKind::BoolLiteral(_) => Some(LiteralKind::Bool),
            ExprKind::IntLiteral(_) => Some(LiteralKind::Int),
            ExprKind::FloatLiteral(_) => Some(LiteralKind::Float),
            _ => None,
        }
    }

    /// Literal standing in for a result that could not be computed.
    pub fn placeholder(&self) -> ExprKind {
        match self {
            LiteralKind::Bool => ExprKind::BoolLiteral(false),
            LiteralKind::Int => ExprKind::IntLiteral(BigInt::from(0)),
            LiteralKind::Float => ExprKind::FloatLiteral(FloatValue::zero()),
        }
    }
}

/// Returns `None` when the right operand is a zero divisor.
pub type BinaryFolder = fn(BinaryOperator, &ExprKind, &ExprKind) -> Option<ExprKind>;
pub type UnaryFolder = fn(UnaryOperator, &ExprKind) -> ExprKind;

#[derive(Clone, Copy)]
pub struct BinaryFold {
    pub result: LiteralKind,
    pub apply: BinaryFolder,
}

const ARITHMETIC: [BinaryOperator; 5] = [
    BinaryOperator::Add,
    BinaryOperator::Sub,
    BinaryOperator::Mul,
    BinaryOperator::Div,
    BinaryOperator::Mod,
];

const COMPARISON: [BinaryOperator; 6] = [
    BinaryOperator::Less,
    BinaryOperator::LessEqual,
    BinaryOperator::GreaterEqual,
    BinaryOperator::Greater,
    BinaryOperator::Equal,
    BinaryOperator::NotEqual,
];

lazy_static! {
    pub static ref BINARY_FOLDS: HashMap<(BinaryOperator, LiteralKind, LiteralKind), BinaryFold> = {
        let mut map = HashMap::new();
        let numeric = [LiteralKind::Int, LiteralKind::Float];

        for op in ARITHMETIC {
            map.insert(
                (op, LiteralKind::Int, LiteralKind::Int),
                BinaryFold { result: LiteralKind::Int, apply: fold_int_arithmetic },
            );
        }
        for op in ARITHMETIC.iter().filter(|op| **op != BinaryOperator::Mod) {
            for (lhs, rhs) in [
                (LiteralKind::Int, LiteralKind::Float),
                (LiteralKind::Float, LiteralKind::Int),
                (LiteralKind::Float, LiteralKind::Float),
            ] {
                map.insert(
                    (*op, lhs, rhs),
                    BinaryFold { result: LiteralKind::Float, apply: fold_float_arithmetic },
                );
            }
        }
        for op in COMPARISON {
            for lhs in numeric {
                for rhs in numeric {
                    map.insert(
                        (op, lhs, rhs),
                        BinaryFold { result: LiteralKind::Bool, apply: fold_numeric_comparison },
                    );
                }
            }
        }
        for op in [BinaryOperator::Equal, BinaryOperator::NotEqual] {
            map.insert(
                (op, LiteralKind::Bool, LiteralKind::Bool),
                BinaryFold { result: LiteralKind::Bool, apply: fold_bool_equality },
            );
        }

        map
    };

    pub static ref UNARY_FOLDS: HashMap<(UnaryOperator, LiteralKind), UnaryFolder> = {
        let mut map: HashMap<(UnaryOperator, LiteralKind), UnaryFolder> = HashMap::new();
        map.insert((UnaryOperator::Plus, LiteralKind::Int), fold_identity);
        map.insert((UnaryOperator::Plus, LiteralKind::Float), fold_identity);
        map.insert((UnaryOperator::Minus, LiteralKind::Int), fold_negate);
        map.insert((UnaryOperator::Minus, LiteralKind::Float), fold_negate);
        map
    };
}

/// Applies `op` to two literal operands.
///
/// Unavailable pairs and zero divisors are reported and replaced by a placeholder literal.
pub fn apply_binary(
    position: Position,
    lhs: &Expr,
    op: BinaryOperator,
    rhs: &Expr,
    diagnostics: &mut Diagnostics,
) -> Expr {
    let fold = match (LiteralKind::of(lhs), LiteralKind::of(rhs)) {
        (Some(lhs_kind), Some(rhs_kind)) => BINARY_FOLDS.get(&(op, lhs_kind, rhs_kind)),
        _ => None,
    };

    let Some(fold) = fold else {
        diagnostics.error(
            ErrorImpl::BinaryOperatorUnavailable {
                operator: op.symbol().to_string(),
                lhs_type: lhs.type_name(),
                rhs_type: rhs.type_name(),
            },
            position.clone(),
        );
        return Expr::new(position, LiteralKind::Bool.placeholder());
    };

    match (fold.apply)(op, &lhs.kind, &rhs.kind) {
        Some(kind) => Expr::new(position, kind),
        None => {
            diagnostics.error(
                ErrorImpl::DivideOrModuloByLiteralZero {
                    operator: op.symbol().to_string(),
                },
                position.clone(),
            );
            Expr::new(position, fold.result.placeholder())
        }
    }
}

pub fn apply_unary(
    position: Position,
    op: UnaryOperator,
    operand: &Expr,
    diagnostics: &mut Diagnostics,
) -> Expr {
    match LiteralKind::of(operand).and_then(|kind| UNARY_FOLDS.get(&(op, kind))) {
        Some(fold) => Expr::new(position, fold(op, &operand.kind)),
        None => {
            diagnostics.error(
                ErrorImpl::UnaryOperatorUnavailable {
                    operator: op.symbol().to_string(),
                    operand_type: operand.type_name(),
                },
                position.clone(),
            );
            Expr::new(position, LiteralKind::Bool.placeholder())
        }
    }
}

fn as_float(kind: &ExprKind) -> FloatValue {
    match kind {
        ExprKind::IntLiteral(value) => FloatValue::from_int(value),
        ExprKind::FloatLiteral(value) => value.clone(),
        _ => FloatValue::zero(),
    }
}

fn is_zero_divisor(kind: &ExprKind) -> bool {
    match kind {
        ExprKind::IntLiteral(value) => int_is_zero(value),
        ExprKind::FloatLiteral(value) => value.is_zero(),
        _ => false,
    }
}

fn fold_int_arithmetic(op: BinaryOperator, lhs: &ExprKind, rhs: &ExprKind) -> Option<ExprKind> {
    let (ExprKind::IntLiteral(lhs), ExprKind::IntLiteral(rhs)) = (lhs, rhs) else {
        return Some(LiteralKind::Int.placeholder());
    };

    // BigInt division truncates toward zero and the remainder keeps the sign of lhs
    let value = match op {
        BinaryOperator::Add => lhs + rhs,
        BinaryOperator::Sub => lhs - rhs,
        BinaryOperator::Mul => lhs * rhs,
        BinaryOperator::Div | BinaryOperator::Mod if int_is_zero(rhs) => return None,
        BinaryOperator::Div => lhs / rhs,
        BinaryOperator::Mod => lhs % rhs,
        _ => return Some(LiteralKind::Int.placeholder()),
    };
    Some(ExprKind::IntLiteral(value))
}

fn fold_float_arithmetic(op: BinaryOperator, lhs: &ExprKind, rhs: &ExprKind) -> Option<ExprKind> {
    if op.is_division() && is_zero_divisor(rhs) {
        return None;
    }

    let (lhs, rhs) = (as_float(lhs), as_float(rhs));
    let value = match op {
        BinaryOperator::Add => lhs.add(&rhs),
        BinaryOperator::Sub => lhs.sub(&rhs),
        BinaryOperator::Mul => lhs.mul(&rhs),
        BinaryOperator::Div => lhs.div(&rhs),
        _ => return Some(LiteralKind::Float.placeholder()),
    };
    Some(ExprKind::FloatLiteral(value))
}

fn fold_numeric_comparison(
    op: BinaryOperator,
    lhs: &ExprKind,
    rhs: &ExprKind,
) -> Option<ExprKind> {
    let ordering = match (lhs, rhs) {
        (ExprKind::IntLiteral(lhs), ExprKind::IntLiteral(rhs)) => Some(lhs.cmp(rhs)),
        _ => as_float(lhs).compare(&as_float(rhs)),
    };

    let Some(ordering) = ordering else {
        return Some(ExprKind::BoolLiteral(op == BinaryOperator::NotEqual));
    };
    let value = match op {
        BinaryOperator::Less => ordering.is_lt(),
        BinaryOperator::LessEqual => ordering.is_le(),
        BinaryOperator::GreaterEqual => ordering.is_ge(),
        BinaryOperator::Greater => ordering.is_gt(),
        BinaryOperator::Equal => ordering.is_eq(),
        BinaryOperator::NotEqual => ordering.is_ne(),
        _ => false,
    };
    Some(ExprKind::BoolLiteral(value))
}

fn fold_bool_equality(op: BinaryOperator, lhs: &ExprKind, rhs: &ExprKind) -> Option<ExprKind> {
    let (ExprKind::BoolLiteral(lhs), ExprKind::BoolLiteral(rhs)) = (lhs, rhs) else {
        return Some(LiteralKind::Bool.placeholder());
    };
    let value = match op {
        BinaryOperator::Equal => lhs == rhs,
        _ => lhs != rhs,
    };
    Some(ExprKind::BoolLiteral(value))
}

fn fold_identity(_: UnaryOperator, operand: &ExprKind) -> ExprKind {
    operand.clone()
}

fn fold_negate(_: UnaryOperator, operand: &ExprKind) -> ExprKind {
    match operand {
        ExprKind::IntLiteral(value) => ExprKind::IntLiteral(-value),
        ExprKind::FloatLiteral(value) => ExprKind::FloatLiteral(value.neg()),
        other => other.clone(),
    }
}
