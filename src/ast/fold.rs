use crate::errors::errors::Diagnostics;

use super::{
    expressions::{Expr, ExprKind},
    operators::{apply_binary, apply_unary},
};

/// Folds literal subexpressions bottom-up.
///
/// Never fails: operator errors are reported and replaced by a placeholder
/// literal, so folding the result again changes nothing.
pub fn fold(expr: Expr, diagnostics: &mut Diagnostics) -> Expr {
    let Expr { position, kind } = expr;

    match kind {
        ExprKind::Binary { lhs, op, rhs } => {
            let lhs = fold(*lhs, diagnostics);
            let rhs = fold(*rhs, diagnostics);
            if lhs.is_literal() && rhs.is_literal() {
                apply_binary(position, &lhs, op, &rhs, diagnostics)
            } else {
                Expr::binary(position, lhs, op, rhs)
            }
        }
        ExprKind::PreUnary { op, operand } => {
            let operand = fold(*operand, diagnostics);
            if operand.is_literal() {
                apply_unary(position, op, &operand, diagnostics)
            } else {
                Expr::pre_unary(position, op, operand)
            }
        }
        ExprKind::Conjunction { lhs, rhs } => {
            let lhs = fold(*lhs, diagnostics);
            let rhs = fold(*rhs, diagnostics);
            if lhs.is_literal() && rhs.is_literal() {
                let value = lhs.bool_value(diagnostics) && rhs.bool_value(diagnostics);
                Expr::bool(position, value)
            } else {
                Expr::new(
                    position,
                    ExprKind::Conjunction {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                )
            }
        }
        ExprKind::Disjunction { lhs, rhs } => {
            let lhs = fold(*lhs, diagnostics);
            let rhs = fold(*rhs, diagnostics);
            if lhs.is_literal() && rhs.is_literal() {
                let value = lhs.bool_value(diagnostics) || rhs.bool_value(diagnostics);
                Expr::bool(position, value)
            } else {
                Expr::new(
                    position,
                    ExprKind::Disjunction {
                        lhs: Box::new(lhs),
                        rhs: Box::new(rhs),
                    },
                )
            }
        }
        ExprKind::Negation(operand) => {
            let operand = fold(*operand, diagnostics);
            if operand.is_literal() {
                let value = !operand.bool_value(diagnostics);
                Expr::bool(position, value)
            } else {
                Expr::new(position, ExprKind::Negation(Box::new(operand)))
            }
        }
        ExprKind::ListLiteral(elements) => Expr::new(
            position,
            ExprKind::ListLiteral(fold_all(elements, diagnostics)),
        ),
        ExprKind::Pipeline {
            list,
            kind,
            section,
        } => Expr::new(
            position,
            ExprKind::Pipeline {
                list: Box::new(fold(*list, diagnostics)),
                kind,
                section: Box::new(fold(*section, diagnostics)),
            },
        ),
        ExprKind::Call { name, args } => Expr::new(
            position,
            ExprKind::Call {
                name,
                args: fold_all(args, diagnostics),
            },
        ),
        ExprKind::MemberCall {
            object,
            member,
            args,
        } => Expr::new(
            position,
            ExprKind::MemberCall {
                object: Box::new(fold(*object, diagnostics)),
                member,
                args: fold_all(args, diagnostics),
            },
        ),
        kind @ (ExprKind::BoolLiteral(_)
        | ExprKind::IntLiteral(_)
        | ExprKind::FloatLiteral(_)
        | ExprKind::StringLiteral(_)
        | ExprKind::ListElement
        | ExprKind::ListIndex
        | ExprKind::Reference(_)
        | ExprKind::FuncReference { .. }) => Expr::new(position, kind),
    }
}

fn fold_all(exprs: Vec<Expr>, diagnostics: &mut Diagnostics) -> Vec<Expr> {
    exprs
        .into_iter()
        .map(|expr| fold(expr, diagnostics))
        .collect()
}
