use crate::{
    ast::{
        fold::fold,
        statements::{Block, Function, Stmt, StmtKind},
    },
    errors::errors::Diagnostics,
};

use super::accumulator::Accumulator;

/// Folds and flow-checks a block into a fresh one.
pub fn check_block(block: Block, diagnostics: &mut Diagnostics) -> Block {
    let mut accumulator = Accumulator::new();
    check_into(block, &mut accumulator, diagnostics);
    accumulator.deliver()
}

pub fn check_function(function: Function, diagnostics: &mut Diagnostics) -> Function {
    let Function {
        position,
        name,
        params,
        body,
        ..
    } = function;
    let body = check_block(body, diagnostics);
    Function::new(position, &name, params, body)
}

fn check_into(block: Block, accumulator: &mut Accumulator, diagnostics: &mut Diagnostics) {
    for stmt in block.stmts {
        check_stmt(stmt, accumulator, diagnostics);
    }
    for func in block.funcs {
        accumulator.add_func(check_function(func, diagnostics));
    }
}

fn check_stmt(stmt: Stmt, accumulator: &mut Accumulator, diagnostics: &mut Diagnostics) {
    if accumulator.reject_unreachable(&stmt.position, diagnostics) {
        return;
    }
    let Stmt { position, kind } = stmt;

    match kind {
        StmtKind::Arithmetics(expr) => {
            let expr = fold(expr, diagnostics);
            accumulator.add_stmt(Stmt::arithmetics(position, expr), diagnostics);
        }
        StmtKind::VarDef { name, init } => {
            let init = fold(init, diagnostics);
            accumulator.add_stmt(Stmt::var_def(position, &name, init), diagnostics);
        }
        StmtKind::Return(value) => {
            let value = fold(value, diagnostics);
            accumulator.add_stmt(Stmt::ret(position, value), diagnostics);
        }
        StmtKind::ReturnNothing => accumulator.add_stmt(Stmt::ret_nothing(position), diagnostics),
        StmtKind::Branch {
            predicate,
            consequence,
            alternative,
        } => {
            let predicate = fold(predicate, diagnostics);
            if predicate.is_literal() {
                let taken = if predicate.bool_value(diagnostics) {
                    consequence
                } else {
                    alternative
                };
                log::trace!("branch at {} collapsed", position);
                check_into(taken, accumulator, diagnostics);
                return;
            }

            let consequence = check_arm(consequence, diagnostics);
            let alternative = check_arm(alternative, diagnostics);
            accumulator.add_branch(position, predicate, consequence, alternative, diagnostics);
        }
        StmtKind::BranchConsequenceOnly {
            predicate,
            consequence,
        } => {
            let predicate = fold(predicate, diagnostics);
            if predicate.is_literal() {
                if predicate.bool_value(diagnostics) {
                    check_into(consequence, accumulator, diagnostics);
                }
                return;
            }

            let consequence = check_arm(consequence, diagnostics);
            accumulator.add_branch_consequence_only(position, predicate, consequence, diagnostics);
        }
        StmtKind::BranchAlternativeOnly {
            predicate,
            alternative,
        } => {
            let predicate = fold(predicate, diagnostics);
            if predicate.is_literal() {
                if !predicate.bool_value(diagnostics) {
                    check_into(alternative, accumulator, diagnostics);
                }
                return;
            }

            let alternative = check_arm(alternative, diagnostics);
            accumulator.add_branch_alternative_only(position, predicate, alternative, diagnostics);
        }
    }
}

fn check_arm(block: Block, diagnostics: &mut Diagnostics) -> Accumulator {
    let mut accumulator = Accumulator::new();
    check_into(block, &mut accumulator, diagnostics);
    accumulator
}
