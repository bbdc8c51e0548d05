use crate::{
    ast::{
        expressions::Expr,
        statements::{Block, Function, Stmt, StmtKind},
    },
    errors::errors::{Diagnostics, ErrorImpl, WarningImpl},
    Position,
};

/// Collects the statements of one straight-line sequence.
///
/// Once a return is added the sequence is terminated: the next statement is
/// reported as unreachable and every later one is dropped without a report.
#[derive(Debug, Default)]
pub struct Accumulator {
    stmts: Vec<Stmt>,
    funcs: Vec<Function>,
    terminated_at: Option<Position>,
    unreachable_reported: bool,
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator::default()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated_at.is_some()
    }

    pub fn terminated_at(&self) -> Option<&Position> {
        self.terminated_at.as_ref()
    }

    /// Returns true if a statement at `position` must be dropped.
    pub fn reject_unreachable(&mut self, position: &Position, diagnostics: &mut Diagnostics) -> bool {
        let Some(terminated_at) = &self.terminated_at else {
            return false;
        };
        if !self.unreachable_reported {
            diagnostics.error(
                ErrorImpl::UnreachableStatement {
                    terminated_at: terminated_at.clone(),
                },
                position.clone(),
            );
            self.unreachable_reported = true;
        }
        true
    }

    pub fn add_stmt(&mut self, stmt: Stmt, diagnostics: &mut Diagnostics) {
        if self.reject_unreachable(&stmt.position, diagnostics) {
            return;
        }
        if stmt.is_terminator() {
            self.terminated_at = Some(stmt.position.clone());
        }
        self.stmts.push(stmt);
    }

    pub fn add_func(&mut self, func: Function) {
        self.funcs.push(func);
    }

    /// Adds a two-sided branch whose arms were accumulated separately.
    ///
    /// The sequence terminates only when both arms do. A single terminated
    /// arm is worth a warning; neither terminating is silent.
    pub fn add_branch(
        &mut self,
        position: Position,
        predicate: Expr,
        consequence: Accumulator,
        alternative: Accumulator,
        diagnostics: &mut Diagnostics,
    ) {
        if self.reject_unreachable(&position, diagnostics) {
            return;
        }

        match (consequence.terminated_at(), alternative.terminated_at()) {
            (Some(consequence_at), Some(alternative_at)) => {
                diagnostics.warning(
                    WarningImpl::BothBranchesTerminated {
                        consequence: consequence_at.clone(),
                        alternative: alternative_at.clone(),
                    },
                    position.clone(),
                );
                self.terminated_at = Some(position.clone());
            }
            (Some(consequence_at), None) => diagnostics.warning(
                WarningImpl::ConsequenceBranchTerminatedEarly,
                consequence_at.clone(),
            ),
            (None, Some(alternative_at)) => diagnostics.warning(
                WarningImpl::AlternativeBranchTerminatedEarly,
                alternative_at.clone(),
            ),
            (None, None) => {}
        }

        self.stmts.push(Stmt::new(
            position,
            StmtKind::Branch {
                predicate,
                consequence: consequence.deliver(),
                alternative: alternative.deliver(),
            },
        ));
    }

    pub fn add_branch_consequence_only(
        &mut self,
        position: Position,
        predicate: Expr,
        consequence: Accumulator,
        diagnostics: &mut Diagnostics,
    ) {
        if self.reject_unreachable(&position, diagnostics) {
            return;
        }
        self.stmts.push(Stmt::new(
            position,
            StmtKind::BranchConsequenceOnly {
                predicate,
                consequence: consequence.deliver(),
            },
        ));
    }

    pub fn add_branch_alternative_only(
        &mut self,
        position: Position,
        predicate: Expr,
        alternative: Accumulator,
        diagnostics: &mut Diagnostics,
    ) {
        if self.reject_unreachable(&position, diagnostics) {
            return;
        }
        self.stmts.push(Stmt::new(
            position,
            StmtKind::BranchAlternativeOnly {
                predicate,
                alternative: alternative.deliver(),
            },
        ));
    }

    pub fn deliver(self) -> Block {
        Block {
            stmts: self.stmts,
            funcs: self.funcs,
        }
    }
}
