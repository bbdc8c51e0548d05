//! Imperative construction of the raw syntax tree.
//!
//! A front end drives `TreeBuilder` with one call per source construct. The
//! builder keeps a stack of open clauses; closing a clause turns it into a
//! statement or function of the enclosing block.

use crate::{
    ast::{
        expressions::Expr,
        statements::{Block, Function, Stmt, StmtKind},
    },
    errors::errors::{Diagnostics, ErrorImpl},
    Position,
};

#[derive(Debug)]
enum ClauseKind {
    Global,
    Function {
        position: Position,
        name: String,
        params: Vec<String>,
    },
    Consequence {
        position: Position,
        predicate: Expr,
    },
    Alternative {
        position: Position,
        predicate: Expr,
        consequence: Block,
    },
    AlternativeOnly {
        position: Position,
        predicate: Expr,
    },
    /// Body of an `else` with no branch to attach to, dropped on close.
    Orphan,
}

#[derive(Debug)]
struct Clause {
    kind: ClauseKind,
    block: Block,
}

impl Clause {
    fn new(kind: ClauseKind) -> Self {
        Clause {
            kind,
            block: Block::new(),
        }
    }
}

/// Builder for the raw tree of one compilation unit.
pub struct TreeBuilder {
    /// Open clauses, the global block at the bottom
    clauses: Vec<Clause>,
    /// Problems found while building, handed on with the tree
    diagnostics: Diagnostics,
}

impl Default for TreeBuilder {
    fn default() -> Self {
        TreeBuilder::new()
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        TreeBuilder {
            clauses: vec![Clause::new(ClauseKind::Global)],
            diagnostics: Diagnostics::new(),
        }
    }

    /// Nesting depth, 0 when only the global block is open.
    pub fn depth(&self) -> usize {
        self.clauses.len() - 1
    }

    fn current_block(&mut self) -> &mut Block {
        let last = self.clauses.len() - 1;
        &mut self.clauses[last].block
    }

    pub fn add_stmt(&mut self, stmt: Stmt) {
        self.current_block().stmts.push(stmt);
    }

    pub fn add_arithmetics(&mut self, position: Position, expr: Expr) {
        self.add_stmt(Stmt::arithmetics(position, expr));
    }

    pub fn add_var_def(&mut self, position: Position, name: &str, init: Expr) {
        self.add_stmt(Stmt::var_def(position, name, init));
    }

    pub fn add_return(&mut self, position: Position, value: Expr) {
        self.add_stmt(Stmt::ret(position, value));
    }

    pub fn add_return_nothing(&mut self, position: Position) {
        self.add_stmt(Stmt::ret_nothing(position));
    }

    /// Opens a function body. Statements added until the matching `close` belong to it.
    ///
    /// # Arguments
    ///
    /// * `position` - Position of the function header
    /// * `name` - Function name
    /// * `params` - Parameter names in declaration order
    pub fn open_function(&mut self, position: Position, name: &str, params: &[&str]) {
        self.clauses.push(Clause::new(ClauseKind::Function {
            position,
            name: name.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
        }));
    }

    /// Opens the consequence of `if predicate`.
    pub fn open_branch(&mut self, position: Position, predicate: Expr) {
        self.clauses
            .push(Clause::new(ClauseKind::Consequence { position, predicate }));
    }

    /// Opens the body of `ifnot predicate`, a branch with only an alternative.
    pub fn open_branch_alternative_only(&mut self, position: Position, predicate: Expr) {
        self.clauses
            .push(Clause::new(ClauseKind::AlternativeOnly { position, predicate }));
    }

    /// Switches the innermost open branch over to its alternative.
    ///
    /// Without an open consequence to switch from, reports
    /// `ElseWithoutMatchingBranch` and swallows the alternative's body.
    pub fn open_alternative(&mut self, position: Position) {
        let Some(clause) = self.clauses.pop() else {
            return;
        };

        match clause.kind {
            ClauseKind::Consequence {
                position: branch_position,
                predicate,
            } => {
                self.clauses.push(Clause::new(ClauseKind::Alternative {
                    position: branch_position,
                    predicate,
                    consequence: clause.block,
                }));
            }
            kind => {
                self.clauses.push(Clause {
                    kind,
                    block: clause.block,
                });
                self.diagnostics
                    .error(ErrorImpl::ElseWithoutMatchingBranch, position);
                self.clauses.push(Clause::new(ClauseKind::Orphan));
            }
        }
    }

    /// Closes the innermost open clause. The global block cannot be closed.
    pub fn close(&mut self) {
        if self.clauses.len() <= 1 {
            log::warn!("close called with no open clause");
            return;
        }
        let Some(clause) = self.clauses.pop() else {
            return;
        };
        let block = clause.block;

        match clause.kind {
            ClauseKind::Global => {}
            ClauseKind::Function {
                position,
                name,
                params,
            } => {
                let function = Function::new(position, &name, params, block);
                self.current_block().funcs.push(function);
            }
            ClauseKind::Consequence {
                position,
                predicate,
            } => self.add_stmt(Stmt::new(
                position,
                StmtKind::BranchConsequenceOnly {
                    predicate,
                    consequence: block,
                },
            )),
            ClauseKind::Alternative {
                position,
                predicate,
                consequence,
            } => self.add_stmt(Stmt::new(
                position,
                StmtKind::Branch {
                    predicate,
                    consequence,
                    alternative: block,
                },
            )),
            ClauseKind::AlternativeOnly {
                position,
                predicate,
            } => self.add_stmt(Stmt::new(
                position,
                StmtKind::BranchAlternativeOnly {
                    predicate,
                    alternative: block,
                },
            )),
            ClauseKind::Orphan => {
                log::trace!(
                    "dropping unmatched alternative with {} statements",
                    block.stmts.len()
                );
            }
        }
    }

    /// Closes every clause still open and yields the global block.
    pub fn finish(mut self) -> (Block, Diagnostics) {
        while self.clauses.len() > 1 {
            self.close();
        }
        let block = self
            .clauses
            .pop()
            .map(|clause| clause.block)
            .unwrap_or_default();
        (block, self.diagnostics)
    }
}
