use crate::Position;

use super::expressions::Expr;

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub position: Position,
    pub kind: StmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// Expression evaluated for its effect.
    Arithmetics(Expr),
    VarDef {
        name: String,
        init: Expr,
    },
    Return(Expr),
    ReturnNothing,
    Branch {
        predicate: Expr,
        consequence: Block,
        alternative: Block,
    },
    BranchConsequenceOnly {
        predicate: Expr,
        consequence: Block,
    },
    BranchAlternativeOnly {
        predicate: Expr,
        alternative: Block,
    },
}

impl Stmt {
    pub fn new(position: Position, kind: StmtKind) -> Self {
        Stmt { position, kind }
    }

    pub fn arithmetics(position: Position, expr: Expr) -> Self {
        Stmt::new(position, StmtKind::Arithmetics(expr))
    }

    pub fn var_def(position: Position, name: &str, init: Expr) -> Self {
        Stmt::new(
            position,
            StmtKind::VarDef {
                name: name.to_string(),
                init,
            },
        )
    }

    pub fn ret(position: Position, value: Expr) -> Self {
        Stmt::new(position, StmtKind::Return(value))
    }

    pub fn ret_nothing(position: Position) -> Self {
        Stmt::new(position, StmtKind::ReturnNothing)
    }

    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, StmtKind::Return(_) | StmtKind::ReturnNothing)
    }
}

/// Statements in source order plus the functions declared alongside them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub funcs: Vec<Function>,
}

impl Block {
    pub fn new() -> Self {
        Block::default()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty() && self.funcs.is_empty()
    }

    /// Whether every path through the block ends in a return.
    pub fn terminates(&self) -> bool {
        self.stmts.iter().any(|stmt| match &stmt.kind {
            StmtKind::Return(_) | StmtKind::ReturnNothing => true,
            StmtKind::Branch {
                consequence,
                alternative,
                ..
            } => consequence.terminates() && alternative.terminates(),
            _ => false,
        })
    }

    /// Looks for returns in this block and its branches, not in nested functions.
    pub fn contains_return(&self, with_value: bool) -> bool {
        self.stmts.iter().any(|stmt| match &stmt.kind {
            StmtKind::Return(_) => with_value,
            StmtKind::ReturnNothing => !with_value,
            StmtKind::Branch {
                consequence,
                alternative,
                ..
            } => {
                consequence.contains_return(with_value) || alternative.contains_return(with_value)
            }
            StmtKind::BranchConsequenceOnly { consequence, .. } => {
                consequence.contains_return(with_value)
            }
            StmtKind::BranchAlternativeOnly { alternative, .. } => {
                alternative.contains_return(with_value)
            }
            StmtKind::Arithmetics(_) | StmtKind::VarDef { .. } => false,
        })
    }
}

/// Untyped function declaration.
///
/// `contains_void_return` also covers falling off the end of the body.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub position: Position,
    pub name: String,
    pub params: Vec<String>,
    pub body: Block,
    pub contains_void_return: bool,
    pub contains_value_return: bool,
}

impl Function {
    pub fn new(position: Position, name: &str, params: Vec<String>, body: Block) -> Self {
        let contains_value_return = body.contains_return(true);
        let contains_void_return = body.contains_return(false) || !body.terminates();
        Function {
            position,
            name: name.to_string(),
            params,
            body,
            contains_void_return,
            contains_value_return,
        }
    }
}
