//! Name-resolved tree.
//!
//! Same shape as the checked raw tree, but every name is replaced by what it
//! refers to and functions are pulled out into a flat declaration list
//! indexed by `FunctionId`. Nothing here carries a type yet.

use num_bigint::BigInt;

use crate::{
    ast::{
        expressions::{BinaryOperator, PipeKind, UnaryOperator},
        numeric::FloatValue,
    },
    Position,
};

use super::symbol_table::{FunctionId, VariableBinding};

#[derive(Debug, Clone, PartialEq)]
pub struct ProtoExpr {
    pub position: Position,
    pub kind: ProtoExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProtoExprKind {
    BoolLiteral(bool),
    IntLiteral(BigInt),
    FloatLiteral(FloatValue),
    StringLiteral(String),
    ListLiteral(Vec<ProtoExpr>),
    ListElement,
    ListIndex,
    Pipeline {
        list: Box<ProtoExpr>,
        kind: PipeKind,
        section: Box<ProtoExpr>,
    },
    Reference(VariableBinding),
    FuncReference(FunctionId),
    Binary {
        lhs: Box<ProtoExpr>,
        op: BinaryOperator,
        rhs: Box<ProtoExpr>,
    },
    PreUnary {
        op: UnaryOperator,
        operand: Box<ProtoExpr>,
    },
    Conjunction {
        lhs: Box<ProtoExpr>,
        rhs: Box<ProtoExpr>,
    },
    Disjunction {
        lhs: Box<ProtoExpr>,
        rhs: Box<ProtoExpr>,
    },
    Negation(Box<ProtoExpr>),
    Call {
        func: FunctionId,
        args: Vec<ProtoExpr>,
    },
    CallVariable {
        binding: VariableBinding,
        args: Vec<ProtoExpr>,
    },
    MemberCall {
        object: Box<ProtoExpr>,
        member: String,
        args: Vec<ProtoExpr>,
    },
    /// A name that did not resolve; already reported.
    Bad,
}

impl ProtoExpr {
    pub fn new(position: Position, kind: ProtoExprKind) -> Self {
        ProtoExpr { position, kind }
    }

    pub fn is_zero_literal(&self) -> bool {
        match &self.kind {
            ProtoExprKind::IntLiteral(value) => *value == BigInt::from(0),
            ProtoExprKind::FloatLiteral(value) => value.is_zero(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtoStmt {
    pub position: Position,
    pub kind: ProtoStmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProtoStmtKind {
    Arithmetics(ProtoExpr),
    VarDef { name: String, init: ProtoExpr },
    Return(ProtoExpr),
    ReturnNothing,
    /// One-sided branches come through with an empty arm.
    Branch {
        predicate: ProtoExpr,
        consequence: ProtoBlock,
        alternative: ProtoBlock,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtoBlock {
    /// Nesting level of the scope this block opened.
    pub level: usize,
    pub stmts: Vec<ProtoStmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub id: FunctionId,
    pub position: Position,
    pub name: String,
    pub params: Vec<String>,
    pub body: ProtoBlock,
    pub contains_void_return: bool,
    pub contains_value_return: bool,
    /// Free variables in first-use order, including those needed by callees.
    pub captures: Vec<VariableBinding>,
}

impl FunctionDecl {
    pub fn body_level(&self) -> usize {
        self.body.level
    }

    /// Whether the return type is known to be void before any instantiation.
    pub fn returns_void(&self) -> bool {
        self.contains_void_return || !self.contains_value_return
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProtoProgram {
    pub global: ProtoBlock,
    /// Indexed by `FunctionId`.
    pub functions: Vec<FunctionDecl>,
}

impl ProtoProgram {
    pub fn function(&self, id: FunctionId) -> &FunctionDecl {
        &self.functions[id.0]
    }

    pub fn functions_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FunctionDecl> + 'a {
        self.functions.iter().filter(move |f| f.name == name)
    }
}
