//! Typed intermediate representation.
//!
//! One typed body exists per function instance. Every expression carries
//! its static type, every variable access its storage address, and every
//! call the instance it dispatches to. This is what the emission layer walks.

use num_bigint::BigInt;

use crate::{
    ast::{
        expressions::{BinaryOperator, PipeKind, UnaryOperator},
        numeric::FloatValue,
    },
    resolve::symbol_table::FunctionId,
    Position,
};

use super::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Address {
    /// Stack slot within the instance frame; parameters come first.
    Local(usize),
    /// Index into the instance's capture list.
    Capture(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub position: Position,
    pub ty: Type,
    pub kind: TypedExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CaptureSource {
    /// Captured values are read from the caller's own variables.
    Environment(Vec<TypedExpr>),
    /// Captured values travel inside a function reference value.
    Reference(Box<TypedExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedExprKind {
    BoolLiteral(bool),
    IntLiteral(BigInt),
    FloatLiteral(FloatValue),
    StringLiteral(String),
    ListLiteral(Vec<TypedExpr>),
    ListElement,
    ListIndex,
    Pipeline {
        list: Box<TypedExpr>,
        kind: PipeKind,
        section: Box<TypedExpr>,
    },
    Reference {
        name: String,
        address: Address,
    },
    FuncReference {
        func: FunctionId,
        captures: Vec<TypedExpr>,
    },
    Binary {
        lhs: Box<TypedExpr>,
        op: BinaryOperator,
        rhs: Box<TypedExpr>,
    },
    PreUnary {
        op: UnaryOperator,
        operand: Box<TypedExpr>,
    },
    Conjunction {
        lhs: Box<TypedExpr>,
        rhs: Box<TypedExpr>,
    },
    Disjunction {
        lhs: Box<TypedExpr>,
        rhs: Box<TypedExpr>,
    },
    Negation(Box<TypedExpr>),
    Call {
        instance: InstanceId,
        args: Vec<TypedExpr>,
        captures: CaptureSource,
    },
    MemberCall {
        object: Box<TypedExpr>,
        member: String,
        args: Vec<TypedExpr>,
    },
    /// Stand-in after an error, or for a call that could not be instantiated yet.
    Bad,
}

impl TypedExpr {
    pub fn new(position: Position, ty: Type, kind: TypedExprKind) -> Self {
        TypedExpr { position, ty, kind }
    }

    pub fn bad(position: Position) -> Self {
        TypedExpr::new(position, Type::Bad, TypedExprKind::Bad)
    }

    pub fn unresolved(position: Position) -> Self {
        TypedExpr::new(position, Type::Unresolved, TypedExprKind::Bad)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypedStmt {
    pub position: Position,
    pub kind: TypedStmtKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypedStmtKind {
    Arithmetics(TypedExpr),
    VarDef {
        name: String,
        slot: usize,
        init: TypedExpr,
    },
    Return(TypedExpr),
    ReturnNothing,
    Branch {
        predicate: TypedExpr,
        consequence: TypedBlock,
        alternative: TypedBlock,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypedBlock {
    pub stmts: Vec<TypedStmt>,
}

/// A named, typed storage location of an instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Slot {
    pub name: String,
    pub ty: Type,
    pub slot: usize,
}
