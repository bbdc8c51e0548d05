//! Expression nodes of the raw syntax tree.
//!
//! Every node owns its children and carries the position it was built at.
//! The same node type is used before and after constant folding; folding
//! only ever replaces subtrees with literals.

use std::fmt::Display;

use num_bigint::BigInt;

use crate::{
    errors::errors::{Diagnostics, ErrorImpl},
    Position,
};

use super::numeric::FloatValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Less,
    LessEqual,
    GreaterEqual,
    Greater,
    Equal,
    NotEqual,
    /// List concatenation, `++`.
    Append,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Less => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterEqual => ">=",
            BinaryOperator::Greater => ">",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::Append => "++",
        }
    }

    pub fn is_division(&self) -> bool {
        matches!(self, BinaryOperator::Div | BinaryOperator::Mod)
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}

/// `|:` maps every element through the section, `|?` keeps elements the section accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipeKind {
    Map,
    Filter,
}

impl PipeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            PipeKind::Map => "|:",
            PipeKind::Filter => "|?",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub position: Position,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    BoolLiteral(bool),
    IntLiteral(BigInt),
    FloatLiteral(FloatValue),
    StringLiteral(String),
    ListLiteral(Vec<Expr>),
    /// `$element` inside a pipeline section.
    ListElement,
    /// `$index` inside a pipeline section.
    ListIndex,
    Pipeline {
        list: Box<Expr>,
        kind: PipeKind,
        section: Box<Expr>,
    },
    Reference(String),
    FuncReference {
        name: String,
        param_count: usize,
    },
    Binary {
        lhs: Box<Expr>,
        op: BinaryOperator,
        rhs: Box<Expr>,
    },
    PreUnary {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    Conjunction {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Disjunction {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Negation(Box<Expr>),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    MemberCall {
        object: Box<Expr>,
        member: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn new(position: Position, kind: ExprKind) -> Self {
        Expr { position, kind }
    }

    pub fn bool(position: Position, value: bool) -> Self {
        Expr::new(position, ExprKind::BoolLiteral(value))
    }

    pub fn int(position: Position, value: impl Into<BigInt>) -> Self {
        Expr::new(position, ExprKind::IntLiteral(value.into()))
    }

    pub fn float(position: Position, value: FloatValue) -> Self {
        Expr::new(position, ExprKind::FloatLiteral(value))
    }

    pub fn string(position: Position, value: &str) -> Self {
        Expr::new(position, ExprKind::StringLiteral(value.to_string()))
    }

    pub fn reference(position: Position, name: &str) -> Self {
        Expr::new(position, ExprKind::Reference(name.to_string()))
    }

    pub fn binary(position: Position, lhs: Expr, op: BinaryOperator, rhs: Expr) -> Self {
        Expr::new(
            position,
            ExprKind::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
            },
        )
    }

    pub fn pre_unary(position: Position, op: UnaryOperator, operand: Expr) -> Self {
        Expr::new(
            position,
            ExprKind::PreUnary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    pub fn call(position: Position, name: &str, args: Vec<Expr>) -> Self {
        Expr::new(
            position,
            ExprKind::Call {
                name: name.to_string(),
                args,
            },
        )
    }

    /// Only boolean and numeric literals take part in folding.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::BoolLiteral(_) | ExprKind::IntLiteral(_) | ExprKind::FloatLiteral(_)
        )
    }

    /// Value of a literal used as a condition.
    ///
    /// Anything but a boolean literal reports `ConditionNotBoolean` and reads as `false`.
    pub fn bool_value(&self, diagnostics: &mut Diagnostics) -> bool {
        match self.kind {
            ExprKind::BoolLiteral(value) => value,
            _ => {
                diagnostics.error(
                    ErrorImpl::ConditionNotBoolean {
                        type_name: self.type_name(),
                    },
                    self.position.clone(),
                );
                false
            }
        }
    }

    /// Diagnostic rendering of the node, e.g. `(int(5))` or `((int(1)) + (reference(x)))`.
    pub fn type_name(&self) -> String {
        match &self.kind {
            ExprKind::BoolLiteral(value) => format!("(bool({}))", value),
            ExprKind::IntLiteral(value) => format!("(int({}))", value),
            ExprKind::FloatLiteral(value) => format!("(float({}))", value),
            ExprKind::StringLiteral(value) => format!("(string({}))", value),
            ExprKind::ListLiteral(_) => "list".to_string(),
            ExprKind::ListElement => "list element".to_string(),
            ExprKind::ListIndex => "list index".to_string(),
            ExprKind::Pipeline {
                list,
                kind,
                section,
            } => format!(
                "({} {} {})",
                list.type_name(),
                kind.symbol(),
                section.type_name()
            ),
            ExprKind::Reference(name) => format!("(reference({}))", name),
            ExprKind::FuncReference { name, param_count } => {
                format!("(func reference({}@{}))", name, param_count)
            }
            ExprKind::Binary { lhs, op, rhs } => {
                format!("({} {} {})", lhs.type_name(), op.symbol(), rhs.type_name())
            }
            ExprKind::PreUnary { op, operand } => {
                format!("({}{})", op.symbol(), operand.type_name())
            }
            ExprKind::Conjunction { lhs, rhs } => {
                format!("({}&&{})", lhs.type_name(), rhs.type_name())
            }
            ExprKind::Disjunction { lhs, rhs } => {
                format!("({}||{})", lhs.type_name(), rhs.type_name())
            }
            ExprKind::Negation(operand) => format!("(!{})", operand.type_name()),
            ExprKind::Call { name, args } => {
                format!("(call({})({}))", name, join_type_names(args))
            }
            ExprKind::MemberCall {
                object,
                member,
                args,
            } => format!(
                "(member ({}).(call({})({})))",
                object.type_name(),
                member,
                join_type_names(args)
            ),
        }
    }
}

fn join_type_names(args: &[Expr]) -> String {
    args.iter()
        .map(|arg| arg.type_name())
        .collect::<Vec<_>>()
        .join(", ")
}
