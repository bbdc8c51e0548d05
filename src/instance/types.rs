//! Static types of the instantiation stage.

use std::fmt::Display;

use crate::resolve::symbol_table::FunctionId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Void,
    Bool,
    Int,
    Float,
    String,
    /// `List(Void)` is the empty list literal and fits any list.
    List(Box<Type>),
    /// A function named by `name@arity`, together with the types of what it captures.
    FuncReference {
        func: FunctionId,
        name: String,
        param_count: usize,
        captures: Vec<Type>,
    },
    /// Result of an expression that already produced an error.
    Bad,
    /// Result of a call whose callee has no return type yet.
    Unresolved,
}

impl Type {
    pub fn list_of(element: Type) -> Type {
        Type::List(Box::new(element))
    }

    /// Bad and unresolved types never produce further diagnostics.
    pub fn is_silent(&self) -> bool {
        matches!(self, Type::Bad | Type::Unresolved)
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::List(element) => Some(element),
            _ => None,
        }
    }

    /// Unresolved wins over bad so that pending work is retried.
    pub fn silent_of(lhs: &Type, rhs: &Type) -> Option<Type> {
        if matches!(lhs, Type::Unresolved) || matches!(rhs, Type::Unresolved) {
            Some(Type::Unresolved)
        } else if lhs.is_silent() || rhs.is_silent() {
            Some(Type::Bad)
        } else {
            None
        }
    }

    /// Common type of two list-compatible types, if any.
    pub fn unify(&self, other: &Type) -> Option<Type> {
        match (self, other) {
            (Type::List(lhs), Type::List(rhs)) => match (lhs.as_ref(), rhs.as_ref()) {
                (Type::Void, _) => Some(other.clone()),
                (_, Type::Void) => Some(self.clone()),
                _ => lhs.unify(rhs).map(Type::list_of),
            },
            _ if self == other => Some(self.clone()),
            _ => None,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::List(element) => write!(f, "list[{}]", element),
            Type::FuncReference {
                name, param_count, ..
            } => write!(f, "func reference({}@{})", name, param_count),
            Type::Bad => write!(f, "bad"),
            Type::Unresolved => write!(f, "unresolved"),
        }
    }
}
