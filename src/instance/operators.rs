//! Operator and member tables over static types.

use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::ast::expressions::{BinaryOperator, UnaryOperator};

use super::types::Type;

lazy_static! {
    pub static ref BINARY_RESULT_TYPES: HashMap<(BinaryOperator, Type, Type), Type> = {
        let mut map = HashMap::new();
        let numeric = [Type::Int, Type::Float];

        for op in [BinaryOperator::Add, BinaryOperator::Sub, BinaryOperator::Mul, BinaryOperator::Div] {
            for lhs in &numeric {
                for rhs in &numeric {
                    let result = if *lhs == Type::Int && *rhs == Type::Int {
                        Type::Int
                    } else {
                        Type::Float
                    };
                    map.insert((op, lhs.clone(), rhs.clone()), result);
                }
            }
        }
        map.insert((BinaryOperator::Mod, Type::Int, Type::Int), Type::Int);

        for op in [
            BinaryOperator::Less,
            BinaryOperator::LessEqual,
            BinaryOperator::GreaterEqual,
            BinaryOperator::Greater,
            BinaryOperator::Equal,
            BinaryOperator::NotEqual,
        ] {
            for lhs in &numeric {
                for rhs in &numeric {
                    map.insert((op, lhs.clone(), rhs.clone()), Type::Bool);
                }
            }
            map.insert((op, Type::String, Type::String), Type::Bool);
        }
        map.insert((BinaryOperator::Equal, Type::Bool, Type::Bool), Type::Bool);
        map.insert((BinaryOperator::NotEqual, Type::Bool, Type::Bool), Type::Bool);
        map.insert((BinaryOperator::Add, Type::String, Type::String), Type::String);

        map
    };

    pub static ref UNARY_RESULT_TYPES: HashMap<(UnaryOperator, Type), Type> = {
        let mut map = HashMap::new();
        for op in [UnaryOperator::Plus, UnaryOperator::Minus] {
            map.insert((op, Type::Int), Type::Int);
            map.insert((op, Type::Float), Type::Float);
        }
        map
    };
}

/// Result type of `lhs op rhs`, `None` if unavailable.
pub fn binary_result(op: BinaryOperator, lhs: &Type, rhs: &Type) -> Option<Type> {
    if op == BinaryOperator::Append {
        return match (lhs, rhs) {
            (Type::List(_), Type::List(_)) => lhs.unify(rhs),
            _ => None,
        };
    }
    BINARY_RESULT_TYPES
        .get(&(op, lhs.clone(), rhs.clone()))
        .cloned()
}

pub fn unary_result(op: UnaryOperator, operand: &Type) -> Option<Type> {
    UNARY_RESULT_TYPES.get(&(op, operand.clone())).cloned()
}

/// Result type of a built-in member call on `object`.
pub fn member_result(object: &Type, member: &str, arg_count: usize) -> Option<Type> {
    if arg_count != 0 {
        return None;
    }
    match (object, member) {
        (Type::List(_) | Type::String, "size") => Some(Type::Int),
        (Type::List(_) | Type::String, "empty") => Some(Type::Bool),
        (Type::List(element), "first" | "last") => Some(element.as_ref().clone()),
        _ => None,
    }
}
