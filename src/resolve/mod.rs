//! Name resolution.
//!
//! Turns the flow-checked tree into a tree where every reference and call
//! points at a definition, recording which variables each nested function
//! captures from its surroundings.

pub mod resolved_ast;
pub mod resolver;
pub mod symbol_table;
