//! Typed instantiation.
//!
//! Submodules:
//! - types: Static types
//! - operators: Operator and member result types
//! - typed_ast: Typed representation handed to emission
//! - instantiate: Instance creation, caching and return type resolution
//! - emit: Emitter contract and a text emitter
pub mod emit;
pub mod instantiate;
pub mod operators;
pub mod typed_ast;
pub mod types;

#[cfg(test)]
mod tests;
