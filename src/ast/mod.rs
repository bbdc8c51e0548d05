/// AST (Abstract Syntax Tree) module
/// Contains the raw tree handed over by the builder and constant folding over it
///
/// Submodules:
/// - expressions: Expression nodes and operators
/// - statements: Statements, blocks and function declarations
/// - numeric: Arbitrary-precision literal values
/// - operators: Literal folding tables
/// - fold: Constant folder
pub mod expressions;
pub mod fold;
pub mod numeric;
pub mod operators;
pub mod statements;
