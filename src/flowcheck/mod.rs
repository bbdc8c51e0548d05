//! Flow checking of the raw tree.
//!
//! Folds constants, collapses branches on literal predicates, drops code
//! after a return and warns about branches where only one arm returns.

use crate::{ast::statements::Block, errors::errors::Diagnostics};

pub mod accumulator;
pub mod filter;


pub fn check_program(global: Block, diagnostics: &mut Diagnostics) -> Block {
    filter::check_block(global, diagnostics)
}
