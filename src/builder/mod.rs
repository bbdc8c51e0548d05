//! Builder module for constructing the raw syntax tree.
//!
//! Front ends call into `TreeBuilder` in source order; grammar is not
//! validated here beyond matching alternatives with their branches.

pub mod builder;
