//! Diagnostics produced by the semantic passes.
//!
//! This module defines everything a pipeline run can report:
//!
//! - Error structures with source position information
//! - Warnings for suspicious but legal control flow
//! - The `Diagnostics` sink threaded through every pass
//! - Error formatting against the source text

pub mod errors;
