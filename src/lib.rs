#![allow(clippy::module_inception)]

use std::{fmt::Display, rc::Rc};

use crate::{
    ast::statements::Block,
    errors::errors::{Diagnostics, PipelineError},
    instance::{
        emit::{deliver_program, Emitter},
        instantiate::{instantiate_program, FunctionInstance},
        typed_ast::TypedBlock,
    },
};

pub mod ast;
pub mod builder;
pub mod config;
pub mod errors;
pub mod flowcheck;
pub mod instance;
pub mod resolve;

pub use config::Config;

/// Source line and file name a node came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position(pub u32, pub Rc<String>);

impl Position {
    pub fn null() -> Self {
        Position(0, Rc::new(String::from("<null>")))
    }

    pub fn line(&self) -> u32 {
        self.0
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.1, self.0)
    }
}

/// Result of running the semantic pipeline over one program.
#[derive(Debug)]
pub struct Compilation {
    pub global: TypedBlock,
    pub instances: Vec<FunctionInstance>,
    pub diagnostics: Diagnostics,
    warnings_as_errors: bool,
}

impl Compilation {
    pub fn has_error(&self) -> bool {
        self.diagnostics.has_error()
            || (self.warnings_as_errors && !self.diagnostics.warnings().is_empty())
    }

    /// Instances created for the function with the given name, in creation order.
    pub fn instances_named<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a FunctionInstance> + 'a {
        self.instances.iter().filter(move |i| i.name == name)
    }

    pub fn deliver<E: Emitter>(&self, emitter: &mut E) -> Result<(), PipelineError> {
        if self.has_error() {
            return Err(PipelineError::HasErrors {
                errors: self.diagnostics.errors().len(),
                warnings: self.diagnostics.warnings().len(),
            });
        }
        deliver_program(&self.global, &self.instances, emitter);
        Ok(())
    }
}

/// Runs flow checking, name resolution and instantiation over a built program.
///
/// `diagnostics` carries whatever the builder already reported; every stage
/// appends to it and none of them stop early.
pub fn compile(global: Block, mut diagnostics: Diagnostics, config: &Config) -> Compilation {
    log::debug!("flow checking global block");
    let checked = flowcheck::check_program(global, &mut diagnostics);

    log::debug!("resolving names");
    let program = resolve::resolver::resolve_program(checked, &mut diagnostics);

    log::debug!(
        "instantiating program with {} function declarations",
        program.functions.len()
    );
    let (global, instances) = instantiate_program(&program, config, &mut diagnostics);

    Compilation {
        global,
        instances,
        diagnostics,
        warnings_as_errors: config.warnings_as_errors,
    }
}
