use std::rc::Rc;

use crate::Position;

/// Knobs for one pipeline run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Longest chain of nested instantiations before giving up on a call.
    pub max_instantiation_depth: usize,
    /// Treat any recorded warning as a failed run.
    pub warnings_as_errors: bool,
    /// Source file name for front ends that build positions through
    /// `Config::position`. The pipeline itself only sees the positions.
    pub file_name: Rc<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_instantiation_depth: 256,
            warnings_as_errors: false,
            file_name: Rc::new(String::from("<input>")),
        }
    }
}

impl Config {
    /// Position on `line` of the configured file, shared by every node a front end builds.
    pub fn position(&self, line: u32) -> Position {
        Position(line, Rc::clone(&self.file_name))
    }
}
