use std::fmt::Display;

use thiserror::Error;

use crate::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnreachableStatement { .. } => "UnreachableStatement",
            ErrorImpl::ConditionNotBoolean { .. } => "ConditionNotBoolean",
            ErrorImpl::BinaryOperatorUnavailable { .. } => "BinaryOperatorUnavailable",
            ErrorImpl::UnaryOperatorUnavailable { .. } => "UnaryOperatorUnavailable",
            ErrorImpl::DivideOrModuloByLiteralZero { .. } => "DivideOrModuloByLiteralZero",
            ErrorImpl::UnresolvableReference { .. } => "UnresolvableReference",
            ErrorImpl::UnresolvableCall { .. } => "UnresolvableCall",
            ErrorImpl::ReturnTypeUnresolvable { .. } => "ReturnTypeUnresolvable",
            ErrorImpl::ElseWithoutMatchingBranch => "ElseWithoutMatchingBranch",
            ErrorImpl::VariableAlreadyDeclared { .. } => "VariableAlreadyDeclared",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::ReturnTypeConflict { .. } => "ReturnTypeConflict",
            ErrorImpl::ListElementTypeMismatch { .. } => "ListElementTypeMismatch",
            ErrorImpl::MemberCallUnavailable { .. } => "MemberCallUnavailable",
            ErrorImpl::ListContextUnavailable { .. } => "ListContextUnavailable",
            ErrorImpl::NotCallable { .. } => "NotCallable",
            ErrorImpl::InstantiationTooDeep { .. } => "InstantiationTooDeep",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnreachableStatement { terminated_at } => ErrorTip::Suggestion(format!(
                "Flow already terminated at {}, this statement is unreachable",
                terminated_at
            )),
            ErrorImpl::ConditionNotBoolean { type_name } => ErrorTip::Suggestion(format!(
                "Condition `{}` is not a boolean",
                type_name
            )),
            ErrorImpl::BinaryOperatorUnavailable {
                operator,
                lhs_type,
                rhs_type,
            } => ErrorTip::Suggestion(format!(
                "Operator `{}` is not available between `{}` and `{}`",
                operator, lhs_type, rhs_type
            )),
            ErrorImpl::UnaryOperatorUnavailable {
                operator,
                operand_type,
            } => ErrorTip::Suggestion(format!(
                "Operator `{}` is not available for `{}`",
                operator, operand_type
            )),
            ErrorImpl::DivideOrModuloByLiteralZero { operator } => ErrorTip::Suggestion(format!(
                "Right hand side of `{}` is a literal zero",
                operator
            )),
            ErrorImpl::UnresolvableReference { name } => {
                ErrorTip::Suggestion(format!("Variable `{}` not declared", name))
            }
            ErrorImpl::UnresolvableCall { name, arg_count } => ErrorTip::Suggestion(format!(
                "No function `{}` taking {} arguments found",
                name, arg_count
            )),
            ErrorImpl::ReturnTypeUnresolvable { name, arg_count } => ErrorTip::Suggestion(format!(
                "Return type of `{}` with {} arguments cannot be resolved, does every path recurse?",
                name, arg_count
            )),
            ErrorImpl::ElseWithoutMatchingBranch => ErrorTip::None,
            ErrorImpl::VariableAlreadyDeclared { variable, previous } => {
                ErrorTip::Suggestion(format!(
                    "Variable `{}` already declared at {}",
                    variable, previous
                ))
            }
            ErrorImpl::FunctionAlreadyDeclared {
                function,
                param_count,
            } => ErrorTip::Suggestion(format!(
                "Function `{}` taking {} parameters already declared",
                function, param_count
            )),
            ErrorImpl::ReturnTypeConflict { expected, received } => ErrorTip::Suggestion(format!(
                "Expected return type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ListElementTypeMismatch { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Expected list element type `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::MemberCallUnavailable { member, type_name } => ErrorTip::Suggestion(
                format!("Type `{}` has no member `{}`", type_name, member),
            ),
            ErrorImpl::ListContextUnavailable { expression } => ErrorTip::Suggestion(format!(
                "`{}` is only available inside a list pipeline",
                expression
            )),
            ErrorImpl::NotCallable { name, type_name } => ErrorTip::Suggestion(format!(
                "`{}` of type `{}` cannot be called",
                name, type_name
            )),
            ErrorImpl::InstantiationTooDeep { name, depth } => ErrorTip::Suggestion(format!(
                "Instantiating `{}` exceeded the depth limit of {}",
                name, depth
            )),
        }
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("flow already terminated at {terminated_at}, statement unreachable")]
    UnreachableStatement { terminated_at: Position },
    #[error("condition is not boolean: {type_name}")]
    ConditionNotBoolean { type_name: String },
    #[error("binary operator {operator} not available for {lhs_type:?} and {rhs_type:?}")]
    BinaryOperatorUnavailable {
        operator: String,
        lhs_type: String,
        rhs_type: String,
    },
    #[error("unary operator {operator} not available for {operand_type:?}")]
    UnaryOperatorUnavailable {
        operator: String,
        operand_type: String,
    },
    #[error("{operator} by literal zero")]
    DivideOrModuloByLiteralZero { operator: String },
    #[error("reference {name:?} cannot be resolved")]
    UnresolvableReference { name: String },
    #[error("call to {name:?} with {arg_count} arguments cannot be resolved")]
    UnresolvableCall { name: String, arg_count: usize },
    #[error("cannot resolve return type of {name:?} with {arg_count} arguments")]
    ReturnTypeUnresolvable { name: String, arg_count: usize },
    #[error("else without matching branch")]
    ElseWithoutMatchingBranch,
    #[error("variable {variable:?} already declared")]
    VariableAlreadyDeclared { variable: String, previous: Position },
    #[error("function {function:?} with {param_count} parameters already declared")]
    FunctionAlreadyDeclared { function: String, param_count: usize },
    #[error("return types do not match: expected {expected:?}, received {received:?}")]
    ReturnTypeConflict { expected: String, received: String },
    #[error("list element types do not match: expected {expected:?}, received {received:?}")]
    ListElementTypeMismatch { expected: String, received: String },
    #[error("member {member:?} not available for {type_name:?}")]
    MemberCallUnavailable { member: String, type_name: String },
    #[error("{expression} outside of list context")]
    ListContextUnavailable { expression: String },
    #[error("{name:?} of type {type_name:?} is not callable")]
    NotCallable { name: String, type_name: String },
    #[error("instantiation of {name:?} exceeded depth {depth}")]
    InstantiationTooDeep { name: String, depth: usize },
}

/// Failures of the pipeline as a whole, as opposed to diagnostics about the program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("refusing to deliver a program with {errors} errors and {warnings} warnings")]
    HasErrors { errors: usize, warnings: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    internal_warning: WarningImpl,
    position: Position,
}

impl Warning {
    pub fn new(warning_impl: WarningImpl, position: Position) -> Self {
        Warning {
            internal_warning: warning_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &WarningImpl {
        &self.internal_warning
    }

    pub fn get_warning_name(&self) -> &str {
        match &self.internal_warning {
            WarningImpl::ConsequenceBranchTerminatedEarly => "ConsequenceBranchTerminatedEarly",
            WarningImpl::AlternativeBranchTerminatedEarly => "AlternativeBranchTerminatedEarly",
            WarningImpl::BothBranchesTerminated { .. } => "BothBranchesTerminated",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WarningImpl {
    #[error("consequence branch terminated early")]
    ConsequenceBranchTerminatedEarly,
    #[error("alternative branch terminated early")]
    AlternativeBranchTerminatedEarly,
    #[error("both branches terminated, at {consequence} and {alternative}")]
    BothBranchesTerminated {
        consequence: Position,
        alternative: Position,
    },
}

/// Append-only sink for everything a pipeline run reports.
///
/// Passes never stop at the first problem; they record it here and keep
/// going with a placeholder so later nodes still get checked.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    errors: Vec<Error>,
    warnings: Vec<Warning>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn error(&mut self, error_impl: ErrorImpl, position: Position) {
        log::debug!("error at {}: {}", position, error_impl);
        self.errors.push(Error::new(error_impl, position));
    }

    pub fn warning(&mut self, warning_impl: WarningImpl, position: Position) {
        log::debug!("warning at {}: {}", position, warning_impl);
        self.warnings.push(Warning::new(warning_impl, position));
    }

    pub fn has_error(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    /// Errors of one kind, selected by `get_error_name()`.
    pub fn errors_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Error> + 'a {
        self.errors.iter().filter(move |e| e.get_error_name() == name)
    }

    pub fn warnings_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Warning> + 'a {
        self.warnings
            .iter()
            .filter(move |w| w.get_warning_name() == name)
    }
}

/// Formats an error against the source text it points into.
///
/// ```text
/// Error: ConditionNotBoolean (Condition `(int(1))` is not a boolean)
/// -> main.stk
///    |
/// 20 | if 1
///    | ^
/// ```
pub fn render_error(error: &Error, source: &str) -> String {
    let position = error.get_position();
    let mut rendered = String::new();

    if let ErrorTip::None = error.get_tip() {
        rendered.push_str(&format!("Error: {}\n", error.get_error_name()));
    } else {
        rendered.push_str(&format!(
            "Error: {} ({})\n",
            error.get_error_name(),
            error.get_tip()
        ));
    }
    rendered.push_str(&format!("-> {}\n", position.1));

    let line = position.0;
    let line_string = line.to_string();
    let padding = line_string.len() + 2;

    match get_line(source, line) {
        Some(line_text) => {
            let line_text = remove_starting_whitespace(line_text);
            rendered.push_str(&format!("{:>padding$}\n", "|"));
            rendered.push_str(&format!("{} | {}\n", line_string, line_text.trim_end()));
            rendered.push_str(&format!("{:>padding$} ^\n", "|"));
        }
        None => {
            rendered.push_str(&format!("{:>padding$} (line {} not in source)\n", "|", line));
        }
    }

    rendered
}

fn get_line(source: &str, line: u32) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source.split('\n').nth(line as usize - 1)
}

/// Positions carry no column, so the caret always sits under the first
/// non-blank character.
fn remove_starting_whitespace(string: &str) -> &str {
    string.trim_start_matches([' ', '\t'])
}
