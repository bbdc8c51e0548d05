//! Delivery of instantiated programs to a code emitter.
//!
//! Target code generation is not done here. [`deliver_program`] walks the
//! typed global block and every instance and hands each statement to an
//! [`Emitter`], with explicit begin/end markers around functions and blocks.
//! [`TextEmitter`] renders the walk as indented text.

use super::{
    instantiate::FunctionInstance,
    typed_ast::{Address, CaptureSource, TypedBlock, TypedExpr, TypedExprKind, TypedStmt, TypedStmtKind},
};

pub trait Emitter {
    /// Starts an instance; the global block is delivered first, outside any function.
    fn function_begin(&mut self, instance: &FunctionInstance);
    fn function_end(&mut self, instance: &FunctionInstance);

    fn block_begin(&mut self);
    fn block_end(&mut self);

    fn arithmetics(&mut self, expr: &TypedExpr);
    fn var_def(&mut self, name: &str, slot: usize, init: &TypedExpr);
    fn return_value(&mut self, value: &TypedExpr);
    fn return_nothing(&mut self);
    /// Followed by two delivered blocks, consequence then alternative.
    fn branch(&mut self, predicate: &TypedExpr);
}

pub fn deliver_program<E: Emitter>(global: &TypedBlock, instances: &[FunctionInstance], emitter: &mut E) {
    log::debug!("delivering global block and {} instances", instances.len());
    deliver_block(global, emitter);

    for instance in instances {
        emitter.function_begin(instance);
        deliver_block(&instance.body, emitter);
        emitter.function_end(instance);
    }
}

fn deliver_block<E: Emitter>(block: &TypedBlock, emitter: &mut E) {
    emitter.block_begin();
    for stmt in &block.stmts {
        deliver_statement(stmt, emitter);
    }
    emitter.block_end();
}

fn deliver_statement<E: Emitter>(stmt: &TypedStmt, emitter: &mut E) {
    match &stmt.kind {
        TypedStmtKind::Arithmetics(expr) => emitter.arithmetics(expr),
        TypedStmtKind::VarDef { name, slot, init } => emitter.var_def(name, *slot, init),
        TypedStmtKind::Return(value) => emitter.return_value(value),
        TypedStmtKind::ReturnNothing => emitter.return_nothing(),
        TypedStmtKind::Branch {
            predicate,
            consequence,
            alternative,
        } => {
            emitter.branch(predicate);
            deliver_block(consequence, emitter);
            deliver_block(alternative, emitter);
        }
    }
}

/// Renders a delivered program as indented text, one statement per line.
#[derive(Debug, Default)]
pub struct TextEmitter {
    output: String,
    indent: usize,
}

impl TextEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn into_output(self) -> String {
        self.output
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
        self.output.push_str(text);
        self.output.push('\n');
    }
}

impl Emitter for TextEmitter {
    fn function_begin(&mut self, instance: &FunctionInstance) {
        let params = instance
            .params
            .iter()
            .map(|p| format!("{}: {}", p.name, p.ty))
            .collect::<Vec<_>>()
            .join(", ");
        let returns = instance
            .return_type
            .as_ref()
            .map(|t| t.to_string())
            .unwrap_or_else(|| "bad".to_string());
        self.line(&format!("fn {}#{}({}) -> {}", instance.name, instance.id.0, params, returns));

        if !instance.captures.is_empty() {
            let captures = instance
                .captures
                .iter()
                .map(|c| format!("{}: {}", c.name, c.ty))
                .collect::<Vec<_>>()
                .join(", ");
            self.line(&format!("captures {}", captures));
        }
    }

    fn function_end(&mut self, _instance: &FunctionInstance) {}

    fn block_begin(&mut self) {
        self.line("{");
        self.indent += 1;
    }

    fn block_end(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.line("}");
    }

    fn arithmetics(&mut self, expr: &TypedExpr) {
        self.line(&render_expr(expr));
    }

    fn var_def(&mut self, name: &str, slot: usize, init: &TypedExpr) {
        self.line(&format!("{}@{}: {} = {}", name, slot, init.ty, render_expr(init)));
    }

    fn return_value(&mut self, value: &TypedExpr) {
        self.line(&format!("return {}", render_expr(value)));
    }

    fn return_nothing(&mut self) {
        self.line("return");
    }

    fn branch(&mut self, predicate: &TypedExpr) {
        self.line(&format!("if {}", render_expr(predicate)));
    }
}

fn render_list(exprs: &[TypedExpr]) -> String {
    exprs.iter().map(render_expr).collect::<Vec<_>>().join(", ")
}

pub fn render_expr(expr: &TypedExpr) -> String {
    match &expr.kind {
        TypedExprKind::BoolLiteral(value) => value.to_string(),
        TypedExprKind::IntLiteral(value) => value.to_string(),
        TypedExprKind::FloatLiteral(value) => value.to_string(),
        TypedExprKind::StringLiteral(value) => format!("{:?}", value),
        TypedExprKind::ListLiteral(elements) => format!("[{}]", render_list(elements)),
        TypedExprKind::ListElement => "$element".to_string(),
        TypedExprKind::ListIndex => "$index".to_string(),
        TypedExprKind::Pipeline {
            list,
            kind,
            section,
        } => format!(
            "({} {} {})",
            render_expr(list),
            kind.symbol(),
            render_expr(section)
        ),
        TypedExprKind::Reference { name, address } => match address {
            Address::Local(slot) => format!("{}@{}", name, slot),
            Address::Capture(index) => format!("{}^{}", name, index),
        },
        TypedExprKind::FuncReference { captures, .. } => {
            format!("&{}[{}]", expr.ty, render_list(captures))
        }
        TypedExprKind::Binary { lhs, op, rhs } => {
            format!("({} {} {})", render_expr(lhs), op.symbol(), render_expr(rhs))
        }
        TypedExprKind::PreUnary { op, operand } => {
            format!("{}{}", op.symbol(), render_expr(operand))
        }
        TypedExprKind::Conjunction { lhs, rhs } => {
            format!("({} && {})", render_expr(lhs), render_expr(rhs))
        }
        TypedExprKind::Disjunction { lhs, rhs } => {
            format!("({} || {})", render_expr(lhs), render_expr(rhs))
        }
        TypedExprKind::Negation(operand) => format!("!{}", render_expr(operand)),
        TypedExprKind::Call {
            instance,
            args,
            captures,
        } => {
            let call = format!("#{}({})", instance.0, render_list(args));
            match captures {
                CaptureSource::Environment(values) if values.is_empty() => call,
                CaptureSource::Environment(values) => format!("{}[{}]", call, render_list(values)),
                CaptureSource::Reference(reference) => {
                    format!("{}[via {}]", call, render_expr(reference))
                }
            }
        }
        TypedExprKind::MemberCall {
            object,
            member,
            args,
        } => format!("{}.{}({})", render_expr(object), member, render_list(args)),
        TypedExprKind::Bad => "<bad>".to_string(),
    }
}
