//! Function instantiation engine.
//!
//! Functions are untyped templates. Each call site asks for an instance of
//! the callee specialized to its argument types (and the types of whatever
//! the callee captures); instances are cached by that key.
//!
//! A body is compiled in passes. A pass that calls an instance whose return
//! type is still unknown types the call as `Unresolved` and records the
//! dependency. When a pass ends with such dependencies the instance waits:
//! its diagnostics are held back and it is compiled again once one of them
//! resolves. Whatever is still waiting when nothing more can resolve gets
//! `ReturnTypeUnresolvable`.
//!
//! New instances are never compiled from inside the pass that asked for
//! them. They go onto a queue that the engine works through, so the depth of
//! polymorphic recursion is bounded by `max_instantiation_depth` and not by
//! the native stack.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use crate::{
    ast::expressions::PipeKind,
    errors::errors::{Diagnostics, ErrorImpl},
    resolve::{
        resolved_ast::{FunctionDecl, ProtoBlock, ProtoExpr, ProtoExprKind, ProtoProgram, ProtoStmt, ProtoStmtKind},
        symbol_table::{FunctionId, VariableBinding},
    },
    Config, Position,
};

use super::{
    operators::{binary_result, member_result, unary_result},
    typed_ast::{
        Address, CaptureSource, InstanceId, Slot, TypedBlock, TypedExpr, TypedExprKind,
        TypedStmt, TypedStmtKind,
    },
    types::Type,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub func: FunctionId,
    pub args: Vec<Type>,
    pub captures: Vec<Type>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InstanceState {
    /// Created or woken up, not compiled yet.
    #[default]
    Queued,
    Compiling,
    /// Last pass depended on instances without a return type.
    Waiting,
    Done,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureSlot {
    pub name: String,
    pub level: usize,
    pub ty: Type,
}

#[derive(Debug, Clone, Default)]
struct Progress {
    state: InstanceState,
    pending_on: BTreeSet<InstanceId>,
    /// Diagnostics of a pass that is waiting, committed once it settles.
    held: Diagnostics,
}

#[derive(Debug, Clone)]
pub struct FunctionInstance {
    pub id: InstanceId,
    pub func: FunctionId,
    pub name: String,
    pub position: Position,
    pub params: Vec<Slot>,
    pub captures: Vec<CaptureSlot>,
    /// Parameters followed by every local variable, in slot order.
    pub locals: Vec<Slot>,
    /// `None` while unresolved, or when every return path failed to type.
    pub return_type: Option<Type>,
    pub body: TypedBlock,
    depth: usize,
    progress: Progress,
    /// Returns whose value was unresolved in some earlier pass.
    pending_paths: HashSet<Position>,
}

impl FunctionInstance {
    pub fn arg_types(&self) -> Vec<Type> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    pub fn state(&self) -> InstanceState {
        self.progress.state
    }
}

#[derive(Debug, Default)]
struct GlobalUnit {
    body: TypedBlock,
    locals: Vec<Slot>,
    progress: Progress,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subject {
    Global,
    Instance(InstanceId),
}

struct PassOutcome {
    body: TypedBlock,
    locals: Vec<Slot>,
    diagnostics: Diagnostics,
    pending_on: BTreeSet<InstanceId>,
    unresolved_returns: Vec<Position>,
}

struct Engine<'p> {
    program: &'p ProtoProgram,
    max_depth: usize,
    instances: Vec<FunctionInstance>,
    cache: HashMap<InstanceKey, InstanceId>,
    global: GlobalUnit,
    queue: VecDeque<Subject>,
    diagnostics: Diagnostics,
}

/// Instantiates everything reachable from the global block.
///
/// Returns the typed global block and all instances, indexed by `InstanceId`.
pub fn instantiate_program(
    program: &ProtoProgram,
    config: &Config,
    diagnostics: &mut Diagnostics,
) -> (TypedBlock, Vec<FunctionInstance>) {
    let mut engine = Engine {
        program,
        max_depth: config.max_instantiation_depth,
        instances: Vec::new(),
        cache: HashMap::new(),
        global: GlobalUnit::default(),
        queue: VecDeque::from([Subject::Global]),
        diagnostics: Diagnostics::new(),
    };

    engine.drain();

    log::debug!("instantiation created {} instances", engine.instances.len());
    diagnostics.extend(engine.diagnostics);
    (engine.global.body, engine.instances)
}

impl<'p> Engine<'p> {
    fn progress(&self, subject: Subject) -> &Progress {
        match subject {
            Subject::Global => &self.global.progress,
            Subject::Instance(id) => &self.instances[id.0].progress,
        }
    }

    fn progress_mut(&mut self, subject: Subject) -> &mut Progress {
        match subject {
            Subject::Global => &mut self.global.progress,
            Subject::Instance(id) => &mut self.instances[id.0].progress,
        }
    }

    fn subjects(&self) -> Vec<Subject> {
        std::iter::once(Subject::Global)
            .chain((0..self.instances.len()).map(|i| Subject::Instance(InstanceId(i))))
            .collect()
    }

    /// No longer worth waiting for: either typed, or finished without a type.
    fn is_settled(&self, id: InstanceId) -> bool {
        let instance = &self.instances[id.0];
        instance.return_type.is_some() || instance.progress.state == InstanceState::Done
    }

    fn instantiate(
        &mut self,
        key: InstanceKey,
        depth: usize,
        position: &Position,
        diagnostics: &mut Diagnostics,
    ) -> Option<InstanceId> {
        if let Some(id) = self.cache.get(&key) {
            return Some(*id);
        }

        let program = self.program;
        let decl = program.function(key.func);
        if depth > self.max_depth {
            diagnostics.error(
                ErrorImpl::InstantiationTooDeep {
                    name: decl.name.clone(),
                    depth: self.max_depth,
                },
                position.clone(),
            );
            return None;
        }

        let id = InstanceId(self.instances.len());
        let params: Vec<Slot> = decl
            .params
            .iter()
            .zip(&key.args)
            .enumerate()
            .map(|(slot, (name, ty))| Slot {
                name: name.clone(),
                ty: ty.clone(),
                slot,
            })
            .collect();
        let captures = decl
            .captures
            .iter()
            .zip(&key.captures)
            .map(|(binding, ty)| CaptureSlot {
                name: binding.name.clone(),
                level: binding.level,
                ty: ty.clone(),
            })
            .collect();
        let return_type = if decl.returns_void() {
            Some(Type::Void)
        } else {
            None
        };

        log::debug!(
            "instantiating {}({}) as #{}",
            decl.name,
            key.args
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            id.0
        );

        self.instances.push(FunctionInstance {
            id,
            func: key.func,
            name: decl.name.clone(),
            position: decl.position.clone(),
            locals: params.clone(),
            params,
            captures,
            return_type,
            body: TypedBlock::default(),
            depth,
            progress: Progress::default(),
            pending_paths: HashSet::new(),
        });
        self.cache.insert(key, id);
        self.queue.push_back(Subject::Instance(id));
        Some(id)
    }

    /// Compiles `subject` until it either settles or has to wait.
    fn run(&mut self, subject: Subject) {
        loop {
            self.progress_mut(subject).state = InstanceState::Compiling;
            let outcome = self.compile_pass(subject);

            if let Subject::Instance(id) = subject {
                self.instances[id.0]
                    .pending_paths
                    .extend(outcome.unresolved_returns.iter().cloned());
            }

            let retry = outcome
                .pending_on
                .iter()
                .any(|dependency| self.is_settled(*dependency));
            if retry {
                log::trace!("{:?} saw a dependency resolve, compiling again", subject);
                continue;
            }

            self.apply(subject, outcome);
            return;
        }
    }

    fn apply(&mut self, subject: Subject, outcome: PassOutcome) {
        let PassOutcome {
            body,
            locals,
            diagnostics,
            pending_on,
            ..
        } = outcome;

        match subject {
            Subject::Global => {
                self.global.body = body;
                self.global.locals = locals;
            }
            Subject::Instance(id) => {
                let instance = &mut self.instances[id.0];
                instance.body = body;
                instance.locals = locals;
            }
        }

        let waiting = !pending_on.is_empty();
        let progress = self.progress_mut(subject);
        progress.pending_on = pending_on;
        if waiting {
            log::debug!("{:?} waits on {:?}", subject, progress.pending_on);
            progress.state = InstanceState::Waiting;
            progress.held = diagnostics;
        } else {
            progress.state = InstanceState::Done;
            progress.held = Diagnostics::new();
            self.diagnostics.extend(diagnostics);
        }
    }

    /// Works through the queue, then wakes waiting subjects whose
    /// dependencies settled, until neither makes progress.
    fn drain(&mut self) {
        loop {
            while let Some(subject) = self.queue.pop_front() {
                self.run(subject);
            }

            let ready: Vec<Subject> = self
                .subjects()
                .into_iter()
                .filter(|subject| {
                    let progress = self.progress(*subject);
                    progress.state == InstanceState::Waiting
                        && progress
                            .pending_on
                            .iter()
                            .any(|dependency| self.is_settled(*dependency))
                })
                .collect();
            if ready.is_empty() {
                break;
            }
            for subject in ready {
                self.progress_mut(subject).state = InstanceState::Queued;
                self.queue.push_back(subject);
            }
        }

        for subject in self.subjects() {
            let progress = self.progress_mut(subject);
            if progress.state != InstanceState::Waiting {
                continue;
            }
            progress.state = InstanceState::Done;
            let held = std::mem::take(&mut progress.held);
            self.diagnostics.extend(held);

            if let Subject::Instance(id) = subject {
                let instance = &self.instances[id.0];
                if instance.return_type.is_none() {
                    self.diagnostics.error(
                        ErrorImpl::ReturnTypeUnresolvable {
                            name: instance.name.clone(),
                            arg_count: instance.params.len(),
                        },
                        instance.position.clone(),
                    );
                }
            }
        }
    }

    fn compile_pass(&mut self, subject: Subject) -> PassOutcome {
        let program = self.program;
        let (block, frame, captures, depth) = match subject {
            Subject::Global => (&program.global, Frame::new(0), Vec::new(), 0),
            Subject::Instance(id) => {
                let instance = &self.instances[id.0];
                let decl = program.function(instance.func);
                let mut frame = Frame::new(decl.body_level());
                for param in &instance.params {
                    frame.define(&param.name, param.ty.clone(), param.slot);
                }
                (
                    &decl.body,
                    frame,
                    instance.captures.clone(),
                    instance.depth,
                )
            }
        };
        let locals = match subject {
            Subject::Global => Vec::new(),
            Subject::Instance(id) => self.instances[id.0].params.clone(),
        };

        let mut pass = Pass {
            engine: self,
            subject,
            depth,
            body_level: frame.level,
            captures,
            frames: vec![frame],
            next_slot: locals.len(),
            locals,
            list_contexts: Vec::new(),
            diagnostics: Diagnostics::new(),
            pending_on: BTreeSet::new(),
            unresolved_returns: Vec::new(),
        };
        let body = pass.stmts(&block.stmts);

        PassOutcome {
            body,
            locals: pass.locals,
            diagnostics: pass.diagnostics,
            pending_on: pass.pending_on,
            unresolved_returns: pass.unresolved_returns,
        }
    }
}

#[derive(Debug)]
struct Frame {
    level: usize,
    vars: HashMap<String, (Type, usize)>,
}

impl Frame {
    fn new(level: usize) -> Self {
        Frame {
            level,
            vars: HashMap::new(),
        }
    }

    fn define(&mut self, name: &str, ty: Type, slot: usize) {
        self.vars.insert(name.to_string(), (ty, slot));
    }
}

/// One compilation of one body.
struct Pass<'e, 'p> {
    engine: &'e mut Engine<'p>,
    subject: Subject,
    depth: usize,
    body_level: usize,
    captures: Vec<CaptureSlot>,
    frames: Vec<Frame>,
    locals: Vec<Slot>,
    next_slot: usize,
    /// Element types of the enclosing list pipelines, innermost last.
    list_contexts: Vec<Type>,
    diagnostics: Diagnostics,
    pending_on: BTreeSet<InstanceId>,
    unresolved_returns: Vec<Position>,
}

impl<'e, 'p> Pass<'e, 'p> {
    fn program(&self) -> &'p ProtoProgram {
        self.engine.program
    }

    fn stmts(&mut self, stmts: &[ProtoStmt]) -> TypedBlock {
        TypedBlock {
            stmts: stmts.iter().map(|stmt| self.stmt(stmt)).collect(),
        }
    }

    fn arm(&mut self, block: &ProtoBlock) -> TypedBlock {
        self.frames.push(Frame::new(block.level));
        let typed = self.stmts(&block.stmts);
        self.frames.pop();
        typed
    }

    fn stmt(&mut self, stmt: &ProtoStmt) -> TypedStmt {
        let position = stmt.position.clone();

        let kind = match &stmt.kind {
            ProtoStmtKind::Arithmetics(expr) => TypedStmtKind::Arithmetics(self.expr(expr)),
            ProtoStmtKind::VarDef { name, init } => {
                let init = self.expr(init);
                let slot = self.next_slot;
                self.next_slot += 1;
                if let Some(frame) = self.frames.last_mut() {
                    frame.define(name, init.ty.clone(), slot);
                }
                self.locals.push(Slot {
                    name: name.clone(),
                    ty: init.ty.clone(),
                    slot,
                });
                TypedStmtKind::VarDef {
                    name: name.clone(),
                    slot,
                    init,
                }
            }
            ProtoStmtKind::Return(value) => {
                let value = self.expr(value);
                self.add_return(&position, &value.ty);
                TypedStmtKind::Return(value)
            }
            ProtoStmtKind::ReturnNothing => {
                self.add_return(&position, &Type::Void);
                TypedStmtKind::ReturnNothing
            }
            ProtoStmtKind::Branch {
                predicate,
                consequence,
                alternative,
            } => {
                let predicate = self.expr(predicate);
                self.expect_bool(&predicate);
                TypedStmtKind::Branch {
                    predicate,
                    consequence: self.arm(consequence),
                    alternative: self.arm(alternative),
                }
            }
        };

        TypedStmt { position, kind }
    }

    /// Checks a returned type against the instance's return type, fixing it on first sight.
    fn add_return(&mut self, position: &Position, ty: &Type) {
        let Subject::Instance(id) = self.subject else {
            return;
        };
        match ty {
            Type::Unresolved => {
                self.unresolved_returns.push(position.clone());
                return;
            }
            Type::Bad => return,
            _ => {}
        }

        let instance = &mut self.engine.instances[id.0];
        let Some(expected) = instance.return_type.clone() else {
            log::debug!("{} #{} returns {}", instance.name, id.0, ty);
            instance.return_type = Some(ty.clone());
            return;
        };
        if let Some(unified) = expected.unify(ty) {
            if unified != expected {
                log::debug!("{} #{} narrows to {}", instance.name, id.0, unified);
                instance.return_type = Some(unified);
            }
            return;
        }

        if instance.pending_paths.contains(position) {
            self.diagnostics.error(
                ErrorImpl::ReturnTypeUnresolvable {
                    name: instance.name.clone(),
                    arg_count: instance.params.len(),
                },
                position.clone(),
            );
        } else {
            self.diagnostics.error(
                ErrorImpl::ReturnTypeConflict {
                    expected: expected.to_string(),
                    received: ty.to_string(),
                },
                position.clone(),
            );
        }
    }

    fn expect_bool(&mut self, expr: &TypedExpr) {
        if !expr.ty.is_silent() && expr.ty != Type::Bool {
            self.diagnostics.error(
                ErrorImpl::ConditionNotBoolean {
                    type_name: expr.ty.to_string(),
                },
                expr.position.clone(),
            );
        }
    }

    fn lookup(&self, binding: &VariableBinding) -> Option<(Type, Address)> {
        if binding.level < self.body_level {
            return self
                .captures
                .iter()
                .position(|c| c.name == binding.name && c.level == binding.level)
                .map(|index| (self.captures[index].ty.clone(), Address::Capture(index)));
        }
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.level == binding.level)
            .and_then(|frame| frame.vars.get(&binding.name))
            .map(|(ty, slot)| (ty.clone(), Address::Local(*slot)))
    }

    fn reference(&mut self, position: &Position, binding: &VariableBinding) -> TypedExpr {
        match self.lookup(binding) {
            Some((ty, address)) => TypedExpr::new(
                position.clone(),
                ty,
                TypedExprKind::Reference {
                    name: binding.name.clone(),
                    address,
                },
            ),
            None => {
                self.diagnostics.error(
                    ErrorImpl::UnresolvableReference {
                        name: binding.name.clone(),
                    },
                    position.clone(),
                );
                TypedExpr::bad(position.clone())
            }
        }
    }

    /// Reads the current values of everything `decl` captures.
    fn capture_values(&mut self, decl: &FunctionDecl, position: &Position) -> Option<Vec<TypedExpr>> {
        let mut values = Vec::with_capacity(decl.captures.len());
        for binding in &decl.captures {
            let value = self.reference(position, binding);
            if value.ty == Type::Bad {
                return None;
            }
            values.push(value);
        }
        Some(values)
    }

    fn exprs(&mut self, exprs: &[ProtoExpr]) -> Vec<TypedExpr> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }

    fn boxed(&mut self, expr: &ProtoExpr) -> Box<TypedExpr> {
        Box::new(self.expr(expr))
    }

    /// Return type of a called instance, waiting on it if it has none yet.
    fn call_result(&mut self, id: InstanceId) -> Type {
        if let Some(ty) = &self.engine.instances[id.0].return_type {
            return ty.clone();
        }
        if self.engine.is_settled(id) {
            return Type::Bad;
        }
        self.pending_on.insert(id);
        Type::Unresolved
    }

    fn call(
        &mut self,
        position: &Position,
        func: FunctionId,
        args: Vec<TypedExpr>,
        capture_types: Vec<Type>,
        captures: CaptureSource,
    ) -> TypedExpr {
        let silent = args
            .iter()
            .map(|arg| &arg.ty)
            .chain(capture_types.iter())
            .fold(None, |acc: Option<Type>, ty| match (acc, ty.is_silent()) {
                (Some(Type::Unresolved), _) => Some(Type::Unresolved),
                (_, true) => Some(ty.clone()),
                (acc, false) => acc,
            });
        if let Some(ty) = silent {
            return TypedExpr::new(position.clone(), ty, TypedExprKind::Bad);
        }

        let key = InstanceKey {
            func,
            args: args.iter().map(|arg| arg.ty.clone()).collect(),
            captures: capture_types,
        };
        let Some(instance) =
            self.engine
                .instantiate(key, self.depth + 1, position, &mut self.diagnostics)
        else {
            return TypedExpr::bad(position.clone());
        };

        let ty = self.call_result(instance);
        TypedExpr::new(
            position.clone(),
            ty,
            TypedExprKind::Call {
                instance,
                args,
                captures,
            },
        )
    }

    fn expr(&mut self, expr: &ProtoExpr) -> TypedExpr {
        let position = expr.position.clone();
        let program = self.program();

        match &expr.kind {
            ProtoExprKind::BoolLiteral(value) => {
                TypedExpr::new(position, Type::Bool, TypedExprKind::BoolLiteral(*value))
            }
            ProtoExprKind::IntLiteral(value) => TypedExpr::new(
                position,
                Type::Int,
                TypedExprKind::IntLiteral(value.clone()),
            ),
            ProtoExprKind::FloatLiteral(value) => TypedExpr::new(
                position,
                Type::Float,
                TypedExprKind::FloatLiteral(value.clone()),
            ),
            ProtoExprKind::StringLiteral(value) => TypedExpr::new(
                position,
                Type::String,
                TypedExprKind::StringLiteral(value.clone()),
            ),
            ProtoExprKind::ListLiteral(elements) => self.list_literal(position, elements),
            ProtoExprKind::ListElement => match self.list_contexts.last() {
                Some(element) => {
                    TypedExpr::new(position, element.clone(), TypedExprKind::ListElement)
                }
                None => self.outside_list(position, "list element"),
            },
            ProtoExprKind::ListIndex => {
                if self.list_contexts.is_empty() {
                    self.outside_list(position, "list index")
                } else {
                    TypedExpr::new(position, Type::Int, TypedExprKind::ListIndex)
                }
            }
            ProtoExprKind::Pipeline {
                list,
                kind,
                section,
            } => self.pipeline(position, list, *kind, section),
            ProtoExprKind::Reference(binding) => self.reference(&position, binding),
            ProtoExprKind::FuncReference(func) => {
                let decl = program.function(*func);
                let Some(captures) = self.capture_values(decl, &position) else {
                    return TypedExpr::bad(position);
                };
                if let Some(silent) = captures.iter().find(|c| c.ty.is_silent()) {
                    return TypedExpr::new(position, silent.ty.clone(), TypedExprKind::Bad);
                }
                let ty = Type::FuncReference {
                    func: *func,
                    name: decl.name.clone(),
                    param_count: decl.params.len(),
                    captures: captures.iter().map(|c| c.ty.clone()).collect(),
                };
                TypedExpr::new(
                    position,
                    ty,
                    TypedExprKind::FuncReference {
                        func: *func,
                        captures,
                    },
                )
            }
            ProtoExprKind::Binary { lhs, op, rhs } => {
                let typed_lhs = self.boxed(lhs);
                let typed_rhs = self.boxed(rhs);

                let ty = if let Some(silent) = Type::silent_of(&typed_lhs.ty, &typed_rhs.ty) {
                    silent
                } else {
                    if op.is_division() && rhs.is_zero_literal() {
                        self.diagnostics.error(
                            ErrorImpl::DivideOrModuloByLiteralZero {
                                operator: op.symbol().to_string(),
                            },
                            position.clone(),
                        );
                    }
                    match binary_result(*op, &typed_lhs.ty, &typed_rhs.ty) {
                        Some(ty) => ty,
                        None => {
                            self.diagnostics.error(
                                ErrorImpl::BinaryOperatorUnavailable {
                                    operator: op.symbol().to_string(),
                                    lhs_type: typed_lhs.ty.to_string(),
                                    rhs_type: typed_rhs.ty.to_string(),
                                },
                                position.clone(),
                            );
                            Type::Bad
                        }
                    }
                };
                TypedExpr::new(
                    position,
                    ty,
                    TypedExprKind::Binary {
                        lhs: typed_lhs,
                        op: *op,
                        rhs: typed_rhs,
                    },
                )
            }
            ProtoExprKind::PreUnary { op, operand } => {
                let operand = self.boxed(operand);
                let ty = if operand.ty.is_silent() {
                    operand.ty.clone()
                } else {
                    match unary_result(*op, &operand.ty) {
                        Some(ty) => ty,
                        None => {
                            self.diagnostics.error(
                                ErrorImpl::UnaryOperatorUnavailable {
                                    operator: op.symbol().to_string(),
                                    operand_type: operand.ty.to_string(),
                                },
                                position.clone(),
                            );
                            Type::Bad
                        }
                    }
                };
                TypedExpr::new(position, ty, TypedExprKind::PreUnary { op: *op, operand })
            }
            ProtoExprKind::Conjunction { lhs, rhs } => {
                let (lhs, rhs, ty) = self.logical_operands(lhs, rhs);
                TypedExpr::new(position, ty, TypedExprKind::Conjunction { lhs, rhs })
            }
            ProtoExprKind::Disjunction { lhs, rhs } => {
                let (lhs, rhs, ty) = self.logical_operands(lhs, rhs);
                TypedExpr::new(position, ty, TypedExprKind::Disjunction { lhs, rhs })
            }
            ProtoExprKind::Negation(operand) => {
                let operand = self.boxed(operand);
                self.expect_bool(&operand);
                let ty = match operand.ty {
                    Type::Unresolved => Type::Unresolved,
                    _ => Type::Bool,
                };
                TypedExpr::new(position, ty, TypedExprKind::Negation(operand))
            }
            ProtoExprKind::Call { func, args } => {
                let args = self.exprs(args);
                let decl = program.function(*func);
                let Some(captures) = self.capture_values(decl, &position) else {
                    return TypedExpr::bad(position);
                };
                let capture_types = captures.iter().map(|c| c.ty.clone()).collect();
                self.call(
                    &position,
                    *func,
                    args,
                    capture_types,
                    CaptureSource::Environment(captures),
                )
            }
            ProtoExprKind::CallVariable { binding, args } => {
                let args = self.exprs(args);
                let callee = self.reference(&position, binding);
                let callee_type = callee.ty.clone();
                match &callee_type {
                    ty if ty.is_silent() => {
                        TypedExpr::new(position, ty.clone(), TypedExprKind::Bad)
                    }
                    Type::FuncReference {
                        func,
                        param_count,
                        captures,
                        ..
                    } if *param_count == args.len() => {
                        self.call(
                            &position,
                            *func,
                            args,
                            captures.clone(),
                            CaptureSource::Reference(Box::new(callee)),
                        )
                    }
                    Type::FuncReference { .. } => {
                        self.diagnostics.error(
                            ErrorImpl::UnresolvableCall {
                                name: binding.name.clone(),
                                arg_count: args.len(),
                            },
                            position.clone(),
                        );
                        TypedExpr::bad(position)
                    }
                    other => {
                        self.diagnostics.error(
                            ErrorImpl::NotCallable {
                                name: binding.name.clone(),
                                type_name: other.to_string(),
                            },
                            position.clone(),
                        );
                        TypedExpr::bad(position)
                    }
                }
            }
            ProtoExprKind::MemberCall {
                object,
                member,
                args,
            } => {
                let object = self.boxed(object);
                let args = self.exprs(args);
                let ty = if object.ty.is_silent() {
                    object.ty.clone()
                } else {
                    match member_result(&object.ty, member, args.len()) {
                        Some(ty) => ty,
                        None => {
                            self.diagnostics.error(
                                ErrorImpl::MemberCallUnavailable {
                                    member: member.clone(),
                                    type_name: object.ty.to_string(),
                                },
                                position.clone(),
                            );
                            Type::Bad
                        }
                    }
                };
                TypedExpr::new(
                    position,
                    ty,
                    TypedExprKind::MemberCall {
                        object,
                        member: member.clone(),
                        args,
                    },
                )
            }
            ProtoExprKind::Bad => TypedExpr::bad(position),
        }
    }

    fn outside_list(&mut self, position: Position, expression: &str) -> TypedExpr {
        self.diagnostics.error(
            ErrorImpl::ListContextUnavailable {
                expression: expression.to_string(),
            },
            position.clone(),
        );
        TypedExpr::bad(position)
    }

    fn logical_operands(
        &mut self,
        lhs: &ProtoExpr,
        rhs: &ProtoExpr,
    ) -> (Box<TypedExpr>, Box<TypedExpr>, Type) {
        let lhs = self.boxed(lhs);
        let rhs = self.boxed(rhs);
        self.expect_bool(&lhs);
        self.expect_bool(&rhs);
        let ty = match Type::silent_of(&lhs.ty, &rhs.ty) {
            Some(Type::Unresolved) => Type::Unresolved,
            _ => Type::Bool,
        };
        (lhs, rhs, ty)
    }

    fn list_literal(&mut self, position: Position, elements: &[ProtoExpr]) -> TypedExpr {
        let elements = self.exprs(elements);
        let mut element_type: Option<Type> = None;
        let mut silent: Option<Type> = None;

        for element in &elements {
            if element.ty.is_silent() {
                silent = Type::silent_of(&element.ty, silent.as_ref().unwrap_or(&Type::Bad));
                continue;
            }
            element_type = match element_type {
                None => Some(element.ty.clone()),
                Some(expected) => match expected.unify(&element.ty) {
                    Some(unified) => Some(unified),
                    None => {
                        self.diagnostics.error(
                            ErrorImpl::ListElementTypeMismatch {
                                expected: expected.to_string(),
                                received: element.ty.to_string(),
                            },
                            element.position.clone(),
                        );
                        Some(expected)
                    }
                },
            };
        }

        let ty = match silent {
            Some(silent) => silent,
            None => Type::list_of(element_type.unwrap_or(Type::Void)),
        };
        TypedExpr::new(position, ty, TypedExprKind::ListLiteral(elements))
    }

    fn pipeline(
        &mut self,
        position: Position,
        list: &ProtoExpr,
        kind: PipeKind,
        section: &ProtoExpr,
    ) -> TypedExpr {
        let list = self.boxed(list);
        if list.ty.is_silent() {
            return TypedExpr::new(position, list.ty.clone(), TypedExprKind::Bad);
        }
        let Some(element) = list.ty.element().cloned() else {
            self.diagnostics.error(
                ErrorImpl::BinaryOperatorUnavailable {
                    operator: kind.symbol().to_string(),
                    lhs_type: list.ty.to_string(),
                    rhs_type: "list section".to_string(),
                },
                position.clone(),
            );
            return TypedExpr::bad(position);
        };

        self.list_contexts.push(element);
        let section = self.boxed(section);
        self.list_contexts.pop();

        let ty = if section.ty.is_silent() {
            section.ty.clone()
        } else {
            match kind {
                PipeKind::Map => Type::list_of(section.ty.clone()),
                PipeKind::Filter => {
                    self.expect_bool(&section);
                    list.ty.clone()
                }
            }
        };
        TypedExpr::new(
            position,
            ty,
            TypedExprKind::Pipeline {
                list,
                kind,
                section,
            },
        )
    }
}
