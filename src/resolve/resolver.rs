use std::collections::BTreeMap;

use crate::{
    ast::{
        expressions::{Expr, ExprKind},
        statements::{Block, Function, Stmt, StmtKind},
    },
    errors::errors::{Diagnostics, ErrorImpl},
};

use super::{
    resolved_ast::{FunctionDecl, ProtoBlock, ProtoExpr, ProtoExprKind, ProtoProgram, ProtoStmt, ProtoStmtKind},
    symbol_table::{CallBinding, FunctionId, ScopeKind, SymbolTable},
};

struct Resolver<'d> {
    table: SymbolTable,
    decls: Vec<Option<FunctionDecl>>,
    /// Functions called or referenced from each function body.
    callees: BTreeMap<FunctionId, Vec<FunctionId>>,
    diagnostics: &'d mut Diagnostics,
}

/// Resolves every name in a flow-checked program.
///
/// Within a block, function signatures are declared first, then statements
/// are resolved in order, then function bodies. A body therefore sees every
/// variable of its enclosing blocks, whether defined before or after it.
pub fn resolve_program(global: Block, diagnostics: &mut Diagnostics) -> ProtoProgram {
    let mut resolver = Resolver {
        table: SymbolTable::new(),
        decls: Vec::new(),
        callees: BTreeMap::new(),
        diagnostics,
    };

    let global = resolver.resolve_block(global);
    resolver.close_captures();

    let Resolver { table, decls, .. } = resolver;
    let functions = decls
        .into_iter()
        .flatten()
        .map(|mut decl| {
            decl.captures = table.captures_of(decl.id);
            decl
        })
        .collect();

    ProtoProgram { global, functions }
}

impl Resolver<'_> {
    fn resolve_block(&mut self, block: Block) -> ProtoBlock {
        let level = self.table.level();

        let mut declared = Vec::new();
        for func in block.funcs {
            let id = self.table.define_function(
                func.position.clone(),
                &func.name,
                func.params.len(),
                self.diagnostics,
            );
            if let Some(id) = id {
                if self.decls.len() <= id.0 {
                    self.decls.resize(id.0 + 1, None);
                }
                declared.push((id, func));
            }
        }

        let stmts = block
            .stmts
            .into_iter()
            .map(|stmt| self.resolve_stmt(stmt))
            .collect();

        for (id, func) in declared {
            self.resolve_function(id, func);
        }

        ProtoBlock { level, stmts }
    }

    fn resolve_function(&mut self, id: FunctionId, func: Function) {
        let Function {
            position,
            name,
            params,
            body,
            contains_void_return,
            contains_value_return,
        } = func;

        self.table.enter_scope(ScopeKind::Function(id));
        for param in &params {
            self.table
                .define_variable(position.clone(), param, self.diagnostics);
        }
        let body = self.resolve_block(body);
        self.table.leave_scope();

        log::debug!("resolved function {}/{} as #{}", name, params.len(), id.0);
        self.decls[id.0] = Some(FunctionDecl {
            id,
            position,
            name,
            params,
            body,
            contains_void_return,
            contains_value_return,
            captures: Vec::new(),
        });
    }

    fn resolve_arm(&mut self, block: Block) -> ProtoBlock {
        self.table.enter_scope(ScopeKind::Branch);
        let block = self.resolve_block(block);
        self.table.leave_scope();
        block
    }

    fn empty_arm(&self) -> ProtoBlock {
        ProtoBlock {
            level: self.table.level() + 1,
            stmts: Vec::new(),
        }
    }

    fn resolve_stmt(&mut self, stmt: Stmt) -> ProtoStmt {
        let Stmt { position, kind } = stmt;

        let kind = match kind {
            StmtKind::Arithmetics(expr) => ProtoStmtKind::Arithmetics(self.resolve_expr(expr)),
            StmtKind::VarDef { name, init } => {
                // the initializer cannot see the variable it defines
                let init = self.resolve_expr(init);
                self.table
                    .define_variable(position.clone(), &name, self.diagnostics);
                ProtoStmtKind::VarDef { name, init }
            }
            StmtKind::Return(value) => ProtoStmtKind::Return(self.resolve_expr(value)),
            StmtKind::ReturnNothing => ProtoStmtKind::ReturnNothing,
            StmtKind::Branch {
                predicate,
                consequence,
                alternative,
            } => ProtoStmtKind::Branch {
                predicate: self.resolve_expr(predicate),
                consequence: self.resolve_arm(consequence),
                alternative: self.resolve_arm(alternative),
            },
            StmtKind::BranchConsequenceOnly {
                predicate,
                consequence,
            } => ProtoStmtKind::Branch {
                predicate: self.resolve_expr(predicate),
                consequence: self.resolve_arm(consequence),
                alternative: self.empty_arm(),
            },
            StmtKind::BranchAlternativeOnly {
                predicate,
                alternative,
            } => ProtoStmtKind::Branch {
                predicate: self.resolve_expr(predicate),
                consequence: self.empty_arm(),
                alternative: self.resolve_arm(alternative),
            },
        };

        ProtoStmt { position, kind }
    }

    fn resolve_exprs(&mut self, exprs: Vec<Expr>) -> Vec<ProtoExpr> {
        exprs
            .into_iter()
            .map(|expr| self.resolve_expr(expr))
            .collect()
    }

    fn resolve_boxed(&mut self, expr: Box<Expr>) -> Box<ProtoExpr> {
        Box::new(self.resolve_expr(*expr))
    }

    fn record_callee(&mut self, callee: FunctionId) {
        if let Some(caller) = self.table.current_function() {
            self.callees.entry(caller).or_default().push(callee);
        }
    }

    fn resolve_expr(&mut self, expr: Expr) -> ProtoExpr {
        let Expr { position, kind } = expr;

        let kind = match kind {
            ExprKind::BoolLiteral(value) => ProtoExprKind::BoolLiteral(value),
            ExprKind::IntLiteral(value) => ProtoExprKind::IntLiteral(value),
            ExprKind::FloatLiteral(value) => ProtoExprKind::FloatLiteral(value),
            ExprKind::StringLiteral(value) => ProtoExprKind::StringLiteral(value),
            ExprKind::ListLiteral(elements) => {
                ProtoExprKind::ListLiteral(self.resolve_exprs(elements))
            }
            ExprKind::ListElement => ProtoExprKind::ListElement,
            ExprKind::ListIndex => ProtoExprKind::ListIndex,
            ExprKind::Pipeline {
                list,
                kind,
                section,
            } => ProtoExprKind::Pipeline {
                list: self.resolve_boxed(list),
                kind,
                section: self.resolve_boxed(section),
            },
            ExprKind::Reference(name) => {
                match self
                    .table
                    .resolve_reference(position.clone(), &name, self.diagnostics)
                {
                    Some(binding) => ProtoExprKind::Reference(binding),
                    None => ProtoExprKind::Bad,
                }
            }
            ExprKind::FuncReference { name, param_count } => {
                match self.table.resolve_function(&name, param_count) {
                    Some(func) => {
                        self.record_callee(func);
                        ProtoExprKind::FuncReference(func)
                    }
                    None => {
                        self.diagnostics.error(
                            ErrorImpl::UnresolvableCall {
                                name,
                                arg_count: param_count,
                            },
                            position.clone(),
                        );
                        ProtoExprKind::Bad
                    }
                }
            }
            ExprKind::Binary { lhs, op, rhs } => ProtoExprKind::Binary {
                lhs: self.resolve_boxed(lhs),
                op,
                rhs: self.resolve_boxed(rhs),
            },
            ExprKind::PreUnary { op, operand } => ProtoExprKind::PreUnary {
                op,
                operand: self.resolve_boxed(operand),
            },
            ExprKind::Conjunction { lhs, rhs } => ProtoExprKind::Conjunction {
                lhs: self.resolve_boxed(lhs),
                rhs: self.resolve_boxed(rhs),
            },
            ExprKind::Disjunction { lhs, rhs } => ProtoExprKind::Disjunction {
                lhs: self.resolve_boxed(lhs),
                rhs: self.resolve_boxed(rhs),
            },
            ExprKind::Negation(operand) => ProtoExprKind::Negation(self.resolve_boxed(operand)),
            ExprKind::Call { name, args } => {
                let args = self.resolve_exprs(args);
                match self.table.resolve_call(
                    position.clone(),
                    &name,
                    args.len(),
                    self.diagnostics,
                ) {
                    Some(CallBinding::Function(func)) => {
                        self.record_callee(func);
                        ProtoExprKind::Call { func, args }
                    }
                    Some(CallBinding::Variable(binding)) => {
                        ProtoExprKind::CallVariable { binding, args }
                    }
                    None => ProtoExprKind::Bad,
                }
            }
            ExprKind::MemberCall {
                object,
                member,
                args,
            } => ProtoExprKind::MemberCall {
                object: self.resolve_boxed(object),
                member,
                args: self.resolve_exprs(args),
            },
        };

        ProtoExpr { position, kind }
    }

    /// Propagates captures from callees to callers until nothing changes.
    ///
    /// A caller needs every capture of its callee that lives outside the
    /// caller's own body, since it has to supply them at the call.
    fn close_captures(&mut self) {
        let body_levels: BTreeMap<FunctionId, usize> = self
            .decls
            .iter()
            .flatten()
            .map(|decl| (decl.id, decl.body_level()))
            .collect();

        let mut changed = true;
        while changed {
            changed = false;
            for (caller, callees) in &self.callees {
                let Some(caller_level) = body_levels.get(caller) else {
                    continue;
                };
                for callee in callees {
                    for capture in self.table.captures_of(*callee) {
                        if capture.level < *caller_level
                            && self.table.add_capture(*caller, capture)
                        {
                            changed = true;
                        }
                    }
                }
            }
        }
    }
}
