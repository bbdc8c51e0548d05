use std::collections::HashMap;

use indexmap::IndexMap;

use crate::{
    errors::errors::{Diagnostics, ErrorImpl},
    Position,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Function(FunctionId),
    Branch,
}

/// A variable definition as seen from a reference to it.
///
/// `level` is the nesting level of the defining scope, which together with
/// the name identifies the definition along any chain of enclosing scopes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariableBinding {
    pub name: String,
    pub level: usize,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CallBinding {
    Function(FunctionId),
    /// No function matched; the callee is whatever value the variable holds.
    Variable(VariableBinding),
}

#[derive(Debug)]
struct Scope {
    parent: Option<ScopeId>,
    level: usize,
    kind: ScopeKind,
    variables: HashMap<String, Position>,
    functions: HashMap<(String, usize), FunctionId>,
}

/// Lexically nested scopes, stored as an arena with a cursor on the innermost one.
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    current: ScopeId,
    captures: HashMap<FunctionId, IndexMap<String, VariableBinding>>,
    function_count: usize,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope {
                parent: None,
                level: 0,
                kind: ScopeKind::Global,
                variables: HashMap::new(),
                functions: HashMap::new(),
            }],
            current: ScopeId(0),
            captures: HashMap::new(),
            function_count: 0,
        }
    }

    fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.0]
    }

    pub fn level(&self) -> usize {
        self.scope(self.current).level
    }

    pub fn enter_scope(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let level = self.level() + 1;
        self.scopes.push(Scope {
            parent: Some(self.current),
            level,
            kind,
            variables: HashMap::new(),
            functions: HashMap::new(),
        });
        self.current = id;
        id
    }

    pub fn leave_scope(&mut self) {
        match self.scope(self.current).parent {
            Some(parent) => self.current = parent,
            None => log::warn!("attempted to leave the global scope"),
        }
    }

    /// Innermost function whose body encloses the current scope.
    pub fn current_function(&self) -> Option<FunctionId> {
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let ScopeKind::Function(function) = self.scope(id).kind {
                return Some(function);
            }
            scope = self.scope(id).parent;
        }
        None
    }

    pub fn define_variable(
        &mut self,
        position: Position,
        name: &str,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let current = self.current;
        if let Some(previous) = self.scope(current).variables.get(name) {
            diagnostics.error(
                ErrorImpl::VariableAlreadyDeclared {
                    variable: name.to_string(),
                    previous: previous.clone(),
                },
                position,
            );
            return false;
        }
        self.scope_mut(current)
            .variables
            .insert(name.to_string(), position);
        true
    }

    /// Declares a function signature in the current scope and hands out its id.
    pub fn define_function(
        &mut self,
        position: Position,
        name: &str,
        param_count: usize,
        diagnostics: &mut Diagnostics,
    ) -> Option<FunctionId> {
        let current = self.current;
        let key = (name.to_string(), param_count);
        if self.scope(current).functions.contains_key(&key) {
            diagnostics.error(
                ErrorImpl::FunctionAlreadyDeclared {
                    function: name.to_string(),
                    param_count,
                },
                position,
            );
            return None;
        }

        let id = FunctionId(self.function_count);
        self.function_count += 1;
        self.scope_mut(current).functions.insert(key, id);
        self.captures.insert(id, IndexMap::new());
        Some(id)
    }

    /// Looks a variable up from the current scope outward.
    ///
    /// Every function body crossed on the way to the definition records it
    /// as a capture.
    pub fn resolve_reference(
        &mut self,
        position: Position,
        name: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<VariableBinding> {
        match self.lookup_variable(name) {
            Some(binding) => Some(binding),
            None => {
                diagnostics.error(
                    ErrorImpl::UnresolvableReference {
                        name: name.to_string(),
                    },
                    position,
                );
                None
            }
        }
    }

    pub fn resolve_function(&self, name: &str, arg_count: usize) -> Option<FunctionId> {
        let key = (name.to_string(), arg_count);
        let mut scope = Some(self.current);
        while let Some(id) = scope {
            if let Some(function) = self.scope(id).functions.get(&key) {
                return Some(*function);
            }
            scope = self.scope(id).parent;
        }
        None
    }

    /// Resolves a call by name and argument count, falling back to a variable of that name.
    pub fn resolve_call(
        &mut self,
        position: Position,
        name: &str,
        arg_count: usize,
        diagnostics: &mut Diagnostics,
    ) -> Option<CallBinding> {
        if let Some(function) = self.resolve_function(name, arg_count) {
            return Some(CallBinding::Function(function));
        }
        if let Some(binding) = self.lookup_variable(name) {
            return Some(CallBinding::Variable(binding));
        }
        diagnostics.error(
            ErrorImpl::UnresolvableCall {
                name: name.to_string(),
                arg_count,
            },
            position,
        );
        None
    }

    pub fn captures_of(&self, function: FunctionId) -> Vec<VariableBinding> {
        self.captures
            .get(&function)
            .map(|captures| captures.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns true if the capture was not recorded yet.
    pub fn add_capture(&mut self, function: FunctionId, binding: VariableBinding) -> bool {
        let captures = self.captures.entry(function).or_default();
        if captures.contains_key(&binding.name) {
            return false;
        }
        log::trace!(
            "function #{} captures {} (level {})",
            function.0,
            binding.name,
            binding.level
        );
        captures.insert(binding.name.clone(), binding);
        true
    }

    fn lookup_variable(&mut self, name: &str) -> Option<VariableBinding> {
        let mut scope = Some(self.current);
        let mut crossed = Vec::new();

        while let Some(id) = scope {
            let current = self.scope(id);
            if let Some(position) = current.variables.get(name) {
                let binding = VariableBinding {
                    name: name.to_string(),
                    level: current.level,
                    position: position.clone(),
                };
                for function in crossed {
                    self.add_capture(function, binding.clone());
                }
                return Some(binding);
            }
            if let ScopeKind::Function(function) = current.kind {
                crossed.push(function);
            }
            scope = current.parent;
        }
        None
    }
}
