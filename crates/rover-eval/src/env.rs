//! Scoped variable environment for the rover evaluator.

use crate::value::Value;
use std::collections::BTreeMap;

/// Index of the module-level scope.
pub const GLOBAL: usize = 0;

/// A single scope level.
#[derive(Debug, Clone)]
struct Scope {
    bindings: BTreeMap<String, Value>,
    /// Lexically enclosing scope; `None` for the global scope.
    parent: Option<usize>,
}

impl Scope {
    fn new(parent: Option<usize>) -> Self {
        Self {
            bindings: BTreeMap::new(),
            parent,
        }
    }
}

/// Scoped variable environment with push/pop semantics.
///
/// Lookup starts at the innermost scope and follows parent links, so a
/// function body sees its own locals and the scope it was defined in, but
/// never its caller's locals.
/// `define` always binds in the current (innermost) scope.
/// `set` updates the first scope on the chain where the variable exists.
#[derive(Debug, Clone)]
pub struct Environment {
    scopes: Vec<Scope>,
}

impl Environment {
    /// Create a new environment with one global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None)],
        }
    }

    /// Push a new scope whose parent is `parent` (a function's defining scope).
    pub fn push_scope(&mut self, parent: usize) {
        self.scopes.push(Scope::new(Some(parent)));
    }

    /// Pop the innermost scope, dropping its variables.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Number of live scopes.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Define a variable in the current (innermost) scope.
    pub fn define(&mut self, name: &str, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name.to_string(), value);
        }
    }

    /// Look up a variable along the scope chain.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let idx = self.find(name)?;
        self.scopes[idx].bindings.get(name)
    }

    /// Mutable access to a variable along the scope chain.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        let idx = self.find(name)?;
        self.scopes[idx].bindings.get_mut(name)
    }

    /// Update a variable in the first scope where it exists.
    /// Returns `true` if found and updated, `false` if not found.
    pub fn set(&mut self, name: &str, value: Value) -> bool {
        match self.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Index of the scope that binds `name`, walking parent links.
    fn find(&self, name: &str) -> Option<usize> {
        let mut idx = Some(self.scopes.len() - 1);
        while let Some(i) = idx {
            let scope = &self.scopes[i];
            if scope.bindings.contains_key(name) {
                return Some(i);
            }
            idx = scope.parent;
        }
        None
    }

    /// Bindings of the global scope.
    pub fn global_bindings(&self) -> &BTreeMap<String, Value> {
        &self.scopes[GLOBAL].bindings
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}
