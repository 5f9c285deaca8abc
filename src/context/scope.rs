//! Lexical scope tables
//!
//! Scopes live in an arena owned by [`ScopeTree`] and link to their parent
//! by [`ScopeId`]. Each table is an ordered sequence keyed by name; lookup
//! is innermost-first, walking the parent chain. The tree outlives the
//! context pass so the emitter can resolve variables through the handles
//! stored on the AST.

use crate::ast::ActualType;
use crate::common::{NodeId, ScopeId, SourceTrace};

/// A variable bound in a scope
#[derive(Debug, Clone)]
pub struct ScopeVar {
    pub name: String,
    pub ty: ActualType,
    pub constant: bool,
    /// The initializing expression, when the declaration had one
    pub value: Option<NodeId>,
    /// Function parameters are never unused-checked or deallocated
    pub of_function: bool,
    /// Only allocated variables lower their deallocation to `free`
    pub allocated: bool,
    pub reassigned: bool,
    pub trace: SourceTrace,
}

/// A function registered in a scope
#[derive(Debug, Clone)]
pub struct ScopeFn {
    pub name: String,
    pub return_types: Vec<ActualType>,
    pub arg_names: Vec<String>,
    pub arg_types: Vec<ActualType>,
}

/// A type name known to a scope
#[derive(Debug, Clone)]
pub struct ScopeType {
    pub name: String,
}

/// One lexical scope
#[derive(Debug, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub vars: Vec<ScopeVar>,
    pub fns: Vec<ScopeFn>,
    pub types: Vec<ScopeType>,
}

/// Arena of scopes built by the context pass
#[derive(Debug, Default)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
}

impl ScopeTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, parent: Option<ScopeId>) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent,
            ..Scope::default()
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn var(&self, scope: ScopeId, index: usize) -> &ScopeVar {
        &self.scopes[scope.index()].vars[index]
    }

    pub fn var_mut(&mut self, scope: ScopeId, index: usize) -> &mut ScopeVar {
        &mut self.scopes[scope.index()].vars[index]
    }

    /// Find a variable in this scope only
    pub fn lookup_var_local(&self, scope: ScopeId, name: &str) -> Option<usize> {
        self.scope(scope).vars.iter().position(|v| v.name == name)
    }

    /// Find a variable, innermost scope first
    pub fn lookup_var(&self, scope: ScopeId, name: &str) -> Option<(ScopeId, usize)> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(index) = self.lookup_var_local(id, name) {
                return Some((id, index));
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// Find a function, innermost scope first
    pub fn lookup_fn(&self, scope: ScopeId, name: &str) -> Option<&ScopeFn> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(function) = self.scope(id).fns.iter().find(|f| f.name == name) {
                return Some(function);
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// Find a type name, innermost scope first
    pub fn lookup_type(&self, scope: ScopeId, name: &str) -> Option<&ScopeType> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(ty) = self.scope(id).types.iter().find(|t| t.name == name) {
                return Some(ty);
            }
            current = self.scope(id).parent;
        }
        None
    }

    /// Register a type name once, in the scope it was first seen
    pub fn register_type(&mut self, scope: ScopeId, name: &str) {
        if self.lookup_type(scope, name).is_none() {
            self.scope_mut(scope).types.push(ScopeType {
                name: name.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TypeId;

    fn var(name: &str) -> ScopeVar {
        ScopeVar {
            name: name.to_string(),
            ty: ActualType::simple(TypeId::Int32),
            constant: false,
            value: None,
            of_function: false,
            allocated: false,
            reassigned: false,
            trace: SourceTrace::default(),
        }
    }

    #[test]
    fn test_scope_nesting() {
        let mut tree = ScopeTree::new();
        let root = tree.alloc(None);
        let child = tree.alloc(Some(root));

        tree.scope_mut(root).vars.push(var("x"));
        tree.scope_mut(child).vars.push(var("y"));

        // Both visible from the child, only x from the root
        assert!(tree.lookup_var(child, "x").is_some());
        assert!(tree.lookup_var(child, "y").is_some());
        assert!(tree.lookup_var(root, "y").is_none());
    }

    #[test]
    fn test_innermost_wins() {
        let mut tree = ScopeTree::new();
        let root = tree.alloc(None);
        let child = tree.alloc(Some(root));

        tree.scope_mut(root).vars.push(var("x"));
        tree.scope_mut(child).vars.push(var("x"));

        let (scope, _) = tree.lookup_var(child, "x").unwrap();
        assert_eq!(scope, child);
    }

    #[test]
    fn test_local_lookup_ignores_parents() {
        let mut tree = ScopeTree::new();
        let root = tree.alloc(None);
        let child = tree.alloc(Some(root));

        tree.scope_mut(root).vars.push(var("x"));
        assert!(tree.lookup_var_local(child, "x").is_none());
    }

    #[test]
    fn test_register_type_once() {
        let mut tree = ScopeTree::new();
        let root = tree.alloc(None);

        tree.register_type(root, "string");
        tree.register_type(root, "string");
        assert_eq!(tree.scope(root).types.len(), 1);
    }
}
