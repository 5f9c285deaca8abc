//! Context pass for the Comet language
//!
//! Walks the parsed tree once, building the scope arena, binding names,
//! checking types, and synthesizing [`StmtKind::MemoryDeAllocation`] nodes
//! at each scope-local variable's last use. The tree is enriched in place:
//! scope handles land on `Root`/`ScopeDeclaration` nodes and declared-type
//! sentinels are back-filled with inferred types, so the emitter never
//! re-analyses. Advisory hints are collected alongside; the first semantic
//! violation aborts the pass.

mod scope;

pub use scope::{Scope, ScopeFn, ScopeTree, ScopeType, ScopeVar};

use crate::ast::{ActualType, Ast, Statement, StmtKind, TypeId, VariadicKind};
use crate::common::{NodeId, ScopeId, SourceTrace};
use crate::diagnostics::{CompileError, Hint};

/// Analyze the tree rooted at `ast.root`, mutating it in place
pub fn grow(ast: &mut Ast) -> Result<(ScopeTree, Vec<Hint>), CompileError> {
    let mut builder = ContextBuilder {
        scopes: ScopeTree::new(),
        hints: Vec::new(),
    };

    let root_scope = builder.scopes.alloc(None);
    builder.scopes.register_type(root_scope, "string");

    let root = ast.root;
    if let StmtKind::Root { scope, .. } = &mut ast.node_mut(root).kind {
        *scope = Some(root_scope);
    }

    let children = match &ast.node(root).kind {
        StmtKind::Root { children, .. } => children.clone(),
        _ => Vec::new(),
    };

    for child in children {
        builder.analyze_statement(ast, child, root_scope)?;
    }

    builder.const_hints(root_scope);

    Ok((builder.scopes, builder.hints))
}

struct ContextBuilder {
    scopes: ScopeTree,
    hints: Vec<Hint>,
}

impl ContextBuilder {
    fn analyze_statement(
        &mut self,
        ast: &mut Ast,
        node: NodeId,
        scope: ScopeId,
    ) -> Result<(), CompileError> {
        let trace = ast.node(node).trace;

        match ast.node(node).kind.clone() {
            StmtKind::ScopeDeclaration { .. } => {
                self.analyze_scope(ast, node, scope, &[]).map(|_| ())
            }

            StmtKind::FunctionDeclaration {
                name,
                arg_names,
                arg_types,
                return_types,
                body,
                native: _,
            } => self.analyze_function(
                ast,
                scope,
                trace,
                &name,
                &arg_names,
                &arg_types,
                &return_types,
                body,
            ),

            StmtKind::VariableDeclaration { .. } => {
                self.analyze_variable_declaration(ast, node, scope)
            }

            StmtKind::VariableAssignment {
                identifiers,
                expressions,
            } => self.analyze_assignment(ast, scope, &identifiers, &expressions),

            StmtKind::IdentifierExpression { name } => {
                if self.scopes.lookup_var(scope, &name).is_none() {
                    return Err(CompileError::UnknownIdentifier {
                        name,
                        trace,
                        span: trace.span(),
                    });
                }
                Ok(())
            }

            StmtKind::FunctionExpression { name, args } => {
                // In statement position any return shape is fine
                self.check_call(ast, &name, &args, scope, trace).map(|_| ())
            }

            StmtKind::BinaryExpression { .. } => self.infer_type(ast, node, scope).map(|_| ()),

            StmtKind::ImportStatement { paths, native } => {
                if !native {
                    for path in &paths {
                        self.hints.push(Hint::new(
                            format!("Import \"{path}\" is not linked yet"),
                            trace,
                        ));
                    }
                }
                Ok(())
            }

            // Already-enriched trees re-analyze cleanly
            StmtKind::MemoryDeAllocation { .. } => Ok(()),

            StmtKind::Root { .. }
            | StmtKind::NullLiteral
            | StmtKind::NumberLiteral { .. }
            | StmtKind::StringLiteral { .. }
            | StmtKind::BooleanLiteral { .. } => Ok(()),
        }
    }

    /// Open a child scope for `node`, seed it with `params`, analyze the
    /// children, then run the dead-variable pass
    fn analyze_scope(
        &mut self,
        ast: &mut Ast,
        node: NodeId,
        parent: ScopeId,
        params: &[ScopeVar],
    ) -> Result<ScopeId, CompileError> {
        let scope = self.scopes.alloc(Some(parent));
        for param in params {
            self.scopes.scope_mut(scope).vars.push(param.clone());
        }

        if let StmtKind::ScopeDeclaration { scope: slot, .. } = &mut ast.node_mut(node).kind {
            *slot = Some(scope);
        }

        let children = match &ast.node(node).kind {
            StmtKind::ScopeDeclaration { children, .. } => children.clone(),
            _ => Vec::new(),
        };

        for child in children {
            self.analyze_statement(ast, child, scope)?;
        }

        self.finish_scope(ast, node, scope)?;
        self.const_hints(scope);

        Ok(scope)
    }

    #[allow(clippy::too_many_arguments)]
    fn analyze_function(
        &mut self,
        ast: &mut Ast,
        scope: ScopeId,
        trace: SourceTrace,
        name: &str,
        arg_names: &[String],
        arg_types: &[ActualType],
        return_types: &[ActualType],
        body: Option<NodeId>,
    ) -> Result<(), CompileError> {
        if self.scopes.scope(scope).parent.is_some() {
            return Err(CompileError::NestedFunction {
                name: name.to_string(),
                trace,
                span: trace.span(),
            });
        }

        if self.scopes.scope(scope).fns.iter().any(|f| f.name == name) {
            return Err(CompileError::DuplicateFunction {
                name: name.to_string(),
                trace,
                span: trace.span(),
            });
        }

        for ty in arg_types.iter().chain(return_types.iter()) {
            if let Some(custom) = &ty.custom_name {
                self.scopes.register_type(scope, custom);
            }
        }

        // Registered before the body so recursion resolves
        self.scopes.scope_mut(scope).fns.push(ScopeFn {
            name: name.to_string(),
            return_types: return_types.to_vec(),
            arg_names: arg_names.to_vec(),
            arg_types: arg_types.to_vec(),
        });

        if let Some(body) = body {
            let params: Vec<ScopeVar> = arg_names
                .iter()
                .zip(arg_types.iter())
                .filter(|(name, _)| !name.is_empty())
                .map(|(name, ty)| ScopeVar {
                    name: name.clone(),
                    ty: ty.clone(),
                    constant: true,
                    value: None,
                    of_function: true,
                    allocated: false,
                    reassigned: false,
                    trace,
                })
                .collect();

            self.analyze_scope(ast, body, scope, &params)?;
        }

        Ok(())
    }

    fn analyze_variable_declaration(
        &mut self,
        ast: &mut Ast,
        node: NodeId,
        scope: ScopeId,
    ) -> Result<(), CompileError> {
        let trace = ast.node(node).trace;
        let (identifiers, types, expressions, constant) = match &ast.node(node).kind {
            StmtKind::VariableDeclaration {
                identifiers,
                types,
                expressions,
                constant,
            } => (
                identifiers.clone(),
                types.clone(),
                expressions.clone(),
                *constant,
            ),
            _ => return Ok(()),
        };

        for i in 0..identifiers.len() {
            let name = ast
                .identifier_name(identifiers[i])
                .unwrap_or_default()
                .to_string();

            if self.scopes.lookup_var_local(scope, &name).is_some() {
                return Err(CompileError::DuplicateVariable {
                    name,
                    trace,
                    span: trace.span(),
                });
            }

            let shadows = self
                .scopes
                .scope(scope)
                .parent
                .and_then(|parent| self.scopes.lookup_var(parent, &name))
                .is_some();
            if shadows {
                self.hints.push(Hint::new(
                    format!("Variable {name} shadows an earlier declaration"),
                    trace,
                ));
            }

            let declared = types[i].clone();
            let value = expressions.get(i).copied();

            let ty = match value {
                Some(expression) => {
                    let inferred = self.infer_type(ast, expression, scope)?;

                    if declared.id == TypeId::Void {
                        // Back-fill the sentinel with the inferred type
                        if let StmtKind::VariableDeclaration { types, .. } =
                            &mut ast.node_mut(node).kind
                        {
                            types[i] = inferred.clone();
                        }
                        inferred
                    } else if !declared.accepts(&inferred) {
                        return Err(CompileError::DeclarationTypeMismatch {
                            name,
                            declared: declared.to_string(),
                            inferred: inferred.to_string(),
                            trace,
                            span: trace.span(),
                        });
                    } else {
                        declared
                    }
                }
                // The parser guarantees an explicit non-void type here
                None => declared,
            };

            if let Some(custom) = &ty.custom_name {
                self.scopes.register_type(scope, custom);
            }

            let allocated = ty.is_string();
            self.scopes.scope_mut(scope).vars.push(ScopeVar {
                name,
                ty,
                constant,
                value,
                of_function: false,
                allocated,
                reassigned: false,
                trace,
            });
        }

        Ok(())
    }

    fn analyze_assignment(
        &mut self,
        ast: &mut Ast,
        scope: ScopeId,
        identifiers: &[NodeId],
        expressions: &[NodeId],
    ) -> Result<(), CompileError> {
        for i in 0..identifiers.len() {
            let trace = ast.node(identifiers[i]).trace;
            let name = ast
                .identifier_name(identifiers[i])
                .unwrap_or_default()
                .to_string();

            let Some((var_scope, var_index)) = self.scopes.lookup_var(scope, &name) else {
                return Err(CompileError::UnknownIdentifier {
                    name,
                    trace,
                    span: trace.span(),
                });
            };

            let var = self.scopes.var(var_scope, var_index);
            if var.constant {
                return Err(CompileError::AssignToConstant {
                    name,
                    trace,
                    span: trace.span(),
                });
            }
            let expected = var.ty.clone();

            let inferred = self.infer_type(ast, expressions[i], scope)?;
            if !expected.accepts(&inferred) {
                return Err(CompileError::AssignmentTypeMismatch {
                    name,
                    expected: expected.to_string(),
                    found: inferred.to_string(),
                    trace,
                    span: trace.span(),
                });
            }

            self.scopes.var_mut(var_scope, var_index).reassigned = true;
        }

        Ok(())
    }

    /// Infer the type of an expression node, resolving names on the way
    fn infer_type(
        &self,
        ast: &Ast,
        node: NodeId,
        scope: ScopeId,
    ) -> Result<ActualType, CompileError> {
        let statement = ast.node(node);
        let trace = statement.trace;

        match &statement.kind {
            // TODO widen integer literals by magnitude instead of
            // defaulting to int32
            StmtKind::NumberLiteral { value } => Ok(if value.contains('.') {
                ActualType::simple(TypeId::Float32)
            } else {
                ActualType::simple(TypeId::Int32)
            }),

            StmtKind::BooleanLiteral { .. } => Ok(ActualType::simple(TypeId::Bool)),

            StmtKind::StringLiteral { .. } => Ok(ActualType::string()),

            StmtKind::IdentifierExpression { name } => {
                match self.scopes.lookup_var(scope, name) {
                    Some((var_scope, var_index)) => {
                        Ok(self.scopes.var(var_scope, var_index).ty.clone())
                    }
                    None => Err(CompileError::UnknownIdentifier {
                        name: name.clone(),
                        trace,
                        span: trace.span(),
                    }),
                }
            }

            StmtKind::BinaryExpression { left, right, .. } => {
                let left = self.infer_type(ast, *left, scope)?;
                let right = self.infer_type(ast, *right, scope)?;

                ActualType::common(&left, &right).ok_or(CompileError::OperandTypeMismatch {
                    left: left.to_string(),
                    right: right.to_string(),
                    trace,
                    span: trace.span(),
                })
            }

            StmtKind::FunctionExpression { name, args } => {
                let function = self.check_call(ast, name, args, scope, trace)?;

                if function.return_types.len() != 1 || function.return_types[0].id == TypeId::Void {
                    return Err(CompileError::InvalidExpressionCall {
                        function: name.clone(),
                        trace,
                        span: trace.span(),
                    });
                }
                Ok(function.return_types[0].clone())
            }

            _ => Err(CompileError::CannotInfer {
                trace,
                span: trace.span(),
            }),
        }
    }

    /// Resolve a call target and validate its arguments
    fn check_call(
        &self,
        ast: &Ast,
        name: &str,
        args: &[NodeId],
        scope: ScopeId,
        trace: SourceTrace,
    ) -> Result<ScopeFn, CompileError> {
        let Some(function) = self.scopes.lookup_fn(scope, name).cloned() else {
            return Err(CompileError::UnknownFunction {
                name: name.to_string(),
                trace,
                span: trace.span(),
            });
        };

        let params = &function.arg_types;
        let variadic = params.last().and_then(|t| t.variadic);
        let fixed = match variadic {
            Some(_) => params.len() - 1,
            None => params.len(),
        };

        let count_ok = match variadic {
            Some(_) => args.len() >= fixed,
            None => args.len() == params.len(),
        };
        if !count_ok {
            return Err(CompileError::ArgumentCountMismatch {
                function: name.to_string(),
                expected: params.len(),
                found: args.len(),
                trace,
                span: trace.span(),
            });
        }

        for (i, arg) in args.iter().enumerate() {
            let inferred = self.infer_type(ast, *arg, scope)?;

            let in_variadic = variadic.is_some() && i >= fixed;
            if in_variadic && variadic == Some(VariadicKind::Unvalidated) {
                continue;
            }

            let param = if i < params.len() {
                &params[i]
            } else {
                &params[params.len() - 1]
            };

            if !param.accepts(&inferred) {
                let arg_trace = ast.node(*arg).trace;
                return Err(CompileError::ArgumentTypeMismatch {
                    function: name.to_string(),
                    index: i,
                    expected: param.to_string(),
                    found: inferred.to_string(),
                    trace: arg_trace,
                    span: arg_trace.span(),
                });
            }
        }

        Ok(function)
    }

    /// Dead-variable detection for a fully analysed scope: every
    /// non-parameter variable must be used past its declaration, and gets a
    /// deallocation node spliced in after its last use
    fn finish_scope(
        &mut self,
        ast: &mut Ast,
        node: NodeId,
        scope: ScopeId,
    ) -> Result<(), CompileError> {
        let children = match &ast.node(node).kind {
            StmtKind::ScopeDeclaration { children, .. } => children.clone(),
            _ => return Ok(()),
        };

        // Deallocation nodes from an earlier run are invisible to the
        // counter and get re-pointed instead of duplicated
        let existing: Vec<(NodeId, usize)> = children
            .iter()
            .filter_map(|&child| match ast.node(child).kind {
                StmtKind::MemoryDeAllocation { var, .. } => Some((child, var)),
                _ => None,
            })
            .collect();

        let vars: Vec<(usize, String, SourceTrace)> = self
            .scopes
            .scope(scope)
            .vars
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.of_function)
            .map(|(i, v)| (i, v.name.clone(), v.trace))
            .collect();

        let mut insertions = Vec::new();

        for (var_index, name, trace) in vars {
            let mut uses = 0;
            let mut last_use = 0;

            for (i, &child) in children.iter().enumerate() {
                if matches!(ast.node(child).kind, StmtKind::MemoryDeAllocation { .. }) {
                    continue;
                }
                if is_using_variable(ast, child, &name) {
                    uses += 1;
                    last_use = i;
                }
            }

            // The declaration itself counts as one use
            if uses <= 1 {
                return Err(CompileError::UnusedVariable {
                    name,
                    trace,
                    span: trace.span(),
                });
            }

            insertions.push((var_index, last_use, trace));
        }

        // Splice in declaration order with a running offset so shared
        // last-use indices keep their deallocations ordered
        let mut offset = 0;
        for (var_index, last_use, trace) in insertions {
            if let Some(&(existing_node, _)) = existing.iter().find(|(_, v)| *v == var_index) {
                ast.node_mut(existing_node).kind = StmtKind::MemoryDeAllocation {
                    scope,
                    var: var_index,
                };
                continue;
            }

            let dealloc = ast.alloc(Statement::new(
                StmtKind::MemoryDeAllocation {
                    scope,
                    var: var_index,
                },
                trace,
            ));

            if let StmtKind::ScopeDeclaration { children, .. } = &mut ast.node_mut(node).kind {
                let index = (last_use + 1 + offset).min(children.len());
                children.insert(index, dealloc);
            }
            offset += 1;
        }

        Ok(())
    }

    /// Mutable variables that were never reassigned could be constants
    fn const_hints(&mut self, scope: ScopeId) {
        for var in &self.scopes.scope(scope).vars {
            if !var.of_function && !var.constant && !var.reassigned {
                self.hints.push(Hint::new(
                    format!("Variable {} is never reassigned and could be const", var.name),
                    var.trace,
                ));
            }
        }
    }
}

/// Structural use predicate: does the statement reference `name`?
fn is_using_variable(ast: &Ast, node: NodeId, name: &str) -> bool {
    match &ast.node(node).kind {
        StmtKind::IdentifierExpression { name: used } => used == name,

        StmtKind::BinaryExpression { left, right, .. } => {
            is_using_variable(ast, *left, name) || is_using_variable(ast, *right, name)
        }

        StmtKind::VariableDeclaration {
            identifiers,
            expressions,
            ..
        }
        | StmtKind::VariableAssignment {
            identifiers,
            expressions,
        } => {
            identifiers
                .iter()
                .any(|&id| is_using_variable(ast, id, name))
                || expressions
                    .iter()
                    .any(|&expr| is_using_variable(ast, expr, name))
        }

        StmtKind::FunctionExpression { args, .. } => {
            args.iter().any(|&arg| is_using_variable(ast, arg, name))
        }

        StmtKind::ScopeDeclaration { children, .. } | StmtKind::Root { children, .. } => children
            .iter()
            .any(|&child| is_using_variable(ast, child, name)),

        StmtKind::FunctionDeclaration { body, .. } => body
            .map(|body| is_using_variable(ast, body, name))
            .unwrap_or(false),

        _ => false,
    }
}
