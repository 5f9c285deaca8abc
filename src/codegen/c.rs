//! C emitter for the Comet language
//!
//! Lowers the enriched AST to a single C translation unit. Three text
//! regions accumulate besides the body: `includes` (deduplicated
//! `#include` lines), `head` (generated type predeclarations, currently
//! the boolean bit-field struct), and `prepend` (generated multi-value
//! return structs). The final output is includes ++ head ++ prepend ++
//! body. Generated symbols carry the `Comet_INTERNAL_` prefix to avoid
//! collisions with user code.

use crate::ast::{ActualType, Ast, StmtKind, TypeId};
use crate::common::{NodeId, ScopeId};
use crate::context::ScopeTree;
use crate::diagnostics::CompileError;

/// Emit a self-contained C translation unit for the analyzed tree
pub fn compile_c(ast: &Ast, scopes: &ScopeTree) -> Result<String, CompileError> {
    let mut emitter = Emitter {
        ast,
        scopes,
        includes: Vec::new(),
        head: String::new(),
        prepend: String::new(),
        indent: -1,
        boolean_emitted: false,
    };

    let body = emitter.emit_statement(ast.root, None)?;

    let mut output = String::new();
    for include in &emitter.includes {
        output += &format!("#include \"{include}\"\n");
    }
    output += &emitter.head;
    output += &emitter.prepend;
    output += &body;

    Ok(output)
}

fn internal_name(name: &str) -> String {
    format!("Comet_INTERNAL_{name}")
}

fn return_struct_name(name: &str) -> String {
    format!("Return_{}", internal_name(name))
}

struct Emitter<'a> {
    ast: &'a Ast,
    scopes: &'a ScopeTree,
    includes: Vec<String>,
    head: String,
    prepend: String,
    indent: i32,
    boolean_emitted: bool,
}

impl<'a> Emitter<'a> {
    fn indent(&self) -> String {
        "    ".repeat(self.indent.max(0) as usize)
    }

    fn import_lib(&mut self, path: &str) {
        if !self.includes.iter().any(|i| i == path) {
            self.includes.push(path.to_string());
        }
    }

    fn emit_boolean_struct(&mut self) {
        if self.boolean_emitted {
            return;
        }
        self.head += &format!(
            "struct {} {{\n    unsigned int value : 1;\n}};\n",
            internal_name("boolean")
        );
        self.boolean_emitted = true;
    }

    /// The C spelling of a Comet type; registers lazy includes and the
    /// boolean struct on first demand
    fn c_type(&mut self, ty: &ActualType) -> String {
        match ty.id {
            TypeId::Void => "void".to_string(),
            TypeId::Bool => {
                self.emit_boolean_struct();
                format!("struct {}", internal_name("boolean"))
            }
            TypeId::Custom => ty.custom_name.clone().unwrap_or_default(),
            TypeId::Float32 => "float".to_string(),
            TypeId::Float64 => "double".to_string(),
            TypeId::Complex64 => "float _Complex".to_string(),
            TypeId::Complex128 => "double _Complex".to_string(),
            TypeId::Int8 => self.sized_int("int8_t"),
            TypeId::Int16 => self.sized_int("int16_t"),
            TypeId::Int32 => self.sized_int("int32_t"),
            TypeId::Int64 => self.sized_int("int64_t"),
            TypeId::UnsignedInt8 => self.sized_int("uint8_t"),
            TypeId::UnsignedInt16 => self.sized_int("uint16_t"),
            TypeId::UnsignedInt32 => self.sized_int("uint32_t"),
            TypeId::UnsignedInt64 => self.sized_int("uint64_t"),
        }
    }

    fn sized_int(&mut self, spelling: &str) -> String {
        self.import_lib("sys/types.h");
        spelling.to_string()
    }

    fn emit_statement(
        &mut self,
        node: NodeId,
        scope: Option<ScopeId>,
    ) -> Result<String, CompileError> {
        match &self.ast.node(node).kind {
            StmtKind::Root { .. } | StmtKind::ScopeDeclaration { .. } => self.emit_scope(node),
            StmtKind::FunctionDeclaration { .. } => self.emit_function(node),
            StmtKind::VariableDeclaration { .. } => self.emit_variable_declaration(node, scope),
            StmtKind::VariableAssignment { .. } => self.emit_assignment(node, scope),
            StmtKind::MemoryDeAllocation { scope, var } => {
                let (scope, var) = (*scope, *var);
                self.emit_deallocation(scope, var)
            }
            StmtKind::ImportStatement { paths, native } => {
                if *native {
                    let paths = paths.clone();
                    for path in paths {
                        self.import_lib(&path);
                    }
                }
                Ok(String::new())
            }
            StmtKind::IdentifierExpression { .. }
            | StmtKind::NumberLiteral { .. }
            | StmtKind::StringLiteral { .. }
            | StmtKind::BooleanLiteral { .. }
            | StmtKind::BinaryExpression { .. }
            | StmtKind::FunctionExpression { .. } => {
                let scope = self.require_scope(node, scope)?;
                let expression = self.emit_expression(node, scope)?;
                Ok(format!("{}{};", self.indent(), expression))
            }
            StmtKind::NullLiteral => {
                let trace = self.ast.node(node).trace;
                Err(CompileError::UnsupportedStatement {
                    kind: self.ast.node(node).kind.name().to_string(),
                    trace,
                    span: trace.span(),
                })
            }
        }
    }

    fn require_scope(
        &self,
        node: NodeId,
        scope: Option<ScopeId>,
    ) -> Result<ScopeId, CompileError> {
        scope.ok_or_else(|| {
            let trace = self.ast.node(node).trace;
            CompileError::MissingContext {
                trace,
                span: trace.span(),
            }
        })
    }

    fn emit_scope(&mut self, node: NodeId) -> Result<String, CompileError> {
        let (children, scope, braced) = match &self.ast.node(node).kind {
            StmtKind::Root { children, scope } => (children.clone(), *scope, false),
            StmtKind::ScopeDeclaration { children, scope } => (children.clone(), *scope, true),
            _ => unreachable!("emit_scope on a non-scope node"),
        };

        let scope = self.require_scope(node, scope)?;

        let mut content = String::new();

        if braced {
            content += &format!("{}{{\n", self.indent());
        }

        self.indent += 1;
        for child in children {
            let code = self.emit_statement(child, Some(scope))?;
            if !code.is_empty() {
                content += &code;
                content.push('\n');
            }
        }
        self.indent -= 1;

        if braced {
            content += &format!("{}}}\n", self.indent());
        }

        Ok(content)
    }

    fn emit_function(&mut self, node: NodeId) -> Result<String, CompileError> {
        let trace = self.ast.node(node).trace;
        let (name, arg_names, arg_types, return_types, body, native) =
            match &self.ast.node(node).kind {
                StmtKind::FunctionDeclaration {
                    name,
                    arg_names,
                    arg_types,
                    return_types,
                    body,
                    native,
                } => (
                    name.clone(),
                    arg_names.clone(),
                    arg_types.clone(),
                    return_types.clone(),
                    *body,
                    *native,
                ),
                _ => unreachable!("emit_function on a non-function node"),
            };

        let return_type_c = if return_types.len() > 1 {
            // Multiple return values become a generated struct
            let struct_name = return_struct_name(&name);

            let mut generated = format!("struct {struct_name} {{\n");
            self.indent += 1;
            for (i, ty) in return_types.iter().enumerate() {
                let c_type = self.c_type(ty);
                generated += &format!("{}{} type{};\n", self.indent(), c_type, i);
            }
            self.indent -= 1;
            generated += "};\n";
            self.prepend += &generated;

            format!("struct {struct_name}")
        } else {
            self.c_type(&return_types[0])
        };

        let mut content = format!("{}{} {}(", self.indent(), return_type_c, name);

        for (i, ty) in arg_types.iter().enumerate() {
            if ty.variadic.is_some() {
                content += "...";
            } else {
                let c_type = self.c_type(ty);
                content += &format!("{} {}", c_type, arg_names[i]);
            }
            if i != arg_types.len() - 1 {
                content += ", ";
            }
        }
        content += ")";

        if native {
            content += ";";
            return Ok(content);
        }

        let Some(body) = body else {
            return Err(CompileError::MissingFunctionBody {
                name,
                trace,
                span: trace.span(),
            });
        };

        content += " ";
        content += &self.emit_scope(body)?;

        Ok(content)
    }

    fn emit_variable_declaration(
        &mut self,
        node: NodeId,
        scope: Option<ScopeId>,
    ) -> Result<String, CompileError> {
        let scope = self.require_scope(node, scope)?;
        let (identifiers, types, expressions, constant) = match &self.ast.node(node).kind {
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
            _ => unreachable!("emit_variable_declaration on a non-declaration node"),
        };

        let mut content = String::new();

        for i in 0..identifiers.len() {
            let name = self
                .ast
                .identifier_name(identifiers[i])
                .unwrap_or_default()
                .to_string();
            let ty = &types[i];

            let constant_prefix = if constant { "const " } else { "" };
            let c_type = self.c_type(ty);
            content += &format!("{}{}{} {}", self.indent(), constant_prefix, c_type, name);

            if let Some(&expression) = expressions.get(i) {
                let compiled = self.emit_expression(expression, scope)?;

                if ty.id == TypeId::Bool {
                    content += &format!(" = {{ value: {compiled} }}");
                } else {
                    content += &format!(" = {compiled}");
                }
            }

            content += ";";
            if i != identifiers.len() - 1 {
                content.push('\n');
            }
        }

        Ok(content)
    }

    fn emit_assignment(
        &mut self,
        node: NodeId,
        scope: Option<ScopeId>,
    ) -> Result<String, CompileError> {
        let scope = self.require_scope(node, scope)?;
        let (identifiers, expressions) = match &self.ast.node(node).kind {
            StmtKind::VariableAssignment {
                identifiers,
                expressions,
            } => (identifiers.clone(), expressions.clone()),
            _ => unreachable!("emit_assignment on a non-assignment node"),
        };

        let mut content = String::new();

        for i in 0..identifiers.len() {
            let target = self.emit_expression(identifiers[i], scope)?;
            let value = self.emit_expression(expressions[i], scope)?;

            content += &format!("{}{} = {};", self.indent(), target, value);
            if i != identifiers.len() - 1 {
                content.push('\n');
            }
        }

        Ok(content)
    }

    fn emit_deallocation(&mut self, scope: ScopeId, var: usize) -> Result<String, CompileError> {
        let variable = self.scopes.var(scope, var);
        if !variable.allocated {
            return Ok(String::new());
        }

        let name = variable.name.clone();
        self.import_lib("stdlib.h");
        Ok(format!("{}free({});", self.indent(), name))
    }

    fn emit_expression(&mut self, node: NodeId, scope: ScopeId) -> Result<String, CompileError> {
        match &self.ast.node(node).kind {
            StmtKind::NumberLiteral { value } => Ok(value.clone()),
            StmtKind::StringLiteral { value } => Ok(format!("\"{value}\"")),
            StmtKind::BooleanLiteral { value } => Ok(if *value { "1" } else { "0" }.to_string()),
            StmtKind::IdentifierExpression { name } => {
                // Booleans live in a bit-field struct
                if let Some((var_scope, var_index)) = self.scopes.lookup_var(scope, name) {
                    if self.scopes.var(var_scope, var_index).ty.id == TypeId::Bool {
                        return Ok(format!("{name}.value"));
                    }
                }
                Ok(name.clone())
            }
            StmtKind::BinaryExpression { .. } => self.emit_binary(node, 0, scope),
            StmtKind::FunctionExpression { name, args } => {
                let (name, args) = (name.clone(), args.clone());
                let mut parts = Vec::new();
                for arg in args {
                    parts.push(self.emit_expression(arg, scope)?);
                }
                Ok(format!("{}({})", name, parts.join(", ")))
            }
            kind => {
                let trace = self.ast.node(node).trace;
                Err(CompileError::UnsupportedStatement {
                    kind: kind.name().to_string(),
                    trace,
                    span: trace.span(),
                })
            }
        }
    }

    /// Additive groups below the top level keep their parentheses;
    /// multiplicative groups never need them
    fn emit_binary(
        &mut self,
        node: NodeId,
        depth: usize,
        scope: ScopeId,
    ) -> Result<String, CompileError> {
        let (op, left, right) = match &self.ast.node(node).kind {
            StmtKind::BinaryExpression { op, left, right } => (*op, *left, *right),
            _ => unreachable!("emit_binary on a non-binary node"),
        };

        let prioritized = op.is_multiplicative();
        let mut content = String::new();

        if depth > 0 && !prioritized {
            content += "(";
        }

        content += &self.emit_operand(left, depth, scope)?;
        content += op.symbol();
        content += &self.emit_operand(right, depth, scope)?;

        if depth > 0 && !prioritized {
            content += ")";
        }

        Ok(content)
    }

    fn emit_operand(
        &mut self,
        node: NodeId,
        depth: usize,
        scope: ScopeId,
    ) -> Result<String, CompileError> {
        match &self.ast.node(node).kind {
            StmtKind::BinaryExpression { .. } => self.emit_binary(node, depth + 1, scope),
            _ => self.emit_expression(node, scope),
        }
    }
}
