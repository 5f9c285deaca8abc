//! Abstract Syntax Tree for the Comet language
//!
//! Nodes live in an arena owned by [`Ast`] and reference each other by
//! [`NodeId`] handles, so the tree has no pointer cycles and the context
//! pass can mutate nodes in place. The parser owns the tree; the context
//! builder enriches it (scope handles, back-filled types, synthesized
//! deallocation nodes); the emitter reads it.

pub mod types;

pub use types::{ActualType, TypeId, VariadicKind};

use crate::common::{NodeId, ScopeId, SourceTrace};
use serde::{Deserialize, Serialize};

/// The parsed program: a node arena plus the root handle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ast {
    pub nodes: Vec<Statement>,
    pub root: NodeId,
}

impl Ast {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: NodeId(0),
        }
    }

    pub fn alloc(&mut self, statement: Statement) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(statement);
        id
    }

    pub fn node(&self, id: NodeId) -> &Statement {
        &self.nodes[id.index()]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Statement {
        &mut self.nodes[id.index()]
    }

    /// Identifier name of a node, if it is an identifier expression
    pub fn identifier_name(&self, id: NodeId) -> Option<&str> {
        match &self.node(id).kind {
            StmtKind::IdentifierExpression { name } => Some(name),
            _ => None,
        }
    }
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

/// A single AST node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statement {
    pub kind: StmtKind,
    pub trace: SourceTrace,
}

impl Statement {
    pub fn new(kind: StmtKind, trace: SourceTrace) -> Self {
        Self { kind, trace }
    }
}

/// Binary operators, in precedence groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Modulus,
}

impl BinaryOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Addition => "+",
            BinaryOp::Subtraction => "-",
            BinaryOp::Multiplication => "*",
            BinaryOp::Division => "/",
            BinaryOp::Modulus => "%",
        }
    }

    /// Multiplicative operators bind tighter than additive ones
    pub fn is_multiplicative(&self) -> bool {
        !matches!(self, BinaryOp::Addition | BinaryOp::Subtraction)
    }
}

/// Statement and expression kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StmtKind {
    /// Program root; `scope` is filled by the context pass
    Root {
        children: Vec<NodeId>,
        scope: Option<ScopeId>,
    },
    NullLiteral,
    NumberLiteral {
        value: String,
    },
    StringLiteral {
        value: String,
    },
    BooleanLiteral {
        value: bool,
    },
    IdentifierExpression {
        name: String,
    },
    BinaryExpression {
        op: BinaryOp,
        left: NodeId,
        right: NodeId,
    },
    /// Function call, in expression or statement position
    FunctionExpression {
        name: String,
        args: Vec<NodeId>,
    },
    FunctionDeclaration {
        name: String,
        arg_names: Vec<String>,
        arg_types: Vec<ActualType>,
        /// At least one entry; defaults to `void`
        return_types: Vec<ActualType>,
        /// `None` exactly for native functions
        body: Option<NodeId>,
        native: bool,
    },
    /// Parallel declaration; `types` is back-filled by the context pass
    /// where the declared type was the `void` sentinel
    VariableDeclaration {
        identifiers: Vec<NodeId>,
        types: Vec<ActualType>,
        expressions: Vec<NodeId>,
        constant: bool,
    },
    ScopeDeclaration {
        children: Vec<NodeId>,
        scope: Option<ScopeId>,
    },
    VariableAssignment {
        identifiers: Vec<NodeId>,
        expressions: Vec<NodeId>,
    },
    ImportStatement {
        paths: Vec<String>,
        native: bool,
    },
    /// Synthesized by the context pass after a variable's last use;
    /// references the owning scope's variable table
    MemoryDeAllocation {
        scope: ScopeId,
        var: usize,
    },
}

impl StmtKind {
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Root { .. } => "Root",
            StmtKind::NullLiteral => "NullLiteral",
            StmtKind::NumberLiteral { .. } => "NumberLiteral",
            StmtKind::StringLiteral { .. } => "StringLiteral",
            StmtKind::BooleanLiteral { .. } => "BooleanLiteral",
            StmtKind::IdentifierExpression { .. } => "IdentifierExpression",
            StmtKind::BinaryExpression { .. } => "BinaryExpression",
            StmtKind::FunctionExpression { .. } => "FunctionExpression",
            StmtKind::FunctionDeclaration { .. } => "FunctionDeclaration",
            StmtKind::VariableDeclaration { .. } => "VariableDeclaration",
            StmtKind::ScopeDeclaration { .. } => "ScopeDeclaration",
            StmtKind::VariableAssignment { .. } => "VariableAssignment",
            StmtKind::ImportStatement { .. } => "ImportStatement",
            StmtKind::MemoryDeAllocation { .. } => "MemoryDeAllocation",
        }
    }
}
