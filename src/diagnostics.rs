//! Diagnostic reporting with source locations
//!
//! Every pipeline stage fails with at most one [`CompileError`]; the
//! variants are grouped by stage. Each error carries the nearest
//! [`SourceTrace`], both baked into the message (`message @ row:col`, the
//! format the CLI prints to stderr) and as a labelled span for rich
//! terminal reports. Advisory [`Hint`]s never abort compilation.

use crate::common::SourceTrace;
use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Compiler diagnostic
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CompileError {
    // === Lex errors ===
    #[error("Unknown character '{ch}' @ {trace}")]
    #[diagnostic(code(lex::unknown_character))]
    UnknownCharacter {
        ch: char,
        trace: SourceTrace,
        #[label("unrecognized character")]
        span: SourceSpan,
    },

    // === Parse errors ===
    #[error("Unexpected token: expected {expected}, found {found} @ {trace}")]
    #[diagnostic(code(parse::unexpected_token))]
    UnexpectedToken {
        expected: String,
        found: String,
        trace: SourceTrace,
        #[label("unexpected token here")]
        span: SourceSpan,
    },

    #[error("Variadic parameter must be the last parameter @ {trace}")]
    #[diagnostic(code(parse::invalid_variadic))]
    InvalidVariadic {
        trace: SourceTrace,
        #[label("variadic parameter here")]
        span: SourceSpan,
    },

    #[error("Native function {name} cannot define a scope @ {trace}")]
    #[diagnostic(code(parse::native_with_body))]
    NativeWithBody {
        name: String,
        trace: SourceTrace,
        #[label("body not allowed")]
        span: SourceSpan,
    },

    #[error("Function {name} is missing a body @ {trace}")]
    #[diagnostic(
        code(parse::missing_body),
        help("only functions declared `fn native` may omit a body")
    )]
    MissingFunctionBody {
        name: String,
        trace: SourceTrace,
        #[label("expected a scope here")]
        span: SourceSpan,
    },

    #[error("Identifier and expression count mismatch: {identifiers} identifiers, {expressions} expressions @ {trace}")]
    #[diagnostic(code(parse::expression_arity))]
    ExpressionArityMismatch {
        identifiers: usize,
        expressions: usize,
        trace: SourceTrace,
        #[label("counts must match")]
        span: SourceSpan,
    },

    #[error(
        "Identifier and type count mismatch: {identifiers} identifiers, {types} types @ {trace}"
    )]
    #[diagnostic(code(parse::type_arity))]
    TypeArityMismatch {
        identifiers: usize,
        types: usize,
        trace: SourceTrace,
        #[label("counts must match")]
        span: SourceSpan,
    },

    #[error("Cannot declare variable as void @ {trace}")]
    #[diagnostic(code(parse::void_variable))]
    VoidVariable {
        trace: SourceTrace,
        #[label("void type here")]
        span: SourceSpan,
    },

    #[error("Variable declaration needs an explicit type or an initial value @ {trace}")]
    #[diagnostic(code(parse::missing_type_or_value))]
    MissingTypeOrValue {
        trace: SourceTrace,
        #[label("no type and no value")]
        span: SourceSpan,
    },

    // === Context errors ===
    #[error("Variable {name} is already declared @ {trace}")]
    #[diagnostic(code(context::duplicate_variable))]
    DuplicateVariable {
        name: String,
        trace: SourceTrace,
        #[label("redeclared here")]
        span: SourceSpan,
    },

    #[error("Function {name} is already declared @ {trace}")]
    #[diagnostic(code(context::duplicate_function))]
    DuplicateFunction {
        name: String,
        trace: SourceTrace,
        #[label("redeclared here")]
        span: SourceSpan,
    },

    #[error("Function {name} must be declared at the global scope @ {trace}")]
    #[diagnostic(code(context::nested_function))]
    NestedFunction {
        name: String,
        trace: SourceTrace,
        #[label("nested declaration here")]
        span: SourceSpan,
    },

    #[error("Undefined identifier {name} @ {trace}")]
    #[diagnostic(code(context::unknown_identifier))]
    UnknownIdentifier {
        name: String,
        trace: SourceTrace,
        #[label("not found in this scope")]
        span: SourceSpan,
    },

    #[error("Undefined function {name} @ {trace}")]
    #[diagnostic(code(context::unknown_function))]
    UnknownFunction {
        name: String,
        trace: SourceTrace,
        #[label("no such function")]
        span: SourceSpan,
    },

    #[error("Cannot assign to constant {name} @ {trace}")]
    #[diagnostic(code(context::assign_to_constant))]
    AssignToConstant {
        name: String,
        trace: SourceTrace,
        #[label("declared const")]
        span: SourceSpan,
    },

    #[error("Value of variable {name} does not match its type: declared {declared}, inferred {inferred} @ {trace}")]
    #[diagnostic(code(context::declaration_type_mismatch))]
    DeclarationTypeMismatch {
        name: String,
        declared: String,
        inferred: String,
        trace: SourceTrace,
        #[label("declared {declared}")]
        span: SourceSpan,
    },

    #[error("Cannot assign {found} to variable {name} of type {expected} @ {trace}")]
    #[diagnostic(code(context::assignment_type_mismatch))]
    AssignmentTypeMismatch {
        name: String,
        expected: String,
        found: String,
        trace: SourceTrace,
        #[label("expected {expected}")]
        span: SourceSpan,
    },

    #[error("Incompatible operand types {left} and {right} @ {trace}")]
    #[diagnostic(code(context::operand_type_mismatch))]
    OperandTypeMismatch {
        left: String,
        right: String,
        trace: SourceTrace,
        #[label("operands cannot combine")]
        span: SourceSpan,
    },

    #[error(
        "Argument {index} of call to {function} has type {found}, expected {expected} @ {trace}"
    )]
    #[diagnostic(code(context::argument_type_mismatch))]
    ArgumentTypeMismatch {
        function: String,
        index: usize,
        expected: String,
        found: String,
        trace: SourceTrace,
        #[label("expected {expected}")]
        span: SourceSpan,
    },

    #[error("Call to {function} expects {expected} arguments, found {found} @ {trace}")]
    #[diagnostic(code(context::argument_count_mismatch))]
    ArgumentCountMismatch {
        function: String,
        expected: usize,
        found: usize,
        trace: SourceTrace,
        #[label("wrong argument count")]
        span: SourceSpan,
    },

    #[error("Function {function} cannot be used as an expression @ {trace}")]
    #[diagnostic(
        code(context::invalid_expression_call),
        help("only functions returning exactly one value may appear in expressions")
    )]
    InvalidExpressionCall {
        function: String,
        trace: SourceTrace,
        #[label("call used as a value")]
        span: SourceSpan,
    },

    #[error("Cannot infer a type for this expression @ {trace}")]
    #[diagnostic(code(context::cannot_infer))]
    CannotInfer {
        trace: SourceTrace,
        #[label("no type")]
        span: SourceSpan,
    },

    #[error("Unused variable {name} @ {trace}")]
    #[diagnostic(code(context::unused_variable))]
    UnusedVariable {
        name: String,
        trace: SourceTrace,
        #[label("declared but never read")]
        span: SourceSpan,
    },

    // === Emit errors ===
    #[error("Cannot emit statement kind {kind} @ {trace}")]
    #[diagnostic(code(emit::unsupported_statement))]
    UnsupportedStatement {
        kind: String,
        trace: SourceTrace,
        #[label("unsupported here")]
        span: SourceSpan,
    },

    #[error("Missing context information @ {trace}")]
    #[diagnostic(
        code(emit::missing_context),
        help("the context pass must run before code generation")
    )]
    MissingContext {
        trace: SourceTrace,
        #[label("unanalyzed scope")]
        span: SourceSpan,
    },
}

impl CompileError {
    /// The trace the error was raised at
    pub fn trace(&self) -> SourceTrace {
        match self {
            CompileError::UnknownCharacter { trace, .. }
            | CompileError::UnexpectedToken { trace, .. }
            | CompileError::InvalidVariadic { trace, .. }
            | CompileError::NativeWithBody { trace, .. }
            | CompileError::MissingFunctionBody { trace, .. }
            | CompileError::ExpressionArityMismatch { trace, .. }
            | CompileError::TypeArityMismatch { trace, .. }
            | CompileError::VoidVariable { trace, .. }
            | CompileError::MissingTypeOrValue { trace, .. }
            | CompileError::DuplicateVariable { trace, .. }
            | CompileError::DuplicateFunction { trace, .. }
            | CompileError::NestedFunction { trace, .. }
            | CompileError::UnknownIdentifier { trace, .. }
            | CompileError::UnknownFunction { trace, .. }
            | CompileError::AssignToConstant { trace, .. }
            | CompileError::DeclarationTypeMismatch { trace, .. }
            | CompileError::AssignmentTypeMismatch { trace, .. }
            | CompileError::OperandTypeMismatch { trace, .. }
            | CompileError::ArgumentTypeMismatch { trace, .. }
            | CompileError::ArgumentCountMismatch { trace, .. }
            | CompileError::InvalidExpressionCall { trace, .. }
            | CompileError::CannotInfer { trace, .. }
            | CompileError::UnusedVariable { trace, .. }
            | CompileError::UnsupportedStatement { trace, .. }
            | CompileError::MissingContext { trace, .. } => *trace,
        }
    }
}

/// Advisory message produced by the context pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    pub message: String,
    pub trace: SourceTrace,
}

impl Hint {
    pub fn new(message: impl Into<String>, trace: SourceTrace) -> Self {
        Self {
            message: message.into(),
            trace,
        }
    }
}
