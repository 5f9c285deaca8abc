//! Parser for the Comet language
//!
//! A recursive descent parser that produces an [`Ast`] arena from a token
//! stream. One failure aborts the parse; line feeds and semicolons are
//! statement terminators and are dropped from the output.

use crate::ast::*;
use crate::common::{NodeId, SourceTrace};
use crate::diagnostics::CompileError;
use crate::lexer::{Token, TokenKind};

/// Parse a token stream into an AST rooted at a `Root` node
pub fn parse(tokens: &[Token]) -> Result<Ast, CompileError> {
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}

/// Parser state
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    ast: Ast,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens,
            pos: 0,
            ast: Ast::new(),
        }
    }

    fn current(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens
                .last()
                .expect("token stream should have at least EOF")
        })
    }

    fn peek(&self) -> TokenKind {
        self.current().kind
    }

    fn peek_next(&self) -> TokenKind {
        self.tokens
            .get(self.pos + 1)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.pos.min(self.tokens.len() - 1)];
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<&Token, CompileError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn is_done(&self) -> bool {
        self.pos >= self.tokens.len() || self.at(TokenKind::Eof)
    }

    fn trace(&self) -> SourceTrace {
        self.current().trace
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let token = self.current();
        let found = match token.kind {
            TokenKind::Identifier | TokenKind::Number | TokenKind::String | TokenKind::Boolean => {
                format!("`{}`", token.text)
            }
            kind => kind.as_str().to_string(),
        };
        CompileError::UnexpectedToken {
            expected: expected.to_string(),
            found,
            trace: token.trace,
            span: token.trace.span(),
        }
    }

    /// A statement ends at a line feed, semicolon, closing brace, or the
    /// end of input; the terminator is never consumed here
    fn demand_terminator(&mut self) -> Result<(), CompileError> {
        match self.peek() {
            TokenKind::Lf | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("new line or semicolon")),
        }
    }

    // ==================== PROGRAM ====================

    fn parse_program(&mut self) -> Result<Ast, CompileError> {
        let mut children = Vec::new();

        while !self.is_done() {
            if let Some(statement) = self.parse_statement()? {
                children.push(statement);
            }
        }

        let root = self.ast.alloc(Statement::new(
            StmtKind::Root {
                children,
                scope: None,
            },
            SourceTrace::default(),
        ));
        self.ast.root = root;

        Ok(std::mem::take(&mut self.ast))
    }

    // ==================== STATEMENTS ====================

    /// Returns `None` for ignored line feeds and semicolons
    fn parse_statement(&mut self) -> Result<Option<NodeId>, CompileError> {
        match self.peek() {
            TokenKind::Lf | TokenKind::Semicolon => {
                self.advance();
                Ok(None)
            }
            TokenKind::LBrace => self.parse_scope().map(Some),
            TokenKind::Function => self.parse_function().map(Some),
            TokenKind::Import => self.parse_import().map(Some),
            TokenKind::Var | TokenKind::Const => self.parse_variable_declaration().map(Some),
            TokenKind::Identifier => {
                if self.peek_next() == TokenKind::Equals {
                    self.parse_assignment().map(Some)
                } else {
                    // Expression statement: a call, or a bare expression
                    // such as a trailing identifier
                    let expression = self.parse_expression()?;
                    self.demand_terminator()?;
                    Ok(Some(expression))
                }
            }
            TokenKind::LParen => self.parse_assignment().map(Some),
            _ => Err(self.unexpected("statement")),
        }
    }

    fn parse_scope(&mut self) -> Result<NodeId, CompileError> {
        let start = self.trace();
        self.expect(TokenKind::LBrace, "{")?;

        let mut children = Vec::new();
        loop {
            if self.at(TokenKind::RBrace) {
                self.advance();
                break;
            }
            if self.is_done() {
                return Err(self.unexpected("}"));
            }
            if let Some(statement) = self.parse_statement()? {
                children.push(statement);
            }
        }

        Ok(self.ast.alloc(Statement::new(
            StmtKind::ScopeDeclaration {
                children,
                scope: None,
            },
            start,
        )))
    }

    // ==================== FUNCTIONS ====================

    fn parse_function(&mut self) -> Result<NodeId, CompileError> {
        let start = self.trace();
        self.advance(); // fn

        let native = if self.at(TokenKind::Native) {
            self.advance();
            true
        } else {
            false
        };

        let name = self
            .expect(TokenKind::Identifier, "function name")?
            .text
            .clone();

        self.expect(TokenKind::LParen, "(")?;

        let mut arg_names = Vec::new();
        let mut arg_types = Vec::new();

        loop {
            if self.at(TokenKind::RParen) {
                self.advance();
                break;
            }

            if !self.at(TokenKind::Identifier) {
                return Err(self.unexpected("type"));
            }
            let mut arg_type = ActualType::from_name(&self.current().text);
            self.advance();

            let variadic_trace = self.trace();
            match self.peek() {
                TokenKind::Variadic => {
                    arg_type.variadic = Some(VariadicKind::Validated);
                    self.advance();
                }
                TokenKind::VariadicNoValidate => {
                    arg_type.variadic = Some(VariadicKind::Unvalidated);
                    self.advance();
                }
                _ => {}
            }

            // A variadic parameter may omit its name
            let arg_name = if self.at(TokenKind::Identifier) {
                self.advance().text.clone()
            } else if arg_type.variadic.is_some() {
                String::new()
            } else {
                return Err(self.unexpected("identifier for argument name"));
            };

            let variadic = arg_type.variadic.is_some();
            arg_types.push(arg_type);
            arg_names.push(arg_name);

            if self.at(TokenKind::RParen) {
                self.advance();
                break;
            }
            if variadic {
                return Err(CompileError::InvalidVariadic {
                    trace: variadic_trace,
                    span: variadic_trace.span(),
                });
            }
            self.expect(TokenKind::Comma, ", or )")?;
        }

        let return_types = self.parse_return_types()?;

        if native && self.at(TokenKind::LBrace) {
            let trace = self.trace();
            return Err(CompileError::NativeWithBody {
                name,
                trace,
                span: trace.span(),
            });
        }

        let body = if native {
            None
        } else {
            if !self.at(TokenKind::LBrace) {
                let trace = self.trace();
                return Err(CompileError::MissingFunctionBody {
                    name,
                    trace,
                    span: trace.span(),
                });
            }
            Some(self.parse_scope()?)
        };

        Ok(self.ast.alloc(Statement::new(
            StmtKind::FunctionDeclaration {
                name,
                arg_names,
                arg_types,
                return_types,
                body,
                native,
            },
            start,
        )))
    }

    fn parse_return_types(&mut self) -> Result<Vec<ActualType>, CompileError> {
        if !self.at(TokenKind::ArrowRight) {
            return Ok(vec![ActualType::simple(TypeId::Void)]);
        }
        self.advance();

        let mut return_types = Vec::new();

        if self.at(TokenKind::LParen) {
            self.advance();
            loop {
                // Catches `-> ()` and `-> (int,)`
                if self.at(TokenKind::RParen) {
                    return Err(self.unexpected("type"));
                }
                if !self.at(TokenKind::Identifier) {
                    return Err(self.unexpected("type"));
                }
                return_types.push(ActualType::from_name(&self.current().text));
                self.advance();

                if self.at(TokenKind::RParen) {
                    self.advance();
                    break;
                }
                self.expect(TokenKind::Comma, ", or )")?;
            }
        } else {
            if !self.at(TokenKind::Identifier) {
                return Err(self.unexpected("type"));
            }
            return_types.push(ActualType::from_name(&self.current().text));
            self.advance();
        }

        Ok(return_types)
    }

    // ==================== IMPORTS ====================

    fn parse_import(&mut self) -> Result<NodeId, CompileError> {
        let start = self.trace();
        self.advance(); // import

        let native = if self.at(TokenKind::Native) {
            self.advance();
            true
        } else {
            false
        };

        let values = self.parse_expression_group()?;

        let mut paths = Vec::new();
        for value in values {
            match &self.ast.node(value).kind {
                StmtKind::StringLiteral { value } => paths.push(value.clone()),
                _ => return Err(self.unexpected("string")),
            }
        }

        self.demand_terminator()?;

        Ok(self.ast.alloc(Statement::new(
            StmtKind::ImportStatement { paths, native },
            start,
        )))
    }

    // ==================== VARIABLES ====================

    fn parse_variable_declaration(&mut self) -> Result<NodeId, CompileError> {
        let start = self.trace();
        let constant = self.at(TokenKind::Const);
        self.advance(); // var | const

        let identifiers = self.parse_identifier_list()?;

        let mut types: Vec<ActualType> = Vec::new();
        let mut typed = false;

        if self.at(TokenKind::Colon) {
            self.advance();
            typed = true;

            if self.at(TokenKind::LParen) {
                self.advance();
                loop {
                    types.push(self.parse_variable_type()?);

                    if self.at(TokenKind::RParen) {
                        self.advance();
                        break;
                    }
                    self.expect(TokenKind::Comma, ", or )")?;
                }

                if types.len() > 1 && identifiers.len() != types.len() {
                    return Err(CompileError::TypeArityMismatch {
                        identifiers: identifiers.len(),
                        types: types.len(),
                        trace: start,
                        span: start.span(),
                    });
                }
            } else {
                types.push(self.parse_variable_type()?);
            }
        }

        let mut expressions = Vec::new();

        if self.at(TokenKind::Equals) {
            self.advance();
            expressions = self.parse_value_list(identifiers.len(), start)?;
        }

        if !typed && expressions.is_empty() {
            return Err(CompileError::MissingTypeOrValue {
                trace: start,
                span: start.span(),
            });
        }

        if !expressions.is_empty() && identifiers.len() != expressions.len() {
            return Err(CompileError::ExpressionArityMismatch {
                identifiers: identifiers.len(),
                expressions: expressions.len(),
                trace: start,
                span: start.span(),
            });
        }

        // A single type declares all identifiers; no type at all leaves the
        // void sentinel for the context pass to back-fill
        if types.is_empty() {
            types = vec![ActualType::default(); identifiers.len()];
        } else if types.len() == 1 {
            while types.len() < identifiers.len() {
                types.push(types[0].clone());
            }
        }

        self.demand_terminator()?;

        Ok(self.ast.alloc(Statement::new(
            StmtKind::VariableDeclaration {
                identifiers,
                types,
                expressions,
                constant,
            },
            start,
        )))
    }

    fn parse_variable_type(&mut self) -> Result<ActualType, CompileError> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.unexpected("type for variable declaration"));
        }
        let token = self.current();
        let parsed = ActualType::from_name(&token.text);
        if parsed.id == TypeId::Void {
            let trace = token.trace;
            return Err(CompileError::VoidVariable {
                trace,
                span: trace.span(),
            });
        }
        self.advance();
        Ok(parsed)
    }

    fn parse_assignment(&mut self) -> Result<NodeId, CompileError> {
        let start = self.trace();
        let identifiers = self.parse_identifier_list()?;

        if !self.at(TokenKind::Equals) {
            return Err(self.unexpected("="));
        }
        self.advance();

        let expressions = self.parse_value_list(identifiers.len(), start)?;

        if identifiers.len() != expressions.len() {
            return Err(CompileError::ExpressionArityMismatch {
                identifiers: identifiers.len(),
                expressions: expressions.len(),
                trace: start,
                span: start.span(),
            });
        }

        self.demand_terminator()?;

        Ok(self.ast.alloc(Statement::new(
            StmtKind::VariableAssignment {
                identifiers,
                expressions,
            },
            start,
        )))
    }

    /// `x` or `(a, b, c)` in declaration/assignment target position
    fn parse_identifier_list(&mut self) -> Result<Vec<NodeId>, CompileError> {
        let mut identifiers = Vec::new();

        if self.at(TokenKind::LParen) {
            self.advance();
            loop {
                identifiers.push(self.parse_identifier()?);

                if self.at(TokenKind::RParen) {
                    self.advance();
                    break;
                }
                if self.at(TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                return Err(self.unexpected(", or )"));
            }
        } else {
            identifiers.push(self.parse_identifier()?);
        }

        Ok(identifiers)
    }

    fn parse_identifier(&mut self) -> Result<NodeId, CompileError> {
        if !self.at(TokenKind::Identifier) {
            return Err(self.unexpected("identifier"));
        }
        let token = self.advance();
        let (name, trace) = (token.text.clone(), token.trace);
        Ok(self
            .ast
            .alloc(Statement::new(StmtKind::IdentifierExpression { name }, trace)))
    }

    /// The right-hand side of `=`: one expression, or a parenthesised
    /// comma group when assigning to several identifiers
    fn parse_value_list(
        &mut self,
        identifier_count: usize,
        start: SourceTrace,
    ) -> Result<Vec<NodeId>, CompileError> {
        let mut expressions = Vec::new();

        if self.at(TokenKind::LParen) && identifier_count > 1 {
            self.advance();
            loop {
                expressions.push(self.parse_expression()?);

                if self.at(TokenKind::RParen) {
                    self.advance();
                    break;
                }
                if self.at(TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                return Err(self.unexpected(", or )"));
            }
        } else {
            if identifier_count > 1 {
                return Err(CompileError::ExpressionArityMismatch {
                    identifiers: identifier_count,
                    expressions: 1,
                    trace: start,
                    span: start.span(),
                });
            }
            expressions.push(self.parse_expression()?);
        }

        Ok(expressions)
    }

    /// `(X, X, ..., X)` or a single `X`
    fn parse_expression_group(&mut self) -> Result<Vec<NodeId>, CompileError> {
        let mut result = Vec::new();

        if self.at(TokenKind::LParen) {
            self.advance();
            loop {
                // Catches `()` and trailing commas
                if self.at(TokenKind::RParen) {
                    return Err(self.unexpected("expression"));
                }

                result.push(self.parse_expression()?);

                if self.at(TokenKind::RParen) {
                    self.advance();
                    break;
                }
                if self.at(TokenKind::Comma) {
                    self.advance();
                    continue;
                }
                return Err(self.unexpected(", or )"));
            }
        } else {
            result.push(self.parse_expression()?);
        }

        Ok(result)
    }

    // ==================== EXPRESSIONS ====================

    fn parse_expression(&mut self) -> Result<NodeId, CompileError> {
        self.parse_additive()
    }

    fn parse_additive(&mut self) -> Result<NodeId, CompileError> {
        let mut left = self.parse_multiplicative()?;

        loop {
            if self.is_done() {
                break;
            }

            let op = match self.peek() {
                TokenKind::Addition => BinaryOp::Addition,
                TokenKind::Subtraction => BinaryOp::Subtraction,
                _ => break,
            };
            self.advance();

            let right = self.parse_multiplicative()?;
            let trace = self.ast.node(left).trace;
            left = self.ast.alloc(Statement::new(
                StmtKind::BinaryExpression { op, left, right },
                trace,
            ));
        }

        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<NodeId, CompileError> {
        let mut left = self.parse_primary()?;

        loop {
            if self.is_done() {
                break;
            }

            let op = match self.peek() {
                TokenKind::Multiplication => BinaryOp::Multiplication,
                TokenKind::Division => BinaryOp::Division,
                TokenKind::Modulus => BinaryOp::Modulus,
                _ => break,
            };
            self.advance();

            let right = self.parse_primary()?;
            let trace = self.ast.node(left).trace;
            left = self.ast.alloc(Statement::new(
                StmtKind::BinaryExpression { op, left, right },
                trace,
            ));
        }

        Ok(left)
    }

    fn parse_primary(&mut self) -> Result<NodeId, CompileError> {
        let token = self.current().clone();

        match token.kind {
            TokenKind::Identifier => {
                self.advance();
                if self.at(TokenKind::LParen) {
                    return self.parse_call(token.text, token.trace);
                }
                Ok(self.ast.alloc(Statement::new(
                    StmtKind::IdentifierExpression { name: token.text },
                    token.trace,
                )))
            }
            TokenKind::Number => {
                self.advance();
                Ok(self.ast.alloc(Statement::new(
                    StmtKind::NumberLiteral { value: token.text },
                    token.trace,
                )))
            }
            TokenKind::String => {
                self.advance();
                Ok(self.ast.alloc(Statement::new(
                    StmtKind::StringLiteral { value: token.text },
                    token.trace,
                )))
            }
            TokenKind::Boolean => {
                self.advance();
                Ok(self.ast.alloc(Statement::new(
                    StmtKind::BooleanLiteral {
                        value: token.text == "true",
                    },
                    token.trace,
                )))
            }
            TokenKind::Null => {
                self.advance();
                Ok(self
                    .ast
                    .alloc(Statement::new(StmtKind::NullLiteral, token.trace)))
            }
            TokenKind::LParen => {
                self.advance();
                let wrapped = self.parse_expression()?;
                if !self.at(TokenKind::RParen) {
                    return Err(self.unexpected(")"));
                }
                self.advance();
                Ok(wrapped)
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    fn parse_call(&mut self, name: String, trace: SourceTrace) -> Result<NodeId, CompileError> {
        self.advance(); // (

        let mut args = Vec::new();
        if self.at(TokenKind::RParen) {
            self.advance();
        } else {
            loop {
                args.push(self.parse_expression()?);

                if self.at(TokenKind::RParen) {
                    self.advance();
                    break;
                }
                self.expect(TokenKind::Comma, ", or )")?;
            }
        }

        Ok(self.ast.alloc(Statement::new(
            StmtKind::FunctionExpression { name, args },
            trace,
        )))
    }
}
