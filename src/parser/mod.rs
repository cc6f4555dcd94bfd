mod parse_error;
pub use parse_error::ParseError;

use crate::ast::{self, Expression, Statement};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use std::convert::TryFrom;
use std::mem;
use std::rc::Rc;
use tracing::{debug, trace};


/// Binding strength of an operator token, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
}

impl From<TokenType> for Precedence {
    fn from(token_type: TokenType) -> Self {
        match token_type {
            TokenType::Eq | TokenType::NotEq => Self::Equals,
            TokenType::LT | TokenType::GT => Self::LessGreater,
            TokenType::Plus | TokenType::Minus => Self::Sum,
            TokenType::Slash | TokenType::Asterisk => Self::Product,
            TokenType::LParen => Self::Call,
            TokenType::Illegal
            | TokenType::Eof
            | TokenType::Ident
            | TokenType::Int
            | TokenType::String
            | TokenType::Assign
            | TokenType::Bang
            | TokenType::Comma
            | TokenType::Semicolon
            | TokenType::RParen
            | TokenType::LBrace
            | TokenType::RBrace
            | TokenType::Else
            | TokenType::False
            | TokenType::Function
            | TokenType::If
            | TokenType::Let
            | TokenType::Return
            | TokenType::True => Self::Lowest,
        }
    }
}

pub struct Parser<I: Iterator<Item = Token>> {
    tokens: I,
    cur_token: Token,
    peek_token: Token,
    errors: Vec<ParseError>,
}

impl<I: Iterator<Item = Token>> Parser<I> {
    pub fn new<T: IntoIterator<Item = Token, IntoIter = I>>(tokens: T) -> Self {
        let mut tokens = tokens.into_iter();
        let cur_token = tokens.next().unwrap_or(Token::Eof);
        let peek_token = tokens.next().unwrap_or(Token::Eof);

        Self {
            tokens,
            cur_token,
            peek_token,
            errors: vec![],
        }
    }

    fn next_token(&mut self) {
        let peek_token = self.tokens.next().unwrap_or(Token::Eof);
        self.cur_token = mem::replace(&mut self.peek_token, peek_token);
    }

    /// Parse the whole token stream. The program is returned even when
    /// diagnostics were recorded; it must not be evaluated in that case.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn parse(mut self) -> (ast::Program, Vec<ParseError>) {
        let mut program = ast::Program::default();

        while !self.cur_token.is(TokenType::Eof) {
            match self.parse_statement() {
                Some(stmt) => program.statements.push(stmt),
                None => self.synchronize(),
            }
            self.next_token();
        }

        debug!(
            statements = program.statements.len(),
            errors = self.errors.len(),
            "parsed program"
        );
        (program, self.errors)
    }

    pub fn parse_program(self) -> Result<ast::Program, Vec<ParseError>> {
        let (program, errors) = self.parse();

        if errors.is_empty() {
            Ok(program)
        } else {
            Err(errors)
        }
    }

    /// Skip the rest of a malformed statement. Stops on the terminator or at
    /// end of input, whichever comes first.
    fn synchronize(&mut self) {
        while !self.cur_token.is(TokenType::Semicolon) && !self.cur_token.is(TokenType::Eof) {
            self.next_token();
        }
    }

    /// Like `synchronize`, but also stops where the enclosing block closes.
    /// The closing brace becomes the current token.
    fn synchronize_in_block(&mut self) {
        while !self.cur_token.is(TokenType::Semicolon)
            && !self.cur_token.is(TokenType::RBrace)
            && !self.cur_token.is(TokenType::Eof)
        {
            if self.peek_token.is(TokenType::RBrace) {
                self.next_token();
                return;
            }
            self.next_token();
        }
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        trace!(token = %self.cur_token.token_type(), "statement");
        match self.cur_token.token_type() {
            TokenType::Let => self.parse_let_statement().map(Statement::Let),
            TokenType::Return => self.parse_return_statement().map(Statement::Return),
            _ => self.parse_expression_statement().map(Statement::Expr),
        }
    }

    fn parse_let_statement(&mut self) -> Option<ast::LetStatement> {
        let token = self.cur_token.clone();

        if !self.expect_peek(TokenType::Ident) {
            return None;
        }

        let name: ast::Identifier = self.cur_token.clone().into();

        if !self.expect_peek(TokenType::Assign) {
            return None;
        }

        self.next_token();
        let value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();

        Some(ast::LetStatement { token, name, value })
    }

    fn parse_return_statement(&mut self) -> Option<ast::ReturnStatement> {
        let token = self.cur_token.clone();

        self.next_token();
        let return_value = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();

        Some(ast::ReturnStatement {
            token,
            return_value,
        })
    }

    fn parse_expression_statement(&mut self) -> Option<ast::ExpressionStatement> {
        let token = self.cur_token.clone();
        let expression = self.parse_expression(Precedence::Lowest)?;
        self.skip_optional_semicolon();

        Some(ast::ExpressionStatement { token, expression })
    }

    fn skip_optional_semicolon(&mut self) {
        if self.peek_token.is(TokenType::Semicolon) {
            self.next_token();
        }
    }

    /// Collects statements up to the closing brace, leaving it as the
    /// current token.
    fn parse_block_statement(&mut self) -> Option<ast::BlockStatement> {
        let token = self.cur_token.clone();
        let mut statements = vec![];

        self.next_token();

        while !self.cur_token.is(TokenType::RBrace) && !self.cur_token.is(TokenType::Eof) {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => {
                    self.synchronize_in_block();
                    if self.cur_token.is(TokenType::RBrace) {
                        continue;
                    }
                }
            }
            self.next_token();
        }

        if !self.cur_token.is(TokenType::RBrace) {
            self.errors.push(ParseError::UnexpectedToken {
                expected: TokenType::RBrace,
                got: self.cur_token.token_type(),
            });
            return None;
        }

        Some(ast::BlockStatement { token, statements })
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        ensure_sufficient_stack(|| -> Option<Expression> {
            let mut left = self.parse_prefix()?;

            while !self.peek_token.is(TokenType::Semicolon) && precedence < self.peek_precedence() {
                left = match self.peek_token.token_type() {
                    TokenType::Plus
                    | TokenType::Minus
                    | TokenType::Slash
                    | TokenType::Asterisk
                    | TokenType::LT
                    | TokenType::GT
                    | TokenType::Eq
                    | TokenType::NotEq => {
                        self.next_token();
                        self.parse_infix_expression(left)?
                    }
                    TokenType::LParen => {
                        self.next_token();
                        self.parse_call_expression(left)?
                    }
                    TokenType::Illegal
                    | TokenType::Eof
                    | TokenType::Ident
                    | TokenType::Int
                    | TokenType::String
                    | TokenType::Assign
                    | TokenType::Bang
                    | TokenType::Comma
                    | TokenType::Semicolon
                    | TokenType::RParen
                    | TokenType::LBrace
                    | TokenType::RBrace
                    | TokenType::Else
                    | TokenType::False
                    | TokenType::Function
                    | TokenType::If
                    | TokenType::Let
                    | TokenType::Return
                    | TokenType::True => return Some(left),
                };
            }

            Some(left)
        })
    }

    fn parse_prefix(&mut self) -> Option<Expression> {
        match self.cur_token.token_type() {
            TokenType::Ident => Some(Expression::Identifier(self.cur_token.clone().into())),
            TokenType::Int => self.parse_integer_literal(),
            TokenType::String => Some(Expression::String(ast::StringLiteral {
                token: self.cur_token.clone(),
                value: self.cur_token.literal(),
            })),
            TokenType::True | TokenType::False => Some(Expression::Boolean(ast::Boolean {
                token: self.cur_token.clone(),
                value: self.cur_token.is(TokenType::True),
            })),
            TokenType::Bang | TokenType::Minus => self.parse_prefix_expression(),
            TokenType::LParen => self.parse_grouped_expression(),
            TokenType::If => self.parse_if_expression(),
            TokenType::Function => self.parse_function_literal(),
            token_type @ TokenType::Illegal
            | token_type @ TokenType::Eof
            | token_type @ TokenType::Assign
            | token_type @ TokenType::Plus
            | token_type @ TokenType::Slash
            | token_type @ TokenType::Asterisk
            | token_type @ TokenType::LT
            | token_type @ TokenType::GT
            | token_type @ TokenType::Eq
            | token_type @ TokenType::NotEq
            | token_type @ TokenType::Comma
            | token_type @ TokenType::Semicolon
            | token_type @ TokenType::RParen
            | token_type @ TokenType::LBrace
            | token_type @ TokenType::RBrace
            | token_type @ TokenType::Else
            | token_type @ TokenType::Let
            | token_type @ TokenType::Return => {
                self.errors.push(ParseError::NoPrefixParseFn { token_type });
                None
            }
        }
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        let literal = self.cur_token.literal();
        match literal.parse() {
            Ok(value) => Some(Expression::IntegerLiteral(ast::IntegerLiteral {
                token: self.cur_token.clone(),
                value,
            })),
            Err(_) => {
                self.errors.push(ParseError::InvalidInteger { literal });
                None
            }
        }
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();
        let operator = ast::Operator::try_from(&token).ok()?;

        self.next_token();
        let right = self.parse_expression(Precedence::Prefix)?;

        Some(Expression::Prefix(ast::PrefixExpression {
            token,
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        let operator = ast::Operator::try_from(&token).ok()?;
        let precedence = self.cur_precedence();

        self.next_token();
        let right = self.parse_expression(precedence)?;

        Some(Expression::Infix(ast::InfixExpression {
            token,
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();

        let expression = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::RParen) {
            return None;
        }

        Some(expression)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();

        if !self.expect_peek(TokenType::LParen) {
            return None;
        }

        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenType::RParen) || !self.expect_peek(TokenType::LBrace) {
            return None;
        }

        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_token.is(TokenType::Else) {
            self.next_token();
            if !self.expect_peek(TokenType::LBrace) {
                return None;
            }
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Some(Expression::If(ast::IfExpression {
            token,
            condition: Box::new(condition),
            consequence,
            alternative,
        }))
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        let token = self.cur_token.clone();

        if !self.expect_peek(TokenType::LParen) {
            return None;
        }

        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenType::LBrace) {
            return None;
        }

        let body = self.parse_block_statement()?;

        Some(Expression::Function(ast::FunctionLiteral {
            token,
            parameters,
            body: Rc::new(body),
        }))
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<ast::Identifier>> {
        let mut identifiers = vec![];

        if self.peek_token.is(TokenType::RParen) {
            self.next_token();
            return Some(identifiers);
        }

        if !self.expect_peek(TokenType::Ident) {
            return None;
        }
        identifiers.push(self.cur_token.clone().into());

        while self.peek_token.is(TokenType::Comma) {
            self.next_token();
            if !self.expect_peek(TokenType::Ident) {
                return None;
            }
            identifiers.push(self.cur_token.clone().into());
        }

        if !self.expect_peek(TokenType::RParen) {
            return None;
        }

        Some(identifiers)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let token = self.cur_token.clone();
        let arguments = self.parse_expression_list(TokenType::RParen)?;

        Some(Expression::Call(ast::CallExpression {
            token,
            function: Box::new(function),
            arguments,
        }))
    }

    fn parse_expression_list(&mut self, end: TokenType) -> Option<Vec<Expression>> {
        let mut list = vec![];

        if self.peek_token.is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_token.is(TokenType::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }

        Some(list)
    }

    fn peek_precedence(&self) -> Precedence {
        self.peek_token.token_type().into()
    }

    fn cur_precedence(&self) -> Precedence {
        self.cur_token.token_type().into()
    }

    fn expect_peek(&mut self, expected: TokenType) -> bool {
        if self.peek_token.is(expected) {
            self.next_token();
            true
        } else {
            self.peek_error(expected);
            false
        }
    }

    fn peek_error(&mut self, expected: TokenType) {
        self.errors.push(ParseError::UnexpectedToken {
            expected,
            got: self.peek_token.token_type(),
        });
    }
}
