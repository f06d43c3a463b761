use std::iter::Peekable;

use tracing::debug;

use crate::{
    error::{Error, Result},
    expr::Expr,
    stmt::{self, Stmt},
    token::*,
    value,
};

const MAX_ARITY: usize = 255;

const EQUALITY_TOKENS: &[&TokenKind] = &[
    &TokenKind::BangEqual,
    &TokenKind::EqualEqual,
];

const COMPARISON_TOKENS: &[&TokenKind] = &[
    &TokenKind::Greater,
    &TokenKind::GreaterEqual,
    &TokenKind::Less,
    &TokenKind::LessEqual,
];

const TERM_TOKENS: &[&TokenKind] = &[
    &TokenKind::Minus,
    &TokenKind::Plus,
];

const FACTOR_TOKENS: &[&TokenKind] = &[
    &TokenKind::Star,
    &TokenKind::Slash,
];

const UNARY_TOKENS: &[&TokenKind] = &[
    &TokenKind::Bang,
    &TokenKind::Minus,
];

/// Recursive-descent parser. Errors are collected rather than returned
/// early: after each one the parser skips to the next statement boundary
/// and carries on, dropping the statement that failed.
pub struct Parser<T> {
    tokens: T,
    errors: Vec<Error>,
    function_depth: usize,
}

impl <T: Iterator<Item = Token>> Parser<Peekable<T>> {
    pub fn new(tokens: T) -> Self {
        let tokens = tokens.peekable();
        Parser { tokens, errors: Vec::new(), function_depth: 0 }
    }

    pub fn parse(&mut self) -> (Vec<Stmt>, Vec<Error>) {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        (statements, std::mem::take(&mut self.errors))
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let reported = self.errors.len();

        let result = if self.match_single(&TokenKind::Fun).is_some() {
            self.function("function").map(Stmt::Function)
        } else if self.match_single(&TokenKind::Var).is_some() {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(statement) if self.errors.len() == reported => Some(statement),
            // Something inside was reported without unwinding.
            Ok(_) => None,
            Err(error) => {
                self.report(error);
                self.synchronise();
                None
            },
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(&TokenKind::Identifier, "Expect variable name.")?;

        let initializer = if self.match_single(&TokenKind::Equal).is_some() {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(&TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::new_var(name, initializer))
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.match_single(&TokenKind::For).is_some() {
            self.for_statement()
        } else if self.match_single(&TokenKind::If).is_some() {
            self.if_statement()
        } else if self.match_single(&TokenKind::Print).is_some() {
            self.print_statement()
        } else if let Some(token) = self.match_single(&TokenKind::Return) {
            self.return_statement(token)
        } else if self.match_single(&TokenKind::While).is_some() {
            self.while_statement()
        } else if self.match_single(&TokenKind::LeftBrace).is_some() {
            Ok(Stmt::new_block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_single(&TokenKind::Semicolon).is_some() {
            None
        } else if self.match_single(&TokenKind::Var).is_some() {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check_next(&TokenKind::Semicolon) {
            self.expression()?
        } else { Expr::new_literal(value::Literal::from(true)) };

        self.consume(&TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if !self.check_next(&TokenKind::RightParen) {
            Some(Stmt::new_expression(self.expression()?))
        } else { None };

        self.consume(&TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let body = self.statement()?;
        let body = Box::new(match increment {
            Some(i) => Stmt::new_block(vec![body, i]),
            None => body,
        });
        let while_loop = Stmt::new_while(condition, body);
        let while_loop = match initializer {
            Some(i) => Stmt::new_block(vec![i, while_loop]),
            None => while_loop,
        };

        Ok(while_loop)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_single(&TokenKind::Else).is_some() {
            Some(Box::new(self.statement()?))
        } else { None };

        Ok(Stmt::new_if(condition, then_branch, else_branch))
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let expression = self.expression()?;
        self.consume(&TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::new_print(expression))
    }

    fn return_statement(&mut self, keyword: Token) -> Result<Stmt> {
        if self.function_depth == 0 {
            return Err(Error::syntactic(keyword, "Can't return from top-level code."))
        }

        let value = if !self.check_next(&TokenKind::Semicolon) {
            Some(self.expression()?)
        } else { None };
        self.consume(&TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::new_return(keyword, value))
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(Stmt::new_while(condition, body))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expression = self.expression()?;
        self.consume(&TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::new_expression(expression))
    }

    fn function(&mut self, kind: &str) -> Result<stmt::Function> {
        let name = self.consume(
            &TokenKind::Identifier,
            format!("Expect {} name.", kind).as_str()
        )?;
        self.consume(
            &TokenKind::LeftParen,
            format!("Expect '(' after {} name.", kind).as_str()
        )?;

        let mut params = Vec::new();
        if !self.check_next(&TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARITY {
                    let token = self.peek_token();
                    self.report(Error::syntactic(token, "Can't have more than 255 parameters."));
                }
                params.push(self.consume(&TokenKind::Identifier, "Expect parameter name.")?);
                if self.match_single(&TokenKind::Comma).is_none() { break }
            }
        }

        self.consume(&TokenKind::RightParen, "Expect ')' after parameters.")?;
        self.consume(
            &TokenKind::LeftBrace,
            format!("Expect '{{' before {} body.", kind).as_str()
        )?;

        self.function_depth += 1;
        let body = self.block();
        self.function_depth -= 1;

        Ok(stmt::Function { name, params, body: body? })
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check_next(&TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        self.consume(&TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    pub(crate) fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr = self.or()?;
        if let Some(equals) = self.match_single(&TokenKind::Equal) {
            let value = self.assignment()?;
            if let Expr::Variable(lhs) = expr {
                return Ok(Expr::new_assign(lhs.name, Box::new(value)))
            }
            // Reported, not unwound: the parser is still in a sane state.
            self.report(Error::syntactic(equals, "Invalid assignment target."));
        }
        Ok(expr)
    }

    fn or(&mut self) -> Result<Expr> {
        let mut e = self.and()?;

        while let Some(op) = self.match_single(&TokenKind::Or) {
            let right = Box::new(self.and()?);
            e = Expr::new_logical(Box::new(e), op, right);
        }

        Ok(e)
    }

    fn and(&mut self) -> Result<Expr> {
        let mut e = self.equality()?;

        while let Some(op) = self.match_single(&TokenKind::And) {
            let right = Box::new(self.equality()?);
            e = Expr::new_logical(Box::new(e), op, right);
        }

        Ok(e)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::comparison,
            EQUALITY_TOKENS
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::term,
            COMPARISON_TOKENS
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::factor,
            TERM_TOKENS
        )
    }

    fn factor(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::unary,
            FACTOR_TOKENS
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        if let Some(token) = self.match_any(UNARY_TOKENS) {
            let right = Box::new(self.unary()?);
            Ok(Expr::new_unary(token, right))
        } else {
            self.call()
        }
    }

    fn call(&mut self) -> Result<Expr> {
        let mut e = self.primary()?;

        while self.match_single(&TokenKind::LeftParen).is_some() {
            e = self.finish_call(e)?;
        }

        Ok(e)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut args = Vec::new();

        if !self.check_next(&TokenKind::RightParen) {
            loop {
                if args.len() >= MAX_ARITY {
                    let token = self.peek_token();
                    self.report(Error::syntactic(token, "Can't have more than 255 arguments."));
                }
                args.push(self.expression()?);
                if self.match_single(&TokenKind::Comma).is_none() { break }
            }
        }
        let paren = self.consume(
            &TokenKind::RightParen,
            "Expect ')' after arguments."
        )?;

        Ok(Expr::new_call(Box::new(callee), paren, args))
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.peek_token();

        let e = match &token.kind {
            TokenKind::True => Expr::new_literal(true.into()),
            TokenKind::False => Expr::new_literal(false.into()),
            TokenKind::Nil => Expr::new_literal(value::Literal::Nil),
            TokenKind::Number(n) => Expr::new_literal((*n).into()),
            TokenKind::String(s) => Expr::new_literal(s.clone().into()),
            TokenKind::Identifier => Expr::new_variable(token.clone()),
            TokenKind::LeftParen => {
                self.tokens.next();
                let expression = Box::new(self.expression()?);
                self.consume(&TokenKind::RightParen, "Expect ')' after expression.")?;
                return Ok(Expr::new_grouping(expression))
            },
            _ => return Err(Error::syntactic(token.clone(), "Expect expression.")),
        };

        self.tokens.next();
        Ok(e)
    }

    fn is_at_end(&mut self) -> bool {
        self.tokens.peek().map_or(true, Token::is_eof)
    }

    // The token errors should point at. A stream that ran dry without an
    // `EndOfFile` token is treated as if it had one.
    fn peek_token(&mut self) -> Token {
        self.tokens.peek()
            .cloned()
            .unwrap_or_else(|| Token::new(TokenKind::EndOfFile, "", 0))
    }

    fn check_next(&mut self, kind: &TokenKind) -> bool {
        self.tokens.peek()
            .map(|t| &t.kind == kind)
            .unwrap_or(false)
    }

    fn consume(&mut self, kind: &TokenKind, error_msg: &str) -> Result<Token> {
        match self.match_single(kind) {
            Some(token) => Ok(token),
            None => Err(Error::syntactic(self.peek_token(), error_msg)),
        }
    }

    fn match_binary_precedence_with_tokens(
        &mut self,
        parse: impl Fn(&mut Self) -> Result<Expr>,
        kinds: &[&TokenKind]
    ) -> Result<Expr> {
        let mut e = parse(self)?;

        while let Some(token) = self.match_any(kinds) {
            let right = Box::new(parse(self)?);
            e = Expr::new_binary(Box::new(e), token, right)
        }

        Ok(e)
    }

    fn match_single(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.check_next(kind) {
            self.tokens.next()
        } else {
            None
        }
    }

    fn match_any(&mut self, kinds: &[&TokenKind]) -> Option<Token> {
        kinds.iter().find_map(|k| self.match_single(k))
    }

    fn report(&mut self, error: Error) {
        debug!(%error, "parse error");
        self.errors.push(error);
    }

    // Discards tokens until just after a `;` or just before a keyword that
    // starts a declaration or statement.
    fn synchronise(&mut self) {
        while !self.is_at_end() {
            let consumed = self.tokens.next().map(|t| t.kind);
            if consumed == Some(TokenKind::Semicolon) { return }

            use TokenKind::*;
            if let Some(Class | Fun | Var | For | If | While | Print | Return) =
                self.tokens.peek().map(|t| &t.kind)
            {
                return
            }
        }
    }
}
