use std::result;

use thiserror::Error;

use crate::token::Token;

pub type Result<T> = result::Result<T, Error>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("[line {line}] Error: {message}")]
    Lexical { line: usize, message: String },

    #[error("[line {}] Error{}: {message}", .token.line, location(.token))]
    Syntactic { token: Token, message: String },

    #[error("{message}\n[line {}]", .token.line)]
    Runtime { token: Token, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn lexical<S: Into<String>>(line: usize, message: S) -> Error {
        Error::Lexical { line, message: message.into() }
    }

    pub fn syntactic<S: Into<String>>(token: Token, message: S) -> Error {
        Error::Syntactic { token, message: message.into() }
    }

    pub fn runtime<S: Into<String>>(token: Token, message: S) -> Error {
        Error::Runtime { token, message: message.into() }
    }

    pub fn is_runtime_error(&self) -> bool {
        matches!(self, Error::Runtime { .. })
    }

    /// Source line the error points at, if it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            Error::Lexical { line, .. } => Some(*line),
            Error::Syntactic { token, .. } | Error::Runtime { token, .. } => Some(token.line),
            Error::Io(_) => None,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Error::Lexical { message, .. }
            | Error::Syntactic { message, .. }
            | Error::Runtime { message, .. } => message.clone(),
            Error::Io(e) => e.to_string(),
        }
    }
}

fn location(token: &Token) -> String {
    if token.is_eof() {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenKind;

    #[test]
    fn lexical_errors_report_line_only() {
        let e = Error::lexical(3, "Unexpected character.");
        assert_eq!("[line 3] Error: Unexpected character.", e.to_string());
    }

    #[test]
    fn syntactic_errors_report_lexeme() {
        let token = Token::new(TokenKind::Semicolon, ";", 7);
        let e = Error::syntactic(token, "Expect expression.");
        assert_eq!("[line 7] Error at ';': Expect expression.", e.to_string());
    }

    #[test]
    fn syntactic_errors_at_eof_say_at_end() {
        let token = Token::new(TokenKind::EndOfFile, "", 2);
        let e = Error::syntactic(token, "Expect ';' after value.");
        assert_eq!("[line 2] Error at end: Expect ';' after value.", e.to_string());
    }

    #[test]
    fn runtime_errors_put_line_after_message() {
        let token = Token::new(TokenKind::Minus, "-", 4);
        let e = Error::runtime(token, "Operand must be a number.");
        assert!(e.is_runtime_error());
        assert_eq!(Some(4), e.line());
        assert_eq!("Operand must be a number.\n[line 4]", e.to_string());
    }
}
