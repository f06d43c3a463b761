pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod printer;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;
mod callable;
mod session;

pub use crate::{
    error::{Error, Result},
    session::{Failure, Lox},
};

/// Scans `source`, returning the tokens (always ending in `EndOfFile`) and
/// any lexical errors met along the way.
pub fn scan(source: &str) -> (Vec<token::Token>, Vec<Error>) {
    let mut tokens = Vec::new();
    let mut errors = Vec::new();
    for result in scanner::Scanner::new(source) {
        match result {
            Ok(token) => tokens.push(token),
            Err(error) => errors.push(error),
        }
    }
    (tokens, errors)
}

/// Parses a token stream, returning every statement that parsed cleanly
/// and every error reported.
pub fn parse(tokens: Vec<token::Token>) -> (Vec<stmt::Stmt>, Vec<Error>) {
    parser::Parser::new(tokens.into_iter()).parse()
}
