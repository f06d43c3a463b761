use std::io::Write;

use tracing::debug;

use crate::{
    error::Error,
    interpreter::Interpreter,
    parser::Parser,
};

/// Why a run failed. Static failures carry every lexical and parse error
/// found in the source; nothing was executed.
#[derive(Debug)]
pub enum Failure {
    Static(Vec<Error>),
    Runtime(Error),
}

impl Failure {
    pub fn exit_code(&self) -> i32 {
        match self {
            Failure::Static(_) => 65,
            Failure::Runtime(_) => 70,
        }
    }

    pub fn errors(&self) -> &[Error] {
        match self {
            Failure::Static(errors) => errors,
            Failure::Runtime(error) => std::slice::from_ref(error),
        }
    }
}

/// A single interpreter session. Globals persist from one `run` to the
/// next, which is what an interactive prompt needs.
pub struct Lox<W> {
    interpreter: Interpreter<W>,
}

impl <W: Write> Lox<W> {
    pub fn new(out: W) -> Self {
        Self { interpreter: Interpreter::new(out) }
    }

    pub fn run(&mut self, source: &str) -> Result<(), Failure> {
        let (tokens, mut errors) = crate::scan(source);
        let mut parser = Parser::new(tokens.into_iter());
        let (statements, parse_errors) = parser.parse();
        errors.extend(parse_errors);

        if !errors.is_empty() {
            debug!(count = errors.len(), "not running source with static errors");
            return Err(Failure::Static(errors))
        }

        self.interpreter.interpret(&statements).map_err(Failure::Runtime)
    }
}
