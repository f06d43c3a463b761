use crate::{
    environment::Environment,
    error::Result,
    interpreter::{Flow, Interpreter},
    value::{Function, NativeFn, Value},
};
use std::io::Write;

pub(crate) trait Callable<W: Write> {
    fn arity(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter<W>, args: Vec<Value>) -> Result<Value>;
}

impl Value {
    pub(crate) fn callable<W: Write>(&self) -> Option<&dyn Callable<W>> {
        match self {
            Value::NativeFn(n) => Some(n),
            Value::Function(f) => Some(f.as_ref()),
            _ => None,
        }
    }
}

impl <W: Write> Callable<W> for NativeFn {
    fn arity(&self) -> usize {
        self.arity
    }

    fn call(&self, _interpreter: &mut Interpreter<W>, args: Vec<Value>) -> Result<Value> {
        Ok((self.body)(&args))
    }
}

impl <W: Write> Callable<W> for Function {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    // The call's scope hangs off the closure, not off the caller's scope.
    fn call(&self, interpreter: &mut Interpreter<W>, args: Vec<Value>) -> Result<Value> {
        let mut environment = Environment::from(&self.closure);
        for (param, arg) in self.declaration.params.iter().zip(args) {
            environment.define(param.lexeme.clone(), arg);
        }

        match interpreter.execute_block(&self.declaration.body, environment)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::Nil),
        }
    }
}
