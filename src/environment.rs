use std::{
    cell::RefCell,
    collections::HashMap,
    rc::Rc,
};
use crate::{
    error::{Error, Result},
    token::Token,
    value::Value,
};

/// One scope of variable bindings. Scopes are shared through
/// `Rc<RefCell<_>>` because a closure may keep its declaring scope alive
/// after the block that created it has finished.
#[derive(Debug, Default)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self { enclosing: None, values: HashMap::new() }
    }

    pub fn from(e: &Rc<RefCell<Environment>>) -> Self {
        Self { enclosing: Some(Rc::clone(e)), values: HashMap::new() }
    }

    pub fn get(&self, name: &Token) -> Result<Value> {
        match self.values.get(&name.lexeme) {
            Some(v) => Ok(v.clone()),
            None => self.enclosing.as_ref()
                .map(|e| e.borrow().get(name))
                .unwrap_or_else(|| Err(undefined_var_error(name))),
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        match self.values.get_mut(&name.lexeme) {
            Some(v) => {
                *v = value;
                Ok(())
            },
            None => self.enclosing.as_ref()
                .map(|e| e.borrow_mut().assign(name, value))
                .unwrap_or_else(|| Err(undefined_var_error(name))),
        }
    }

    pub fn define<S: Into<String>>(&mut self, name: S, value: Value) {
        self.values.insert(name.into(), value);
    }
}

fn undefined_var_error(name: &Token) -> Error {
    Error::runtime(
        name.clone(),
        format!("Undefined variable '{}'.", name.lexeme)
    )
}
