use std::{
    cell::RefCell,
    fmt::{self, Debug, Display},
    rc::Rc,
};

use crate::{environment::Environment, stmt};

/// A constant as it appears in source: carried by tokens and literal
/// expressions.
#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Bool(bool),
    Nil,
    Number(f64),
    String(String),
}

impl From<bool> for Literal {
    fn from(b: bool) -> Self {
        Literal::Bool(b)
    }
}

impl From<f64> for Literal {
    fn from(n: f64) -> Self {
        Literal::Number(n)
    }
}

impl From<String> for Literal {
    fn from(s: String) -> Self {
        Literal::String(s)
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Literal::*;
        match self {
            Bool(b) => write!(f, "{}", b),
            Nil => write!(f, "nil"),
            Number(n) => write_number(f, *n),
            String(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Function(Rc<Function>),
    NativeFn(NativeFn),
    Nil,
    Number(f64),
    String(String),
}

impl Value {
    pub(crate) fn new_native_fn(name: &'static str, arity: usize, body: fn(&[Value]) -> Value) -> Self {
        Value::NativeFn(NativeFn { name, arity, body })
    }

    pub(crate) fn new_function(declaration: Rc<stmt::Function>, closure: Rc<RefCell<Environment>>) -> Self {
        Value::Function(Rc::new(Function { declaration, closure }))
    }

    pub fn is_equal(&self, other: &Value) -> bool {
        use Value::*;
        match (self, other) {
            (Nil, Nil) => true,
            (Bool(s), Bool(o)) => s == o,
            (Number(s), Number(o)) => {
                // NaN is equal to itself in Lox.
                if s.is_nan() && o.is_nan() {
                    true
                } else {
                    s == o
                }
            },
            (String(s), String(o)) => s == o,
            (Function(s), Function(o)) => Rc::ptr_eq(s, o),
            (NativeFn(s), NativeFn(o)) => s.name == o.name,
            _ => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false) | Value::Nil)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<Literal> for Value {
    fn from(l: Literal) -> Self {
        match l {
            Literal::Bool(b) => Value::Bool(b),
            Literal::Nil => Value::Nil,
            Literal::Number(n) => Value::Number(n),
            Literal::String(s) => Value::String(s),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Value::*;
        match self {
            Bool(b) => write!(f, "{}", b),
            Function(fnc) => write!(f, "{}", fnc),
            NativeFn(_) => write!(f, "<native fn>"),
            Nil => write!(f, "nil"),
            Number(n) => write_number(f, *n),
            String(s) => write!(f, "{}", s),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

// Whole numbers print without a fractional part and infinities keep the
// spelling Lox programs expect.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_infinite() {
        let sign = if n.is_sign_negative() { "-" } else { "" };
        write!(f, "{}Infinity", sign)
    } else {
        write!(f, "{}", n)
    }
}

#[derive(Clone)]
pub struct NativeFn {
    pub(crate) name: &'static str,
    pub(crate) arity: usize,
    pub(crate) body: fn(&[Value]) -> Value,
}

impl Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// A user-defined function together with the scope it was declared in.
pub struct Function {
    pub(crate) declaration: Rc<stmt::Function>,
    pub(crate) closure: Rc<RefCell<Environment>>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.name())
    }
}

impl Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
