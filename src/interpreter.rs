use std::{
    cell::RefCell,
    io::Write,
    rc::Rc,
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::{debug, trace};

use crate::{
    environment::Environment,
    error::{Error, Result},
    expr::{self, Expr},
    stmt::{self, Stmt},
    token::{TokenKind, Token},
    value::Value,
};

/// How a statement finished. `Return` travels up through enclosing blocks
/// and loops until the function call that started them turns it back into
/// a value.
#[derive(Debug, PartialEq)]
pub(crate) enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<W> {
    environment: Rc<RefCell<Environment>>,
    writer: W,
}

impl <W: Write> Interpreter<W> {
    pub fn new(writer: W) -> Self {
        let mut globals = Environment::new();
        globals.define("clock", Value::new_native_fn("clock", 0, clock));
        Interpreter {
            environment: Rc::new(RefCell::new(globals)),
            writer,
        }
    }

    /// Runs `statements` in order, stopping at the first runtime error.
    /// Globals defined before the error stay defined for the next call.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for s in statements.iter() {
            // The parser rejects `return` outside of functions, so a
            // top-level statement can only finish normally.
            if let Flow::Return(_) = self.execute(s)? {
                break
            }
        }
        Ok(())
    }

    fn execute(&mut self, s: &Stmt) -> Result<Flow> {
        trace!(statement = ?s, "execute");
        match s {
            Stmt::Block(b) => {
                let environment = Environment::from(&self.environment);
                self.execute_block(&b.statements, environment)
            },
            Stmt::Expression(e) => {
                self.evaluate(&e.expression)?;
                Ok(Flow::Normal)
            },
            Stmt::Function(f) => {
                let function = Value::new_function(
                    Rc::new(f.clone()),
                    Rc::clone(&self.environment),
                );
                self.environment.borrow_mut().define(f.name.lexeme.clone(), function);
                Ok(Flow::Normal)
            },
            Stmt::If(i) => self.execute_if(i),
            Stmt::Print(p) => {
                let value = self.evaluate(&p.expression)?;
                writeln!(self.writer, "{}", value)?;
                Ok(Flow::Normal)
            },
            Stmt::Return(r) => {
                let value = match &r.value {
                    Some(v) => self.evaluate(v)?,
                    None => Value::Nil,
                };
                Ok(Flow::Return(value))
            },
            Stmt::Var(v) => {
                let value = match &v.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(v.name.lexeme.clone(), value);
                Ok(Flow::Normal)
            },
            Stmt::While(w) => self.execute_while(w),
        }
    }

    /// Runs `statements` with `environment` as the current scope. The
    /// previous scope is put back however the statements finish.
    pub(crate) fn execute_block(&mut self, statements: &[Stmt], environment: Environment) -> Result<Flow> {
        let previous = std::mem::replace(
            &mut self.environment,
            Rc::new(RefCell::new(environment)),
        );
        let result = self.execute_all(statements);
        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for statement in statements {
            if let flow @ Flow::Return(_) = self.execute(statement)? {
                return Ok(flow)
            }
        }
        Ok(Flow::Normal)
    }

    fn execute_if(&mut self, i: &stmt::If) -> Result<Flow> {
        if self.evaluate(&i.condition)?.is_truthy() {
            self.execute(&i.then_branch)
        } else if let Some(else_branch) = &i.else_branch {
            self.execute(else_branch)
        } else {
            Ok(Flow::Normal)
        }
    }

    fn execute_while(&mut self, w: &stmt::While) -> Result<Flow> {
        while self.evaluate(&w.condition)?.is_truthy() {
            if let flow @ Flow::Return(_) = self.execute(&w.body)? {
                return Ok(flow)
            }
        }
        Ok(Flow::Normal)
    }

    fn evaluate(&mut self, e: &Expr) -> Result<Value> {
        match e {
            Expr::Assign(a) => {
                let value = self.evaluate(&a.value)?;
                self.environment.borrow_mut().assign(&a.name, value.clone())?;
                Ok(value)
            },
            Expr::Binary(b) => self.evaluate_binary(b),
            Expr::Call(c) => self.evaluate_call(c),
            Expr::Grouping(g) => self.evaluate(&g.expression),
            Expr::Literal(l) => Ok(l.value.clone().into()),
            Expr::Logical(l) => self.evaluate_logical(l),
            Expr::Unary(u) => self.evaluate_unary(u),
            Expr::Variable(v) => self.environment.borrow().get(&v.name),
            Expr::Get(g) => Err(Error::runtime(g.name.clone(), "Property access is not supported.")),
            Expr::Set(s) => Err(Error::runtime(s.name.clone(), "Property assignment is not supported.")),
            Expr::Super(s) => Err(Error::runtime(s.keyword.clone(), "'super' is not supported.")),
            Expr::This(t) => Err(Error::runtime(t.keyword.clone(), "'this' is not supported.")),
        }
    }

    fn evaluate_binary(&mut self, e: &expr::Binary) -> Result<Value> {
        let left = self.evaluate(e.left.as_ref())?;
        let right = self.evaluate(e.right.as_ref())?;
        let kind = e.op.kind.clone();

        use Value::{Number, String, Bool};
        match kind {
            TokenKind::Minus => compute_if_numbers(&e.op, left, right, |l, r| l - r),
            TokenKind::Plus => match (left, right) {
                (Number(left), Number(right)) => Ok(Number(left + right)),
                (String(mut left), String(right)) => {
                    left.push_str(right.as_str());
                    Ok(String(left))
                },
                _ => Err(Error::runtime(e.op.clone(), "Operands must be two numbers or two strings.")),
            },
            TokenKind::Slash => compute_if_numbers(&e.op, left, right, |l, r| l / r),
            TokenKind::Star => compute_if_numbers(&e.op, left, right, |l, r| l * r),
            TokenKind::Greater => compute_if_numbers(&e.op, left, right, |l, r| l > r),
            TokenKind::GreaterEqual => compute_if_numbers(&e.op, left, right, |l, r| l >= r),
            TokenKind::Less => compute_if_numbers(&e.op, left, right, |l, r| l < r),
            TokenKind::LessEqual => compute_if_numbers(&e.op, left, right, |l, r| l <= r),
            TokenKind::EqualEqual => Ok(Bool(left.is_equal(&right))),
            TokenKind::BangEqual => Ok(Bool(!left.is_equal(&right))),
            _ => Err(Error::runtime(e.op.clone(), "Unknown binary operator.")),
        }
    }

    fn evaluate_call(&mut self, e: &expr::Call) -> Result<Value> {
        let callee = self.evaluate(&e.callee)?;

        let args: Vec<Value> = e.arguments.iter()
            .map(|a| self.evaluate(a))
            .collect::<Result<_>>()?;

        let function = callee.callable::<W>()
            .ok_or_else(|| Error::runtime(e.paren.clone(), "Can only call functions and classes."))?;

        if args.len() != function.arity() {
            return Err(Error::runtime(
                e.paren.clone(),
                format!("Expected {} arguments but got {}.", function.arity(), args.len())
            ))
        }

        debug!(callee = %callee, line = e.paren.line, "call");
        let result = function.call(self, args);
        debug!(callee = %callee, ok = result.is_ok(), "return");
        result
    }

    fn evaluate_logical(&mut self, e: &expr::Logical) -> Result<Value> {
        let left = self.evaluate(&e.left)?;

        use TokenKind::*;
        match (&e.op.kind, left.is_truthy()) {
            (Or, true) | (And, false) => Ok(left),
            (Or, false) | (And, true) => self.evaluate(&e.right),
            _ => Err(Error::runtime(e.op.clone(), "Unknown logical operator.")),
        }
    }

    fn evaluate_unary(&mut self, e: &expr::Unary) -> Result<Value> {
        let right = self.evaluate(e.right.as_ref())?;
        let kind = e.op.kind.clone();

        use Value::*;
        match (kind, right) {
            (TokenKind::Minus, Number(right)) => Ok(Number(-right)),
            (TokenKind::Minus, _) => Err(Error::runtime(e.op.clone(), "Operand must be a number.")),
            (TokenKind::Bang, right) => Ok(Bool(!right.is_truthy())),
            _ => Err(Error::runtime(e.op.clone(), "Unknown unary operator.")),
        }
    }
}

fn compute_if_numbers<T: Into<Value>>(
    op: &Token,
    left: Value,
    right: Value,
    f: impl Fn(f64, f64) -> T
) -> Result<Value> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => Ok(f(left, right).into()),
        _ => Err(Error::runtime(op.clone(), "Operands must be numbers.")),
    }
}

fn clock(_args: &[Value]) -> Value {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Value::from(since_epoch.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Parser, scanner::Scanner};
    use pretty_assertions::assert_eq;

    fn statements(src: &str) -> Vec<Stmt> {
        let tokens = Scanner::new(src).map(|t| t.expect("scans cleanly"));
        let (statements, errors) = Parser::new(tokens).parse();
        assert!(errors.is_empty(), "unexpected parse errors: {:?}", errors);
        statements
    }

    fn run(interpreter: &mut Interpreter<Vec<u8>>, src: &str) -> Result<String> {
        interpreter.writer.clear();
        interpreter.interpret(&statements(src))?;
        Ok(String::from_utf8_lossy(&interpreter.writer).into_owned())
    }

    #[test]
    fn prints_arithmetic_and_strings() -> Result<()> {
        let mut interpreter = Interpreter::new(Vec::new());
        assert_eq!("5\n", run(&mut interpreter, "print 2 + 3;")?);
        assert_eq!("Infinity\n", run(&mut interpreter, "print 1 / 0;")?);
        assert_eq!("Hello World\n", run(&mut interpreter, "print \"Hello \" + \"World\";")?);
        assert_eq!("false\n", run(&mut interpreter, "print !true;")?);
        assert_eq!("nil\n", run(&mut interpreter, "var x; print x;")?);
        Ok(())
    }

    #[test]
    fn mixing_strings_and_numbers_with_plus_is_an_error() {
        let mut interpreter = Interpreter::new(Vec::new());
        let err = run(&mut interpreter, "print \"a\" + 1;").unwrap_err();
        assert_eq!("Operands must be two numbers or two strings.\n[line 1]", err.to_string());
    }

    #[test]
    fn comparisons_need_numbers() {
        let mut interpreter = Interpreter::new(Vec::new());
        let err = run(&mut interpreter, "print 1 < \"2\";").unwrap_err();
        assert_eq!("Operands must be numbers.\n[line 1]", err.to_string());
        let err = run(&mut interpreter, "print -\"x\";").unwrap_err();
        assert_eq!("Operand must be a number.\n[line 1]", err.to_string());
    }

    #[test]
    fn scope_is_restored_after_an_error_in_a_block() -> Result<()> {
        let mut interpreter = Interpreter::new(Vec::new());
        let err = run(
            &mut interpreter,
            "var a = \"global\"; { var a = \"inner\"; print nil + 1; }"
        ).unwrap_err();
        assert!(err.is_runtime_error());
        assert_eq!("global\n", run(&mut interpreter, "print a;")?);
        Ok(())
    }

    #[test]
    fn return_unwinds_loops_and_blocks_but_not_the_caller() -> Result<()> {
        let mut interpreter = Interpreter::new(Vec::new());
        let output = run(&mut interpreter, r#"
            fun first() {
                while (true) {
                    { return "done"; }
                    print "unreachable";
                }
            }
            print first();
            print "after";
        "#)?;
        assert_eq!("done\nafter\n", output);
        Ok(())
    }

    #[test]
    fn functions_without_return_yield_nil() -> Result<()> {
        let mut interpreter = Interpreter::new(Vec::new());
        assert_eq!("nil\n", run(&mut interpreter, "fun f() {} print f();")?);
        assert_eq!("<fn f>\n", run(&mut interpreter, "print f;")?);
        Ok(())
    }

    #[test]
    fn execute_reports_return_flow() -> Result<()> {
        let mut interpreter = Interpreter::new(Vec::new());
        let body = statements("fun f() { return 1; }");
        let Stmt::Function(f) = &body[0] else { panic!("expected a function") };
        let flow = interpreter.execute_block(&f.body, Environment::new())?;
        assert_eq!(Flow::Return(Value::Number(1.0)), flow);
        Ok(())
    }

    #[test]
    fn clock_is_a_native_number() -> Result<()> {
        let mut interpreter = Interpreter::new(Vec::new());
        assert_eq!("<native fn>\ntrue\n", run(&mut interpreter, "print clock; print clock() > 0;")?);
        Ok(())
    }

    #[test]
    fn class_only_expressions_are_runtime_errors() {
        let mut interpreter = Interpreter::new(Vec::new());
        let this = Token::new(TokenKind::This, "this", 3);
        let err = interpreter.evaluate(&Expr::new_this(this)).unwrap_err();
        assert_eq!("'this' is not supported.\n[line 3]", err.to_string());
    }
}
