use crate::expr::Expr;

/// Renders an expression as a parenthesised prefix form, e.g.
/// `(+ 1 (* 2 3))`.
pub fn print(e: &Expr) -> String {
    match e {
        Expr::Assign(a) => format!("(assign {} {})", a.name.lexeme, print(&a.value)),
        Expr::Binary(b) => parenthesize(&b.op.lexeme, &[b.left.as_ref(), b.right.as_ref()]),
        Expr::Call(c) => {
            let mut exprs = vec![c.callee.as_ref()];
            exprs.extend(c.arguments.iter());
            parenthesize("call", &exprs)
        },
        Expr::Get(g) => format!("(get {} {})", print(&g.object), g.name.lexeme),
        Expr::Grouping(g) => parenthesize("group", &[g.expression.as_ref()]),
        Expr::Literal(l) => l.value.to_string(),
        Expr::Logical(l) => parenthesize(&l.op.lexeme, &[l.left.as_ref(), l.right.as_ref()]),
        Expr::Set(s) => format!("(set {} {} {})", print(&s.object), s.name.lexeme, print(&s.value)),
        Expr::Super(s) => format!("(super {})", s.method.lexeme),
        Expr::This(_) => "(this)".to_string(),
        Expr::Unary(u) => parenthesize(&u.op.lexeme, &[u.right.as_ref()]),
        Expr::Variable(v) => v.name.lexeme.clone(),
    }
}

fn parenthesize(name: &str, exprs: &[&Expr]) -> String {
    let mut s = String::new();
    s.push('(');
    s.push_str(name);

    for e in exprs.iter() {
        s.push(' ');
        s.push_str(print(e).as_str());
    }

    s.push(')');
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        expr,
        token::{Token, TokenKind},
        value::Literal,
    };

    fn number(n: f64) -> Box<Expr> {
        Box::new(Expr::new_literal(Literal::Number(n)))
    }

    #[test]
    fn string_literal() {
        let e = Expr::Literal(expr::Literal { value: Literal::String("yes".into()) });
        assert_eq!("yes", print(&e));
    }

    #[test]
    fn grouped_number() {
        let e = Expr::Grouping(expr::Grouping {
            expression: number(531.9),
        });
        assert_eq!("(group 531.9)", print(&e));
    }

    #[test]
    fn binary_expression_with_unary_and_grouping_sub_exprs() {
        let e = Expr::Binary(expr::Binary {
            left: Box::new(Expr::Unary(expr::Unary {
                op: Token { kind: TokenKind::Minus, lexeme: "-".into(), line: 1 },
                right: number(123.0),
            })),
            op: Token { kind: TokenKind::Star, lexeme: "*".into(), line: 1},
            right: Box::new(Expr::Grouping(expr::Grouping {
                expression: number(45.67),
            }))
        });
        assert_eq!("(* (- 123) (group 45.67))", print(&e));
    }

    #[test]
    fn nil_and_variables() {
        let e = Expr::new_assign(
            Token::new(TokenKind::Identifier, "x", 1),
            Box::new(Expr::new_literal(Literal::Nil)),
        );
        assert_eq!("(assign x nil)", print(&e));
    }

    #[test]
    fn property_forms() {
        let object = Box::new(Expr::new_this(Token::new(TokenKind::This, "this", 1)));
        let name = Token::new(TokenKind::Identifier, "field", 1);
        let get = Expr::new_get(object.clone(), name.clone());
        assert_eq!("(get (this) field)", print(&get));
        let set = Expr::new_set(object, name, number(2.0));
        assert_eq!("(set (this) field 2)", print(&set));
        let sup = Expr::new_super(
            Token::new(TokenKind::Super, "super", 1),
            Token::new(TokenKind::Identifier, "init", 1),
        );
        assert_eq!("(super init)", print(&sup));
    }
}
