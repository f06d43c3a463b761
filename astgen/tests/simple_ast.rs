#![allow(dead_code)]

use astgen::*;

#[test]
fn can_generate_ast() {
    generate_ast!(
        TestAst,
        [ S => { s: String } ]
    );
    let _node = TestAst::S(S { s: "".into() });
}

#[test]
fn can_change_ast_name() {
    generate_ast!(
        OtherAst,
        [ S => { s: String } ]
    );
    let _node = OtherAst::S(S { s: "".into() });
}

#[test]
fn uses_field_names_for_struct_fields() {
    generate_ast!(
        Example,
        [ S => { s: String, i: isize } ]
    );
    let node = S { s: "".into(), i: 3 };
    assert_eq!(3, node.i);
}

#[test]
fn can_clone_nodes() {
    generate_ast!(A, [N => {a: usize}]);
    let n = N { a: 0 };
    assert_eq!(n.clone(), n);
}

#[test]
fn uses_node_names_for_enum_variants() {
    generate_ast!(
        Example,
        [
            A => { a: isize };
            B => { b: String };
        ]
    );
    let _a_node = Example::A(A { a: 0 });
    let _b_node = Example::B(B { b: "".into() });
}

#[test]
fn generates_new_fns() {
    generate_ast!(
        Test,
        [
            A => { a: isize };
            B => { b: usize };
        ]
    );
    assert_eq!(Test::A(A { a: 1 }), Test::new_a(1));
    assert_eq!(Test::B(B { b: 8 }), Test::new_b(8));
}

#[test]
fn snake_cases_multi_word_constructors() {
    generate_ast!(
        Named,
        [ ANode => { a: isize, b: bool } ]
    );
    let Named::ANode(node) = Named::new_a_node(4, true);
    assert_eq!(4, node.a);
    assert!(node.b);
}

#[test]
fn supports_recursive_nodes() {
    generate_ast!(
        Tree,
        [
            Leaf => { value: i32 };
            Pair => { left: Box<Tree>, right: Option<Box<Tree>> };
        ]
    );

    fn sum(t: &Tree) -> i32 {
        match t {
            Tree::Leaf(l) => l.value,
            Tree::Pair(p) => sum(&p.left) + p.right.as_deref().map(sum).unwrap_or(0),
        }
    }

    let tree = Tree::new_pair(
        Box::new(Tree::new_leaf(2)),
        Some(Box::new(Tree::new_pair(Box::new(Tree::new_leaf(3)), None))),
    );
    assert_eq!(5, sum(&tree));
}
