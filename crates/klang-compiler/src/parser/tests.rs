use super::*;
use crate::ast::{BinOp, Decl, Expr, Stmt, TypeSpec};
use crate::diagnostics::Diagnostics;
use crate::lexer::lex;

fn parse_src(src: &str) -> (Unit, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let tokens = lex(src, &mut diagnostics);
    let unit = Parser::new(&tokens, &mut diagnostics).parse_unit();
    (unit, diagnostics)
}

fn parse_ok(src: &str) -> Unit {
    let (unit, diagnostics) = parse_src(src);
    assert!(!diagnostics.has_errors(), "unexpected errors for {src:?}: {diagnostics:?}");
    unit
}

fn sole_function(unit: &Unit) -> &crate::ast::FunctionDecl {
    match &unit.declarations[..] {
        [Decl::Function(f)] => f,
        other => panic!("expected exactly one function declaration, got {other:?}"),
    }
}

#[test]
fn module_and_import_headers() {
    let unit = parse_ok("module demo::app; import io; import net;");
    assert_eq!(unit.module_name.as_ref().unwrap().to_string(), "demo::app");
    assert_eq!(unit.imports.len(), 2);
    assert_eq!(unit.imports[0].name, "io");
    assert_eq!(unit.imports[1].name, "net");
}

#[test]
fn simple_function_with_return() {
    let unit = parse_ok("sum(a: int, b: int): int { return a + b; }");
    let f = sole_function(&unit);
    assert_eq!(f.name, "sum");
    assert_eq!(f.parameters.len(), 2);
    assert!(matches!(f.return_type, Some(TypeSpec::Primitive { .. })));
    let body = f.body.as_ref().unwrap();
    assert_eq!(body.statements.len(), 1);
    assert!(matches!(body.statements[0], Stmt::Return { value: Some(_), .. }));
}

#[test]
fn multiplicative_binds_tighter_than_additive() {
    let unit = parse_ok("f(): int { return 1 + 2 * 3; }");
    let f = sole_function(&unit);
    let Stmt::Return { value: Some(expr), .. } = &f.body.as_ref().unwrap().statements[0] else {
        panic!("expected a return statement");
    };
    match expr {
        Expr::Binary { op: BinOp::Add, left, right, .. } => {
            assert!(matches!(**left, Expr::Literal(_, _)));
            assert!(matches!(**right, Expr::Binary { op: BinOp::Mul, .. }));
        }
        other => panic!("expected top-level addition, got {other:?}"),
    }
}

#[test]
fn assignment_chain_is_right_associative() {
    let unit = parse_ok("f(): int { return a = b = c; }");
    let f = sole_function(&unit);
    let Stmt::Return { value: Some(expr), .. } = &f.body.as_ref().unwrap().statements[0] else {
        panic!("expected a return statement");
    };
    match expr {
        Expr::Binary { op: BinOp::Assign, left, right, .. } => {
            assert!(matches!(**left, Expr::Identifier(_, _)));
            assert!(matches!(**right, Expr::Binary { op: BinOp::Assign, .. }));
        }
        other => panic!("expected top-level assignment, got {other:?}"),
    }
}

#[test]
fn conditional_expression_is_right_associative() {
    let unit = parse_ok("f(): int { return a ? b : c ? d : e; }");
    let f = sole_function(&unit);
    let Stmt::Return { value: Some(expr), .. } = &f.body.as_ref().unwrap().statements[0] else {
        panic!("expected a return statement");
    };
    match expr {
        Expr::Conditional { else_value, .. } => {
            assert!(matches!(**else_value, Expr::Conditional { .. }));
        }
        other => panic!("expected a conditional expression, got {other:?}"),
    }
}

#[test]
fn cast_and_parenthesized_expression_are_disambiguated() {
    let unit = parse_ok("f(x: int): int { return (int)x + (x); }");
    let f = sole_function(&unit);
    let Stmt::Return { value: Some(expr), .. } = &f.body.as_ref().unwrap().statements[0] else {
        panic!("expected a return statement");
    };
    let Expr::Binary { op: BinOp::Add, left, right, .. } = expr else {
        panic!("expected a top-level addition");
    };
    assert!(matches!(**left, Expr::Cast { .. }));
    // `(x)` is a plain grouped identifier, not a cast.
    assert!(matches!(**right, Expr::Identifier(_, _)));
}

#[test]
fn pointer_reference_and_array_type_postfixes() {
    let unit = parse_ok("v: int**; w: int&; arr: int[10]; slice: int[];");
    let names_and_types: Vec<_> = unit
        .declarations
        .iter()
        .map(|d| match d {
            Decl::Variable(v) => (v.name.as_str(), &v.ty),
            other => panic!("expected variable, got {other:?}"),
        })
        .collect();

    match names_and_types[0].1 {
        TypeSpec::Pointer(inner, _) => assert!(matches!(**inner, TypeSpec::Pointer(_, _))),
        other => panic!("expected pointer-to-pointer, got {other:?}"),
    }
    assert!(matches!(names_and_types[1].1, TypeSpec::Reference(_, _)));
    match names_and_types[2].1 {
        TypeSpec::Array { size: Some(10), .. } => {}
        other => panic!("expected a sized array of 10, got {other:?}"),
    }
    match names_and_types[3].1 {
        TypeSpec::Array { size: None, .. } => {}
        other => panic!("expected an unsized array, got {other:?}"),
    }
}

#[test]
fn struct_declaration_splits_fields_and_methods() {
    let unit = parse_ok(
        "struct Point { public: x: int; y: int; len(): int { return x; } }",
    );
    match &unit.declarations[..] {
        [Decl::Struct(s)] => {
            assert_eq!(s.name, "Point");
            assert_eq!(s.fields.len(), 2);
            assert_eq!(s.methods.len(), 1);
            assert_eq!(s.fields[0].specifiers.visibility, Some(crate::ast::Visibility::Public));
        }
        other => panic!("expected a single struct declaration, got {other:?}"),
    }
}

#[test]
fn for_loop_with_variable_declaration_init() {
    let unit = parse_ok("f(): int { for (i: int = 0; i; i = i + 1) { } return 0; }");
    let f = sole_function(&unit);
    let stmt = &f.body.as_ref().unwrap().statements[0];
    match stmt {
        Stmt::For { init: Some(init), condition: Some(_), step: Some(_), .. } => {
            assert!(matches!(**init, Stmt::VarDecl(_)));
        }
        other => panic!("expected a for statement with an init declaration, got {other:?}"),
    }
}

#[test]
fn malformed_declaration_reports_diagnostic_and_resyncs() {
    let (unit, diagnostics) = parse_src("!!! garbage here ;; f(): int { return 1; }");
    assert!(diagnostics.has_errors());
    // The parser recovers and still finds the trailing well-formed function.
    assert!(unit.declarations.iter().any(|d| matches!(d, Decl::Function(f) if f.name == "f")));
}

#[test]
fn array_call_and_member_postfixes_chain_left_to_right() {
    let unit = parse_ok("f(a: int[], p: Point*): int { return a[0].value + p->value; }");
    let f = sole_function(&unit);
    let Stmt::Return { value: Some(expr), .. } = &f.body.as_ref().unwrap().statements[0] else {
        panic!("expected a return statement");
    };
    let Expr::Binary { left, right, .. } = expr else {
        panic!("expected a binary expression");
    };
    match &**left {
        Expr::Member { object, via_pointer: false, .. } => {
            assert!(matches!(**object, Expr::Subscript { .. }));
        }
        other => panic!("expected a[0].value, got {other:?}"),
    }
    assert!(matches!(**right, Expr::Member { via_pointer: true, .. }));
}
