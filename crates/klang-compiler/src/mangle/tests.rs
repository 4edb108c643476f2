use super::*;
use crate::ast::{self, Decl, Expr, Literal, QualifiedName, Specifiers, TypeSpec};
use crate::diagnostics::Diagnostics;
use crate::model::build_model;
use klang_core::{SourceCoord, Span};

fn span() -> Span {
    Span::point(SourceCoord::START)
}

fn int_spec() -> TypeSpec {
    TypeSpec::Primitive { keyword: ast::PrimitiveKeyword::Int, unsigned: false, span: span() }
}

fn param(name: &str, ty: TypeSpec) -> ast::ParameterDecl {
    ast::ParameterDecl { name: name.into(), ty, span: span() }
}

fn empty_unit(declarations: Vec<Decl>) -> ast::Unit {
    ast::Unit { module_name: None, imports: Vec::new(), declarations, span: span() }
}

#[test]
fn free_function_with_two_int_parameters_mangles_per_the_worked_example() {
    let f = ast::FunctionDecl {
        specifiers: Specifiers::default(),
        name: "sum".into(),
        parameters: vec![param("a", int_spec()), param("b", int_spec())],
        return_type: Some(int_spec()),
        body: Some(ast::Block { statements: Vec::new(), span: span() }),
        span: span(),
    };
    let unit = empty_unit(vec![Decl::Function(f)]);
    let mut diagnostics = Diagnostics::new();
    let model = build_model(&unit, &mut diagnostics);
    assert!(!diagnostics.has_errors());
    assert_eq!(mangle_function(&model, 0), "_KFN3sumEii");
}

#[test]
fn member_function_mangles_per_the_worked_example() {
    let method = ast::FunctionDecl {
        specifiers: Specifiers::default(),
        name: "add".into(),
        parameters: vec![param("n", int_spec())],
        return_type: Some(int_spec()),
        body: Some(ast::Block { statements: Vec::new(), span: span() }),
        span: span(),
    };
    let struct_decl = ast::StructDecl {
        specifiers: Specifiers::default(),
        name: "Point".into(),
        fields: Vec::new(),
        methods: vec![method],
        span: span(),
    };
    let unit = empty_unit(vec![Decl::Struct(struct_decl)]);
    let mut diagnostics = Diagnostics::new();
    let model = build_model(&unit, &mut diagnostics);
    assert!(!diagnostics.has_errors());
    let structure = model.structure(0);
    assert_eq!(mangle_function(&model, structure.methods[0]), "_KFMN5Point3addEi");
}

#[test]
fn pointer_to_struct_parameter_nests_the_struct_mangling_under_the_pointer_modifier() {
    let struct_decl = ast::StructDecl {
        specifiers: Specifiers::default(),
        name: "Point".into(),
        fields: Vec::new(),
        methods: Vec::new(),
        span: span(),
    };
    let point_ptr = TypeSpec::Pointer(Box::new(TypeSpec::Identified(QualifiedName::simple("Point"), span())), span());
    let f = ast::FunctionDecl {
        specifiers: Specifiers::default(),
        name: "distance".into(),
        parameters: vec![param("p", point_ptr)],
        return_type: Some(int_spec()),
        body: Some(ast::Block { statements: Vec::new(), span: span() }),
        span: span(),
    };
    let unit = empty_unit(vec![Decl::Struct(struct_decl), Decl::Function(f)]);
    let mut diagnostics = Diagnostics::new();
    let model = build_model(&unit, &mut diagnostics);
    assert!(!diagnostics.has_errors());
    let fid = model.namespace(model.root).functions.iter().copied().find(|&fid| model.function(fid).name == "distance").unwrap();
    assert_eq!(mangle_function(&model, fid), "_KFN8distanceEP_KN5PointE");
}

#[test]
fn const_global_variable_gets_the_k_property_tag() {
    let decl = ast::VariableDecl {
        specifiers: Specifiers { is_const: true, ..Specifiers::default() },
        name: "x".into(),
        ty: int_spec(),
        initializer: Some(Expr::Literal(Literal::Integer { base: crate::lexer::NumericBase::Decimal, unsigned: false, size: crate::lexer::IntegerSize::Int, digits: "1".into() }, span())),
        span: span(),
    };
    let unit = empty_unit(vec![Decl::Variable(decl)]);
    let mut diagnostics = Diagnostics::new();
    let model = build_model(&unit, &mut diagnostics);
    assert!(!diagnostics.has_errors());
    assert_eq!(mangle_global_variable(&model, 0), "_KVKN1xE");
}
