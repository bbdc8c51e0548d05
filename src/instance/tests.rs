//! Unit tests for typed instantiation.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use crate::ast::expressions::{BinaryOperator, Expr, ExprKind, PipeKind, UnaryOperator};
use crate::ast::numeric::FloatValue;
use crate::builder::builder::TreeBuilder;
use crate::errors::errors::ErrorImpl;
use crate::instance::emit::{deliver_program, TextEmitter};
use crate::instance::instantiate::InstanceState;
use crate::instance::typed_ast::{Address, CaptureSource, TypedExprKind, TypedStmtKind};
use crate::instance::types::Type;
use crate::{compile, Compilation, Config, Position};

fn pos(line: u32) -> Position {
    Position(line, Rc::new("test.stk".to_string()))
}

fn compiled(builder: TreeBuilder) -> Compilation {
    compiled_with(builder, &Config::default())
}

fn compiled_with(builder: TreeBuilder, config: &Config) -> Compilation {
    let (block, diagnostics) = builder.finish();
    compile(block, diagnostics, config)
}

fn error_impls(compilation: &Compilation) -> Vec<ErrorImpl> {
    compilation
        .diagnostics
        .errors()
        .iter()
        .map(|e| e.get_impl().clone())
        .collect()
}

/// Type of a variable defined at the top level of the global block.
fn global_type(compilation: &Compilation, name: &str) -> Type {
    compilation
        .global
        .stmts
        .iter()
        .find_map(|stmt| match &stmt.kind {
            TypedStmtKind::VarDef { name: defined, init, .. } if defined == name => {
                Some(init.ty.clone())
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("No global named {}", name))
}

fn return_types(compilation: &Compilation, name: &str) -> Vec<Option<Type>> {
    compilation
        .instances_named(name)
        .map(|i| i.return_type.clone())
        .collect()
}

fn identity(builder: &mut TreeBuilder, line: u32) {
    builder.open_function(pos(line), "id", &["x"]);
    builder.add_return(pos(line + 1), Expr::reference(pos(line + 1), "x"));
    builder.close();
}

fn binary(line: u32, lhs: Expr, op: BinaryOperator, rhs: Expr) -> Expr {
    Expr::binary(pos(line), lhs, op, rhs)
}

fn var(line: u32, name: &str) -> Expr {
    Expr::reference(pos(line), name)
}

fn func_ref(line: u32, name: &str, param_count: usize) -> Expr {
    Expr::new(
        pos(line),
        ExprKind::FuncReference {
            name: name.to_string(),
            param_count,
        },
    )
}

fn list(line: u32, elements: Vec<Expr>) -> Expr {
    Expr::new(pos(line), ExprKind::ListLiteral(elements))
}

fn pipeline(line: u32, list: Expr, kind: PipeKind, section: Expr) -> Expr {
    Expr::new(
        pos(line),
        ExprKind::Pipeline {
            list: Box::new(list),
            kind,
            section: Box::new(section),
        },
    )
}

fn element(line: u32) -> Expr {
    Expr::new(pos(line), ExprKind::ListElement)
}

fn member(line: u32, object: Expr, name: &str) -> Expr {
    Expr::new(
        pos(line),
        ExprKind::MemberCall {
            object: Box::new(object),
            member: name.to_string(),
            args: vec![],
        },
    )
}

#[test]
fn test_one_instance_per_argument_types() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "a", Expr::call(pos(1), "id", vec![Expr::int(pos(1), 1)]));
    builder.add_var_def(pos(2), "b", Expr::call(pos(2), "id", vec![Expr::bool(pos(2), true)]));
    builder.add_var_def(pos(3), "c", Expr::call(pos(3), "id", vec![Expr::int(pos(3), 2)]));
    identity(&mut builder, 4);

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(compilation.instances.len(), 2);
    assert_eq!(
        return_types(&compilation, "id"),
        vec![Some(Type::Int), Some(Type::Bool)]
    );
    assert_eq!(global_type(&compilation, "a"), Type::Int);
    assert_eq!(global_type(&compilation, "b"), Type::Bool);
    assert_eq!(global_type(&compilation, "c"), Type::Int);
    assert!(compilation
        .instances
        .iter()
        .all(|i| i.state() == InstanceState::Done));
}

#[test]
fn test_parameters_occupy_first_slots() {
    let mut builder = TreeBuilder::new();
    builder.add_arithmetics(
        pos(1),
        Expr::call(
            pos(1),
            "f",
            vec![Expr::int(pos(1), 1), Expr::string(pos(1), "s")],
        ),
    );
    builder.open_function(pos(2), "f", &["a", "b"]);
    builder.add_var_def(pos(3), "c", var(3, "a"));
    builder.add_return(pos(4), var(4, "c"));
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    let instance = &compilation.instances[0];
    assert_eq!(instance.arg_types(), vec![Type::Int, Type::String]);
    assert_eq!(
        instance
            .locals
            .iter()
            .map(|s| (s.name.as_str(), s.slot))
            .collect::<Vec<_>>(),
        vec![("a", 0), ("b", 1), ("c", 2)]
    );
    match &instance.body.stmts[1].kind {
        TypedStmtKind::Return(value) => assert_eq!(
            value.kind,
            TypedExprKind::Reference {
                name: "c".to_string(),
                address: Address::Local(2)
            }
        ),
        other => panic!("Expected return, got {:?}", other),
    }
}

#[test]
fn test_void_functions() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "r", Expr::call(pos(1), "p", vec![Expr::int(pos(1), 1)]));
    builder.add_var_def(pos(2), "q", Expr::call(pos(2), "early", vec![]));
    builder.open_function(pos(3), "p", &["x"]);
    builder.add_arithmetics(pos(4), var(4, "x"));
    builder.close();
    builder.open_function(pos(5), "early", &[]);
    builder.add_return_nothing(pos(6));
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(global_type(&compilation, "r"), Type::Void);
    assert_eq!(global_type(&compilation, "q"), Type::Void);
}

#[test]
fn test_self_recursion_without_base_case() {
    let mut builder = TreeBuilder::new();
    builder.add_arithmetics(pos(1), Expr::call(pos(1), "f", vec![]));
    builder.open_function(pos(2), "f", &[]);
    builder.add_return(pos(3), Expr::call(pos(3), "f", vec![]));
    builder.close();

    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![ErrorImpl::ReturnTypeUnresolvable {
            name: "f".to_string(),
            arg_count: 0
        }]
    );
    assert_eq!(compilation.diagnostics.errors()[0].get_position(), &pos(2));
    assert_eq!(return_types(&compilation, "f"), vec![None]);
}

#[test]
fn test_recursion_with_base_case_first() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "r", Expr::call(pos(1), "fact", vec![Expr::int(pos(1), 5)]));
    builder.open_function(pos(2), "fact", &["n"]);
    builder.open_branch(
        pos(3),
        binary(3, var(3, "n"), BinaryOperator::Less, Expr::int(pos(3), 1)),
    );
    builder.add_return(pos(4), Expr::int(pos(4), 1));
    builder.close();
    builder.add_return(
        pos(5),
        binary(
            5,
            var(5, "n"),
            BinaryOperator::Mul,
            Expr::call(
                pos(5),
                "fact",
                vec![binary(5, var(5, "n"), BinaryOperator::Sub, Expr::int(pos(5), 1))],
            ),
        ),
    );
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(compilation.instances.len(), 1);
    assert_eq!(return_types(&compilation, "fact"), vec![Some(Type::Int)]);
    assert_eq!(global_type(&compilation, "r"), Type::Int);
}

#[test]
fn test_recursion_with_base_case_last() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "r", Expr::call(pos(1), "sum", vec![Expr::int(pos(1), 3)]));
    builder.open_function(pos(2), "sum", &["n"]);
    builder.open_branch(
        pos(3),
        binary(3, var(3, "n"), BinaryOperator::Greater, Expr::int(pos(3), 0)),
    );
    builder.add_return(
        pos(4),
        binary(
            4,
            var(4, "n"),
            BinaryOperator::Add,
            Expr::call(
                pos(4),
                "sum",
                vec![binary(4, var(4, "n"), BinaryOperator::Sub, Expr::int(pos(4), 1))],
            ),
        ),
    );
    builder.close();
    builder.add_return(pos(5), Expr::int(pos(5), 0));
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(return_types(&compilation, "sum"), vec![Some(Type::Int)]);
    assert_eq!(global_type(&compilation, "r"), Type::Int);

    // the recursive path is typed in the committed body
    let body = &compilation.instances[0].body;
    match &body.stmts[0].kind {
        TypedStmtKind::Branch { consequence, .. } => match &consequence.stmts[0].kind {
            TypedStmtKind::Return(value) => assert_eq!(value.ty, Type::Int),
            other => panic!("Expected return, got {:?}", other),
        },
        other => panic!("Expected branch, got {:?}", other),
    }
}

#[test]
fn test_pending_path_mismatch_is_unresolvable() {
    let mut builder = TreeBuilder::new();
    builder.add_arithmetics(pos(1), Expr::call(pos(1), "h", vec![Expr::int(pos(1), 3)]));
    builder.open_function(pos(2), "h", &["n"]);
    builder.open_branch(
        pos(3),
        binary(3, var(3, "n"), BinaryOperator::Greater, Expr::int(pos(3), 0)),
    );
    builder.add_return(
        pos(4),
        binary(
            4,
            Expr::call(
                pos(4),
                "h",
                vec![binary(4, var(4, "n"), BinaryOperator::Sub, Expr::int(pos(4), 1))],
            ),
            BinaryOperator::Less,
            Expr::int(pos(4), 1),
        ),
    );
    builder.close();
    builder.add_return(pos(5), Expr::int(pos(5), 0));
    builder.close();

    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![ErrorImpl::ReturnTypeUnresolvable {
            name: "h".to_string(),
            arg_count: 1
        }]
    );
    assert_eq!(compilation.diagnostics.errors()[0].get_position(), &pos(4));
}

#[test]
fn test_return_type_conflict() {
    let mut builder = TreeBuilder::new();
    builder.add_arithmetics(pos(1), Expr::call(pos(1), "g", vec![Expr::bool(pos(1), true)]));
    builder.open_function(pos(2), "g", &["c"]);
    builder.open_branch(pos(3), var(3, "c"));
    builder.add_return(pos(4), Expr::int(pos(4), 1));
    builder.close();
    builder.add_return(pos(5), Expr::string(pos(5), "one"));
    builder.close();

    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![ErrorImpl::ReturnTypeConflict {
            expected: "int".to_string(),
            received: "string".to_string()
        }]
    );
    assert_eq!(compilation.diagnostics.errors()[0].get_position(), &pos(5));
    assert_eq!(return_types(&compilation, "g"), vec![Some(Type::Int)]);
}

#[test]
fn test_empty_list_return_unifies() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "r", Expr::call(pos(1), "f", vec![Expr::bool(pos(1), false)]));
    builder.open_function(pos(2), "f", &["c"]);
    builder.open_branch(pos(3), var(3, "c"));
    builder.add_return(pos(4), list(4, vec![]));
    builder.close();
    builder.add_return(pos(5), list(5, vec![Expr::int(pos(5), 1)]));
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(
        return_types(&compilation, "f"),
        vec![Some(Type::list_of(Type::Int))]
    );
    assert_eq!(global_type(&compilation, "r"), Type::list_of(Type::Int));
}

#[test]
fn test_narrowed_list_return_conflicts() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "r", Expr::call(pos(1), "f", vec![Expr::bool(pos(1), false)]));
    builder.open_function(pos(2), "f", &["c"]);
    builder.open_branch(pos(3), var(3, "c"));
    builder.add_return(pos(4), list(4, vec![]));
    builder.close();
    builder.open_branch(pos(5), var(5, "c"));
    builder.add_return(pos(6), list(6, vec![Expr::int(pos(6), 1)]));
    builder.close();
    builder.add_return(pos(7), list(7, vec![Expr::string(pos(7), "s")]));
    builder.close();

    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![ErrorImpl::ReturnTypeConflict {
            expected: "list[int]".to_string(),
            received: "list[string]".to_string()
        }]
    );
    assert_eq!(compilation.diagnostics.errors()[0].get_position(), &pos(7));
    assert_eq!(
        return_types(&compilation, "f"),
        vec![Some(Type::list_of(Type::Int))]
    );
}

#[test]
fn test_mutual_recursion() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "r", Expr::call(pos(1), "even", vec![Expr::int(pos(1), 4)]));
    for (line, name, other, base) in [(2, "even", "odd", true), (6, "odd", "even", false)] {
        builder.open_function(pos(line), name, &["n"]);
        builder.open_branch(
            pos(line + 1),
            binary(
                line + 1,
                var(line + 1, "n"),
                BinaryOperator::Equal,
                Expr::int(pos(line + 1), 0),
            ),
        );
        builder.add_return(pos(line + 2), Expr::bool(pos(line + 2), base));
        builder.close();
        builder.add_return(
            pos(line + 3),
            Expr::call(
                pos(line + 3),
                other,
                vec![binary(
                    line + 3,
                    var(line + 3, "n"),
                    BinaryOperator::Sub,
                    Expr::int(pos(line + 3), 1),
                )],
            ),
        );
        builder.close();
    }

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(return_types(&compilation, "even"), vec![Some(Type::Bool)]);
    assert_eq!(return_types(&compilation, "odd"), vec![Some(Type::Bool)]);
    assert_eq!(global_type(&compilation, "r"), Type::Bool);
}

#[test]
fn test_mutual_recursion_without_base_case() {
    let mut builder = TreeBuilder::new();
    builder.add_arithmetics(pos(1), Expr::call(pos(1), "a", vec![]));
    builder.open_function(pos(2), "a", &[]);
    builder.add_return(pos(3), Expr::call(pos(3), "b", vec![]));
    builder.close();
    builder.open_function(pos(4), "b", &[]);
    builder.add_return(pos(5), Expr::call(pos(5), "a", vec![]));
    builder.close();

    let compilation = compiled(builder);
    let mut names: Vec<String> = compilation
        .diagnostics
        .errors_named("ReturnTypeUnresolvable")
        .map(|e| match e.get_impl() {
            ErrorImpl::ReturnTypeUnresolvable { name, .. } => name.clone(),
            other => panic!("Unexpected error {:?}", other),
        })
        .collect();
    names.sort();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(compilation.diagnostics.errors().len(), 2);
}

#[test]
fn test_waiting_instance_recompiled_after_dependency_resolves() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "r", Expr::call(pos(1), "a", vec![]));
    builder.open_function(pos(2), "a", &[]);
    builder.add_return(
        pos(3),
        Expr::call(pos(3), "b", vec![Expr::bool(pos(3), true)]),
    );
    builder.close();
    builder.open_function(pos(4), "b", &["c"]);
    builder.open_branch(pos(5), var(5, "c"));
    builder.add_return(pos(6), Expr::call(pos(6), "a", vec![]));
    builder.close();
    builder.add_return(pos(7), Expr::int(pos(7), 1));
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(return_types(&compilation, "a"), vec![Some(Type::Int)]);
    assert_eq!(return_types(&compilation, "b"), vec![Some(Type::Int)]);
    assert!(compilation
        .instances
        .iter()
        .all(|i| i.state() == InstanceState::Done));
}

#[test]
fn test_global_capture() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "x", Expr::float(pos(1), FloatValue::from_f64(1.5)));
    builder.add_var_def(pos(2), "r", Expr::call(pos(2), "f", vec![]));
    builder.open_function(pos(3), "f", &[]);
    builder.add_return(pos(4), var(4, "x"));
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    let instance = &compilation.instances[0];
    assert_eq!(instance.captures.len(), 1);
    assert_eq!(instance.captures[0].name, "x");
    assert_eq!(instance.captures[0].level, 0);
    assert_eq!(instance.captures[0].ty, Type::Float);
    assert_eq!(global_type(&compilation, "r"), Type::Float);

    match &instance.body.stmts[0].kind {
        TypedStmtKind::Return(value) => assert_eq!(
            value.kind,
            TypedExprKind::Reference {
                name: "x".to_string(),
                address: Address::Capture(0)
            }
        ),
        other => panic!("Expected return, got {:?}", other),
    }
}

#[test]
fn test_capture_types_key_instances() {
    let mut builder = TreeBuilder::new();
    builder.add_arithmetics(pos(1), Expr::call(pos(1), "outer", vec![Expr::int(pos(1), 1)]));
    builder.add_arithmetics(pos(2), Expr::call(pos(2), "outer", vec![Expr::string(pos(2), "a")]));
    builder.open_function(pos(3), "outer", &["v"]);
    builder.open_function(pos(4), "inner", &[]);
    builder.add_return(pos(5), var(5, "v"));
    builder.close();
    builder.add_return(pos(6), Expr::call(pos(6), "inner", vec![]));
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(
        return_types(&compilation, "inner"),
        vec![Some(Type::Int), Some(Type::String)]
    );
    assert_eq!(
        return_types(&compilation, "outer"),
        vec![Some(Type::Int), Some(Type::String)]
    );
}

#[test]
fn test_capture_not_defined_at_call_site() {
    let mut builder = TreeBuilder::new();
    builder.add_arithmetics(pos(1), Expr::call(pos(1), "f", vec![]));
    builder.add_var_def(pos(2), "y", Expr::int(pos(2), 1));
    builder.open_function(pos(3), "f", &[]);
    builder.add_return(pos(4), var(4, "y"));
    builder.close();

    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![ErrorImpl::UnresolvableReference {
            name: "y".to_string()
        }]
    );
    assert_eq!(compilation.diagnostics.errors()[0].get_position(), &pos(1));
    assert!(compilation.instances.is_empty());
}

#[test]
fn test_call_through_function_reference() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "g", func_ref(1, "double", 1));
    builder.add_var_def(pos(2), "r", Expr::call(pos(2), "g", vec![Expr::int(pos(2), 21)]));
    builder.open_function(pos(3), "double", &["n"]);
    builder.add_return(
        pos(4),
        binary(4, var(4, "n"), BinaryOperator::Mul, Expr::int(pos(4), 2)),
    );
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert!(matches!(
        global_type(&compilation, "g"),
        Type::FuncReference { param_count: 1, .. }
    ));
    assert_eq!(global_type(&compilation, "r"), Type::Int);
    assert_eq!(return_types(&compilation, "double"), vec![Some(Type::Int)]);

    match &compilation.global.stmts[1].kind {
        TypedStmtKind::VarDef { init, .. } => match &init.kind {
            TypedExprKind::Call { captures, .. } => {
                assert!(matches!(captures, CaptureSource::Reference(_)))
            }
            other => panic!("Expected call, got {:?}", other),
        },
        other => panic!("Expected var def, got {:?}", other),
    }
}

#[test]
fn test_function_reference_carries_captures() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "base", Expr::int(pos(1), 10));
    builder.add_var_def(pos(2), "g", func_ref(2, "add", 1));
    builder.add_var_def(pos(3), "r", Expr::call(pos(3), "g", vec![Expr::int(pos(3), 1)]));
    builder.open_function(pos(4), "add", &["n"]);
    builder.add_return(
        pos(5),
        binary(5, var(5, "n"), BinaryOperator::Add, var(5, "base")),
    );
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    match global_type(&compilation, "g") {
        Type::FuncReference { captures, .. } => assert_eq!(captures, vec![Type::Int]),
        other => panic!("Expected function reference, got {:?}", other),
    }
    assert_eq!(compilation.instances[0].captures[0].ty, Type::Int);
}

#[test]
fn test_calling_non_functions() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "v", Expr::int(pos(1), 1));
    builder.add_arithmetics(pos(2), Expr::call(pos(2), "v", vec![Expr::int(pos(2), 2)]));
    builder.add_var_def(pos(3), "g", func_ref(3, "f", 1));
    builder.add_arithmetics(
        pos(4),
        Expr::call(pos(4), "g", vec![Expr::int(pos(4), 1), Expr::int(pos(4), 2)]),
    );
    builder.open_function(pos(5), "f", &["n"]);
    builder.add_return(pos(6), var(6, "n"));
    builder.close();

    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![
            ErrorImpl::NotCallable {
                name: "v".to_string(),
                type_name: "int".to_string()
            },
            ErrorImpl::UnresolvableCall {
                name: "g".to_string(),
                arg_count: 2
            },
        ]
    );
}

#[test]
fn test_operator_errors() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "s", Expr::string(pos(1), "a"));
    builder.add_var_def(pos(2), "t", binary(2, var(2, "s"), BinaryOperator::Sub, Expr::int(pos(2), 1)));
    // no second error for a value that already failed
    builder.add_var_def(pos(3), "u", binary(3, var(3, "t"), BinaryOperator::Add, Expr::int(pos(3), 1)));
    builder.add_var_def(pos(4), "b", Expr::bool(pos(4), true));
    builder.add_var_def(pos(5), "n", Expr::pre_unary(pos(5), UnaryOperator::Minus, var(5, "b")));
    builder.add_var_def(pos(6), "i", Expr::int(pos(6), 7));
    builder.add_var_def(pos(7), "q", binary(7, var(7, "i"), BinaryOperator::Div, Expr::int(pos(7), 0)));

    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![
            ErrorImpl::BinaryOperatorUnavailable {
                operator: "-".to_string(),
                lhs_type: "string".to_string(),
                rhs_type: "int".to_string()
            },
            ErrorImpl::UnaryOperatorUnavailable {
                operator: "-".to_string(),
                operand_type: "bool".to_string()
            },
            ErrorImpl::DivideOrModuloByLiteralZero {
                operator: "/".to_string()
            },
        ]
    );
    assert_eq!(global_type(&compilation, "t"), Type::Bad);
    assert_eq!(global_type(&compilation, "u"), Type::Bad);
    assert_eq!(global_type(&compilation, "q"), Type::Int);
}

#[test]
fn test_mixed_arithmetic_and_strings() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "i", Expr::int(pos(1), 2));
    builder.add_var_def(pos(2), "f", binary(2, var(2, "i"), BinaryOperator::Mul, Expr::float(pos(2), FloatValue::from_f64(0.5))));
    builder.add_var_def(pos(3), "s", Expr::string(pos(3), "a"));
    builder.add_var_def(pos(4), "t", binary(4, var(4, "s"), BinaryOperator::Add, var(4, "s")));
    builder.add_var_def(pos(5), "c", binary(5, var(5, "s"), BinaryOperator::Less, var(5, "t")));

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(global_type(&compilation, "f"), Type::Float);
    assert_eq!(global_type(&compilation, "t"), Type::String);
    assert_eq!(global_type(&compilation, "c"), Type::Bool);
}

#[test]
fn test_conditions_must_be_boolean() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "x", Expr::int(pos(1), 1));
    builder.open_branch(pos(2), var(2, "x"));
    builder.add_arithmetics(pos(3), var(3, "x"));
    builder.close();
    builder.add_var_def(
        pos(4),
        "y",
        Expr::new(
            pos(4),
            ExprKind::Conjunction {
                lhs: Box::new(var(4, "x")),
                rhs: Box::new(Expr::bool(pos(4), true)),
            },
        ),
    );

    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![
            ErrorImpl::ConditionNotBoolean {
                type_name: "int".to_string()
            },
            ErrorImpl::ConditionNotBoolean {
                type_name: "int".to_string()
            },
        ]
    );
    assert_eq!(global_type(&compilation, "y"), Type::Bool);
}

#[test]
fn test_lists_and_pipelines() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(
        pos(1),
        "xs",
        list(1, vec![Expr::int(pos(1), 1), Expr::int(pos(1), 2)]),
    );
    builder.add_var_def(
        pos(2),
        "doubled",
        pipeline(
            2,
            var(2, "xs"),
            PipeKind::Map,
            binary(2, element(2), BinaryOperator::Mul, Expr::float(pos(2), FloatValue::from_f64(2.0))),
        ),
    );
    builder.add_var_def(
        pos(3),
        "big",
        pipeline(
            3,
            var(3, "xs"),
            PipeKind::Filter,
            binary(3, element(3), BinaryOperator::Greater, Expr::int(pos(3), 1)),
        ),
    );
    builder.add_var_def(
        pos(4),
        "joined",
        binary(4, var(4, "xs"), BinaryOperator::Append, list(4, vec![])),
    );
    builder.add_var_def(pos(5), "size", member(5, var(5, "xs"), "size"));
    builder.add_var_def(pos(6), "head", member(6, var(6, "xs"), "first"));
    builder.add_var_def(
        pos(7),
        "indices",
        pipeline(7, var(7, "xs"), PipeKind::Map, Expr::new(pos(7), ExprKind::ListIndex)),
    );

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert_eq!(global_type(&compilation, "xs"), Type::list_of(Type::Int));
    assert_eq!(global_type(&compilation, "doubled"), Type::list_of(Type::Float));
    assert_eq!(global_type(&compilation, "big"), Type::list_of(Type::Int));
    assert_eq!(global_type(&compilation, "joined"), Type::list_of(Type::Int));
    assert_eq!(global_type(&compilation, "size"), Type::Int);
    assert_eq!(global_type(&compilation, "head"), Type::Int);
    assert_eq!(global_type(&compilation, "indices"), Type::list_of(Type::Int));
}

#[test]
fn test_list_errors() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(
        pos(1),
        "mixed",
        list(1, vec![Expr::int(pos(1), 1), Expr::string(pos(2), "a")]),
    );
    builder.add_arithmetics(pos(3), element(3));
    builder.add_var_def(pos(4), "n", Expr::int(pos(4), 1));
    builder.add_arithmetics(pos(5), member(5, var(5, "n"), "size"));
    builder.add_arithmetics(
        pos(6),
        pipeline(6, var(6, "n"), PipeKind::Map, element(6)),
    );
    builder.add_arithmetics(
        pos(7),
        pipeline(7, list(7, vec![Expr::int(pos(7), 1)]), PipeKind::Filter, element(7)),
    );

    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![
            ErrorImpl::ListElementTypeMismatch {
                expected: "int".to_string(),
                received: "string".to_string()
            },
            ErrorImpl::ListContextUnavailable {
                expression: "list element".to_string()
            },
            ErrorImpl::MemberCallUnavailable {
                member: "size".to_string(),
                type_name: "int".to_string()
            },
            ErrorImpl::BinaryOperatorUnavailable {
                operator: "|:".to_string(),
                lhs_type: "int".to_string(),
                rhs_type: "list section".to_string()
            },
            ErrorImpl::ConditionNotBoolean {
                type_name: "int".to_string()
            },
        ]
    );
    assert_eq!(compilation.diagnostics.errors()[0].get_position(), &pos(2));
    assert_eq!(global_type(&compilation, "mixed"), Type::list_of(Type::Int));
}

#[test]
fn test_instantiation_depth_limit() {
    let mut builder = TreeBuilder::new();
    builder.add_arithmetics(pos(1), Expr::call(pos(1), "grow", vec![Expr::int(pos(1), 1)]));
    builder.open_function(pos(2), "grow", &["x"]);
    builder.add_return(
        pos(3),
        Expr::call(pos(3), "grow", vec![list(3, vec![var(3, "x")])]),
    );
    builder.close();

    let config = Config {
        max_instantiation_depth: 4,
        ..Config::default()
    };
    let compilation = compiled_with(builder, &config);
    assert_eq!(
        error_impls(&compilation),
        vec![ErrorImpl::InstantiationTooDeep {
            name: "grow".to_string(),
            depth: 4
        }]
    );
    assert_eq!(compilation.instances.len(), 4);
}

#[test]
fn test_instantiation_depth_limit_with_default_config() {
    let mut builder = TreeBuilder::new();
    builder.add_arithmetics(pos(1), Expr::call(pos(1), "grow", vec![Expr::int(pos(1), 1)]));
    builder.open_function(pos(2), "grow", &["x"]);
    builder.add_return(
        pos(3),
        Expr::call(pos(3), "grow", vec![list(3, vec![var(3, "x")])]),
    );
    builder.close();

    let config = Config::default();
    let compilation = compiled(builder);
    assert_eq!(
        error_impls(&compilation),
        vec![ErrorImpl::InstantiationTooDeep {
            name: "grow".to_string(),
            depth: config.max_instantiation_depth
        }]
    );
    assert_eq!(compilation.instances.len(), config.max_instantiation_depth);
    assert!(compilation
        .instances
        .iter()
        .all(|i| i.state() == InstanceState::Done && i.return_type.is_none()));
}

#[test]
fn test_uncalled_functions_are_not_instantiated() {
    let mut builder = TreeBuilder::new();
    builder.open_function(pos(1), "never", &["x"]);
    builder.add_return(
        pos(2),
        binary(2, var(2, "x"), BinaryOperator::Sub, Expr::string(pos(2), "s")),
    );
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());
    assert!(compilation.instances.is_empty());
}

#[test]
fn test_text_emitter_output() {
    let mut builder = TreeBuilder::new();
    builder.add_var_def(pos(1), "k", Expr::int(pos(1), 2));
    builder.add_var_def(pos(2), "r", Expr::call(pos(2), "scale", vec![Expr::int(pos(2), 3)]));
    builder.open_function(pos(3), "scale", &["n"]);
    builder.add_return(
        pos(4),
        binary(4, var(4, "n"), BinaryOperator::Mul, var(4, "k")),
    );
    builder.close();

    let compilation = compiled(builder);
    assert!(!compilation.has_error());

    let mut emitter = TextEmitter::new();
    deliver_program(&compilation.global, &compilation.instances, &mut emitter);
    assert_eq!(
        emitter.into_output(),
        [
            "{",
            "  k@0: int = 2",
            "  r@1: int = #0(3)[k@0]",
            "}",
            "fn scale#0(n: int) -> int",
            "captures k: int",
            "{",
            "  return (n@0 * k^0)",
            "}",
            "",
        ]
        .join("\n")
    );
}
