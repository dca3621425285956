#![allow(clippy::expect_used, reason = "tests use expect for brevity")]

use corp_diagnostic::ErrorCode;
use corp_ir::build::{
    assign, assign_to, block, bool, call, call_fn, call_method, call_with, class, constant, field,
    float, for_, for_in, for_of, func, func_def, function_def, ident, if_, index, int,
    interpolated, lambda, list, method, named, new, null, param, param_default, program, prop,
    record, ret, static_method, str, super_call, super_method, ternary, this, unary, var,
    var_typed, while_, brk, cont,
};
use corp_ir::{BinaryOp, Node, TypeRef, UnaryOp};
use pretty_assertions::assert_eq;

use super::*;
use crate::{buffer_handler, Category, EvalMode, PrintHandlerImpl};

fn bin(op: BinaryOp, left: Node, right: Node) -> Node {
    corp_ir::build::binary(op, left, right)
}

fn print(value: Node) -> Node {
    call_fn("print", vec![value])
}

/// Run a program; return the result and everything it printed.
fn run(statements: Vec<Node>) -> (ExecutionResult, String) {
    let output = buffer_handler();
    let mut interpreter = InterpreterBuilder::new()
        .print_handler(output.clone())
        .build();
    let result = interpreter.execute(&program(statements));
    (result, output.get_output())
}

fn output_of(statements: Vec<Node>) -> String {
    let (result, output) = run(statements);
    assert!(
        result.raised.is_none(),
        "unexpected exception: {:?}",
        result.raised
    );
    output
}

fn raised_by(statements: Vec<Node>) -> Rc<ExceptionObject> {
    run(statements).0.raised.expect("program raises")
}

// Expressions and operators

#[test]
fn arithmetic_promotes_and_divides_to_float() {
    let out = output_of(vec![
        print(bin(BinaryOp::Add, int(1), bin(BinaryOp::Mul, int(2), int(3)))),
        print(bin(BinaryOp::Div, int(7), int(2))),
        print(bin(BinaryOp::Div, int(6), int(3))),
        print(bin(BinaryOp::Add, int(1), float(0.5))),
        print(bin(BinaryOp::Mod, int(-7), int(3))),
    ]);
    assert_eq!(out, "7\n3.5\n2.0\n1.5\n2\n");
}

#[test]
fn string_concatenation_uses_display_forms() {
    let out = output_of(vec![
        print(bin(BinaryOp::Add, str("n="), int(3))),
        print(bin(BinaryOp::Mul, str("ab"), int(2))),
        print(interpolated(vec![str("x is "), float(2.0)])),
    ]);
    assert_eq!(out, "n=3\nabab\nx is 2.0\n");
}

#[test]
fn logical_operators_short_circuit_and_yield_bool() {
    let out = output_of(vec![
        print(bin(BinaryOp::And, int(1), str("x"))),
        print(bin(BinaryOp::Or, null(), int(0))),
        // The right side would raise if evaluated.
        print(bin(BinaryOp::And, bool(false), ident("missing"))),
        print(unary(UnaryOp::Not, list(vec![]))),
        print(ternary(bin(BinaryOp::Lt, int(1), int(2)), str("yes"), str("no"))),
    ]);
    assert_eq!(out, "true\nfalse\nfalse\ntrue\nyes\n");
}

#[test]
fn equality_is_numeric_across_int_and_float() {
    let out = output_of(vec![
        print(bin(BinaryOp::Eq, int(2), float(2.0))),
        print(bin(BinaryOp::NotEq, str("a"), str("b"))),
        print(bin(BinaryOp::GtEq, str("b"), str("a"))),
    ]);
    assert_eq!(out, "true\ntrue\ntrue\n");
}

#[test]
fn division_by_zero_raises_runtime_error() {
    let exc = raised_by(vec![var("x", bin(BinaryOp::Div, int(1), int(0)))]);
    assert_eq!(exc.kind, Category::RuntimeError);
    assert_eq!(exc.message, "division by zero");
}

#[test]
fn integer_overflow_raises() {
    let exc = raised_by(vec![print(bin(BinaryOp::Add, int(i64::MAX), int(1)))]);
    assert_eq!(exc.kind, Category::RuntimeError);
    assert_eq!(exc.message, "integer overflow in '+'");
}

#[test]
fn invalid_operands_raise_type_error() {
    let exc = raised_by(vec![print(bin(BinaryOp::Sub, str("a"), int(1)))]);
    assert_eq!(exc.kind, Category::TypeError);
    assert_eq!(exc.message, "type mismatch: cannot apply '-' to str and int");
    let exc = raised_by(vec![print(unary(UnaryOp::Neg, str("a")))]);
    assert_eq!(exc.kind, Category::TypeError);
}

#[test]
fn string_repetition_is_bounded() {
    use corp_ir::build::{catch, try_};
    let out = output_of(vec![
        print(bin(BinaryOp::Mul, str("ab"), int(3))),
        print(bin(BinaryOp::Mul, int(-2), str("ab"))),
        try_(
            vec![print(bin(BinaryOp::Mul, str("ab"), int(i64::MAX)))],
            vec![catch("e", &["MemoryError"], vec![print(prop(ident("e"), "message"))])],
            None,
        ),
    ]);
    assert_eq!(
        out,
        "ababab\n\nstring repetition result exceeds 10000000 elements\n"
    );
}

#[test]
fn self_containing_list_survives_printing_and_raising() {
    use corp_ir::build::{catch, throw, try_};
    let out = output_of(vec![
        var("a", list(vec![int(1)])),
        call_method(ident("a"), "push", vec![ident("a")]),
        try_(
            vec![throw(str("boom"))],
            vec![catch("e", &[], vec![print(str("caught"))])],
            None,
        ),
        print(ident("a")),
        print(bin(BinaryOp::Eq, ident("a"), ident("a"))),
    ]);
    assert_eq!(out, "caught\n[1, [...]]\ntrue\n");
}

#[test]
fn lists_records_and_indexing() {
    let out = output_of(vec![
        var("xs", list(vec![int(1), int(2), int(3)])),
        print(index(ident("xs"), int(-1))),
        assign_to(index(ident("xs"), int(0)), int(10)),
        print(ident("xs")),
        var("r", record(vec![("a", int(1)), ("a", int(2))])),
        print(prop(ident("r"), "a")),
        print(prop(ident("r"), "missing")),
        assign_to(prop(ident("r"), "b"), str("x")),
        print(index(ident("r"), str("b"))),
        print(index(str("héllo"), int(1))),
        print(prop(ident("xs"), "length")),
    ]);
    assert_eq!(out, "3\n[10, 2, 3]\n2\nnull\nx\né\n3\n");
}

#[test]
fn index_out_of_range_raises() {
    let exc = raised_by(vec![print(index(list(vec![int(1)]), int(5)))]);
    assert_eq!(exc.kind, Category::RuntimeError);
    assert_eq!(exc.message, "index 5 out of range for length 1");
}

#[test]
fn property_of_null_is_a_type_error() {
    let exc = raised_by(vec![print(prop(null(), "x"))]);
    assert_eq!(exc.kind, Category::TypeError);
    assert_eq!(exc.message, "cannot read property 'x' of null");
}

#[test]
fn calling_a_non_callable_raises() {
    let exc = raised_by(vec![call(int(3), vec![])]);
    assert_eq!(exc.kind, Category::TypeError);
    assert_eq!(exc.message, "'int' value is not callable");
}

// Variables and scopes

#[test]
fn undefined_variable_raises_reference_error() {
    let exc = raised_by(vec![print(ident("nope"))]);
    assert_eq!(exc.kind, Category::ReferenceError);
    assert_eq!(exc.message, "undefined variable 'nope'");
    assert_eq!(exc.mp_stack.len(), 1);
    assert_eq!(exc.mp_stack[0].function.as_str(), "<module>");
}

#[test]
fn blocks_shadow_but_assign_through() {
    let out = output_of(vec![
        var("x", int(1)),
        block(vec![var("x", int(2)), print(ident("x"))]),
        print(ident("x")),
        block(vec![assign("x", int(3))]),
        print(ident("x")),
    ]);
    assert_eq!(out, "2\n1\n3\n");
}

#[test]
fn assigning_an_undeclared_variable_raises() {
    let exc = raised_by(vec![assign("ghost", int(1))]);
    assert_eq!(exc.kind, Category::ReferenceError);
    assert_eq!(exc.message, "cannot assign to undefined variable 'ghost'");
}

#[test]
fn constants_cannot_be_reassigned() {
    let exc = raised_by(vec![constant("k", int(1)), assign("k", int(2))]);
    assert_eq!(exc.kind, Category::TypeError);
    assert_eq!(exc.message, "cannot assign to constant 'k'");
}

#[test]
fn builtins_are_constants() {
    let exc = raised_by(vec![assign("print", int(1))]);
    assert_eq!(exc.message, "cannot assign to constant 'print'");
}

#[test]
fn declared_types_are_enforced_on_init_and_assignment() {
    let exc = raised_by(vec![var_typed("n", TypeRef::named("int"), Some(str("x")))]);
    assert_eq!(exc.kind, Category::TypeError);
    assert_eq!(exc.message, "type mismatch: 'n' is declared as int but got str");

    let exc = raised_by(vec![
        var_typed("n", TypeRef::named("int"), Some(int(1))),
        assign("n", float(1.5)),
    ]);
    assert_eq!(exc.message, "type mismatch: 'n' is declared as int but got float");
}

// Functions and closures

#[test]
fn closures_share_their_defining_environment() {
    let out = output_of(vec![
        func(
            "make_counter",
            &[],
            vec![
                var("count", int(0)),
                func(
                    "inc",
                    &[],
                    vec![
                        assign("count", bin(BinaryOp::Add, ident("count"), int(1))),
                        ret(ident("count")),
                    ],
                ),
                ret(ident("inc")),
            ],
        ),
        var("a", call_fn("make_counter", vec![])),
        var("b", call_fn("make_counter", vec![])),
        call_fn("a", vec![]),
        call_fn("a", vec![]),
        print(call_fn("a", vec![])),
        print(call_fn("b", vec![])),
    ]);
    assert_eq!(out, "3\n1\n");
}

#[test]
fn closures_see_later_writes_to_captured_variables() {
    let out = output_of(vec![
        var("x", int(1)),
        func("get", &[], vec![ret(ident("x"))]),
        assign("x", int(2)),
        print(call_fn("get", vec![])),
    ]);
    assert_eq!(out, "2\n");
}

#[test]
fn recursion() {
    let out = output_of(vec![
        func(
            "fact",
            &["n"],
            vec![
                if_(bin(BinaryOp::LtEq, ident("n"), int(1)), vec![ret(int(1))], None),
                ret(bin(
                    BinaryOp::Mul,
                    ident("n"),
                    call_fn("fact", vec![bin(BinaryOp::Sub, ident("n"), int(1))]),
                )),
            ],
        ),
        print(call_fn("fact", vec![int(10)])),
    ]);
    assert_eq!(out, "3628800\n");
}

#[test]
fn defaults_and_named_arguments() {
    let mut greet = function_def(
        "greet",
        vec![param("name"), param_default("greeting", str("hello"))],
        vec![ret(bin(
            BinaryOp::Add,
            bin(BinaryOp::Add, ident("greeting"), str(" ")),
            ident("name"),
        ))],
    );
    greet.return_type = Some(TypeRef::named("str"));
    let out = output_of(vec![
        func_def(greet),
        print(call_fn("greet", vec![str("ann")])),
        print(call_with(
            ident("greet"),
            vec![named("greeting", str("hi")), named("name", str("bo"))],
        )),
    ]);
    assert_eq!(out, "hello ann\nhi bo\n");
}

#[test]
fn argument_errors() {
    let decl = func("f", &["a"], vec![ret(ident("a"))]);

    let exc = raised_by(vec![decl.clone(), call_fn("f", vec![])]);
    assert_eq!(exc.message, "f() missing required argument 'a'");

    let exc = raised_by(vec![decl.clone(), call_fn("f", vec![int(1), int(2)])]);
    assert_eq!(exc.message, "f() takes 1 argument(s) but 2 were given");

    let exc = raised_by(vec![
        decl.clone(),
        call_with(ident("f"), vec![named("b", int(1))]),
    ]);
    assert_eq!(exc.message, "f() got an unexpected argument 'b'");

    let exc = raised_by(vec![
        decl,
        call_with(
            ident("f"),
            vec![corp_ir::build::arg(int(1)), named("a", int(2))],
        ),
    ]);
    assert_eq!(exc.message, "f() got multiple values for argument 'a'");
}

#[test]
fn return_type_is_enforced() {
    let mut def = function_def("f", vec![], vec![ret(str("x"))]);
    def.return_type = Some(TypeRef::named("int"));
    let exc = raised_by(vec![func_def(def), call_fn("f", vec![])]);
    assert_eq!(exc.kind, Category::TypeError);
    assert_eq!(exc.message, "type mismatch: f() must return int, got str");
}

#[test]
fn functions_without_return_yield_null() {
    let out = output_of(vec![
        func("f", &[], vec![int(1)]),
        print(call_fn("f", vec![])),
    ]);
    assert_eq!(out, "null\n");
}

#[test]
fn lambdas_are_values() {
    let out = output_of(vec![
        var("double", lambda(&["x"], vec![ret(bin(BinaryOp::Mul, ident("x"), int(2)))])),
        print(call_fn("map", vec![list(vec![int(1), int(2)]), ident("double")])),
    ]);
    assert_eq!(out, "[2, 4]\n");
}

#[test]
fn recursion_limit_raises_memory_error_and_unwinds() {
    let mut interpreter = InterpreterBuilder::new()
        .print_handler(buffer_handler())
        .max_call_depth(Some(50))
        .build();
    let result = interpreter.execute(&program(vec![
        func("down", &[], vec![ret(call_fn("down", vec![]))]),
        call_fn("down", vec![]),
    ]));
    let exc = result.raised.expect("recursion limit");
    assert_eq!(exc.kind, Category::MemoryError);
    assert_eq!(exc.message, "maximum recursion depth exceeded (50)");
    assert_eq!(exc.mp_stack.len(), 50);
    assert_eq!(exc.mp_stack[0].function.as_str(), "down");
    assert_eq!(exc.mp_stack[49].function.as_str(), "<module>");
    assert_eq!(interpreter.call_depth(), 0);
}

// Loops

#[test]
fn while_loop_with_break_and_continue() {
    let out = output_of(vec![
        var("i", int(0)),
        while_(
            bool(true),
            vec![
                assign("i", bin(BinaryOp::Add, ident("i"), int(1))),
                if_(bin(BinaryOp::Eq, ident("i"), int(2)), vec![cont()], None),
                if_(bin(BinaryOp::Gt, ident("i"), int(4)), vec![brk()], None),
                print(ident("i")),
            ],
        ),
    ]);
    assert_eq!(out, "1\n3\n4\n");
}

#[test]
fn for_loop_closures_capture_their_own_iteration() {
    let out = output_of(vec![
        var("fns", list(vec![])),
        for_(
            Some(var("i", int(0))),
            Some(bin(BinaryOp::Lt, ident("i"), int(3))),
            Some(assign("i", bin(BinaryOp::Add, ident("i"), int(1)))),
            vec![call_fn("push", vec![ident("fns"), lambda(&[], vec![ret(ident("i"))])])],
        ),
        for_in("f", ident("fns"), vec![print(call_fn("f", vec![]))]),
    ]);
    assert_eq!(out, "0\n1\n2\n");
}

#[test]
fn for_loop_body_writes_reach_the_condition() {
    let out = output_of(vec![
        for_(
            Some(var("i", int(0))),
            Some(bin(BinaryOp::Lt, ident("i"), int(10))),
            Some(assign("i", bin(BinaryOp::Add, ident("i"), int(1)))),
            vec![
                print(ident("i")),
                assign("i", bin(BinaryOp::Mul, ident("i"), int(3))),
            ],
        ),
    ]);
    assert_eq!(out, "0\n1\n4\n");
}

#[test]
fn for_loop_variables_keep_their_declaration() {
    let typed_loop = |body: Vec<Node>| {
        for_(
            Some(var_typed("i", TypeRef::named("int"), Some(int(0)))),
            Some(bin(BinaryOp::Lt, ident("i"), int(3))),
            Some(assign("i", bin(BinaryOp::Add, ident("i"), int(1)))),
            body,
        )
    };
    let (result, out) = run(vec![typed_loop(vec![
        print(ident("i")),
        if_(
            bin(BinaryOp::Eq, ident("i"), int(1)),
            vec![assign("i", str("one"))],
            None,
        ),
    ])]);
    assert_eq!(out, "0\n1\n");
    let exc = result.raised.expect("second iteration violates the type");
    assert_eq!(exc.message, "type mismatch: 'i' is declared as int but got str");

    let exc = raised_by(vec![for_(
        Some(constant("limit", int(1))),
        None,
        None,
        vec![assign("limit", int(2))],
    )]);
    assert_eq!(exc.message, "cannot assign to constant 'limit'");
}

#[test]
fn for_each_over_values_and_keys() {
    let out = output_of(vec![
        var("r", record(vec![("a", int(1)), ("b", int(2))])),
        for_in("v", ident("r"), vec![print(ident("v"))]),
        for_of("k", ident("r"), vec![print(ident("k"))]),
        for_of("i", list(vec![str("x"), str("y")]), vec![print(ident("i"))]),
    ]);
    assert_eq!(out, "1\n2\na\nb\n0\n1\n");
}

#[test]
fn iterating_a_number_raises() {
    let exc = raised_by(vec![for_in("x", int(3), vec![])]);
    assert_eq!(exc.message, "'int' value is not iterable");
}

#[test]
fn break_at_top_level_is_a_runtime_error() {
    let exc = raised_by(vec![brk()]);
    assert_eq!(exc.kind, Category::RuntimeError);
    assert_eq!(exc.message, "'break' outside of a loop");
}

// Classes

fn point_class() -> Node {
    class(
        "Point",
        None,
        vec![
            method(
                "constructor",
                &["x", "y"],
                vec![
                    assign_to(prop(this(), "x"), ident("x")),
                    assign_to(prop(this(), "y"), ident("y")),
                ],
            ),
            method(
                "sum",
                &[],
                vec![ret(bin(BinaryOp::Add, prop(this(), "x"), prop(this(), "y")))],
            ),
        ],
    )
}

#[test]
fn classes_construct_instances_with_methods() {
    let out = output_of(vec![
        point_class(),
        var("p", new("Point", vec![int(1), int(2)])),
        print(call_method(ident("p"), "sum", vec![])),
        assign_to(prop(ident("p"), "x"), int(10)),
        print(call_method(ident("p"), "sum", vec![])),
        print(call_fn("type_of", vec![ident("p")])),
    ]);
    assert_eq!(out, "3\n12\nPoint\n");
}

#[test]
fn bound_methods_keep_their_receiver() {
    let out = output_of(vec![
        point_class(),
        var("sum", prop(new("Point", vec![int(2), int(3)]), "sum")),
        print(call_fn("sum", vec![])),
    ]);
    assert_eq!(out, "5\n");
}

#[test]
fn fields_initialize_base_first() {
    let out = output_of(vec![
        class("Base", None, vec![field("a", Some(int(1)))]),
        class(
            "Derived",
            Some("Base"),
            vec![field("b", Some(int(2))), field("c", None)],
        ),
        var("d", new("Derived", vec![])),
        print(bin(BinaryOp::Add, prop(ident("d"), "a"), prop(ident("d"), "b"))),
        print(prop(ident("d"), "c")),
    ]);
    assert_eq!(out, "3\nnull\n");
}

#[test]
fn super_calls_dispatch_from_the_declaring_class() {
    let out = output_of(vec![
        class(
            "Animal",
            None,
            vec![
                method("constructor", &["name"], vec![assign_to(prop(this(), "name"), ident("name"))]),
                method(
                    "speak",
                    &[],
                    vec![ret(bin(BinaryOp::Add, prop(this(), "name"), str(" makes a sound")))],
                ),
            ],
        ),
        class(
            "Dog",
            Some("Animal"),
            vec![
                method("constructor", &["name"], vec![super_call(vec![ident("name")])]),
                method(
                    "speak",
                    &[],
                    vec![ret(bin(BinaryOp::Add, super_method("speak", vec![]), str(" (woof)")))],
                ),
            ],
        ),
        class("Puppy", Some("Dog"), vec![]),
        print(call_method(new("Puppy", vec![str("Rex")]), "speak", vec![])),
    ]);
    assert_eq!(out, "Rex makes a sound (woof)\n");
}

#[test]
fn static_methods_are_called_on_the_class() {
    let out = output_of(vec![
        class(
            "MathUtil",
            None,
            vec![static_method("twice", &["x"], vec![ret(bin(BinaryOp::Mul, ident("x"), int(2)))])],
        ),
        print(call_method(ident("MathUtil"), "twice", vec![int(4)])),
    ]);
    assert_eq!(out, "8\n");
}

#[test]
fn missing_instance_property_raises() {
    let exc = raised_by(vec![
        point_class(),
        print(prop(new("Point", vec![int(1), int(2)]), "z")),
    ]);
    assert_eq!(exc.kind, Category::ReferenceError);
    assert_eq!(exc.message, "'Point' has no property 'z'");
}

#[test]
fn this_and_super_outside_methods_raise() {
    let exc = raised_by(vec![print(this())]);
    assert_eq!(exc.kind, Category::ReferenceError);
    let exc = raised_by(vec![super_call(vec![])]);
    assert_eq!(exc.message, "'super' is not defined outside a method");
}

// Exceptions

#[test]
fn typed_catch_of_engine_error() {
    use corp_ir::build::{catch, try_};
    let out = output_of(vec![try_(
        vec![var("x", bin(BinaryOp::Div, int(1), int(0)))],
        vec![
            catch("e", &["TypeError"], vec![print(str("wrong clause"))]),
            catch("e", &["RuntimeError"], vec![print(prop(ident("e"), "message"))]),
        ],
        None,
    )]);
    assert_eq!(out, "division by zero\n");
}

#[test]
fn user_classes_are_caught_through_their_hierarchy() {
    use corp_ir::build::{catch, throw, try_};
    let out = output_of(vec![
        class("AppError", Some("Error"), vec![]),
        class("DbError", Some("AppError"), vec![]),
        try_(
            vec![throw(new("DbError", vec![str("connection lost")]))],
            vec![catch(
                "e",
                &["AppError"],
                vec![
                    print(prop(ident("e"), "message")),
                    print(prop(ident("e"), "type")),
                ],
            )],
            None,
        ),
    ]);
    assert_eq!(out, "connection lost\nDbError\n");
}

#[test]
fn record_payload_type_is_matched_directly() {
    use corp_ir::build::{catch, throw, try_};
    let out = output_of(vec![try_(
        vec![throw(record(vec![
            ("type", str("ValidationError")),
            ("message", str("bad input")),
        ]))],
        vec![catch("e", &["ValidationError"], vec![print(prop(ident("e"), "message"))])],
        None,
    )]);
    assert_eq!(out, "bad input\n");
}

#[test]
fn unmatched_exceptions_propagate_with_their_stack() {
    use corp_ir::build::{catch, throw, try_};
    let exc = raised_by(vec![
        func("fail", &[], vec![throw(str("boom"))]),
        try_(
            vec![call_fn("fail", vec![])],
            vec![catch("e", &["TypeError"], vec![])],
            None,
        ),
    ]);
    assert_eq!(exc.kind, Category::UserRaised);
    assert_eq!(exc.message, "boom");
    let functions: Vec<&str> = exc.mp_stack.iter().map(|f| f.function.as_str()).collect();
    assert_eq!(functions, vec!["fail", "<module>"]);
}

#[test]
fn finally_runs_on_every_path() {
    use corp_ir::build::{catch, throw, try_};
    let out = output_of(vec![
        try_(vec![print(str("body"))], vec![], Some(vec![print(str("finally 1"))])),
        try_(
            vec![throw(str("x"))],
            vec![catch("e", &[], vec![print(str("caught"))])],
            Some(vec![print(str("finally 2"))]),
        ),
        func(
            "early",
            &[],
            vec![try_(vec![ret(int(1))], vec![], Some(vec![print(str("finally 3"))]))],
        ),
        print(call_fn("early", vec![])),
    ]);
    assert_eq!(out, "body\nfinally 1\ncaught\nfinally 2\nfinally 3\n1\n");
}

#[test]
fn return_in_finally_overrides_pending_outcome() {
    use corp_ir::build::{throw, try_};
    let out = output_of(vec![
        func(
            "f",
            &[],
            vec![try_(vec![ret(int(1))], vec![], Some(vec![ret(int(2))]))],
        ),
        func(
            "g",
            &[],
            vec![try_(vec![throw(str("lost"))], vec![], Some(vec![ret(int(3))]))],
        ),
        print(call_fn("f", vec![])),
        print(call_fn("g", vec![])),
    ]);
    assert_eq!(out, "2\n3\n");
}

#[test]
fn rethrow_keeps_the_original_exception() {
    use corp_ir::build::{catch, throw, try_};
    let exc = raised_by(vec![
        func("origin", &[], vec![throw(str("first"))]),
        try_(
            vec![call_fn("origin", vec![])],
            vec![catch("e", &[], vec![throw(ident("e"))])],
            None,
        ),
    ]);
    assert_eq!(exc.message, "first");
    assert_eq!(exc.mp_stack[0].function.as_str(), "origin");
}

fn resource_class() -> Node {
    class(
        "Resource",
        None,
        vec![
            method("constructor", &["name"], vec![assign_to(prop(this(), "name"), ident("name"))]),
            method(
                "__enter__",
                &[],
                vec![
                    print(bin(BinaryOp::Add, str("enter "), prop(this(), "name"))),
                    ret(prop(this(), "name")),
                ],
            ),
            method(
                "__exit__",
                &["err"],
                vec![
                    print(bin(BinaryOp::Add, str("exit "), prop(this(), "name"))),
                    ret(bool(false)),
                ],
            ),
        ],
    )
}

#[test]
fn with_exits_managers_in_reverse_on_every_path() {
    use corp_ir::build::{catch, throw, try_, with_, with_item};
    let out = output_of(vec![
        resource_class(),
        with_(
            vec![
                with_item(new("Resource", vec![str("a")]), Some("x")),
                with_item(new("Resource", vec![str("b")]), Some("y")),
            ],
            vec![print(bin(BinaryOp::Add, ident("x"), ident("y")))],
        ),
        func(
            "early",
            &[],
            vec![with_(
                vec![with_item(new("Resource", vec![str("c")]), None)],
                vec![ret(int(1))],
            )],
        ),
        print(call_fn("early", vec![])),
        try_(
            vec![with_(
                vec![with_item(new("Resource", vec![str("d")]), None)],
                vec![throw(str("boom"))],
            )],
            vec![catch("e", &[], vec![print(prop(ident("e"), "message"))])],
            None,
        ),
    ]);
    assert_eq!(
        out,
        "enter a\nenter b\nab\nexit b\nexit a\nenter c\nexit c\n1\nenter d\nexit d\nboom\n"
    );
}

#[test]
fn truthy_exit_hook_swallows_the_exception_it_receives() {
    use corp_ir::build::{throw, with_, with_item};
    let out = output_of(vec![
        var(
            "m",
            record(vec![(
                "exit",
                lambda(
                    &["err"],
                    vec![print(prop(ident("err"), "message")), ret(bool(true))],
                ),
            )]),
        ),
        with_(
            vec![with_item(ident("m"), Some("h"))],
            vec![print(bin(BinaryOp::Eq, ident("h"), ident("m"))), throw(str("hidden"))],
        ),
        with_(vec![with_item(int(5), Some("n"))], vec![print(ident("n"))]),
        print(str("after")),
    ]);
    assert_eq!(out, "true\nhidden\n5\nafter\n");
}

#[test]
fn failing_enter_skips_the_body_and_exits_earlier_managers() {
    use corp_ir::build::{throw, with_, with_item};
    let (result, out) = run(vec![
        resource_class(),
        with_(
            vec![
                with_item(new("Resource", vec![str("a")]), None),
                with_item(
                    record(vec![("enter", lambda(&[], vec![throw(str("refused"))]))]),
                    None,
                ),
            ],
            vec![print(str("body"))],
        ),
    ]);
    assert_eq!(out, "enter a\nexit a\n");
    assert_eq!(result.raised.expect("enter raises").message, "refused");
}

#[test]
fn delete_removes_bindings_fields_and_elements() {
    use corp_ir::build::{catch, delete, try_};
    let out = output_of(vec![
        var("x", int(1)),
        delete(ident("x")),
        try_(
            vec![print(ident("x"))],
            vec![catch("e", &["ReferenceError"], vec![print(str("x is gone"))])],
            None,
        ),
        var("r", record(vec![("a", int(1)), ("b", int(2)), ("c", int(3))])),
        delete(prop(ident("r"), "a")),
        delete(index(ident("r"), str("c"))),
        print(ident("r")),
        var("xs", list(vec![int(1), int(2), int(3)])),
        delete(index(ident("xs"), int(-1))),
        delete(index(ident("xs"), int(0))),
        print(ident("xs")),
        point_class(),
        var("p", new("Point", vec![int(1), int(2)])),
        delete(prop(ident("p"), "y")),
        try_(
            vec![delete(prop(ident("p"), "y"))],
            vec![catch("e", &[], vec![print(str("y is gone"))])],
            None,
        ),
    ]);
    assert_eq!(out, "x is gone\n{b: 2}\n[2]\ny is gone\n");
}

#[test]
fn delete_refuses_constants_and_missing_elements() {
    use corp_ir::build::delete;
    let exc = raised_by(vec![constant("k", int(1)), delete(ident("k"))]);
    assert_eq!(exc.kind, Category::TypeError);
    assert_eq!(exc.message, "cannot delete constant 'k'");

    let exc = raised_by(vec![
        var("xs", list(vec![int(1)])),
        delete(index(ident("xs"), int(5))),
    ]);
    assert_eq!(exc.message, "index 5 out of range for length 1");
}

#[test]
fn out_of_range_store_into_a_local_list_raises() {
    let exc = raised_by(vec![
        var("xs", list(vec![int(1)])),
        assign_to(index(ident("xs"), int(5)), int(2)),
    ]);
    assert_eq!(exc.kind, Category::RuntimeError);
    assert_eq!(exc.message, "index 5 out of range for length 1");
}

#[test]
fn message_heuristic_matches_user_raised_strings() {
    use corp_ir::build::{catch, throw, try_};
    let out = output_of(vec![try_(
        vec![throw(str("config file not found"))],
        vec![catch("e", &["IOError"], vec![print(prop(ident("e"), "kind"))])],
        None,
    )]);
    assert_eq!(out, "UserRaised\n");
}

// Hoisting

#[test]
fn branch_declarations_are_hoisted_inside_functions() {
    let out = output_of(vec![
        func(
            "pick",
            &["c"],
            vec![
                if_(
                    ident("c"),
                    vec![var("r", int(1))],
                    Some(vec![var("r", int(2))]),
                ),
                ret(ident("r")),
            ],
        ),
        print(call_fn("pick", vec![bool(true)])),
        print(call_fn("pick", vec![bool(false)])),
    ]);
    assert_eq!(out, "1\n2\n");
}

#[test]
fn else_if_chains_are_hoisted() {
    let is = |n: i64| bin(BinaryOp::Eq, ident("c"), int(n));
    let (result, out) = run(vec![
        func(
            "grade",
            &["c"],
            vec![
                if_(
                    is(1),
                    vec![var("r", int(10))],
                    Some(vec![if_(
                        is(2),
                        vec![var("r", int(20))],
                        Some(vec![var("r", int(30))]),
                    )]),
                ),
                ret(ident("r")),
            ],
        ),
        print(call_fn("grade", vec![int(1)])),
        print(call_fn("grade", vec![int(2)])),
        print(call_fn("grade", vec![int(3)])),
    ]);
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert!(result.raised.is_none(), "{:?}", result.raised);
    assert_eq!(out, "10\n20\n30\n");
}

#[test]
fn rejected_programs_do_not_run() {
    let (result, out) = run(vec![
        print(str("before")),
        func(
            "f",
            &["c"],
            vec![
                if_(ident("c"), vec![var("r", int(1))], None),
                ret(ident("r")),
            ],
        ),
    ]);
    assert_eq!(out, "");
    let exc = result.raised.expect("analysis failure");
    assert_eq!(exc.kind, Category::ReferenceError);
    assert_eq!(
        result.diagnostics.iter().map(|d| d.code).collect::<Vec<_>>(),
        vec![ErrorCode::E1001]
    );
    assert_eq!(exc.cause.as_deref(), Some("rejected before execution (E1001)"));
}

// Interpreter state

#[test]
fn globals_persist_across_runs_and_root_is_stable() {
    let output = buffer_handler();
    let mut interpreter = InterpreterBuilder::new()
        .print_handler(output.clone())
        .build();
    let root = interpreter.root_env().clone();

    let first = interpreter.execute(&program(vec![
        var("x", int(41)),
        var("y", bin(BinaryOp::Div, int(1), int(0))),
    ]));
    assert!(first.raised.is_some());
    assert_eq!(interpreter.call_depth(), 0);

    let second = interpreter.execute(&program(vec![print(bin(BinaryOp::Add, ident("x"), int(1)))]));
    assert!(second.is_success());
    assert_eq!(output.get_output(), "42\n");
    assert!(interpreter.root_env().same_scope(&root));
    assert!(interpreter
        .globals()
        .parent()
        .is_some_and(|parent| parent.same_scope(&root)));
}

#[test]
fn execution_result_carries_last_value() {
    let (result, _) = run(vec![var("x", int(2)), bin(BinaryOp::Mul, ident("x"), int(21))]);
    assert_eq!(result.value, Value::Int(42));
}

#[test]
fn test_run_mode_captures_output() {
    let mut interpreter = InterpreterBuilder::new().mode(EvalMode::TestRun).build();
    assert_eq!(interpreter.mode(), EvalMode::TestRun);
    interpreter.execute(&program(vec![print(str("captured"))]));
    let PrintHandlerImpl::Buffer(buffer) = &**interpreter.print_handler() else {
        panic!("test mode prints into a buffer");
    };
    assert_eq!(buffer.get_output(), "captured\n");
}

#[test]
fn host_can_call_back_into_the_program() {
    let mut interpreter = InterpreterBuilder::new()
        .print_handler(buffer_handler())
        .build();
    interpreter.execute(&program(vec![func(
        "add",
        &["a", "b"],
        vec![ret(bin(BinaryOp::Add, ident("a"), ident("b")))],
    )]));
    let add = interpreter.globals().lookup("add").expect("add is defined");
    let sum = interpreter
        .call(&add, vec![Value::Int(2), Value::Int(3)])
        .expect("call succeeds");
    assert_eq!(sum, Value::Int(5));
}
