use corp_diagnostic::SourceMap;
use corp_eval::InterpreterBuilder;
use corp_ir::build::{
    at, binary, call_fn, class, func, ident, if_, int, new, program, ret, str, throw, var,
};
use corp_ir::BinaryOp;
use pretty_assertions::assert_eq;

use crate::common::build;

const APP: &str = "/ws/src/app.corp";

const APP_SOURCE: &str = "function compute(x) {
  var y = x / 0
  return y
}
compute(3)
";

fn workspace() -> InterpreterBuilder {
    InterpreterBuilder::new()
        .workspace_root("/ws")
        .sources(SourceMap::new().with_file(APP, APP_SOURCE))
}

#[test]
fn report_lists_frames_code_and_variables() {
    let (mut interpreter, _) = build(workspace());
    let result = interpreter.execute(&program(vec![
        at(
            APP,
            1,
            func(
                "compute",
                &["x"],
                vec![
                    at(APP, 2, var("y", binary(BinaryOp::Div, ident("x"), int(0)))),
                    at(APP, 3, ret(ident("y"))),
                ],
            ),
        ),
        at(APP, 5, call_fn("compute", vec![int(3)])),
    ]));
    let exc = result.raised.expect("division by zero");
    let report = interpreter.format_exception(&exc);

    let expected_head = "\
Error<RuntimeError>
Message: division by zero
Location: src/app.corp:2 in compute

StackTrace (.mp):
  at src/app.corp:2  in compute  <-- origin
    codeblock: var y = x / 0
    variables: {x=3 (int)}
  at src/app.corp:5  in <module>
    codeblock: compute(3)

Root Cause:
  RuntimeError: division by zero
  raised at src/app.corp:2
";
    assert!(
        report.starts_with(expected_head),
        "unexpected report:\n{report}"
    );
    assert!(report.contains("\nSuggestions:\n  - "));
}

#[test]
fn variable_lists_are_capped() {
    let (mut interpreter, _) = build(workspace());
    let result = interpreter.execute(&program(vec![
        func(
            "many",
            &["a", "b", "c", "d", "e"],
            vec![throw(str("too many"))],
        ),
        call_fn("many", vec![int(1), int(2), int(3), int(4), int(5)]),
    ]));
    let exc = result.raised.expect("thrown");
    let report = interpreter.format_exception(&exc);
    assert!(
        report.contains("    variables: {a=1 (int), b=2 (int), c=3 (int); +2 more}\n"),
        "unexpected report:\n{report}"
    );
}

#[test]
fn user_classes_name_the_report() {
    let (mut interpreter, _) = build(workspace());
    let result = interpreter.execute(&program(vec![
        class("AppError", Some("Error"), vec![]),
        throw(new("AppError", vec![str("bad input")])),
    ]));
    let exc = result.raised.expect("thrown");
    let report = interpreter.format_exception(&exc);
    assert!(report.starts_with("Error<AppError>\nMessage: bad input\n"));
    assert!(report.contains("\nRoot Cause:\n  UserRaised: bad input\n"));
}

#[test]
fn rejected_programs_report_the_diagnostic_code() {
    let (mut interpreter, _) = build(workspace());
    let result = interpreter.execute(&program(vec![func(
        "pick",
        &["c"],
        vec![
            if_(ident("c"), vec![var("r", int(1))], None),
            ret(ident("r")),
        ],
    )]));
    let exc = result.raised.expect("rejected");
    let report = interpreter.format_exception(&exc);
    assert!(report.starts_with("Error<ReferenceError>\n"));
    assert!(report.contains("  rejected before execution (E1001)\n"));
}

#[test]
fn recursion_limit_report() {
    let (mut interpreter, _) = build(workspace().max_call_depth(Some(20)));
    let result = interpreter.execute(&program(vec![
        func("down", &["n"], vec![ret(call_fn("down", vec![ident("n")]))]),
        call_fn("down", vec![int(0)]),
    ]));
    let exc = result.raised.expect("depth limit");
    assert_eq!(exc.mp_stack.len(), 20);
    let report = interpreter.format_exception(&exc);
    assert!(report.starts_with(
        "Error<MemoryError>\nMessage: maximum recursion depth exceeded (20)\n"
    ));
    assert_eq!(report.matches("  in down").count(), 19);
}
