use std::io;

use corp_eval::{Category, HostFault, InterpreterBuilder, IoFaultKind, Value};
use corp_ir::build::{
    call_fn, call_with, catch, ident, lambda, named, prop, record, str, throw, try_,
};
use pretty_assertions::assert_eq;

use crate::common::{build, output_of, print, run_with};

fn describe(error: corp_ir::Node, types: &[&str]) -> corp_ir::Node {
    try_(
        vec![error],
        vec![catch(
            "e",
            types,
            vec![
                print(prop(ident("e"), "type")),
                print(prop(ident("e"), "kind")),
                print(prop(ident("e"), "message")),
            ],
        )],
        None,
    )
}

#[test]
fn io_faults_keep_their_concrete_type() {
    let builder = InterpreterBuilder::new().native("open_config", |_, _| {
        Err(HostFault::Io {
            kind: IoFaultKind::NotFound,
            message: "config.yml: no such file".to_string(),
        })
    });
    let out = output_of(
        builder,
        vec![
            describe(call_fn("open_config", vec![]), &["IOError"]),
            describe(call_fn("open_config", vec![]), &["FileNotFoundError"]),
        ],
    );
    assert_eq!(
        out,
        "FileNotFoundError\nIOError\nconfig.yml: no such file\n".repeat(2)
    );
}

#[test]
fn std_io_errors_convert() {
    let builder = InterpreterBuilder::new().native("write_log", |_, _| {
        Err(io::Error::new(io::ErrorKind::PermissionDenied, "log is read-only").into())
    });
    let out = output_of(
        builder,
        vec![describe(call_fn("write_log", vec![]), &["PermissionError"])],
    );
    assert_eq!(out, "PermissionError\nIOError\nlog is read-only\n");
}

#[test]
fn timeouts_are_concurrency_errors() {
    let builder = InterpreterBuilder::new()
        .native("fetch", |_, _| Err(HostFault::Timeout("fetch after 30s".to_string())));
    let out = output_of(
        builder,
        vec![describe(call_fn("fetch", vec![]), &["ConcurrencyError"])],
    );
    assert_eq!(out, "TimeoutError\nTimeoutError\noperation timed out: fetch after 30s\n");
}

#[test]
fn native_panics_become_runtime_errors() {
    let (mut interpreter, output) = build(
        InterpreterBuilder::new().native("explode", |_, _| panic!("boom")),
    );
    let result = interpreter.execute(&corp_ir::build::program(vec![
        print(str("before")),
        call_fn("explode", vec![]),
        print(str("after")),
    ]));
    let exc = result.raised.expect("panic is raised");
    assert_eq!(exc.kind, Category::RuntimeError);
    assert_eq!(exc.message, "native function panicked: boom");
    assert_eq!(output.get_output(), "before\n");

    // The interpreter is still usable.
    assert_eq!(interpreter.call_depth(), 0);
    let again = interpreter.execute(&corp_ir::build::program(vec![print(str("again"))]));
    assert!(again.is_success());
    assert_eq!(output.get_output(), "before\nagain\n");
}

#[test]
fn exceptions_pass_back_out_through_native_callbacks() {
    let builder = InterpreterBuilder::new().native("invoke", |interp, args| match args {
        [callback] => interp.call(callback, vec![]),
        _ => Err(HostFault::TypeContract("invoke() takes a callback".to_string())),
    });
    let failing = lambda(
        &[],
        vec![throw(record(vec![
            ("type", str("ValidationError")),
            ("message", str("bad input")),
        ]))],
    );
    let out = output_of(
        builder,
        vec![describe(call_fn("invoke", vec![failing]), &["ValidationError"])],
    );
    assert_eq!(out, "ValidationError\nUserRaised\nbad input\n");
}

#[test]
fn natives_reject_named_arguments() {
    let (result, _) = run_with(
        InterpreterBuilder::new(),
        vec![call_with(ident("len"), vec![named("value", str("abc"))])],
    );
    let exc = result.raised.expect("named argument");
    assert_eq!(exc.kind, Category::TypeError);
    assert_eq!(exc.message, "len() does not accept named arguments");
}

#[test]
fn failed_assertions() {
    let out = output_of(
        InterpreterBuilder::new(),
        vec![describe(
            call_fn("assert", vec![corp_ir::build::bool(false), str("limit reached")]),
            &["AssertionError"],
        )],
    );
    assert_eq!(out, "AssertionError\nAssertionError\nassertion failed: limit reached\n");
}

#[test]
fn registered_natives_are_constants() {
    let builder = InterpreterBuilder::new().native("version", |_, _| Ok(Value::str("1.0")));
    let (result, _) = run_with(
        builder,
        vec![
            print(call_fn("version", vec![])),
            corp_ir::build::assign("version", str("2.0")),
        ],
    );
    let exc = result.raised.expect("constant");
    assert_eq!(exc.message, "cannot assign to constant 'version'");
}
