use corp_eval::{Category, InterpreterBuilder};
use corp_ir::build::{
    assign, async_func, await_, call_fn, catch, ident, int, null, prop, ret, str, throw, try_,
    var,
};
use corp_ir::BinaryOp;
use pretty_assertions::assert_eq;

use crate::common::{output_of, print, run};

fn compute() -> corp_ir::Node {
    async_func("compute", &[], vec![print(str("running")), ret(int(42))])
}

#[test]
fn awaited_task_runs_at_the_await() {
    let out = output_of(
        InterpreterBuilder::new(),
        vec![
            compute(),
            var("t", call_fn("compute", vec![])),
            print(str("scheduled")),
            print(await_(ident("t"))),
        ],
    );
    assert_eq!(out, "scheduled\nrunning\n42\n");
}

#[test]
fn a_task_body_runs_once() {
    let out = output_of(
        InterpreterBuilder::new(),
        vec![
            compute(),
            var("t", call_fn("compute", vec![])),
            print(await_(ident("t"))),
            print(await_(ident("t"))),
        ],
    );
    assert_eq!(out, "running\n42\n42\n");
}

#[test]
fn unawaited_tasks_run_after_the_program() {
    let (result, out) = run(vec![
        async_func("first", &[], vec![print(str("first"))]),
        async_func("second", &[], vec![print(str("second"))]),
        call_fn("first", vec![]),
        call_fn("second", vec![]),
        print(str("main")),
    ]);
    assert!(result.is_success());
    assert_eq!(out, "main\nfirst\nsecond\n");
}

#[test]
fn task_arguments_are_bound_at_the_call() {
    let out = output_of(
        InterpreterBuilder::new(),
        vec![
            async_func(
                "add",
                &["a", "b"],
                vec![ret(corp_ir::build::binary(BinaryOp::Add, ident("a"), ident("b")))],
            ),
            var("x", int(1)),
            var("t", call_fn("add", vec![ident("x"), int(2)])),
            assign("x", int(100)),
            print(await_(ident("t"))),
        ],
    );
    assert_eq!(out, "3\n");
}

#[test]
fn failures_reach_every_awaiter() {
    let out = output_of(
        InterpreterBuilder::new(),
        vec![
            async_func("fails", &[], vec![throw(str("nope"))]),
            var("t", call_fn("fails", vec![])),
            try_(
                vec![await_(ident("t"))],
                vec![catch("e", &[], vec![print(prop(ident("e"), "message"))])],
                None,
            ),
            try_(
                vec![await_(ident("t"))],
                vec![catch("e", &[], vec![print(prop(ident("e"), "message"))])],
                None,
            ),
        ],
    );
    assert_eq!(out, "nope\nnope\n");
}

#[test]
fn failing_unawaited_task_does_not_fail_the_run() {
    let (result, out) = run(vec![
        async_func("fails", &[], vec![throw(str("ignored"))]),
        call_fn("fails", vec![]),
        print(str("done")),
    ]);
    assert!(result.raised.is_none());
    assert_eq!(out, "done\n");
}

#[test]
fn task_handle_properties() {
    let out = output_of(
        InterpreterBuilder::new(),
        vec![
            compute(),
            var("t", call_fn("compute", vec![])),
            print(prop(ident("t"), "done")),
            print(prop(ident("t"), "name")),
            await_(ident("t")),
            print(prop(ident("t"), "done")),
        ],
    );
    assert_eq!(out, "false\ncompute\nrunning\ntrue\n");
}

#[test]
fn awaiting_a_plain_value_yields_it() {
    let out = output_of(InterpreterBuilder::new(), vec![print(await_(int(5)))]);
    assert_eq!(out, "5\n");
}

#[test]
fn a_task_awaiting_itself_is_a_deadlock() {
    let (result, _) = run(vec![
        var("t", null()),
        async_func("selfwait", &[], vec![ret(await_(ident("t")))]),
        assign("t", call_fn("selfwait", vec![])),
        await_(ident("t")),
    ]);
    let exc = result.raised.expect("deadlock is raised");
    assert_eq!(exc.kind, Category::ConcurrencyError);
    assert_eq!(
        exc.message,
        "deadlock: task 'selfwait' awaited while it is still running"
    );
}
