//! Shared helpers for engine tests.

use std::sync::Once;

use corp_eval::{buffer_handler, ExecutionResult, Interpreter, InterpreterBuilder, SharedPrintHandler};
use corp_ir::build::{call_fn, program};
use corp_ir::Node;

static TRACING_INIT: Once = Once::new();

/// Install a subscriber once, and only when `CORP_LOG` holds a filter
/// such as `corp_eval=debug`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if let Ok(filter) = EnvFilter::try_from_env("CORP_LOG") {
            tracing_subscriber::registry()
                .with(fmt::layer().with_test_writer().with_target(true))
                .with(filter)
                .init();
        }
    });
}

/// Build from `builder` with output captured into the returned buffer.
pub fn build(builder: InterpreterBuilder) -> (Interpreter, SharedPrintHandler) {
    init_tracing();
    let output = buffer_handler();
    let interpreter = builder.print_handler(output.clone()).build();
    (interpreter, output)
}

/// Run `statements` as a program on a default interpreter.
pub fn run(statements: Vec<Node>) -> (ExecutionResult, String) {
    run_with(InterpreterBuilder::new(), statements)
}

pub fn run_with(builder: InterpreterBuilder, statements: Vec<Node>) -> (ExecutionResult, String) {
    let (mut interpreter, output) = build(builder);
    let result = interpreter.execute(&program(statements));
    (result, output.get_output())
}

/// Output of a program that must not raise.
pub fn output_of(builder: InterpreterBuilder, statements: Vec<Node>) -> String {
    let (result, output) = run_with(builder, statements);
    if let Some(exc) = &result.raised {
        panic!("unexpected exception: {exc}");
    }
    output
}

pub fn print(value: Node) -> Node {
    call_fn("print", vec![value])
}
