use corp_eval::{Category, HostFault, InterpreterBuilder, MapResolver, Value};
use corp_ir::build::{
    binary, call_fn, call_method, catch, from_import, func, ident, if_, import, int, program,
    prop, ret, str, throw, try_, var,
};
use corp_ir::{BinaryOp, Name, Node};
use pretty_assertions::assert_eq;

use crate::common::{output_of, print, run_with};

fn util_module() -> Node {
    program(vec![
        print(str("loading util")),
        func(
            "double",
            &["x"],
            vec![ret(binary(BinaryOp::Mul, ident("x"), int(2)))],
        ),
        var("answer", int(42)),
    ])
}

fn with_modules(resolver: MapResolver) -> InterpreterBuilder {
    InterpreterBuilder::new().module_resolver(resolver)
}

#[test]
fn a_module_body_runs_once() {
    let out = output_of(
        with_modules(MapResolver::new().with_program("util", util_module())),
        vec![
            import("util", None),
            import("util", Some("u")),
            print(call_method(ident("util"), "double", vec![int(4)])),
            print(prop(ident("u"), "answer")),
        ],
    );
    assert_eq!(out, "loading util\n8\n42\n");
}

#[test]
fn from_import_binds_selected_names() {
    let out = output_of(
        with_modules(MapResolver::new().with_program("util", util_module())),
        vec![
            from_import("util", &[("double", None), ("answer", Some("a"))]),
            print(call_fn("double", vec![ident("a")])),
        ],
    );
    assert_eq!(out, "loading util\n84\n");
}

#[test]
fn dotted_import_binds_the_last_segment() {
    let tools = program(vec![var("version", str("1.2"))]);
    let out = output_of(
        with_modules(MapResolver::new().with_program("pkg.tools", tools)),
        vec![import("pkg.tools", None), print(prop(ident("tools"), "version"))],
    );
    assert_eq!(out, "1.2\n");
}

#[test]
fn module_globals_stay_in_the_module() {
    let (result, _) = run_with(
        with_modules(MapResolver::new().with_program("util", util_module())),
        vec![import("util", None), print(ident("answer"))],
    );
    let exc = result.raised.expect("answer is not a global");
    assert_eq!(exc.message, "undefined variable 'answer'");
}

#[test]
fn missing_export_is_a_reference_error() {
    let (result, _) = run_with(
        with_modules(MapResolver::new().with_program("util", util_module())),
        vec![from_import("util", &[("nope", None)])],
    );
    let exc = result.raised.expect("missing export");
    assert_eq!(exc.kind, Category::ReferenceError);
    assert_eq!(exc.message, "module 'util' has no export 'nope'");
}

#[test]
fn circular_imports_are_detected() {
    let resolver = MapResolver::new()
        .with_program("a", program(vec![import("b", None)]))
        .with_program("b", program(vec![import("a", None)]));
    let (result, _) = run_with(with_modules(resolver), vec![import("a", None)]);
    let exc = result.raised.expect("cycle");
    assert_eq!(exc.kind, Category::ReferenceError);
    assert_eq!(exc.message, "circular import of module 'a'");
    let functions: Vec<&str> = exc.mp_stack.iter().map(|f| f.function.as_str()).collect();
    assert_eq!(functions, vec!["<module b>", "<module a>", "<module>"]);
}

#[test]
fn unknown_modules_raise_io_errors() {
    let out = output_of(
        with_modules(MapResolver::new()),
        vec![try_(
            vec![import("nope", None)],
            vec![catch("e", &["IOError"], vec![print(prop(ident("e"), "message"))])],
            None,
        )],
    );
    assert_eq!(out, "module not found: nope\n");
}

#[test]
fn importing_without_a_resolver_fails() {
    let (result, _) = run_with(InterpreterBuilder::new(), vec![import("util", None)]);
    let exc = result.raised.expect("no resolver");
    assert_eq!(exc.kind, Category::IoError);
    assert_eq!(exc.message, "cannot import 'util': no module resolver configured");
}

#[test]
fn native_modules_export_their_bindings() {
    let square = Value::native("square", |_, args| match args {
        [Value::Int(n)] => Ok(Value::Int(n * n)),
        _ => Err(HostFault::TypeContract("square() expects an int".to_string())),
    });
    let resolver = MapResolver::new().with_bindings(
        "mathx",
        vec![(Name::new("pi"), Value::Float(3.5)), (Name::new("square"), square)],
    );
    let out = output_of(
        with_modules(resolver),
        vec![
            import("mathx", Some("m")),
            print(prop(ident("m"), "pi")),
            print(call_method(ident("m"), "square", vec![int(7)])),
        ],
    );
    assert_eq!(out, "3.5\n49\n");
}

#[test]
fn a_failed_module_is_retried() {
    let bad = program(vec![print(str("loading bad")), throw(str("broken"))]);
    let attempt = || {
        try_(
            vec![import("bad", None)],
            vec![catch("e", &[], vec![print(prop(ident("e"), "message"))])],
            None,
        )
    };
    let out = output_of(
        with_modules(MapResolver::new().with_program("bad", bad)),
        vec![attempt(), attempt()],
    );
    assert_eq!(out, "loading bad\nbroken\nloading bad\nbroken\n");
}

#[test]
fn modules_are_analyzed_before_they_run() {
    let rejected = program(vec![
        print(str("never printed")),
        func(
            "pick",
            &["c"],
            vec![
                if_(ident("c"), vec![var("r", int(1))], None),
                ret(ident("r")),
            ],
        ),
    ]);
    let (result, out) = run_with(
        with_modules(MapResolver::new().with_program("rejected", rejected)),
        vec![import("rejected", None)],
    );
    assert_eq!(out, "");
    let exc = result.raised.expect("analysis failure");
    assert_eq!(exc.kind, Category::ReferenceError);
    assert_eq!(exc.message, "Variable not declared in all branches: `r`");
}
