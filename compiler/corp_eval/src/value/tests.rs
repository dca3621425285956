use super::*;
use pretty_assertions::assert_eq;

#[test]
fn display_and_repr_differ_only_for_strings() {
    assert_eq!(Value::str("hi").display(), "hi");
    assert_eq!(Value::str("hi").repr(), "\"hi\"");
    assert_eq!(Value::Int(3).display(), Value::Int(3).repr());
    assert_eq!(Value::Null.display(), "null");
}

#[test]
fn floats_keep_a_decimal_point() {
    assert_eq!(Value::Float(2.0).display(), "2.0");
    assert_eq!(Value::Float(2.5).display(), "2.5");
}

#[test]
fn containers_render_elements_with_repr() {
    let list = Value::list(vec![Value::Int(1), Value::str("a"), Value::Null]);
    assert_eq!(list.display(), "[1, \"a\", null]");

    let record = Value::record(vec![("x".into(), Value::Int(1)), ("y".into(), Value::Bool(false))]);
    assert_eq!(record.display(), "{x: 1, y: false}");
}

#[test]
fn truthiness() {
    assert!(!Value::Null.is_truthy());
    assert!(!Value::Int(0).is_truthy());
    assert!(!Value::str("").is_truthy());
    assert!(!Value::list(vec![]).is_truthy());
    assert!(Value::Int(-1).is_truthy());
    assert!(Value::str("0").is_truthy());
}

#[test]
fn equality_is_structural_for_data() {
    assert_eq!(Value::Int(1), Value::Float(1.0));
    assert_eq!(
        Value::list(vec![Value::Int(1)]),
        Value::list(vec![Value::Int(1)])
    );
    assert_ne!(Value::Int(1), Value::str("1"));
    assert_ne!(Value::Null, Value::Bool(false));
}

#[test]
fn lists_are_shared_between_aliases() {
    let list = Value::list(vec![]);
    let alias = list.clone();
    if let Value::List(items) = &alias {
        items.borrow_mut().push(Value::Int(7));
    }
    assert_eq!(list.display(), "[7]");
}

#[test]
fn type_names() {
    assert_eq!(Value::Int(1).type_name(), "int");
    assert_eq!(Value::str("s").type_name(), "str");
    assert_eq!(Value::record(vec![]).type_name(), "record");
    assert_eq!(Value::native("f", |_, _| Ok(Value::Null)).type_name(), "function");
}

fn self_containing_list() -> Value {
    let list = Value::list(vec![Value::Int(1)]);
    if let Value::List(items) = &list {
        items.borrow_mut().push(list.clone());
    }
    list
}

#[test]
fn self_containing_containers_render_an_ellipsis() {
    assert_eq!(self_containing_list().repr(), "[1, [...]]");

    let record = Value::record(vec![("id".into(), Value::Int(7))]);
    if let Value::Record(fields) = &record {
        fields.borrow_mut().push(("me".into(), record.clone()));
    }
    assert_eq!(record.display(), "{id: 7, me: {...}}");
}

#[test]
fn shared_but_acyclic_children_render_in_full() {
    let inner = Value::list(vec![Value::Int(2)]);
    let outer = Value::list(vec![inner.clone(), inner]);
    assert_eq!(outer.repr(), "[[2], [2]]");
}

#[test]
fn cyclic_lists_compare_without_recursing_forever() {
    let a = self_containing_list();
    let b = self_containing_list();
    assert_eq!(a, a.clone());
    assert_eq!(a, b);
    assert_ne!(a, Value::list(vec![Value::Int(1), Value::Int(1)]));
}
