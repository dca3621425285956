use super::*;

#[test]
fn display_shows_file_and_line() {
    let span = Span::new("src/app.mp", 12, 4);
    assert_eq!(span.to_string(), "src/app.mp:12");
    assert_eq!(format!("{span:?}"), "src/app.mp:12:4");
}

#[test]
fn builtin_span_is_unknown() {
    assert!(!Span::builtin().is_known());
    assert!(Span::new("a.mp", 1, 1).is_known());
}
