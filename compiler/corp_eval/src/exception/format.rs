//! Human-readable exception reports.

use std::fmt::Write;

use corp_diagnostic::SourceMap;

use super::{Category, ExceptionObject, StackFrame};
use crate::diagnostics::truncate;

const MAX_MESSAGE: usize = 200;
const MAX_LISTED_VARIABLES: usize = 3;
const MAX_CODE_LINE: usize = 120;

/// Render `exc` as a multi-line report.
///
/// ```text
/// Error<ReferenceError>
/// Message: undefined variable 'total'
/// Location: src/app.corp:12 in compute
///
/// StackTrace (.mp):
///   at src/app.corp:12  in compute  <-- origin
///     codeblock: return total + 1
///     variables: {x=3 (int)}
///   at src/app.corp:20  in <module>
///
/// Root Cause:
///   ...
/// Suggestions:
///   - ...
/// ```
///
/// File paths under `workspace_root` are shown relative to it. Source lines
/// come from `sources` when the file is present there.
pub fn format_exception(exc: &ExceptionObject, workspace_root: &str, sources: &SourceMap) -> String {
    let mut out = String::new();
    let message = truncate(&exc.message, MAX_MESSAGE);
    let origin = exc.mp_stack.first();

    let _ = writeln!(out, "Error<{}>", exc.type_name);
    let _ = writeln!(out, "Message: {message}");
    let location = match origin {
        Some(frame) => format!(
            "{}:{} in {}",
            relative(frame.file.as_str(), workspace_root),
            frame.line,
            frame.function
        ),
        None if exc.span.is_known() => format!(
            "{}:{}",
            relative(exc.span.file.as_str(), workspace_root),
            exc.span.line
        ),
        None => "<unknown>".to_string(),
    };
    let _ = writeln!(out, "Location: {location}");

    if !exc.mp_stack.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "StackTrace (.mp):");
        for (i, frame) in exc.mp_stack.iter().enumerate() {
            write_frame(&mut out, frame, i == 0, workspace_root, sources);
        }
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Root Cause:");
    let _ = writeln!(out, "  {}: {message}", exc.kind);
    if let Some(frame) = origin {
        let _ = writeln!(
            out,
            "  raised at {}:{}",
            relative(frame.file.as_str(), workspace_root),
            frame.line
        );
    }
    let _ = writeln!(out, "  {}", category_note(exc.kind));
    if let Some(cause) = &exc.cause {
        let _ = writeln!(out, "  {cause}");
    }

    let _ = writeln!(out, "Suggestions:");
    for suggestion in suggestions(&exc.message) {
        let _ = writeln!(out, "  - {suggestion}");
    }
    out
}

fn write_frame(out: &mut String, frame: &StackFrame, is_origin: bool, root: &str, sources: &SourceMap) {
    let marker = if is_origin { "  <-- origin" } else { "" };
    let _ = writeln!(
        out,
        "  at {}:{}  in {}{marker}",
        relative(frame.file.as_str(), root),
        frame.line,
        frame.function
    );
    if let Some(code) = sources.line_text(frame.file.as_str(), frame.line) {
        let code = code.trim();
        if !code.is_empty() {
            let _ = writeln!(out, "    codeblock: {}", truncate(code, MAX_CODE_LINE));
        }
    }
    if !frame.locals.is_empty() {
        let listed: Vec<String> = frame
            .locals
            .iter()
            .take(MAX_LISTED_VARIABLES)
            .map(|var| format!("{}={} ({})", var.name, var.value, var.type_name))
            .collect();
        let hidden = frame.locals.len().saturating_sub(MAX_LISTED_VARIABLES);
        let more = if hidden > 0 {
            format!("; +{hidden} more")
        } else {
            String::new()
        };
        let _ = writeln!(out, "    variables: {{{}{more}}}", listed.join(", "));
    }
}

/// `file` relative to `root` when it lives under it.
fn relative<'a>(file: &'a str, root: &str) -> &'a str {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return file;
    }
    file.strip_prefix(root)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(file)
}

fn category_note(kind: Category) -> &'static str {
    match kind {
        Category::ReferenceError => "A name was used where no binding for it is visible.",
        Category::TypeError => "A value had a different type than the operation requires.",
        Category::IoError => "An input/output operation failed in the host.",
        Category::TimeoutError => "An operation did not finish within its time limit.",
        Category::ConcurrencyError => "An asynchronous task could not make progress.",
        Category::MemoryError => "The program ran out of memory or call depth.",
        Category::AssertionError => "An assertion did not hold.",
        Category::RuntimeError => "An operation failed while the program was running.",
        Category::UserRaised => "The program raised this exception explicitly.",
    }
}

fn suggestions(message: &str) -> Vec<&'static str> {
    let lower = message.to_lowercase();
    if lower.contains("undefined variable") || lower.contains("is not defined") {
        vec![
            "Check the spelling of the name.",
            "Declare the variable before the statement that reads it.",
            "A variable declared inside one branch of an `if` is not visible after it; declare it before the `if`.",
        ]
    } else if lower.contains("division by zero") {
        vec!["Check the divisor for zero before dividing."]
    } else if lower.contains("type mismatch") {
        vec![
            "Convert the value with str(), int() or float() before using it.",
            "Check the declared type of the variable or parameter.",
        ]
    } else if lower.contains("cannot assign") {
        vec![
            "Declare the variable with `var` before assigning to it.",
            "Constants declared with `const` cannot be reassigned.",
        ]
    } else if lower.contains("not callable") {
        vec!["Only functions, methods and classes can be called; check what the name holds."]
    } else {
        vec!["Inspect the variables listed in the stack trace for unexpected values."]
    }
}
