//! Exceptions.
//!
//! Every failure that reaches CorpLang code is an [`ExceptionObject`]: a
//! [`Category`] from a fixed taxonomy, the concrete type name, a message,
//! the thrown payload, and the stack frozen at the raise site. Host faults
//! (errors and panics from native functions) are wrapped into the same shape
//! by [`ExceptionObject::from_host_fault`], so a `catch` never has to care
//! where a failure came from.

mod format;
mod matching;

use std::fmt;
use std::rc::Rc;

use corp_diagnostic::ErrorCode;
use corp_ir::{Name, Span};

use crate::Value;

pub use format::format_exception;
pub use matching::{CatchMatcher, MatchStrategy};

/// Exception taxonomy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    ReferenceError,
    TypeError,
    IoError,
    /// A kind of `ConcurrencyError`.
    TimeoutError,
    ConcurrencyError,
    MemoryError,
    AssertionError,
    RuntimeError,
    /// Thrown by user code with no built-in category.
    UserRaised,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::ReferenceError,
        Category::TypeError,
        Category::IoError,
        Category::TimeoutError,
        Category::ConcurrencyError,
        Category::MemoryError,
        Category::AssertionError,
        Category::RuntimeError,
        Category::UserRaised,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Category::ReferenceError => "ReferenceError",
            Category::TypeError => "TypeError",
            Category::IoError => "IOError",
            Category::TimeoutError => "TimeoutError",
            Category::ConcurrencyError => "ConcurrencyError",
            Category::MemoryError => "MemoryError",
            Category::AssertionError => "AssertionError",
            Category::RuntimeError => "RuntimeError",
            Category::UserRaised => "UserRaised",
        }
    }

    /// Constant-style spelling accepted in catch clauses: `IO_ERROR`.
    pub const fn constant_name(self) -> &'static str {
        match self {
            Category::ReferenceError => "REFERENCE_ERROR",
            Category::TypeError => "TYPE_ERROR",
            Category::IoError => "IO_ERROR",
            Category::TimeoutError => "TIMEOUT_ERROR",
            Category::ConcurrencyError => "CONCURRENCY_ERROR",
            Category::MemoryError => "MEMORY_ERROR",
            Category::AssertionError => "ASSERTION_ERROR",
            Category::RuntimeError => "RUNTIME_ERROR",
            Category::UserRaised => "USER_RAISED",
        }
    }

    pub const fn parent(self) -> Option<Category> {
        match self {
            Category::TimeoutError => Some(Category::ConcurrencyError),
            _ => None,
        }
    }

    /// Is `self` equal to `other` or a kind of it?
    pub fn is_within(self, other: Category) -> bool {
        self == other || self.parent() == Some(other)
    }

    pub const fn error_code(self) -> ErrorCode {
        match self {
            Category::ReferenceError => ErrorCode::E6001,
            Category::TypeError => ErrorCode::E6002,
            Category::IoError => ErrorCode::E6003,
            Category::TimeoutError => ErrorCode::E6004,
            Category::ConcurrencyError => ErrorCode::E6005,
            Category::MemoryError => ErrorCode::E6006,
            Category::AssertionError => ErrorCode::E6007,
            Category::RuntimeError => ErrorCode::E6008,
            Category::UserRaised => ErrorCode::E6009,
        }
    }

    /// Resolve a catch-clause type name to a category, including the
    /// constant spelling and common host-language aliases.
    pub fn from_type_name(name: &str) -> Option<Category> {
        if let Some(category) = Category::ALL
            .into_iter()
            .find(|c| c.name() == name || c.constant_name() == name)
        {
            return Some(category);
        }
        match name {
            "NameError" | "UndefinedError" => Some(Category::ReferenceError),
            "ValueError" | "ContractError" => Some(Category::TypeError),
            "FileNotFoundError" | "PermissionError" | "OSError" | "NetworkError" => {
                Some(Category::IoError)
            }
            "DeadlockError" | "TaskError" => Some(Category::ConcurrencyError),
            "OutOfMemoryError" | "RecursionError" => Some(Category::MemoryError),
            "ZeroDivisionError" | "ArithmeticError" | "OverflowError" => {
                Some(Category::RuntimeError)
            }
            _ => None,
        }
    }

    /// Guess a category from message text. Last-resort catch matching.
    pub fn from_message(message: &str) -> Option<Category> {
        const TABLE: &[(&str, Category)] = &[
            ("timed out", Category::TimeoutError),
            ("timeout", Category::TimeoutError),
            ("no such file", Category::IoError),
            ("file not found", Category::IoError),
            ("permission denied", Category::IoError),
            ("i/o error", Category::IoError),
            ("out of memory", Category::MemoryError),
            ("recursion depth", Category::MemoryError),
            ("assertion", Category::AssertionError),
            ("undefined variable", Category::ReferenceError),
            ("is not defined", Category::ReferenceError),
            ("type mismatch", Category::TypeError),
            ("not callable", Category::TypeError),
            ("deadlock", Category::ConcurrencyError),
            ("division by zero", Category::RuntimeError),
        ];
        let lower = message.to_lowercase();
        TABLE
            .iter()
            .find(|(needle, _)| lower.contains(needle))
            .map(|(_, category)| *category)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One variable captured in a stack frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalVar {
    pub name: Name,
    /// Rendered value, truncated.
    pub value: String,
    pub type_name: String,
}

/// A frozen call-stack frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackFrame {
    pub file: Name,
    pub line: u32,
    pub column: u32,
    pub function: Name,
    pub locals: Vec<LocalVar>,
}

/// A raised exception.
#[derive(Debug)]
pub struct ExceptionObject {
    pub kind: Category,
    /// Concrete type: a payload class name, a host fault type such as
    /// `FileNotFoundError`, or the category name.
    pub type_name: Name,
    pub message: String,
    /// The thrown value. `null` for engine-raised exceptions.
    pub payload: Value,
    /// Class of the payload when it is an instance.
    pub payload_class_name: Option<Name>,
    /// Most recent frame first. Frozen at the raise site; a rethrow keeps it.
    pub mp_stack: Vec<StackFrame>,
    /// Statement that raised.
    pub span: Span,
    /// Extra context, e.g. the original host error text.
    pub cause: Option<String>,
}

impl ExceptionObject {
    /// An engine-raised exception of `kind`.
    pub fn new(kind: Category, message: impl Into<String>, span: Span, mp_stack: Vec<StackFrame>) -> Self {
        ExceptionObject {
            kind,
            type_name: Name::new(kind.name()),
            message: message.into(),
            payload: Value::Null,
            payload_class_name: None,
            mp_stack,
            span,
            cause: None,
        }
    }

    /// Wrap a value thrown by `throw`.
    pub fn from_payload(payload: Value, span: Span, mp_stack: Vec<StackFrame>) -> Self {
        let kind = classify(&FaultSource::Payload(&payload));
        let payload_class_name = match &payload {
            Value::Instance(instance) => Some(instance.class.name.clone()),
            _ => None,
        };
        let type_name = payload_class_name
            .clone()
            .or_else(|| record_type_name(&payload))
            .unwrap_or_else(|| Name::new(kind.name()));
        ExceptionObject {
            kind,
            type_name,
            message: payload_message(&payload),
            payload,
            payload_class_name,
            mp_stack,
            span,
            cause: None,
        }
    }

    /// Wrap a host fault.
    pub fn from_host_fault(fault: &HostFault, span: Span, mp_stack: Vec<StackFrame>) -> Self {
        let kind = classify(&FaultSource::Host(fault));
        ExceptionObject {
            kind,
            type_name: Name::new(fault.type_name()),
            message: fault.to_string(),
            payload: Value::Null,
            payload_class_name: None,
            mp_stack,
            span,
            cause: Some(format!("host fault: {fault:?}")),
        }
    }

    pub fn error_code(&self) -> ErrorCode {
        self.kind.error_code()
    }
}

impl fmt::Display for ExceptionObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

/// Subclass of an I/O fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoFaultKind {
    NotFound,
    PermissionDenied,
    Other,
}

/// Error returned by native functions.
#[derive(Clone, Debug, thiserror::Error)]
pub enum HostFault {
    #[error("{message}")]
    Io { kind: IoFaultKind, message: String },
    #[error("operation timed out: {0}")]
    Timeout(String),
    #[error("out of memory: {0}")]
    OutOfMemory(String),
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("type mismatch: {0}")]
    TypeContract(String),
    #[error("undefined variable '{0}'")]
    Undefined(String),
    #[error("{0}")]
    Runtime(String),
    #[error("native function panicked: {0}")]
    Panic(String),
    /// A CorpLang exception passing back out through a native callback.
    #[error("{}", .0.message)]
    Raised(Rc<ExceptionObject>),
}

impl HostFault {
    /// Concrete type name reported for this fault.
    pub fn type_name(&self) -> &'static str {
        match self {
            HostFault::Io {
                kind: IoFaultKind::NotFound,
                ..
            } => "FileNotFoundError",
            HostFault::Io {
                kind: IoFaultKind::PermissionDenied,
                ..
            } => "PermissionError",
            HostFault::Io { .. } => "IOError",
            HostFault::Timeout(_) => "TimeoutError",
            HostFault::OutOfMemory(_) => "MemoryError",
            HostFault::Assertion(_) => "AssertionError",
            HostFault::TypeContract(_) => "TypeError",
            HostFault::Undefined(_) => "ReferenceError",
            HostFault::Runtime(_) | HostFault::Panic(_) | HostFault::Raised(_) => "RuntimeError",
        }
    }
}

impl From<std::io::Error> for HostFault {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => IoFaultKind::NotFound,
            std::io::ErrorKind::PermissionDenied => IoFaultKind::PermissionDenied,
            std::io::ErrorKind::TimedOut => return HostFault::Timeout(err.to_string()),
            std::io::ErrorKind::OutOfMemory => return HostFault::OutOfMemory(err.to_string()),
            _ => IoFaultKind::Other,
        };
        HostFault::Io {
            kind,
            message: err.to_string(),
        }
    }
}

/// Input to [`classify`].
pub enum FaultSource<'a> {
    /// A value passed to `throw`.
    Payload(&'a Value),
    /// A fault from a native function.
    Host(&'a HostFault),
}

/// Map a thrown value or host fault to its category.
pub fn classify(source: &FaultSource<'_>) -> Category {
    match source {
        FaultSource::Host(fault) => match fault {
            HostFault::Io { .. } => Category::IoError,
            HostFault::Timeout(_) => Category::TimeoutError,
            HostFault::OutOfMemory(_) => Category::MemoryError,
            HostFault::Assertion(_) => Category::AssertionError,
            HostFault::TypeContract(_) => Category::TypeError,
            HostFault::Undefined(_) => Category::ReferenceError,
            HostFault::Runtime(_) => Category::RuntimeError,
            HostFault::Panic(message) => {
                if message.contains("assert") {
                    Category::AssertionError
                } else {
                    Category::RuntimeError
                }
            }
            HostFault::Raised(exc) => exc.kind,
        },
        FaultSource::Payload(value) => match value {
            Value::Exception(exc) => exc.kind,
            Value::Instance(instance) => instance.class.category().unwrap_or(Category::UserRaised),
            Value::Record(_) => record_type_name(value)
                .and_then(|name| Category::from_type_name(&name))
                .unwrap_or(Category::UserRaised),
            _ => Category::UserRaised,
        },
    }
}

/// `type` (or `kind`) field of a record payload.
fn record_type_name(payload: &Value) -> Option<Name> {
    let Value::Record(fields) = payload else {
        return None;
    };
    fields
        .borrow()
        .iter()
        .find(|(key, _)| key.as_str() == "type" || key.as_str() == "kind")
        .and_then(|(_, value)| match value {
            Value::Str(s) => Some(Name::new(&**s)),
            _ => None,
        })
}

fn payload_message(payload: &Value) -> String {
    match payload {
        Value::Instance(instance) => instance
            .get_field("message")
            .map_or_else(String::new, |m| m.display()),
        Value::Record(fields) => fields
            .borrow()
            .iter()
            .find(|(key, _)| key.as_str() == "message")
            .map_or_else(|| payload.display(), |(_, m)| m.display()),
        Value::Exception(exc) => exc.message.clone(),
        other => other.display(),
    }
}
