//! Error codes for all engine diagnostics.
//!
//! Each error code is a unique identifier (e.g., `E1001`) with the first digit
//! indicating the phase that produced it.

use std::fmt;

/// Error codes for all engine diagnostics.
///
/// Format: E#### where first digit indicates phase:
/// - E1xxx: Hoisting and scope analysis
/// - E6xxx: Runtime exceptions (one per category)
/// - E9xxx: Internal engine errors
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ErrorCode {
    // Analysis Errors (E1xxx)
    /// Variable declared in only some branches of a conditional
    E1001,
    /// Branch declarations disagree on type
    E1002,
    /// Variable read before its declaration in a branch
    E1003,

    // Runtime Errors (E6xxx)
    /// Unresolved name
    E6001,
    /// Type contract violation
    E6002,
    /// Host I/O failure
    E6003,
    /// Operation timed out
    E6004,
    /// Task scheduling failure
    E6005,
    /// Resource exhaustion (including recursion depth)
    E6006,
    /// Assertion failed
    E6007,
    /// Generic runtime fault (division by zero, overflow)
    E6008,
    /// User-raised value
    E6009,

    // Internal Errors (E9xxx)
    /// Internal engine error
    E9001,
}

impl ErrorCode {
    /// Get the string representation (e.g. `"E1001"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "E1001",
            ErrorCode::E1002 => "E1002",
            ErrorCode::E1003 => "E1003",
            ErrorCode::E6001 => "E6001",
            ErrorCode::E6002 => "E6002",
            ErrorCode::E6003 => "E6003",
            ErrorCode::E6004 => "E6004",
            ErrorCode::E6005 => "E6005",
            ErrorCode::E6006 => "E6006",
            ErrorCode::E6007 => "E6007",
            ErrorCode::E6008 => "E6008",
            ErrorCode::E6009 => "E6009",
            ErrorCode::E9001 => "E9001",
        }
    }

    /// One-line summary used by `--explain`-style lookups.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E1001 => "variable not declared in all branches",
            ErrorCode::E1002 => "type mismatch in hoisting",
            ErrorCode::E1003 => "reference to undefined variable",
            ErrorCode::E6001 => "reference error",
            ErrorCode::E6002 => "type error",
            ErrorCode::E6003 => "I/O error",
            ErrorCode::E6004 => "timeout",
            ErrorCode::E6005 => "concurrency error",
            ErrorCode::E6006 => "memory error",
            ErrorCode::E6007 => "assertion failed",
            ErrorCode::E6008 => "runtime error",
            ErrorCode::E6009 => "uncaught user exception",
            ErrorCode::E9001 => "internal engine error",
        }
    }

    /// Check if this is a compile-time analysis error (E1xxx).
    pub fn is_analysis_error(&self) -> bool {
        self.as_str().starts_with("E1")
    }

    /// Check if this is a runtime error (E6xxx).
    pub fn is_runtime_error(&self) -> bool {
        self.as_str().starts_with("E6")
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
