//! Reports for CorpLang programs.
//!
//! A [`Diagnostic`] pairs an [`ErrorCode`] with a message, the spans it is
//! about, and optional notes and suggestions. Emitters in [`emitter`] turn
//! them into text.
//!
//! Compile-time reports come from the hoisting analyzer; runtime exceptions
//! map onto the `E6xxx` range so hosts can treat both uniformly.

mod diagnostic;
pub mod emitter;
mod error_code;
mod source_map;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use error_code::ErrorCode;
pub use source_map::SourceMap;
