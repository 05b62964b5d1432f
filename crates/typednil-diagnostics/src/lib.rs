//! typednil diagnostics: diagnostic types and output formatters.

pub mod diagnostic;
pub mod human;
pub mod json;
pub mod plain;
pub mod source_lines;

pub use diagnostic::*;
