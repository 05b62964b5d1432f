//! Core diagnostic types.
//!
//! The checker produces `Diagnostic` values and every formatter (plain,
//! human, JSON) consumes them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Placeholder used when the offending source line cannot be read.
pub const UNKNOWN_LINE: &str = "??";

/// A diagnostic produced by the checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Unique ID: RULE-file:line:column (e.g., "TNIL001-main.go:31:9").
    pub id: String,
    /// Rule code.
    pub rule: String,
    pub severity: Severity,
    /// One-line summary.
    pub title: String,
    /// Why this return is suspicious.
    pub explanation: String,
    /// Where the typed nil escapes.
    pub location: Location,
    /// Variable returned through the interface slot.
    pub symbol: String,
    /// Trimmed text of the source line at `location`, or `??`.
    pub source_line: String,
    /// Enclosing function, `(*Recv).Name` for methods.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
}

impl Diagnostic {
    /// Total order used for reports: file, line, column, then line text and symbol.
    pub fn report_order(&self, other: &Self) -> Ordering {
        self.location
            .file
            .cmp(&other.location.file)
            .then(self.location.line.cmp(&other.location.line))
            .then(self.location.column.cmp(&other.location.column))
            .then_with(|| self.source_line.cmp(&other.source_line))
            .then_with(|| self.symbol.cmp(&other.symbol))
    }
}

/// Sort diagnostics into deterministic report order.
pub fn sort_diagnostics(diags: &mut [Diagnostic]) {
    diags.sort_by(Diagnostic::report_order);
}

/// Severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source code location.
///
/// Lines and columns are 1-based (matching Go's `token.Position`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Builder for creating diagnostics conveniently.
pub struct DiagnosticBuilder {
    rule: String,
    severity: Severity,
    title: String,
    file: String,
    line: u32,
    column: u32,
    explanation: String,
    symbol: String,
    source_line: String,
    function: String,
}

impl DiagnosticBuilder {
    pub fn new(rule: impl Into<String>, severity: Severity, title: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            severity,
            title: title.into(),
            file: String::new(),
            line: 0,
            column: 0,
            explanation: String::new(),
            symbol: String::new(),
            source_line: UNKNOWN_LINE.to_string(),
            function: String::new(),
        }
    }

    pub fn location(mut self, file: impl Into<String>, line: u32, column: u32) -> Self {
        self.file = file.into();
        self.line = line;
        self.column = column;
        self
    }

    pub fn explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = explanation.into();
        self
    }

    pub fn symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Set the source line; surrounding whitespace is trimmed.
    pub fn source_line(mut self, line: impl AsRef<str>) -> Self {
        self.source_line = line.as_ref().trim().to_string();
        self
    }

    pub fn function(mut self, function: impl Into<String>) -> Self {
        self.function = function.into();
        self
    }

    pub fn build(self) -> Diagnostic {
        let id = format!("{}-{}:{}:{}", self.rule, self.file, self.line, self.column);
        Diagnostic {
            id,
            rule: self.rule,
            severity: self.severity,
            title: self.title,
            explanation: self.explanation,
            location: Location {
                file: self.file,
                line: self.line,
                column: self.column,
            },
            symbol: self.symbol,
            source_line: self.source_line,
            function: self.function,
        }
    }
}
