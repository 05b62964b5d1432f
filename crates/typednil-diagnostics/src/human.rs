//! Human-readable diagnostic output formatter.
//!
//! Uses ariadne for rich terminal output with source context.

use crate::diagnostic::{Diagnostic, Severity};
use crate::plain::PathStyle;
use ariadne::{Color, Config, Label, Report, ReportKind, Source};
use std::collections::HashMap;

/// Format diagnostics for human-readable terminal output.
pub fn format_human(diags: &[Diagnostic], style: &PathStyle, use_color: bool) -> String {
    if diags.is_empty() {
        return "No typed nil returns found\n".to_string();
    }

    let mut output = Vec::new();
    let mut source_cache: HashMap<String, String> = HashMap::new();

    let config = Config::default().with_color(use_color);

    for diag in diags {
        let file = &diag.location.file;
        let shown = style.display(file);

        let source_text = source_cache
            .entry(file.clone())
            .or_insert_with(|| std::fs::read_to_string(file).unwrap_or_default());

        if source_text.is_empty() {
            output.push(format_fallback(diag, &shown));
            continue;
        }

        let kind = match diag.severity {
            Severity::Error => ReportKind::Error,
            Severity::Warning => ReportKind::Warning,
            Severity::Info => ReportKind::Advice,
        };

        let offset = line_col_to_offset(source_text, diag.location.line, diag.location.column);
        let label_end = (offset + diag.symbol.len().max(1)).min(source_text.len());

        let report = Report::build(kind, (shown.as_str(), offset..label_end))
            .with_config(config)
            .with_code(&diag.rule)
            .with_message(&diag.title)
            .with_label(
                Label::new((shown.as_str(), offset..label_end))
                    .with_message(&diag.explanation)
                    .with_color(Color::Yellow),
            )
            .with_help(format!(
                "return an untyped `nil` explicitly instead of `{}`",
                diag.symbol
            ));

        let mut buf = Vec::new();
        report
            .finish()
            .write(
                (shown.as_str(), Source::from(source_text.as_str())),
                &mut buf,
            )
            .ok();

        output.push(String::from_utf8_lossy(&buf).to_string());
    }

    output.push(format!("\nFound {} possible typed nil return(s)\n", diags.len()));

    output.join("\n")
}

/// Convert 1-based line:column to byte offset in source text.
fn line_col_to_offset(source: &str, line: u32, col: u32) -> usize {
    let line = line.saturating_sub(1) as usize;
    let col = col.saturating_sub(1) as usize;

    let offset: usize = source
        .lines()
        .take(line)
        .map(|l| l.len() + 1) // +1 for newline
        .sum();

    (offset + col).min(source.len().saturating_sub(1))
}

/// Fallback format when source file is not available.
fn format_fallback(diag: &Diagnostic, shown: &str) -> String {
    format!(
        "{}:{}:{}: {} [{}] {}: {}\n",
        shown,
        diag.location.line,
        diag.location.column,
        diag.severity,
        diag.rule,
        diag.title,
        diag.explanation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::DiagnosticBuilder;

    fn make_diag(file: &str, line: u32) -> Diagnostic {
        DiagnosticBuilder::new("TNIL001", Severity::Warning, "possible typed nil")
            .location(file, line, 9)
            .symbol("a")
            .explanation("`a` is nil here")
            .build()
    }

    #[test]
    fn test_empty_diagnostics() {
        let result = format_human(&[], &PathStyle::default(), false);
        assert_eq!(result, "No typed nil returns found\n");
    }

    #[test]
    fn test_fallback_no_source() {
        let diag = make_diag("/nonexistent/file.go", 10);
        let result = format_human(&[diag], &PathStyle::absolute(), false);
        assert!(result.contains("TNIL001"));
        assert!(result.contains("/nonexistent/file.go:10:9"));
        assert!(result.contains("Found 1 possible typed nil return(s)"));
    }

    #[test]
    fn test_report_with_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(
            &path,
            "package main\n\nfunc f() error {\n\tvar a *T\n\treturn a\n}\n",
        )
        .unwrap();
        let mut diag = make_diag(&path.to_string_lossy(), 5);
        diag.location.column = 9;
        let result = format_human(&[diag], &PathStyle::relative_to(dir.path()), false);
        assert!(result.contains("TNIL001"));
        assert!(result.contains("main.go"));
        assert!(result.contains("return a"));
    }

    #[test]
    fn test_line_col_to_offset() {
        let src = "line1\nline2\nline3\n";
        assert_eq!(line_col_to_offset(src, 1, 1), 0);
        assert_eq!(line_col_to_offset(src, 2, 1), 6);
        assert_eq!(line_col_to_offset(src, 3, 1), 12);
        assert_eq!(line_col_to_offset(src, 2, 3), 8);
    }

    #[test]
    fn test_line_col_to_offset_bounds() {
        let src = "abc";
        assert_eq!(line_col_to_offset(src, 100, 1), 2);
    }
}
