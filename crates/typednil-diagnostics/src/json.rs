//! JSON output for tooling.

use crate::diagnostic::Diagnostic;
use crate::plain::PathStyle;

/// Serialize diagnostics as a pretty-printed JSON array, with paths shown
/// the same way as the plain formatter.
pub fn format_json(diags: &[Diagnostic], style: &PathStyle) -> serde_json::Result<String> {
    let shown: Vec<Diagnostic> = diags
        .iter()
        .map(|d| {
            let mut d = d.clone();
            d.location.file = style.display(&d.location.file);
            d
        })
        .collect();
    serde_json::to_string_pretty(&shown)
}
