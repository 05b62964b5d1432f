//! Plain, line-oriented output: one tab-separated line per diagnostic.
//!
//! `<path>:<line>:<column>\t<source line>\t| possible typed nil ---> <symbol>`

use std::path::{Path, PathBuf};

use crate::diagnostic::Diagnostic;

/// Marker text preceding the symbol name.
pub const MARKER: &str = "| possible typed nil ---> ";

/// Conventional source root that paths are shortened against.
const SOURCE_ROOT: &str = "/src/";

#[derive(Debug, Clone, Default)]
pub struct PathStyle {
    /// Print paths exactly as loaded.
    pub absolute: bool,
    /// Directory that paths are made relative to when possible.
    pub base_dir: Option<PathBuf>,
}

impl PathStyle {
    pub fn absolute() -> Self {
        Self {
            absolute: true,
            base_dir: None,
        }
    }

    pub fn relative_to(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            absolute: false,
            base_dir: Some(base_dir.into()),
        }
    }

    /// Shorten `file` for display.
    pub fn display(&self, file: &str) -> String {
        if self.absolute {
            return file.to_string();
        }
        if let Some(base) = &self.base_dir {
            if let Ok(rel) = Path::new(file).strip_prefix(base) {
                if !rel.as_os_str().is_empty() {
                    return rel.to_string_lossy().to_string();
                }
            }
        }
        match file.find(SOURCE_ROOT) {
            Some(i) => file[i + SOURCE_ROOT.len()..].to_string(),
            None => file.to_string(),
        }
    }
}

/// Render one diagnostic as a report line (without trailing newline).
pub fn format_line(diag: &Diagnostic, style: &PathStyle) -> String {
    format!(
        "{}:{}:{}\t{}\t{}{}",
        style.display(&diag.location.file),
        diag.location.line,
        diag.location.column,
        diag.source_line,
        MARKER,
        diag.symbol,
    )
}

/// Render all diagnostics, one per line.
pub fn format_plain(diags: &[Diagnostic], style: &PathStyle) -> String {
    let mut out = String::new();
    for diag in diags {
        out.push_str(&format_line(diag, style));
        out.push('\n');
    }
    out
}
