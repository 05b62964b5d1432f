//! Per-file cache of source lines used to quote the offending line.

use std::collections::HashMap;

use crate::diagnostic::UNKNOWN_LINE;

/// Lazily reads files and keeps their lines for repeated lookups.
///
/// Unreadable files are remembered as empty so they are only tried once.
#[derive(Debug, Default)]
pub struct SourceLines {
    files: HashMap<String, Vec<String>>,
}

impl SourceLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with in-memory contents (used when the loader already
    /// holds the source text).
    pub fn insert(&mut self, path: impl Into<String>, contents: &str) {
        self.files
            .insert(path.into(), contents.lines().map(str::to_string).collect());
    }

    /// Trimmed text of the 1-based `line` in `path`, or `??`.
    pub fn line(&mut self, path: &str, line: u32) -> String {
        let lines = self
            .files
            .entry(path.to_string())
            .or_insert_with(|| read_lines(path));
        line.checked_sub(1)
            .and_then(|idx| lines.get(idx as usize))
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| UNKNOWN_LINE.to_string())
    }
}

fn read_lines(path: &str) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => text.lines().map(str::to_string).collect(),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.go");
        std::fs::write(&path, "package main\n\nfunc f() error {\n\treturn a\n}\n").unwrap();
        let path = path.to_string_lossy().to_string();

        let mut cache = SourceLines::new();
        assert_eq!(cache.line(&path, 4), "return a");
        assert_eq!(cache.line(&path, 1), "package main");
    }

    #[test]
    fn test_out_of_range_is_placeholder() {
        let mut cache = SourceLines::new();
        cache.insert("x.go", "one\ntwo\n");
        assert_eq!(cache.line("x.go", 3), "??");
        assert_eq!(cache.line("x.go", 0), "??");
        assert_eq!(cache.line("x.go", 2), "two");
    }

    #[test]
    fn test_missing_file_is_placeholder() {
        let mut cache = SourceLines::new();
        assert_eq!(cache.line("/nonexistent/file.go", 1), "??");
    }
}
