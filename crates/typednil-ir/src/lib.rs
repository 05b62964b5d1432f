//! typednil IR: the typed AST the checker consumes.
//!
//! Parsing and type resolution happen outside the checker: either an
//! external type-checker bridge emits this tree as JSON, or the bundled
//! tree-sitter frontend lowers Go source into it.

pub mod ir;

/// Deserialize an `AnalysisInput` from a JSON string.
pub fn from_json(data: &str) -> Result<ir::AnalysisInput, String> {
    serde_json::from_str(data).map_err(|e| format!("invalid typed AST: {e}"))
}

/// Load a typed-AST JSON dump from disk.
pub fn load_json_file(path: &std::path::Path) -> Result<ir::AnalysisInput, String> {
    let data = std::fs::read_to_string(path).map_err(|e| format!("read error: {e}"))?;
    from_json(&data)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "packages": [{
            "import_path": "example.com/demo",
            "name": "demo",
            "files": [{
                "path": "/src/example.com/demo/demo.go",
                "functions": [{
                    "name": "F",
                    "pos": {"line": 3, "column": 1},
                    "results": [{"ty": {"text": "error", "class": "interface"}}],
                    "body": {"pos": {"line": 3, "column": 14}, "stmts": [
                        {"kind": "return", "pos": {"line": 4, "column": 2}, "results": [
                            {"pos": {"line": 4, "column": 9}, "ty": "untyped_nil", "kind": {"kind": "nil"}}
                        ]}
                    ]}
                }]
            }]
        }]
    }"#;

    #[test]
    fn test_from_json_minimal() {
        let input = from_json(MINIMAL).unwrap();
        assert_eq!(input.packages.len(), 1);
        let pkg = &input.packages[0];
        assert_eq!(pkg.function_count(), 1);
        let func = &pkg.files[0].functions[0];
        assert_eq!(func.result_slots().len(), 1);
        assert!(func.body.as_ref().is_some_and(|b| b.stmts.len() == 1));
        assert!(!pkg.files[0].is_test);
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        let err = from_json("{not json").unwrap_err();
        assert!(err.contains("invalid typed AST"));
    }

    #[test]
    fn test_load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ast.json");
        std::fs::write(&path, MINIMAL).unwrap();
        let input = load_json_file(&path).unwrap();
        assert_eq!(input.packages[0].name, "demo");
    }

    #[test]
    fn test_load_json_file_missing() {
        let err = load_json_file(std::path::Path::new("/nonexistent/ast.json")).unwrap_err();
        assert!(err.starts_with("read error"));
    }
}
