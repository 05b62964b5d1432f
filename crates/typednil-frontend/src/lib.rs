//! typednil frontend - Go source to typed AST via tree-sitter.
//!
//! A lightweight alternative to the external type-checker bridge: types are
//! resolved from the package's own declarations plus a list of well-known
//! interfaces, which is enough to classify pointers and interfaces in most
//! code. Anything it cannot resolve is left unknown.

pub mod lower;
pub mod parse;
pub mod types;

pub use parse::{parse_go_file, ParseError, ParsedFile};
pub use types::{TypeEnv, DEFAULT_INTERFACES};

use typednil_ir::ir::Package;

#[derive(Debug, Clone, Default)]
pub struct FrontendOptions {
    /// Extra qualified interface names, e.g. `store.Store`.
    pub interfaces: Vec<String>,
}

/// Lower the parsed files of one package.
///
/// All files must share a package clause; the first one names the package.
pub fn lower_package(
    import_path: &str,
    dir: &str,
    files: &[ParsedFile],
    options: &FrontendOptions,
) -> Result<Package, ParseError> {
    let name = match files.first() {
        Some(first) => first
            .package_name()
            .ok_or_else(|| ParseError::MissingPackage(first.path.clone()))?
            .to_string(),
        None => String::new(),
    };

    let env = TypeEnv::build(files, &options.interfaces);
    let lowered = files
        .iter()
        .map(|file| {
            if file.has_errors() {
                tracing::warn!(path = %file.path, "syntax errors; results for this file may be incomplete");
            }
            lower::lower_file(file, &env)
        })
        .collect();

    Ok(Package {
        import_path: import_path.to_string(),
        name,
        dir: dir.to_string(),
        files: lowered,
    })
}

/// Parse and lower one in-memory file as a package of its own.
pub fn lower_source(path: &str, source: &str, options: &FrontendOptions) -> Result<Package, ParseError> {
    let parsed = parse_go_file(source, path)?;
    let dir = std::path::Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();
    lower_package(&dir, &dir, std::slice::from_ref(&parsed), options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_package_across_files() {
        let a = parse_go_file("package demo\n\ntype Sink interface{ Put() }\n", "/p/a.go").unwrap();
        let b = parse_go_file(
            "package demo\n\nfunc get() (Sink, error) { return nil, nil }\n",
            "/p/b.go",
        )
        .unwrap();
        let pkg = lower_package("example.com/demo", "/p", &[a, b], &FrontendOptions::default())
            .unwrap();
        assert_eq!(pkg.name, "demo");
        assert_eq!(pkg.files.len(), 2);
        assert_eq!(pkg.function_count(), 1);
        // The interface declared in a.go classifies the result in b.go.
        let slots = pkg.files[1].functions[0].result_slots();
        assert!(slots.iter().all(|s| s.ty.class.is_interface()));
    }

    #[test]
    fn test_missing_package_clause() {
        let parsed = parse_go_file("func f() {}\n", "/p/x.go").unwrap();
        let err = lower_package("x", "/p", &[parsed], &FrontendOptions::default()).unwrap_err();
        assert!(matches!(err, ParseError::MissingPackage(_)));
    }

    #[test]
    fn test_lower_source() {
        let pkg = lower_source(
            "/p/main.go",
            "package main\n\nfunc main() {}\n",
            &FrontendOptions::default(),
        )
        .unwrap();
        assert_eq!(pkg.name, "main");
        assert_eq!(pkg.dir, "/p");
        assert_eq!(pkg.files[0].path, "/p/main.go");
    }
}
