//! Package discovery and source loading.
//!
//! Patterns follow the `go` tool's directory forms: `./...` and `dir/...`
//! select a directory tree, anything else a single directory. Within a
//! directory, files are grouped by their package clause so an external
//! `foo_test` package is checked as a package of its own.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use typednil_frontend::{lower_package, parse_go_file, FrontendOptions, ParseError, ParsedFile};
use typednil_ir::ir::{AnalysisInput, Package};

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{0}: no such directory")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub include_tests: bool,
    /// Extra qualified interface names for type classification.
    pub interfaces: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            include_tests: true,
            interfaces: Vec::new(),
        }
    }
}

/// Directories selected by `patterns`, relative to `base`, sorted.
///
/// An empty pattern list means the base directory itself.
pub fn expand_patterns(base: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, LoadError> {
    let default = [".".to_string()];
    let patterns = if patterns.is_empty() {
        &default[..]
    } else {
        patterns
    };

    let mut dirs = BTreeSet::new();
    for pattern in patterns {
        match pattern.strip_suffix("...") {
            Some(prefix) => {
                let root = resolve(base, prefix.trim_end_matches('/'));
                if !root.is_dir() {
                    return Err(LoadError::NotFound(pattern.clone()));
                }
                walk_tree(&root, &mut dirs)?;
            }
            None => {
                let dir = resolve(base, pattern);
                if !dir.is_dir() {
                    return Err(LoadError::NotFound(pattern.clone()));
                }
                dirs.insert(dir);
            }
        }
    }
    Ok(dirs.into_iter().collect())
}

fn resolve(base: &Path, pattern: &str) -> PathBuf {
    if pattern.is_empty() || pattern == "." {
        base.to_path_buf()
    } else {
        base.join(pattern)
    }
}

/// Collect `root` and every descendant directory that contains Go files.
fn walk_tree(root: &Path, dirs: &mut BTreeSet<PathBuf>) -> Result<(), LoadError> {
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut has_go = false;
        for entry in read_dir(&dir)? {
            let name = entry.file_name().to_string_lossy().to_string();
            // `...` does not descend into symlinked directories.
            let file_type = entry.file_type().map_err(|source| LoadError::Io {
                path: entry.path().display().to_string(),
                source,
            })?;
            if file_type.is_symlink() {
                continue;
            }
            if file_type.is_dir() {
                if !is_ignored_dir(&name) {
                    stack.push(entry.path());
                }
            } else if name.ends_with(".go") {
                has_go = true;
            }
        }
        if has_go {
            dirs.insert(dir);
        }
    }
    Ok(())
}

fn is_ignored_dir(name: &str) -> bool {
    name == "testdata" || name == "vendor" || name.starts_with('.') || name.starts_with('_')
}

fn read_dir(dir: &Path) -> Result<Vec<std::fs::DirEntry>, LoadError> {
    let io_err = |source| LoadError::Io {
        path: dir.display().to_string(),
        source,
    };
    let mut entries = std::fs::read_dir(dir)
        .map_err(io_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort_by_key(|e| e.file_name());
    Ok(entries)
}

/// Loads packages by parsing Go source with the bundled frontend.
#[derive(Debug, Clone, Default)]
pub struct SourceLoader {
    options: LoadOptions,
}

impl SourceLoader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    /// Load every package selected by `patterns`.
    pub fn load(&self, base: &Path, patterns: &[String]) -> Result<AnalysisInput, LoadError> {
        let mut input = AnalysisInput::default();
        for dir in expand_patterns(base, patterns)? {
            input.packages.extend(self.load_dir(base, &dir)?);
        }
        tracing::debug!(packages = input.packages.len(), "source packages loaded");
        Ok(input)
    }

    /// Parse and lower the Go files of one directory.
    pub fn load_dir(&self, base: &Path, dir: &Path) -> Result<Vec<Package>, LoadError> {
        let mut by_package: BTreeMap<String, Vec<ParsedFile>> = BTreeMap::new();

        for entry in read_dir(dir)? {
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.ends_with(".go") || name.starts_with('.') || name.starts_with('_') || !path.is_file() {
                continue;
            }
            if !self.options.include_tests && name.ends_with("_test.go") {
                continue;
            }
            let source = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
                path: path.display().to_string(),
                source,
            })?;
            let parsed = parse_go_file(&source, &path.to_string_lossy())?;
            match parsed.package_name() {
                Some(pkg) => {
                    let pkg = pkg.to_string();
                    by_package.entry(pkg).or_default().push(parsed);
                }
                None => {
                    tracing::warn!(path = %path.display(), "no package clause; skipping file");
                }
            }
        }

        let import_path = import_path_for(base, dir);
        let options = FrontendOptions {
            interfaces: self.options.interfaces.clone(),
        };
        let mut packages = Vec::new();
        for (name, files) in by_package {
            let path = if name.ends_with("_test") {
                format!("{import_path}_test")
            } else {
                import_path.clone()
            };
            packages.push(lower_package(&path, &dir.to_string_lossy(), &files, &options)?);
        }
        Ok(packages)
    }
}

/// `./rel/dir` for directories under `base`, the full path otherwise.
fn import_path_for(base: &Path, dir: &Path) -> String {
    match dir.strip_prefix(base) {
        Ok(rel) if rel.as_os_str().is_empty() => ".".to_string(),
        Ok(rel) => format!("./{}", rel.to_string_lossy()),
        Err(_) => dir.to_string_lossy().to_string(),
    }
}
