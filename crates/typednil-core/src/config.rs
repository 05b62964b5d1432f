//! Configuration loading from typednil.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "typednil.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub typednil: TypednilConfig,
    pub loader: LoaderConfig,
    pub types: TypesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TypednilConfig {
    /// Check `_test.go` files too.
    pub include_tests: bool,
    /// Leave out files marked `// Code generated ... DO NOT EDIT.`
    pub skip_generated: bool,
    /// Print file paths exactly as loaded.
    pub abspath: bool,
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Plain,
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoaderBackend {
    /// Bundled tree-sitter frontend.
    #[default]
    Source,
    /// External type-checker emitting the typed AST as JSON.
    Bridge,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub backend: LoaderBackend,
    /// Explicit bridge binary. `None` = search `TYPEDNIL_BRIDGE_PATH`, next to
    /// the executable, then `PATH`.
    pub bridge_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TypesConfig {
    /// Extra qualified interface types for the source frontend, e.g. `store.Store`.
    pub interfaces: Vec<String>,
}

impl Default for TypednilConfig {
    fn default() -> Self {
        Self {
            include_tests: true,
            skip_generated: false,
            abspath: false,
            format: OutputFormat::Plain,
        }
    }
}

/// Find and load typednil.toml, walking up from `start_dir`.
/// Returns default config if no file is found or it cannot be parsed.
pub fn load_config(start_dir: &Path) -> Config {
    let Some(path) = find_config_file(start_dir) else {
        return Config::default();
    };
    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read config; using defaults");
            return Config::default();
        }
    };
    match toml::from_str(&content) {
        Ok(config) => {
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "invalid config; using defaults");
            Config::default()
        }
    }
}

/// Walk up directories looking for typednil.toml.
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Default TOML content for `typednilcheck init`.
pub const DEFAULT_CONFIG_TOML: &str = r#"[typednil]
include_tests = true
skip_generated = false
abspath = false
format = "plain"  # plain | human | json

[loader]
backend = "source"  # source | bridge
# bridge_path = "/usr/local/bin/typednil-bridge"

[types]
# Qualified interface types declared in other packages. Common standard
# library interfaces (context.Context, io.Reader, ...) are always known.
interfaces = []
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert!(cfg.typednil.include_tests);
        assert!(!cfg.typednil.abspath);
        assert!(!cfg.typednil.skip_generated);
        assert_eq!(cfg.typednil.format, OutputFormat::Plain);
        assert_eq!(cfg.loader.backend, LoaderBackend::Source);
        assert!(cfg.types.interfaces.is_empty());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[typednil]
include_tests = false
skip_generated = true
format = "json"

[loader]
backend = "bridge"
bridge_path = "/opt/bridge"

[types]
interfaces = ["store.Store", "log.Logger"]
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert!(!cfg.typednil.include_tests);
        assert!(cfg.typednil.skip_generated);
        assert_eq!(cfg.typednil.format, OutputFormat::Json);
        assert_eq!(cfg.loader.backend, LoaderBackend::Bridge);
        assert_eq!(cfg.loader.bridge_path.as_deref(), Some("/opt/bridge"));
        assert_eq!(cfg.types.interfaces.len(), 2);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let cfg: Config = toml::from_str("[typednil]\nabspath = true\n").unwrap();
        assert!(cfg.typednil.abspath);
        assert!(cfg.typednil.include_tests);
        assert_eq!(cfg.loader.backend, LoaderBackend::Source);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(toml::from_str::<Config>("[typednil]\nformat = \"xml\"\n").is_err());
    }

    #[test]
    fn test_load_config_no_file() {
        let cfg = load_config(Path::new("/nonexistent/path"));
        assert!(cfg.typednil.include_tests);
    }

    #[test]
    fn test_load_config_invalid_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[typednil\n").unwrap();
        let cfg = load_config(dir.path());
        assert!(cfg.typednil.include_tests);
    }

    #[test]
    fn test_find_config_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), DEFAULT_CONFIG_TOML).unwrap();
        let subdir = dir.path().join("sub");
        std::fs::create_dir(&subdir).unwrap();
        let found = find_config_file(&subdir);
        assert_eq!(found, Some(dir.path().join(CONFIG_FILE_NAME)));
    }

    #[test]
    fn test_default_config_toml_parses() {
        let cfg: Config = toml::from_str(DEFAULT_CONFIG_TOML).unwrap();
        assert!(cfg.typednil.include_tests);
        assert_eq!(cfg.typednil.format, OutputFormat::Plain);
        assert_eq!(cfg.loader.backend, LoaderBackend::Source);
    }
}
