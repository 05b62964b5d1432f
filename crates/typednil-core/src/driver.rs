//! Check driver: load packages, analyze them concurrently, collect results.

use std::fmt;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use typednil_check::TypedNilAnalyzer;
use typednil_diagnostics::diagnostic::{sort_diagnostics, Diagnostic};
use typednil_diagnostics::source_lines::SourceLines;
use typednil_ir::ir::AnalysisInput;

use crate::bridge::{BridgeError, BridgeLoader};
use crate::config::{Config, LoaderBackend};
use crate::loader::{LoadError, LoadOptions, SourceLoader};

#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    /// Typed nil returns were found; not a failure of the checker itself.
    #[error("{0}")]
    PossibleTypedNil(PossibleTypedNilErrors),
    #[error("no Go files to check")]
    NoGoFiles,
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Every typed nil return found in one run, in report order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PossibleTypedNilErrors(Vec<Diagnostic>);

impl PossibleTypedNilErrors {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.0
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for PossibleTypedNilErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "found {} possible typed nil return(s)", self.0.len())
    }
}

/// Loads packages the configured way and checks them.
#[derive(Debug, Clone)]
pub struct Checker {
    config: Config,
    base_dir: PathBuf,
}

impl Checker {
    pub fn new(config: Config, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            base_dir: base_dir.into(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Check every package selected by `patterns`.
    ///
    /// `Ok(())` means nothing was found.
    pub fn check_packages(&self, patterns: &[String]) -> Result<(), CheckError> {
        let input = self.load(patterns)?;
        analyze_input(&input)
    }

    /// Load packages without checking them.
    pub fn load(&self, patterns: &[String]) -> Result<AnalysisInput, CheckError> {
        let include_tests = self.config.typednil.include_tests;
        let input = match self.config.loader.backend {
            LoaderBackend::Source => {
                let loader = SourceLoader::new(LoadOptions {
                    include_tests,
                    interfaces: self.config.types.interfaces.clone(),
                });
                loader.load(&self.base_dir, patterns)?
            }
            LoaderBackend::Bridge => {
                let bridge = BridgeLoader::new(self.config.loader.bridge_path.as_deref())?;
                let patterns = if patterns.is_empty() {
                    vec![".".to_string()]
                } else {
                    patterns.to_vec()
                };
                let mut input = bridge.load(&self.base_dir, &patterns, include_tests)?;
                if !include_tests {
                    for pkg in &mut input.packages {
                        pkg.files.retain(|f| !f.is_test);
                    }
                }
                input
            }
        };
        Ok(self.drop_generated(input))
    }

    fn drop_generated(&self, mut input: AnalysisInput) -> AnalysisInput {
        if self.config.typednil.skip_generated {
            for pkg in &mut input.packages {
                pkg.files.retain(|f| {
                    if f.is_generated {
                        tracing::debug!(path = %f.path, "skipping generated file");
                    }
                    !f.is_generated
                });
            }
        }
        input
    }
}

/// Check already-loaded packages.
pub fn analyze_input(input: &AnalysisInput) -> Result<(), CheckError> {
    if input.packages.iter().all(|p| p.files.is_empty()) {
        return Err(CheckError::NoGoFiles);
    }
    let diags = check_concurrently(input);
    if diags.is_empty() {
        Ok(())
    } else {
        Err(CheckError::PossibleTypedNil(PossibleTypedNilErrors(diags)))
    }
}

/// Analyze each package on its own thread and return all diagnostics in
/// report order.
pub fn check_concurrently(input: &AnalysisInput) -> Vec<Diagnostic> {
    let found = Mutex::new(Vec::new());

    std::thread::scope(|s| {
        for pkg in &input.packages {
            let found = &found;
            s.spawn(move || {
                tracing::info!(package = %pkg.import_path, functions = pkg.function_count(), "checking");
                let mut lines = SourceLines::new();
                let diags = TypedNilAnalyzer::analyze_package_with_lines(pkg, &mut lines);
                tracing::info!(package = %pkg.import_path, found = diags.len(), "check done");
                found.lock().extend(diags);
            });
        }
    });

    let mut all = found.into_inner();
    sort_diagnostics(&mut all);
    all
}
