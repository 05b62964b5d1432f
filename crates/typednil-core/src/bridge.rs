//! External type-checker bridge.
//!
//! The bridge is a separate binary (typically written in Go on top of
//! `go/packages`) that loads and type-checks packages and prints the typed
//! AST as JSON on stdout. It is invoked once per run:
//!
//! `<bridge> typecheck --patterns ./...,./cmd [--tests]`
//!
//! Stderr carries logs and type errors; a non-zero exit status fails the run.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use typednil_ir::ir::AnalysisInput;

pub const BRIDGE_ENV: &str = "TYPEDNIL_BRIDGE_PATH";
pub const BRIDGE_BINARY: &str = "typednil-bridge";

/// Errors from the type-checker bridge.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("type-checker bridge not found: {0}")]
    BinaryNotFound(String),
    #[error("failed to spawn type-checker bridge: {0}")]
    SpawnFailed(String),
    #[error("type-checker bridge returned error: {0}")]
    BridgeResponseError(String),
    #[error("failed to read bridge output: {0}")]
    ReadFailed(String),
}

#[derive(Debug, Clone)]
pub struct BridgeLoader {
    binary_path: PathBuf,
}

impl BridgeLoader {
    /// Locate the bridge binary.
    ///
    /// Looks in, in order:
    /// 1. the configured path
    /// 2. `TYPEDNIL_BRIDGE_PATH`
    /// 3. the directory of the current executable
    /// 4. `PATH`
    pub fn new(configured: Option<&str>) -> Result<Self, BridgeError> {
        let binary_path = find_bridge_binary(configured)?;
        tracing::debug!(path = %binary_path.display(), "using type-checker bridge");
        Ok(Self { binary_path })
    }

    pub fn with_binary(path: PathBuf) -> Self {
        Self { binary_path: path }
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    /// One-shot load of `patterns`, resolved relative to `dir`.
    pub fn load(
        &self,
        dir: &Path,
        patterns: &[String],
        include_tests: bool,
    ) -> Result<AnalysisInput, BridgeError> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("typecheck")
            .arg("--patterns")
            .arg(patterns.join(","))
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if include_tests {
            cmd.arg("--tests");
        }

        let output = cmd
            .output()
            .map_err(|e| BridgeError::SpawnFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BridgeError::BridgeResponseError(format!(
                "typecheck exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| BridgeError::ReadFailed(e.to_string()))?;
        if stdout.trim().is_empty() {
            return Err(BridgeError::ReadFailed("bridge returned no data on stdout".into()));
        }
        typednil_ir::from_json(&stdout).map_err(BridgeError::ReadFailed)
    }
}

fn find_bridge_binary(configured: Option<&str>) -> Result<PathBuf, BridgeError> {
    if let Some(path) = configured {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
        return Err(BridgeError::BinaryNotFound(path.display().to_string()));
    }

    if let Ok(path) = std::env::var(BRIDGE_ENV) {
        let path = PathBuf::from(path);
        if path.is_file() {
            return Ok(path);
        }
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            let bridge = dir.join(BRIDGE_BINARY);
            if bridge.is_file() {
                return Ok(bridge);
            }
        }
    }

    if let Some(paths) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&paths) {
            let bridge = dir.join(BRIDGE_BINARY);
            if bridge.is_file() {
                return Ok(bridge);
            }
        }
    }

    Err(BridgeError::BinaryNotFound(format!(
        "{BRIDGE_BINARY} (set [loader] bridge_path or {BRIDGE_ENV})"
    )))
}
