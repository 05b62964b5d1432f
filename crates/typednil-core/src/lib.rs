//! typednil core - configuration, package loading and the check driver.

pub mod bridge;
pub mod config;
pub mod driver;
pub mod loader;

pub use config::{load_config, Config, OutputFormat};
pub use driver::{analyze_input, check_concurrently, CheckError, Checker, PossibleTypedNilErrors};
