//! typednil check - typed nil return analysis

pub mod analysis;
pub mod lattice;
pub mod merge;
pub mod rules;
pub mod scope;

pub use analysis::{Finding, TypedNilAnalyzer};
