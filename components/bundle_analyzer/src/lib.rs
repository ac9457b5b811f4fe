//! Build-artifact bundle composition analysis
//!
//! Parses a build-stats JSON artifact into chunk/module/asset breakdowns,
//! detects duplicate modules, and produces ranked optimization
//! opportunities. A missing or corrupt artifact degrades to a
//! representative mock analysis so dependent tooling keeps functioning.

mod analyzer;
mod artifact;

pub use analyzer::BundleCompositionAnalyzer;
pub use artifact::GZIP_RATIO;
