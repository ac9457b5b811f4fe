//! Bundle composition analysis types

use serde::{Deserialize, Serialize};

use crate::render::Impact;

/// A deliverable unit of bundled code from the build process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleChunk {
    /// Chunk name as emitted by the bundler
    pub name: String,
    /// Uncompressed size in bytes
    pub size: u64,
    /// Compressed size in bytes (estimated when the artifact omits it)
    pub gzip_size: u64,
    /// Whether this chunk is an entry point
    pub is_entry: bool,
    /// Whether this chunk holds third-party vendor code
    pub is_vendor: bool,
    /// Names of member modules
    pub modules: Vec<String>,
}

/// A single module inside the bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleInfo {
    /// Module path or name
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Chunks containing this module
    pub chunks: Vec<String>,
    /// Whether the module comes from an external package
    pub is_external: bool,
}

/// A non-code asset emitted by the build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetInfo {
    /// Asset file name
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

/// Aggregate figures over the whole artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleSummary {
    /// Sum of chunk sizes in bytes
    pub total_size: u64,
    /// Sum of compressed chunk sizes in bytes
    pub estimated_gzip_size: u64,
    /// Sum of vendor chunk sizes in bytes
    pub vendor_size: u64,
    /// Sum of non-vendor chunk sizes in bytes
    pub app_size: u64,
    /// Name of the largest chunk
    pub largest_chunk: Option<String>,
    /// Number of chunks
    pub chunk_count: usize,
    /// Number of modules
    pub module_count: usize,
}

/// Category of a ranked optimization opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptimizationKind {
    /// A chunk is large enough to be worth splitting
    ChunkSplitting,
    /// The vendor aggregate is oversized
    VendorOptimization,
    /// The artifact compresses poorly
    Compression,
    /// A large external module may carry unused exports
    TreeShaking,
    /// A large non-entry chunk could be deferred
    LazyLoading,
}

/// One ranked optimization opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationOpportunity {
    /// Opportunity category
    pub kind: OptimizationKind,
    /// Estimated impact
    pub impact: Impact,
    /// Rough size saving in bytes if acted on
    pub size_saving: u64,
    /// Human-readable description
    pub description: String,
}

/// Full analysis output of one build artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleAnalysis {
    /// Aggregate figures
    pub summary: BundleSummary,
    /// Per-chunk breakdown
    pub chunks: Vec<BundleChunk>,
    /// Modules present in more than one chunk
    pub duplicate_modules: Vec<String>,
    /// Ranked opportunities, high impact first
    pub opportunities: Vec<OptimizationOpportunity>,
    /// True when no artifact was reachable and a representative mock was used
    pub is_fallback: bool,
}
