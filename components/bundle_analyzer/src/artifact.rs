//! Tolerant build-stats artifact model
//!
//! Every field defaults so partial artifacts still parse; classification
//! (vendor chunks, external modules) happens while converting into the
//! shared bundle types.

use perf_types::{AssetInfo, BundleChunk, ModuleInfo};
use serde::Deserialize;

/// Fixed compression heuristic applied when the artifact carries no
/// per-chunk gzip sizes: minified JS typically gzips to ~30%.
pub const GZIP_RATIO: f64 = 0.3;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawStats {
    pub chunks: Vec<RawChunk>,
    pub modules: Vec<RawModule>,
    pub assets: Vec<RawAsset>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawChunk {
    pub name: String,
    pub size: u64,
    pub gzip_size: Option<u64>,
    pub entry: bool,
    pub modules: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawModule {
    pub name: String,
    pub size: u64,
    pub chunks: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawAsset {
    pub name: String,
    pub size: u64,
}

impl RawChunk {
    pub(crate) fn classify(&self, module_sizes: &dyn Fn(&str) -> u64) -> BundleChunk {
        // Best effort: when the artifact omits the chunk size, fall back
        // to the sum of its member module sizes.
        let size = if self.size > 0 {
            self.size
        } else {
            self.modules.iter().map(|m| module_sizes(m)).sum()
        };
        BundleChunk {
            name: self.name.clone(),
            size,
            gzip_size: self
                .gzip_size
                .unwrap_or_else(|| (size as f64 * GZIP_RATIO) as u64),
            is_entry: self.entry,
            is_vendor: self.name.to_lowercase().contains("vendor"),
            modules: self.modules.clone(),
        }
    }
}

impl RawModule {
    pub(crate) fn classify(&self) -> ModuleInfo {
        ModuleInfo {
            name: self.name.clone(),
            size: self.size,
            chunks: self.chunks.clone(),
            is_external: self.name.contains("node_modules"),
        }
    }
}

impl RawAsset {
    pub(crate) fn classify(&self) -> AssetInfo {
        AssetInfo {
            name: self.name.clone(),
            size: self.size,
        }
    }
}
