// Pipeline error taxonomy
// Instrumentation failures are logged and absorbed; only module load
// exhaustion is surfaced to callers, by the loader crate's own error type.

use thiserror::Error;

/// Errors that can occur inside the observability pipeline.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The host exposes no heap-introspection capability
    #[error("heap telemetry is not supported on this platform")]
    UnsupportedPlatform,

    /// A dynamic module import failed after exhausting its retry budget
    #[error("module '{module}' failed to load after {attempts} attempts")]
    LoadFailure {
        /// Logical module name
        module: String,
        /// Attempts made before giving up
        attempts: u32,
    },

    /// The build-stats artifact is missing or corrupt
    #[error("malformed bundle artifact: {0}")]
    MalformedArtifact(String),

    /// Artifact JSON failed to parse
    #[error("bundle artifact parse error: {0}")]
    ArtifactParse(#[from] serde_json::Error),

    /// Unmatched or duplicate profiler calls; absorbed, never propagated
    #[error("profiler misuse: {0}")]
    ProfilerMisuse(String),
}
