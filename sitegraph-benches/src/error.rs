//! Benchmark setup error type.

use sitegraph_core::SiteGraphError;

/// Errors that may occur while preparing benchmark inputs.
#[derive(Debug, thiserror::Error)]
pub enum BenchSetupError {
    /// Pipeline configuration or execution failed.
    #[error("sitegraph operation failed: {0}")]
    Core(#[from] SiteGraphError),
    /// A zero value was passed where a non-zero integer was required.
    #[error("expected a non-zero value for {context}")]
    ZeroValue {
        /// The parameter that was unexpectedly zero.
        context: &'static str,
    },
    /// A floating-point parameter was non-finite or out of range.
    #[error("invalid value for {parameter}")]
    InvalidFloatParameter {
        /// The offending parameter.
        parameter: &'static str,
    },
}
