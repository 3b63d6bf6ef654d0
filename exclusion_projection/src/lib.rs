// Internal modules
pub mod batch;
pub mod config;
pub mod field_path;
#[macro_use]
pub mod logging;
pub mod projection;

// Re-export key types for library consumers
pub use batch::{BatchConfig, BatchError, BatchResults};
pub use field_path::{FieldPath, FieldPathError};
pub use projection::{
    ArrayRecursionPolicy, DefaultIdPolicy, Document, ExclusionNode, ExplainVerbosity,
    ParsedExclusionProjection, ProjectionError, ProjectionResult,
};
