//! Exclusion projections
//!
//! Compile once with `ParsedExclusionProjection::compile`, then apply the result to
//! as many documents as needed, from as many threads as needed.

mod error;
mod node;
mod parsed;
mod policy;

pub use error::{ProjectionError, ProjectionResult};
pub use node::ExclusionNode;
pub use parsed::ParsedExclusionProjection;
pub use policy::{ArrayRecursionPolicy, DefaultIdPolicy, ExplainVerbosity};

/// Ordered field-to-value mapping. Field order is part of a document's value.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Name of the document identifier field
pub const ID_FIELD: &str = "_id";
