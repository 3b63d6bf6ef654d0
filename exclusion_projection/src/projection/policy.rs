//! Policies fixed when a projection is compiled

use serde::{Deserialize, Serialize};

/// Whether an array found inside an array being projected is itself projected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayRecursionPolicy {
    RecurseNestedArrays,
    DoNotRecurseNestedArrays,
}

impl ArrayRecursionPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArrayRecursionPolicy::RecurseNestedArrays => "recurse_nested_arrays",
            ArrayRecursionPolicy::DoNotRecurseNestedArrays => "do_not_recurse_nested_arrays",
        }
    }
}

/// What happens to `_id` when the specification never mentions it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultIdPolicy {
    IncludeId,
    ExcludeId,
}

impl DefaultIdPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultIdPolicy::IncludeId => "include_id",
            DefaultIdPolicy::ExcludeId => "exclude_id",
        }
    }
}

/// Explain verbosity requested by the caller. Exclusion projections serialize
/// the same way at every level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExplainVerbosity {
    QueryPlanner,
    ExecStats,
    AllPlansExecution,
}
