//! Compiled exclusion projections
//!
//! `ParsedExclusionProjection` compiles a specification such as
//! `{"a": 0, "b.c": false, "d": {"e": 0}}` into an `ExclusionNode` tree once, then
//! applies that tree to any number of documents. The compiled value exposes no
//! mutation, so one instance can be shared across threads without locking.

use super::error::{ProjectionError, ProjectionResult};
use super::node::ExclusionNode;
use super::policy::{ArrayRecursionPolicy, DefaultIdPolicy, ExplainVerbosity};
use super::{Document, ID_FIELD};
use crate::config::compile_time::compile::{MAX_SPEC_DEPTH, MAX_SPEC_FIELDS};
use crate::config::ProjectionPreferences;
use crate::field_path::{FieldPath, PATH_SEPARATOR};
use crate::logging::codes;
use serde_json::Value;
use std::collections::BTreeSet;

/// Bookkeeping shared by every level of one compile
#[derive(Debug, Default)]
struct CompileState {
    id_specified: bool,
    fields_seen: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedExclusionProjection {
    root: ExclusionNode,
    default_id_policy: DefaultIdPolicy,
}

impl ParsedExclusionProjection {
    /// Compile `spec` into an exclusion tree
    pub fn compile(
        spec: &Document,
        default_id_policy: DefaultIdPolicy,
        array_recursion_policy: ArrayRecursionPolicy,
    ) -> ProjectionResult<Self> {
        let mut projection = Self {
            root: ExclusionNode::root(array_recursion_policy),
            default_id_policy,
        };

        let fields_seen = match projection.parse_spec(spec) {
            Ok(fields_seen) => fields_seen,
            Err(error) => {
                crate::log_error!(
                    error.error_code(),
                    "Exclusion projection compile aborted",
                    "error_type" => error.error_type(),
                    "detail" => &error
                );
                return Err(error);
            }
        };

        crate::log_success!(
            codes::success::PROJECTION_COMPILED,
            "Exclusion projection compiled",
            "spec_fields" => fields_seen,
            "nodes" => projection.root.node_count(),
            "default_id_policy" => default_id_policy.as_str(),
            "array_recursion_policy" => array_recursion_policy.as_str()
        );

        Ok(projection)
    }

    /// Compile with policies taken from runtime preferences
    pub fn compile_with_preferences(
        spec: &Document,
        preferences: &ProjectionPreferences,
    ) -> ProjectionResult<Self> {
        let projection = Self::compile(
            spec,
            preferences.default_id_policy,
            preferences.array_recursion_policy,
        )?;

        if preferences.log_compile_details {
            crate::log_info!(
                "Compiled exclusion tree",
                "modified_paths" => projection.modified_paths().len(),
                "explain" => Value::Object(projection.serialize(None))
            );
        }

        Ok(projection)
    }

    /// Compile `spec` into the root, returning how many (field, rule) pairs it held
    fn parse_spec(&mut self, spec: &Document) -> ProjectionResult<usize> {
        let mut state = CompileState::default();
        Self::parse(spec, &mut self.root, 0, &mut state)?;

        // The identifier decision is made once, after the whole spec is scanned
        if !state.id_specified && self.default_id_policy == DefaultIdPolicy::ExcludeId {
            self.root.exclude_path(&FieldPath::single(ID_FIELD)?)?;
        }

        Ok(state.fields_seen)
    }

    /// Compile one level of `spec` into `node`, which sits at nesting `depth`
    fn parse(
        spec: &Document,
        node: &mut ExclusionNode,
        depth: usize,
        state: &mut CompileState,
    ) -> ProjectionResult<()> {
        if depth >= MAX_SPEC_DEPTH {
            return Err(ProjectionError::limit_exceeded(
                "spec_depth",
                depth + 1,
                MAX_SPEC_DEPTH,
            ));
        }

        for (field, rule) in spec {
            state.fields_seen += 1;
            if state.fields_seen > MAX_SPEC_FIELDS {
                return Err(ProjectionError::limit_exceeded(
                    "spec_fields",
                    state.fields_seen,
                    MAX_SPEC_FIELDS,
                ));
            }

            if field.starts_with('$') {
                return Err(ProjectionError::contract_violation(
                    field,
                    "'$'-prefixed keys must be rejected before compiling",
                ));
            }

            let dotted = field.contains(PATH_SEPARATOR);
            if dotted && depth > 0 {
                return Err(ProjectionError::contract_violation(
                    field,
                    "dotted field names are only allowed at the top level",
                ));
            }

            // Only top-level keys address the document identifier
            if depth == 0 && (field == ID_FIELD || field.starts_with("_id.")) {
                state.id_specified = true;
            }

            match rule {
                Value::Bool(_) | Value::Number(_) => {
                    if is_truthy(rule) {
                        if field != ID_FIELD {
                            return Err(ProjectionError::contract_violation(
                                field,
                                "only _id may be included in an exclusion projection",
                            ));
                        }
                    } else {
                        node.exclude_path(&FieldPath::parse(field)?)?;
                    }
                }
                Value::Object(nested) => {
                    let full_path = FieldPath::parse(field)?;
                    let mut child = &mut *node;
                    for component in full_path.components() {
                        child = child.add_or_get_child(&FieldPath::single(component)?)?;
                    }
                    Self::parse(nested, child, depth + 1, state)?;
                }
                other => {
                    return Err(ProjectionError::contract_violation(
                        field,
                        format!("unsupported rule value {}", other),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Project one document
    pub fn apply_projection(&self, document: &Document) -> Document {
        self.root.apply_projection(document)
    }

    /// Explain form of the compiled rules. Every verbosity yields the same shape.
    pub fn serialize(&self, _verbosity: Option<ExplainVerbosity>) -> Document {
        self.root.serialize()
    }

    /// Add every fully-qualified path this projection removes to `modified_paths`
    pub fn add_modified_paths(&self, modified_paths: &mut BTreeSet<String>) {
        self.root.add_modified_paths(modified_paths);
    }

    /// Every fully-qualified path this projection removes
    pub fn modified_paths(&self) -> BTreeSet<String> {
        let mut modified_paths = BTreeSet::new();
        self.add_modified_paths(&mut modified_paths);
        modified_paths
    }

    pub fn root(&self) -> &ExclusionNode {
        &self.root
    }

    pub fn default_id_policy(&self) -> DefaultIdPolicy {
        self.default_id_policy
    }

    pub fn array_recursion_policy(&self) -> ArrayRecursionPolicy {
        self.root.array_recursion_policy()
    }
}

/// Truthiness of a boolean or numeric rule value
fn is_truthy(rule: &Value) -> bool {
    match rule {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        _ => false,
    }
}
