//! Exclusion tree nodes
//!
//! Each node holds the exclusion rules for one depth of a document: leaf fields to
//! drop and child nodes to descend into. Every operation a parent needs is defined
//! recursively over the children, so a node can be built and exercised on its own.
//!
//! A field name is either excluded or a child at a given node, never both.

use super::error::{ProjectionError, ProjectionResult};
use super::policy::ArrayRecursionPolicy;
use super::Document;
use crate::field_path::FieldPath;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub struct ExclusionNode {
    /// Leaf fields dropped at this level, in insertion order
    excluded_fields: Vec<String>,
    excluded_index: HashSet<String>,
    /// Fields to descend into, in insertion order
    children: Vec<(String, ExclusionNode)>,
    child_index: HashMap<String, usize>,
    path_to_node: String,
    array_recursion_policy: ArrayRecursionPolicy,
}

impl ExclusionNode {
    pub fn new(
        array_recursion_policy: ArrayRecursionPolicy,
        path_to_node: impl Into<String>,
    ) -> Self {
        Self {
            excluded_fields: Vec::new(),
            excluded_index: HashSet::new(),
            children: Vec::new(),
            child_index: HashMap::new(),
            path_to_node: path_to_node.into(),
            array_recursion_policy,
        }
    }

    /// Empty root node
    pub fn root(array_recursion_policy: ArrayRecursionPolicy) -> Self {
        Self::new(array_recursion_policy, "")
    }

    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Record that `path` must be dropped. Excluding the same path twice is a no-op.
    ///
    /// Fails when a component along the way, or the leaf itself, is already on the
    /// other side of the leaf/child split.
    pub fn exclude_path(&mut self, path: &FieldPath) -> ProjectionResult<()> {
        match path.tail() {
            None => {
                let field = path.head();
                if self.child_index.contains_key(field) {
                    return Err(self.collision(field));
                }
                if self.excluded_index.insert(field.to_string()) {
                    self.excluded_fields.push(field.to_string());
                }
                Ok(())
            }
            Some(tail) => self.child_entry(path.head())?.exclude_path(&tail),
        }
    }

    /// Find or create the child for a single-component path
    pub fn add_or_get_child(&mut self, field_path: &FieldPath) -> ProjectionResult<&mut Self> {
        if !field_path.is_simple() {
            return Err(ProjectionError::contract_violation(
                &field_path.full_path(),
                "child nodes are keyed by a single field name",
            ));
        }

        self.child_entry(field_path.head())
    }

    /// Create a new child for `field`, which must not already have one
    pub fn add_child(&mut self, field: &str) -> ProjectionResult<&mut Self> {
        let field_path = FieldPath::single(field)?;
        if self.child_index.contains_key(field_path.head()) {
            return Err(ProjectionError::contract_violation(
                &FieldPath::fully_qualified(&self.path_to_node, field),
                "child node already exists",
            ));
        }
        if self.excluded_index.contains(field) {
            return Err(self.collision(field));
        }

        let index = self.push_child(field);
        Ok(&mut self.children[index].1)
    }

    fn child_entry(&mut self, field: &str) -> ProjectionResult<&mut Self> {
        if self.excluded_index.contains(field) {
            return Err(self.collision(field));
        }

        let index = match self.child_index.get(field) {
            Some(&index) => index,
            None => self.push_child(field),
        };
        Ok(&mut self.children[index].1)
    }

    fn push_child(&mut self, field: &str) -> usize {
        let child = Self::new(
            self.array_recursion_policy,
            FieldPath::fully_qualified(&self.path_to_node, field),
        );
        let index = self.children.len();
        self.children.push((field.to_string(), child));
        self.child_index.insert(field.to_string(), index);
        index
    }

    fn collision(&self, field: &str) -> ProjectionError {
        ProjectionError::contract_violation(
            &FieldPath::fully_qualified(&self.path_to_node, field),
            "field is both excluded and projected into",
        )
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn get_child(&self, field: &str) -> Option<&Self> {
        self.child_index
            .get(field)
            .map(|&index| &self.children[index].1)
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        self.excluded_index.contains(field)
    }

    pub fn excluded_fields(&self) -> impl Iterator<Item = &str> {
        self.excluded_fields.iter().map(String::as_str)
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, &Self)> {
        self.children
            .iter()
            .map(|(name, child)| (name.as_str(), child))
    }

    pub fn path_to_node(&self) -> &str {
        &self.path_to_node
    }

    pub fn array_recursion_policy(&self) -> ArrayRecursionPolicy {
        self.array_recursion_policy
    }

    /// Number of nodes in this subtree, this node included
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|(_, child)| child.node_count())
            .sum::<usize>()
    }

    // ========================================================================
    // APPLICATION
    // ========================================================================

    /// Project `input` into a new document. Surviving fields keep their order.
    pub fn apply_projection(&self, input: &Document) -> Document {
        let mut output = Document::new();

        for (field, value) in input {
            if self.is_excluded(field) {
                continue;
            }

            let projected = match self.get_child(field) {
                Some(child) => child.apply_projection_to_value(value),
                None => value.clone(),
            };
            output.insert(field.clone(), projected);
        }

        output
    }

    /// Apply this node's rules to any value found at its path.
    ///
    /// Array elements are all projected with the same rules; a numeric path
    /// component such as `"1"` names a field, never an array index.
    pub fn apply_projection_to_value(&self, value: &Value) -> Value {
        match value {
            Value::Object(document) => Value::Object(self.apply_projection(document)),
            Value::Array(elements) => Value::Array(
                elements
                    .iter()
                    .map(|element| {
                        let skip = element.is_array()
                            && self.array_recursion_policy
                                == ArrayRecursionPolicy::DoNotRecurseNestedArrays;
                        if skip {
                            element.clone()
                        } else {
                            self.apply_projection_to_value(element)
                        }
                    })
                    .collect(),
            ),
            scalar => scalar.clone(),
        }
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    /// Explain form of the rules: `false` per excluded field, nested documents per child
    pub fn serialize(&self) -> Document {
        let mut output = Document::new();

        for field in &self.excluded_fields {
            output.insert(field.clone(), Value::Bool(false));
        }
        for (field, child) in &self.children {
            output.insert(field.clone(), Value::Object(child.serialize()));
        }

        output
    }

    /// Collect the fully-qualified path of every leaf exclusion in this subtree
    pub fn add_modified_paths(&self, modified_paths: &mut BTreeSet<String>) {
        for field in &self.excluded_fields {
            modified_paths.insert(FieldPath::fully_qualified(&self.path_to_node, field));
        }

        for (_, child) in &self.children {
            child.add_modified_paths(modified_paths);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {}", other),
        }
    }

    fn path(dotted: &str) -> FieldPath {
        FieldPath::parse(dotted).unwrap()
    }

    #[test]
    fn test_exclude_single_field() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        node.exclude_path(&path("a")).unwrap();

        let output = node.apply_projection(&doc(json!({"a": 1, "b": 2})));
        assert_eq!(Value::Object(output), json!({"b": 2}));
    }

    #[test]
    fn test_exclude_path_is_idempotent() {
        let mut once = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        once.exclude_path(&path("a.b")).unwrap();

        let mut twice = once.clone();
        twice.exclude_path(&path("a.b")).unwrap();

        assert_eq!(once, twice);
        assert_eq!(twice.get_child("a").unwrap().excluded_fields().count(), 1);
    }

    #[test]
    fn test_children_carry_path_and_policy() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::DoNotRecurseNestedArrays);
        node.exclude_path(&path("a.b.c")).unwrap();

        let b = node.get_child("a").unwrap().get_child("b").unwrap();
        assert_eq!(b.path_to_node(), "a.b");
        assert_eq!(
            b.array_recursion_policy(),
            ArrayRecursionPolicy::DoNotRecurseNestedArrays
        );
        assert!(b.is_excluded("c"));
        assert_eq!(node.node_count(), 3);
    }

    #[test]
    fn test_add_or_get_child_rejects_dotted_path() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        let result = node.add_or_get_child(&path("a.b"));
        assert_matches!(result, Err(ProjectionError::ContractViolation { .. }));
    }

    #[test]
    fn test_add_or_get_child_reuses_existing_child() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        node.add_or_get_child(&path("a"))
            .unwrap()
            .exclude_path(&path("x"))
            .unwrap();
        node.add_or_get_child(&path("a"))
            .unwrap()
            .exclude_path(&path("y"))
            .unwrap();

        assert_eq!(node.children().count(), 1);
        let fields: Vec<&str> = node.get_child("a").unwrap().excluded_fields().collect();
        assert_eq!(fields, vec!["x", "y"]);
    }

    #[test]
    fn test_add_child_rejects_duplicates() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        assert!(node.add_child("a").is_ok());
        assert_matches!(
            node.add_child("a"),
            Err(ProjectionError::ContractViolation { .. })
        );
        assert_matches!(
            node.add_child("a.b"),
            Err(ProjectionError::InvalidFieldPath(_))
        );
    }

    #[test]
    fn test_surviving_fields_keep_order() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        node.exclude_path(&path("b")).unwrap();
        node.exclude_path(&path("d.x")).unwrap();

        let input = doc(json!({"e": 1, "d": {"y": 1, "x": 2, "w": 3}, "c": 3, "b": 4, "a": 5}));
        let output = node.apply_projection(&input);

        let keys: Vec<&str> = output.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["e", "d", "c", "a"]);
        let inner: Vec<&str> = output["d"]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(inner, vec!["y", "w"]);
    }

    #[test]
    fn test_missing_and_scalar_values_pass_through() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        node.exclude_path(&path("a.b")).unwrap();
        node.exclude_path(&path("missing")).unwrap();

        let scalar = doc(json!({"a": 5, "z": null}));
        assert_eq!(node.apply_projection(&scalar), scalar);

        let absent = doc(json!({"z": "kept"}));
        assert_eq!(node.apply_projection(&absent), absent);
    }

    #[test]
    fn test_input_document_is_not_modified() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        node.exclude_path(&path("a.b")).unwrap();

        let input = doc(json!({"a": {"b": 1, "c": 2}}));
        let snapshot = input.clone();
        let _ = node.apply_projection(&input);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn test_nested_array_policy() {
        let value = json!([{"a": 1, "b": 2}, [{"a": 1, "b": 2}]]);

        let mut skip = ExclusionNode::root(ArrayRecursionPolicy::DoNotRecurseNestedArrays);
        skip.exclude_path(&path("b")).unwrap();
        assert_eq!(
            skip.apply_projection_to_value(&value),
            json!([{"a": 1}, [{"a": 1, "b": 2}]])
        );

        let mut recurse = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        recurse.exclude_path(&path("b")).unwrap();
        assert_eq!(
            recurse.apply_projection_to_value(&value),
            json!([{"a": 1}, [{"a": 1}]])
        );
    }

    #[test]
    fn test_scalars_inside_arrays_are_untouched() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        node.exclude_path(&path("x.b")).unwrap();

        let input = doc(json!({"x": [1, "two", {"b": 3, "c": 4}, null]}));
        let output = node.apply_projection(&input);
        assert_eq!(
            Value::Object(output),
            json!({"x": [1, "two", {"c": 4}, null]})
        );
    }

    #[test]
    fn test_serialize_and_modified_paths() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        node.exclude_path(&path("a")).unwrap();
        node.exclude_path(&path("b.c")).unwrap();
        node.exclude_path(&path("b.d.e")).unwrap();

        assert_eq!(
            Value::Object(node.serialize()),
            json!({"a": false, "b": {"c": false, "d": {"e": false}}})
        );

        let mut modified = BTreeSet::new();
        node.add_modified_paths(&mut modified);
        let expected: BTreeSet<String> = ["a", "b.c", "b.d.e"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(modified, expected);
        assert!(!modified.contains("b"));
        assert!(!modified.contains("b.d"));
    }

    #[test]
    fn test_leaf_and_child_collide() {
        let mut leaf_first = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        leaf_first.exclude_path(&path("a")).unwrap();
        assert_matches!(
            leaf_first.exclude_path(&path("a.b")),
            Err(ProjectionError::ContractViolation { ref field, .. }) if field == "a"
        );
        assert_matches!(
            leaf_first.add_or_get_child(&path("a")),
            Err(ProjectionError::ContractViolation { .. })
        );
        assert_matches!(
            leaf_first.add_child("a"),
            Err(ProjectionError::ContractViolation { .. })
        );

        let mut child_first = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        child_first.exclude_path(&path("x.y.z")).unwrap();
        assert_matches!(
            child_first.exclude_path(&path("x.y")),
            Err(ProjectionError::ContractViolation { ref field, .. }) if field == "x.y"
        );

        // Failed attempts leave the tree untouched
        assert!(leaf_first.get_child("a").is_none());
        assert!(!child_first.get_child("x").unwrap().is_excluded("y"));
    }

    #[test]
    fn test_wide_node_lookup() {
        let mut node = ExclusionNode::root(ArrayRecursionPolicy::RecurseNestedArrays);
        for i in 0..2000 {
            node.exclude_path(&path(&format!("f{}", i))).unwrap();
        }
        node.exclude_path(&path("nested.inner")).unwrap();

        assert!(node.is_excluded("f1999"));
        assert!(!node.is_excluded("f2000"));
        assert_eq!(node.excluded_fields().next(), Some("f0"));
        assert!(node.get_child("nested").unwrap().is_excluded("inner"));
        assert!(node.get_child("f0").is_none());
    }
}
