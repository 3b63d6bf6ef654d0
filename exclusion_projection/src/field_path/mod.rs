//! Dotted field paths
//!
//! A `FieldPath` is a non-empty sequence of non-empty field names. It is built from
//! dotted strings such as `"a.b.c"` and consumed head-first while the projection
//! tree is being compiled.

mod error;

pub use error::FieldPathError;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Separator between path components
pub const PATH_SEPARATOR: char = '.';

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath {
    components: Vec<String>,
}

impl FieldPath {
    /// Parse field path from dot-separated string
    pub fn parse(path: &str) -> Result<Self, FieldPathError> {
        if path.is_empty() {
            return Err(FieldPathError::EmptyPath);
        }

        let components: Vec<String> = path.split(PATH_SEPARATOR).map(str::to_string).collect();
        if let Some(position) = components.iter().position(String::is_empty) {
            return Err(FieldPathError::empty_component(path, position));
        }

        Ok(Self { components })
    }

    /// Create a single-component field path
    pub fn single(field: &str) -> Result<Self, FieldPathError> {
        if field.is_empty() {
            return Err(FieldPathError::EmptyPath);
        }
        if field.contains(PATH_SEPARATOR) {
            return Err(FieldPathError::separator_in_field_name(field));
        }

        Ok(Self {
            components: vec![field.to_string()],
        })
    }

    /// Check if this is a simple (single component) field path
    pub fn is_simple(&self) -> bool {
        self.components.len() == 1
    }

    /// First component
    pub fn head(&self) -> &str {
        &self.components[0]
    }

    /// Everything after the first component, or None for a simple path
    pub fn tail(&self) -> Option<FieldPath> {
        if self.is_simple() {
            return None;
        }

        Some(Self {
            components: self.components[1..].to_vec(),
        })
    }

    /// Component at `index`
    pub fn field_name(&self, index: usize) -> Option<&str> {
        self.components.get(index).map(String::as_str)
    }

    pub fn components(&self) -> &[String] {
        &self.components
    }

    /// Dotted representation of the whole path
    pub fn full_path(&self) -> String {
        self.components.join(".")
    }

    /// Join a (possibly empty) prefix path and a field name
    pub fn fully_qualified(prefix: &str, field: &str) -> String {
        if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}{}{}", prefix, PATH_SEPARATOR, field)
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.full_path())
    }
}

impl FromStr for FieldPath {
    type Err = FieldPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FieldPath {
    type Error = FieldPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.full_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_dotted_path() {
        let path = FieldPath::parse("a.b.c").unwrap();
        assert_eq!(path.components().len(), 3);
        assert_eq!(path.head(), "a");
        assert_eq!(path.field_name(2), Some("c"));
        assert_eq!(path.full_path(), "a.b.c");
        assert!(!path.is_simple());
    }

    #[test]
    fn test_tail_walks_to_last_component() {
        let path = FieldPath::parse("x.y").unwrap();
        let tail = path.tail().unwrap();
        assert!(tail.is_simple());
        assert_eq!(tail.head(), "y");
        assert!(tail.tail().is_none());
    }

    #[test]
    fn test_numeric_components_are_plain_names() {
        let path = FieldPath::parse("a.1").unwrap();
        assert_eq!(path.components(), &["a".to_string(), "1".to_string()]);
    }

    #[test]
    fn test_rejects_malformed_paths() {
        assert_matches!(FieldPath::parse(""), Err(FieldPathError::EmptyPath));
        assert_matches!(
            FieldPath::parse("a..b"),
            Err(FieldPathError::EmptyComponent { position: 1, .. })
        );
        assert_matches!(
            FieldPath::parse(".a"),
            Err(FieldPathError::EmptyComponent { position: 0, .. })
        );
        assert_matches!(
            FieldPath::single("a.b"),
            Err(FieldPathError::SeparatorInFieldName { .. })
        );
    }

    #[test]
    fn test_fully_qualified() {
        assert_eq!(FieldPath::fully_qualified("", "a"), "a");
        assert_eq!(FieldPath::fully_qualified("a.b", "c"), "a.b.c");
    }

    #[test]
    fn test_serde_as_string() {
        let path: FieldPath = serde_json::from_str("\"a.b\"").unwrap();
        assert_eq!(path.components().len(), 2);
        assert_eq!(serde_json::to_string(&path).unwrap(), "\"a.b\"");
        assert!(serde_json::from_str::<FieldPath>("\"a.\"").is_err());
    }
}
