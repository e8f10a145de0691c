//! Template Tree: the dashboard template held as a generic JSON value.
//!
//! The template is expected to look like
//! {
//!   "title": "...",
//!   "rows": [
//!     { "panels": [ { "datasource": ..., "targets": [ { "azureMonitor": {...} } ] } ] }
//!   ]
//! }
//!
//! Only the top-level object shape is checked at load time. Deeper shape checks
//! happen while the dashboard is specialized, through the accessors below, which
//! report the JSON path of the first mismatch instead of panicking.

use crate::Result;
use crate::diagnostics;

use anyhow::Context;
use serde_json::{Map, Value};
use std::fs;
use thiserror::Error;

/// Path of the document root in error messages.
pub const ROOT_PATH: &str = "$";

/// Structural mismatch between the template and the expected dashboard shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("missing field '{field}' at {path}")]
    MissingField { path: String, field: String },

    #[error("expected {expected} at {path}, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Owned dashboard template. The root is always a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateTree {
    root: Map<String, Value>,
}

impl TemplateTree {
    /// Parse template text. Malformed JSON or a non-object root is an error.
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .with_context(|| diagnostics::error_message("error parsing template"))?;
        Ok(Self::from_value(value)?)
    }

    /// Read and parse a template file.
    pub fn load(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| diagnostics::error_message(format!("read template file {}", path)))?;
        Self::parse(&text)
            .with_context(|| diagnostics::error_message(format!("load template {}", path)))
    }

    pub fn from_value(value: Value) -> std::result::Result<Self, ShapeError> {
        match value {
            Value::Object(root) => Ok(Self { root }),
            other => Err(ShapeError::WrongType {
                path: ROOT_PATH.to_string(),
                expected: "object",
                found: kind_of(&other),
            }),
        }
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.root
    }

    /// Serialize as pretty-printed JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(&self.root)?;
        out.push('\n');
        Ok(out)
    }

    pub fn write(&self, path: &str) -> Result<()> {
        let json = self.to_pretty_json()?;
        fs::write(path, json)
            .with_context(|| diagnostics::error_message(format!("write dashboard {}", path)))
    }
}

impl From<TemplateTree> for Value {
    fn from(tree: TemplateTree) -> Self {
        Value::Object(tree.root)
    }
}

/// Human-readable kind of a JSON value, used in shape errors.
pub fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub fn child_path(path: &str, key: &str) -> String {
    format!("{}.{}", path, key)
}

pub fn index_path(path: &str, index: usize) -> String {
    format!("{}[{}]", path, index)
}

pub fn field<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> std::result::Result<&'a Value, ShapeError> {
    map.get(key).ok_or_else(|| ShapeError::MissingField {
        path: path.to_string(),
        field: key.to_string(),
    })
}

pub fn field_mut<'a>(
    map: &'a mut Map<String, Value>,
    key: &str,
    path: &str,
) -> std::result::Result<&'a mut Value, ShapeError> {
    map.get_mut(key).ok_or_else(|| ShapeError::MissingField {
        path: path.to_string(),
        field: key.to_string(),
    })
}

pub fn as_object<'a>(
    value: &'a Value,
    path: &str,
) -> std::result::Result<&'a Map<String, Value>, ShapeError> {
    value.as_object().ok_or_else(|| wrong_type(path, "object", value))
}

pub fn as_object_mut<'a>(
    value: &'a mut Value,
    path: &str,
) -> std::result::Result<&'a mut Map<String, Value>, ShapeError> {
    let found = kind_of(value);
    value.as_object_mut().ok_or_else(|| ShapeError::WrongType {
        path: path.to_string(),
        expected: "object",
        found,
    })
}

pub fn as_array<'a>(
    value: &'a Value,
    path: &str,
) -> std::result::Result<&'a Vec<Value>, ShapeError> {
    value.as_array().ok_or_else(|| wrong_type(path, "array", value))
}

pub fn as_array_mut<'a>(
    value: &'a mut Value,
    path: &str,
) -> std::result::Result<&'a mut Vec<Value>, ShapeError> {
    let found = kind_of(value);
    value.as_array_mut().ok_or_else(|| ShapeError::WrongType {
        path: path.to_string(),
        expected: "array",
        found,
    })
}

fn wrong_type(path: &str, expected: &'static str, value: &Value) -> ShapeError {
    ShapeError::WrongType {
        path: path.to_string(),
        expected,
        found: kind_of(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn parses_object_template() {
        let tree = TemplateTree::parse(r#"{"title": "t", "rows": []}"#).unwrap();
        assert_eq!(Value::from(tree), json!({"title": "t", "rows": []}));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = TemplateTree::parse(r#"{"title": "t", "rows": ["#).unwrap_err();
        assert!(format!("{:#}", err).contains("error parsing template"));
    }

    #[test]
    fn rejects_non_object_root() {
        let err = TemplateTree::parse("[1, 2]").unwrap_err();
        let shape = err.downcast_ref::<ShapeError>().unwrap();
        assert_eq!(
            shape,
            &ShapeError::WrongType {
                path: "$".to_string(),
                expected: "object",
                found: "array",
            }
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.json");
        let err = TemplateTree::load(path.to_str().unwrap()).unwrap_err();
        assert!(format!("{:#}", err).contains("read template file"));
    }

    #[test]
    fn load_and_write_preserve_key_order() {
        let mut src = tempfile::NamedTempFile::new().unwrap();
        write!(src, r#"{{"title": "t", "rows": [], "editable": true}}"#).unwrap();
        let tree = TemplateTree::load(src.path().to_str().unwrap()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.json");
        tree.write(out.to_str().unwrap()).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        assert!(text.contains("\"editable\""));
        assert!(text.find("\"title\"") < text.find("\"rows\""));
        assert!(text.find("\"rows\"") < text.find("\"editable\""));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn accessors_report_paths() {
        let mut value = json!({"rows": 3});
        let map = as_object_mut(&mut value, ROOT_PATH).unwrap();
        let rows_path = child_path(ROOT_PATH, "rows");
        let rows = field_mut(map, "rows", ROOT_PATH).unwrap();
        assert_eq!(
            as_array_mut(rows, &rows_path).unwrap_err().to_string(),
            "expected array at $.rows, found number"
        );

        let map = as_object(&value, ROOT_PATH).unwrap();
        assert_eq!(
            field(map, "panels", &index_path(&rows_path, 0))
                .unwrap_err()
                .to_string(),
            "missing field 'panels' at $.rows[0]"
        );
    }
}
