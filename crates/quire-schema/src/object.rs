use std::collections::BTreeMap;

use quire_types::IMAGE_IMPORT_PREFIX;
use serde_json::{Map, Value};

use crate::error::ValidationIssues;
use crate::schema::Schema;

/// Type of a declared field.
#[derive(Clone, Debug)]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array(Box<FieldKind>),
    Object(ObjectSchema),
    /// Any JSON value, passed through untouched.
    Any,
    /// A string image reference, rewritten to an import placeholder.
    Image,
}

impl FieldKind {
    fn name(&self) -> &'static str {
        match self {
            Self::String | Self::Image => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Any => "any",
        }
    }
}

/// A declared field of an [`ObjectSchema`]. Fields are required by default.
#[derive(Clone, Debug)]
pub struct Field {
    pub kind: FieldKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl Field {
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            required: true,
            default: None,
        }
    }

    pub fn string() -> Self {
        Self::new(FieldKind::String)
    }

    pub fn number() -> Self {
        Self::new(FieldKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(FieldKind::Boolean)
    }

    pub fn array(items: FieldKind) -> Self {
        Self::new(FieldKind::Array(Box::new(items)))
    }

    pub fn object(schema: ObjectSchema) -> Self {
        Self::new(FieldKind::Object(schema))
    }

    pub fn any() -> Self {
        Self::new(FieldKind::Any)
    }

    pub fn image() -> Self {
        Self::new(FieldKind::Image)
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Value used when the field is missing or null.
    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }
}

/// Declarative object schema.
///
/// Keys not declared are stripped from the output unless the schema is
/// [`passthrough`](ObjectSchema::passthrough).
#[derive(Clone, Debug, Default)]
pub struct ObjectSchema {
    fields: BTreeMap<String, Field>,
    passthrough: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Keep undeclared keys instead of stripping them.
    pub fn passthrough(mut self) -> Self {
        self.passthrough = true;
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    fn parse_at(&self, path: &str, data: &Value, issues: &mut ValidationIssues) -> Value {
        let Some(mapping) = data.as_object() else {
            issues.push(path, format!("Expected object, received {}", type_name(data)));
            return Value::Null;
        };

        let mut out = Map::new();
        for (name, field) in &self.fields {
            let field_path = join(path, name);
            match mapping.get(name).filter(|v| !v.is_null()) {
                Some(value) => {
                    let parsed = parse_value(&field.kind, &field_path, value, issues);
                    out.insert(name.clone(), parsed);
                }
                None => {
                    if let Some(default) = &field.default {
                        out.insert(name.clone(), default.clone());
                    } else if field.required {
                        issues.push(&field_path, "Required");
                    }
                }
            }
        }

        if self.passthrough {
            for (key, value) in mapping {
                if !self.fields.contains_key(key) {
                    out.insert(key.clone(), value.clone());
                }
            }
        }
        Value::Object(out)
    }
}

impl Schema for ObjectSchema {
    fn parse(&self, data: &Value) -> Result<Value, ValidationIssues> {
        let mut issues = ValidationIssues::default();
        let parsed = self.parse_at("", data, &mut issues);
        if issues.is_empty() {
            Ok(parsed)
        } else {
            Err(issues)
        }
    }
}

fn parse_value(kind: &FieldKind, path: &str, value: &Value, issues: &mut ValidationIssues) -> Value {
    let mismatch = |issues: &mut ValidationIssues| {
        issues.push(
            path,
            format!("Expected {}, received {}", kind.name(), type_name(value)),
        );
        Value::Null
    };

    match kind {
        FieldKind::String if value.is_string() => value.clone(),
        FieldKind::Number if value.is_number() => value.clone(),
        FieldKind::Boolean if value.is_boolean() => value.clone(),
        FieldKind::Any => value.clone(),
        FieldKind::Image => match value.as_str() {
            Some(src) => Value::String(format!("{IMAGE_IMPORT_PREFIX}{src}")),
            None => mismatch(issues),
        },
        FieldKind::Array(items) => match value.as_array() {
            Some(values) => Value::Array(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| parse_value(items, &join(path, &i.to_string()), v, issues))
                    .collect(),
            ),
            None => mismatch(issues),
        },
        FieldKind::Object(schema) => schema.parse_at(path, value, issues),
        _ => mismatch(issues),
    }
}

fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post_schema() -> ObjectSchema {
        ObjectSchema::new()
            .field("title", Field::string())
            .field("draft", Field::boolean().default(json!(false)))
            .field("tags", Field::array(FieldKind::String).optional())
    }

    #[test]
    fn strips_undeclared_keys() {
        let parsed = post_schema()
            .parse(&json!({"id": "p1", "title": "Hello"}))
            .unwrap();
        assert_eq!(parsed, json!({"title": "Hello", "draft": false}));
    }

    #[test]
    fn passthrough_keeps_undeclared_keys() {
        let parsed = post_schema()
            .passthrough()
            .parse(&json!({"id": "p1", "title": "Hello"}))
            .unwrap();
        assert_eq!(parsed["id"], "p1");
    }

    #[test]
    fn missing_required_field() {
        let issues = post_schema().parse(&json!({})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.0[0].path, "title");
        assert_eq!(issues.0[0].message, "Required");
    }

    #[test]
    fn null_counts_as_missing() {
        let parsed = post_schema()
            .parse(&json!({"title": "x", "draft": null}))
            .unwrap();
        assert_eq!(parsed["draft"], false);
    }

    #[test]
    fn collects_every_issue_with_paths() {
        let issues = post_schema()
            .parse(&json!({"title": 3, "tags": ["a", 2]}))
            .unwrap_err();
        let paths: Vec<_> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["tags.1", "title"]);
        assert!(issues.0[1].message.contains("Expected string, received number"));
    }

    #[test]
    fn nested_objects() {
        let schema = ObjectSchema::new().field(
            "author",
            Field::object(ObjectSchema::new().field("name", Field::string())),
        );
        let issues = schema.parse(&json!({"author": {}})).unwrap_err();
        assert_eq!(issues.0[0].path, "author.name");
    }

    #[test]
    fn image_fields_are_prefixed() {
        let schema = ObjectSchema::new().field("cover", Field::image());
        let parsed = schema.parse(&json!({"cover": "./cover.png"})).unwrap();
        assert_eq!(parsed["cover"], "__QUIRE_IMAGE_./cover.png");
    }

    #[test]
    fn root_must_be_object() {
        let issues = post_schema().parse(&json!([1, 2])).unwrap_err();
        assert_eq!(issues.0[0].path, "");
        assert_eq!(issues.0[0].message, "Expected object, received array");
    }
}
