//! # Variables
//! The values bound to placeholders for one evaluation run.
//!
//! A placeholder is bound either to a single value or to an array of candidate values. Arrays multiply the number of
//! prompts produced by [PromptTemplate::expand](crate::prompt::PromptTemplate::expand); single values do not.
//!
//! In a variable file, the two kinds look like
//!
//! ```json
//! {
//!     "text": {"type": "single", "value": "hello"},
//!     "lang": {"type": "array", "values": ["fr", "es"]}
//! }
//! ```

use std::collections::btree_map;
use std::collections::BTreeMap;
use std::io;
use std::path::Path;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The value or the candidate values bound to one placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VariableSpec {
    Single { value: String },
    Array { values: Vec<String> },
}

impl VariableSpec {
    pub fn single(value: impl Into<String>) -> Self {
        Self::Single { value: value.into() }
    }

    pub fn array<I, S>(values: I) -> Self
        where I: IntoIterator<Item=S>,
              S: Into<String> {
        Self::Array { values: values.into_iter().map(Into::into).collect() }
    }

    /// The candidate values of this spec. A single value is a slice of one.
    pub fn values(&self) -> &[String] {
        match self {
            VariableSpec::Single { value } => std::slice::from_ref(value),
            VariableSpec::Array { values } => values.as_slice(),
        }
    }

    /// Builds a spec from raw rows of a value table: blank rows are dropped, more than one remaining value makes an
    /// array, otherwise a single value (empty when nothing remains).
    pub fn from_rows<I, S>(rows: I) -> Self
        where I: IntoIterator<Item=S>,
              S: Into<String> {
        let mut values: Vec<String> = rows.into_iter()
            .map(Into::into)
            .filter(|v| !v.is_empty())
            .collect();
        if values.len() > 1 {
            Self::Array { values }
        } else {
            Self::Single { value: values.pop().unwrap_or_default() }
        }
    }

    /// Leniently interprets one entry of a variable file.
    ///
    /// * `{"type": "array", "values": [...]}` keeps every element, stringifying non-string ones
    /// * `{"type": "array", "values": {...}}` turns each entry into `"key: <json value>"`, JSON written with `", "` and
    ///   `": "` separators
    /// * `{"type": "single", "value": ...}` keeps the stringified value
    /// * anything else becomes a single value holding its JSON text
    pub fn from_json(value: &Value) -> Self {
        if let Value::Object(object) = value {
            match (object.get("type").and_then(Value::as_str), object.get("values"), object.get("value")) {
                (Some("array"), Some(Value::Array(values)), _) => {
                    return Self::Array { values: values.iter().map(stringify).collect() };
                }
                (Some("array"), Some(Value::Object(entries)), _) => {
                    return Self::Array {
                        values: entries.iter().map(|(k, v)| format!("{}: {}", k, spaced_json(v))).collect(),
                    };
                }
                (Some("single"), _, Some(single)) => return Self::Single { value: stringify(single) },
                _ => {}
            }
        }
        Self::Single { value: spaced_json(value) }
    }
}

/// Compact JSON, except that separators are followed by a space: `{"x": 1, "y": [1, 2]}`.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first { Ok(()) } else { writer.write_all(b", ") }
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b": ")
    }
}

fn spaced_json(value: &Value) -> String {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    match value.serialize(&mut serializer) {
        Ok(()) => String::from_utf8(buffer).unwrap_or_else(|_| value.to_string()),
        Err(_) => value.to_string(),
    }
}

#[inline]
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Mapping from placeholder name to its [VariableSpec], ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variables(BTreeMap<String, VariableSpec>);

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, placeholder: impl Into<String>, spec: VariableSpec) -> &mut Self {
        self.0.insert(placeholder.into(), spec);
        self
    }

    pub fn with(mut self, placeholder: impl Into<String>, spec: VariableSpec) -> Self {
        self.insert(placeholder, spec);
        self
    }

    pub fn get(&self, placeholder: &str) -> Option<&VariableSpec> {
        self.0.get(placeholder)
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.0.contains_key(placeholder)
    }

    pub fn names(&self) -> impl Iterator<Item=&str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, VariableSpec> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drops every variable whose name is not in `placeholders`, warning about each one dropped.
    pub fn retain_placeholders(&mut self, placeholders: &[String]) {
        self.0.retain(|name, _| {
            let keep = placeholders.iter().any(|p| p == name);
            if !keep {
                warn!("Variable `{}` is not used by the prompt template and is ignored", name);
            }
            keep
        });
    }

    /// Parses a variable file. Malformed JSON, or JSON that is not an object, means "no data" and gives `None`.
    pub fn from_json_str(string: &str) -> Option<Self> {
        match serde_json::from_str::<Value>(string) {
            Ok(Value::Object(object)) => Some(Self(
                object.iter()
                    .map(|(name, value)| (name.clone(), VariableSpec::from_json(value)))
                    .collect()
            )),
            Ok(other) => {
                warn!("Variable file must hold a JSON object, got: {}", other);
                None
            }
            Err(e) => {
                warn!("Ignoring malformed variable file: {}", e);
                None
            }
        }
    }

    /// Reads a variable file. I/O failures are errors, malformed content is `Ok(None)`.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Option<Self>> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&content))
    }
}

impl FromIterator<(String, VariableSpec)> for Variables {
    fn from_iter<T: IntoIterator<Item=(String, VariableSpec)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Variables {
    type Item = (&'a String, &'a VariableSpec);
    type IntoIter = btree_map::Iter<'a, String, VariableSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod test_variables {
    use serde_json::json;
    use super::{Variables, VariableSpec};

    #[test]
    fn test_typed_round_trip_shape() {
        let spec: VariableSpec = serde_json::from_value(json!({"type": "array", "values": ["fr", "es"]})).unwrap();
        assert_eq!(VariableSpec::array(["fr", "es"]), spec);
        let spec: VariableSpec = serde_json::from_value(json!({"type": "single", "value": "hello"})).unwrap();
        assert_eq!(VariableSpec::single("hello"), spec);
        assert_eq!(json!({"type": "single", "value": "hi"}), serde_json::to_value(VariableSpec::single("hi")).unwrap());
    }

    #[test]
    fn test_lenient_json() {
        assert_eq!(VariableSpec::array(["1", "two", "true"]),
                   VariableSpec::from_json(&json!({"type": "array", "values": [1, "two", true]})));
        assert_eq!(VariableSpec::array(["a: {\"x\": 1, \"z\": [1, 2]}", "b: \"y\""]),
                   VariableSpec::from_json(&json!({"type": "array", "values": {"a": {"x": 1, "z": [1, 2]}, "b": "y"}})));
        assert_eq!(VariableSpec::single("42"), VariableSpec::from_json(&json!({"type": "single", "value": 42})));
        assert_eq!(VariableSpec::single("[1, 2]"), VariableSpec::from_json(&json!([1, 2])));
        assert_eq!(VariableSpec::single("\"plain\""), VariableSpec::from_json(&json!("plain")));
    }

    #[test]
    fn test_from_rows() {
        assert_eq!(VariableSpec::array(["a", "b"]), VariableSpec::from_rows(["a", "", "b"]));
        assert_eq!(VariableSpec::single("a"), VariableSpec::from_rows(["", "a"]));
        assert_eq!(VariableSpec::single(""), VariableSpec::from_rows(Vec::<String>::new()));
    }

    #[test]
    fn test_malformed_file_is_no_data() {
        assert!(Variables::from_json_str("{not json").is_none());
        assert!(Variables::from_json_str("[1, 2]").is_none());
        let variables = Variables::from_json_str(r#"{"lang": {"type": "array", "values": ["fr", "es"]}}"#).unwrap();
        assert_eq!(Some(&VariableSpec::array(["fr", "es"])), variables.get("lang"));
    }

    #[test]
    fn test_retain_placeholders() {
        let mut variables = Variables::new()
            .with("a", VariableSpec::single("1"))
            .with("unused", VariableSpec::single("2"));
        variables.retain_placeholders(&["a".to_string()]);
        assert_eq!(vec!["a"], variables.names().collect::<Vec<_>>());
    }
}
