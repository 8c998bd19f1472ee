//! Parse results.

use std::collections::BTreeMap;

use crate::Value;

/// Mapping from argument name to resolved value, plus the selected
/// subcommand.
///
/// Produced once per parse and read-only afterward. Arguments that were
/// neither given nor defaulted are absent, as are the arguments of every
/// subcommand that was not selected.
///
/// # Examples
///
/// ```
/// use argspec_core::*;
///
/// let schema = Schema::new("prog")
///     .with_argument(ArgumentSpec::option(&["--model"]).required())
///     .with_subcommand(SubcommandSpec::new("valid"));
///
/// let result = parse(&schema, ["--model", "m.pt", "valid"])
///     .unwrap()
///     .into_result()
///     .unwrap();
/// assert_eq!(result.get_str("model"), Some("m.pt"));
/// assert_eq!(result.subcommand(), Some("valid"));
/// assert_eq!(result.to_json()["command"], "valid");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    dispatch_field: String,
    subcommand: Option<String>,
    values: BTreeMap<String, Value>,
}

impl ParseResult {
    pub(crate) fn new(dispatch_field: &str) -> Self {
        Self {
            dispatch_field: dispatch_field.to_string(),
            subcommand: None,
            values: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub(crate) fn select(&mut self, subcommand: &str) {
        self.subcommand = Some(subcommand.to_string());
    }

    /// Returns the selected subcommand, if any.
    pub fn subcommand(&self) -> Option<&str> {
        self.subcommand.as_deref()
    }

    /// Returns the name under which the subcommand is recorded.
    pub fn dispatch_field(&self) -> &str {
        &self.dispatch_field
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(Value::as_str)
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(Value::as_int)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Iterates over resolved values in name order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flat JSON view: every resolved value plus the dispatch field (`null`
    /// when no subcommand was selected).
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for (name, value) in &self.values {
            let json = serde_json::to_value(value).unwrap_or(serde_json::Value::Null);
            map.insert(name.clone(), json);
        }
        map.insert(
            self.dispatch_field.clone(),
            self.subcommand
                .as_ref()
                .map_or(serde_json::Value::Null, |s| serde_json::Value::String(s.clone())),
        );
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_view_without_subcommand() {
        let mut result = ParseResult::new("command");
        result.insert("model", Value::from("m.pt"));
        result.insert("batchsize", Value::Int(64));

        let json = result.to_json();
        assert_eq!(json["model"], "m.pt");
        assert_eq!(json["batchsize"], 64);
        assert!(json["command"].is_null());
    }

    #[test]
    fn test_typed_getters() {
        let mut result = ParseResult::new("command");
        result.insert("fast", Value::Bool(true));
        result.select("train");

        assert_eq!(result.get_bool("fast"), Some(true));
        assert_eq!(result.get_int("fast"), None);
        assert!(!result.contains("lr"));
        assert_eq!(result.subcommand(), Some("train"));
        assert_eq!(result.values().count(), 1);
    }
}
