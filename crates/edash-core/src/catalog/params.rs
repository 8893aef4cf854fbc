//! Parameter specifications and boundary validation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The value kinds a parameter may declare.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamKind::String => write!(f, "string"),
            ParamKind::Number => write!(f, "number"),
            ParamKind::Boolean => write!(f, "boolean"),
            ParamKind::Object => write!(f, "object"),
            ParamKind::Array => write!(f, "array"),
        }
    }
}

/// One declared parameter of an operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,
}

impl ParamSpec {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            description: None,
            default_value: None,
            allowed: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn allowed(mut self, values: &[&str]) -> Self {
        self.allowed = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    /// Check a supplied value against the declared kind and allowed set.
    ///
    /// Form-style string input is accepted for every kind as long as it
    /// parses into that kind (`"3"` for a number, `"true"` for a boolean,
    /// JSON text for objects and arrays).
    pub fn check(&self, value: &Value) -> Result<()> {
        let kind_ok = match (self.kind, value) {
            (ParamKind::String, Value::String(_) | Value::Number(_) | Value::Bool(_)) => true,
            (ParamKind::Number, Value::Number(_)) => true,
            (ParamKind::Number, Value::String(s)) => s.trim().parse::<f64>().is_ok(),
            (ParamKind::Boolean, Value::Bool(_)) => true,
            (ParamKind::Boolean, Value::String(s)) => s == "true" || s == "false",
            (ParamKind::Object, Value::Object(_)) => true,
            (ParamKind::Object, Value::String(s)) => {
                matches!(serde_json::from_str::<Value>(s), Ok(Value::Object(_)))
            }
            (ParamKind::Array, Value::Array(_)) => true,
            (ParamKind::Array, Value::String(s)) => {
                matches!(serde_json::from_str::<Value>(s), Ok(Value::Array(_)))
            }
            _ => false,
        };

        if !kind_ok {
            return Err(Error::invalid_parameter(
                &self.name,
                format!("expected {}, got {}", self.kind, value),
            ));
        }

        if let Some(allowed) = &self.allowed {
            let rendered = render_value(value).unwrap_or_default();
            if !allowed.iter().any(|a| a == &rendered) {
                return Err(Error::invalid_parameter(
                    &self.name,
                    format!("'{}' is not one of [{}]", rendered, allowed.join(", ")),
                ));
            }
        }

        Ok(())
    }
}

/// Render a JSON value the way it travels in a query string.
///
/// Returns `None` for `null`, which callers drop instead of sending an empty
/// value.
pub fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => Some(other.to_string()),
    }
}

/// Validate `supplied` against `specs`: unknown keys are rejected, supplied
/// values are checked, absent parameters take their default, and a required
/// parameter with neither is an error. `null` counts as absent.
pub fn resolve_params(
    operation: &str,
    specs: &[ParamSpec],
    supplied: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    if let Some(unknown) = supplied.keys().find(|k| !specs.iter().any(|s| &s.name == *k)) {
        return Err(Error::UnknownParameter {
            operation: operation.to_string(),
            name: unknown.clone(),
        });
    }

    let mut resolved = Map::new();
    for spec in specs {
        match supplied.get(&spec.name).filter(|v| !v.is_null()) {
            Some(value) => {
                spec.check(value)?;
                resolved.insert(spec.name.clone(), value.clone());
            }
            None => match &spec.default_value {
                Some(default) => {
                    resolved.insert(spec.name.clone(), default.clone());
                }
                None if spec.required => {
                    return Err(Error::MissingParameter(spec.name.clone()));
                }
                None => {}
            },
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn limit_spec() -> ParamSpec {
        ParamSpec::new("limit", ParamKind::Number)
            .default_value(10)
            .allowed(&["5", "10", "20", "50"])
    }

    #[test]
    fn test_number_accepts_numeric_strings() {
        let spec = ParamSpec::new("page", ParamKind::Number);
        assert!(spec.check(&json!(2)).is_ok());
        assert!(spec.check(&json!("2")).is_ok());
        assert!(spec.check(&json!("two")).is_err());
        assert!(spec.check(&json!(true)).is_err());
    }

    #[test]
    fn test_boolean_accepts_form_values() {
        let spec = ParamSpec::new("has_green_energy", ParamKind::Boolean);
        assert!(spec.check(&json!(true)).is_ok());
        assert!(spec.check(&json!("false")).is_ok());
        assert!(spec.check(&json!("yes")).is_err());
    }

    #[test]
    fn test_object_and_array_accept_json_text() {
        let object = ParamSpec::new("filter", ParamKind::Object);
        assert!(object.check(&json!({"a": 1})).is_ok());
        assert!(object.check(&json!(r#"{"a":1}"#)).is_ok());
        assert!(object.check(&json!("[1]")).is_err());

        let array = ParamSpec::new("ids", ParamKind::Array);
        assert!(array.check(&json!([1, 2])).is_ok());
        assert!(array.check(&json!("[1,2]")).is_ok());
        assert!(array.check(&json!("nope")).is_err());
    }

    #[test]
    fn test_allowed_set_is_enforced() {
        let spec = limit_spec();
        assert!(spec.check(&json!(20)).is_ok());
        assert!(spec.check(&json!("50")).is_ok());

        let err = spec.check(&json!(7)).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
        assert!(err.to_string().contains("not one of"));
    }

    #[test]
    fn test_render_value_drops_null() {
        assert_eq!(render_value(&json!(null)), None);
        assert_eq!(render_value(&json!("x")), Some("x".to_string()));
        assert_eq!(render_value(&json!(3)), Some("3".to_string()));
        assert_eq!(render_value(&json!(false)), Some("false".to_string()));
        assert_eq!(render_value(&json!({"a": 1})), Some(r#"{"a":1}"#.to_string()));
    }

    #[test]
    fn test_resolve_rejects_unknown_keys() {
        let supplied = json!({"limit": 5, "color": "red"});
        let err = resolve_params("offers", &[limit_spec()], supplied.as_object().unwrap())
            .unwrap_err();
        match err {
            Error::UnknownParameter { operation, name } => {
                assert_eq!(operation, "offers");
                assert_eq!(name, "color");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_resolve_applies_defaults_and_required() {
        let specs = vec![
            limit_spec(),
            ParamSpec::new("route", ParamKind::String).required(),
        ];

        let err = resolve_params("offers", &specs, &Map::new()).unwrap_err();
        assert!(matches!(err, Error::MissingParameter(ref name) if name == "route"));

        let supplied = json!({"route": "providers", "limit": null});
        let resolved = resolve_params("offers", &specs, supplied.as_object().unwrap()).unwrap();
        assert_eq!(resolved["limit"], json!(10));
        assert_eq!(resolved["route"], json!("providers"));
    }
}
