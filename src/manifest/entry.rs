//! Named entry decoding
//!
//! Manifests spell named records as one-key maps:
//!
//! ```yaml
//! - users:
//!     collection: users
//!     file: data/users.json
//! ```
//!
//! [`NamedEntry::decode`] enforces the one-key rule once, so the validators
//! only ever see a name and its fields.

use serde_yaml::{Mapping, Value};

use crate::common::{EntryKind, Error, Result};

/// A one-key map decoded into its name and field mapping
#[derive(Debug, Clone, PartialEq)]
pub struct NamedEntry {
    pub kind: EntryKind,
    /// List position the entry was decoded from, e.g. `global.data[2]`
    pub position: String,
    pub name: String,
    pub fields: Mapping,
}

impl NamedEntry {
    /// Decode a list element found at `position` (e.g. `global.data[2]`)
    pub fn decode(value: &Value, kind: EntryKind, position: &str) -> Result<Self> {
        let map = value.as_mapping().ok_or_else(|| {
            Error::shape(
                position,
                format!("expected a {kind} written as `name: {{ ... }}`"),
            )
        })?;

        if map.len() != 1 {
            let keys: Vec<String> = map.keys().filter_map(scalar_string).collect();
            return Err(Error::shape(
                position,
                format!(
                    "multiple keys ({}); all {kind}s should have a single key",
                    if keys.is_empty() {
                        "none".to_string()
                    } else {
                        keys.join(", ")
                    }
                ),
            ));
        }

        let Some((key, body)) = map.iter().next() else {
            return Err(Error::shape(position, "multiple keys"));
        };
        let name = scalar_string(key)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::shape(position, format!("the {kind} name must be a string")))?;

        let fields = match body {
            Value::Mapping(fields) => fields.clone(),
            // `- users:` with nothing below; reported field by field
            Value::Null => Mapping::new(),
            _ => {
                return Err(Error::shape(
                    format!("{position}.{name}"),
                    format!("the {kind} {name} must be a mapping of fields"),
                ))
            }
        };

        Ok(Self {
            kind,
            position: position.to_string(),
            name,
            fields,
        })
    }

    /// Look up a field, treating an explicit `null` as absent
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// A required scalar field rendered as a string
    pub fn required_string(&self, key: &'static str) -> Result<String> {
        let value = self
            .field(key)
            .ok_or_else(|| Error::missing_field(self.kind, &self.name, key))?;
        self.expect_string(key, value)
    }

    /// An optional scalar field rendered as a string
    pub fn optional_string(&self, key: &'static str) -> Result<Option<String>> {
        self.field(key)
            .map(|value| self.expect_string(key, value))
            .transpose()
    }

    fn expect_string(&self, key: &str, value: &Value) -> Result<String> {
        scalar_string(value).ok_or_else(|| {
            Error::shape(
                format!("{}.{}.{}", self.position, self.name, key),
                format!("{}.{} must be a string", self.name, key),
            )
        })
    }
}

/// Render a YAML scalar as a string; `None` for mappings, sequences and null
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_string(&tagged.value),
        _ => None,
    }
}
