//! # Cadence Values
//!
//! JSON-Cadence wire values and the typed arguments accepted by the
//! operation catalogue.
//!
//! ```text
//! Argument ──to_cadence()──→ CadenceValue ──serde──→ {"type":"UInt64","value":"42"}
//! {"type":"Dictionary",...} ──serde──→ CadenceValue ──to_json()──→ serde_json::Value
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::value_objects::Address;

/// A JSON-Cadence encoded value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum CadenceValue {
    /// No value.
    Void,
    /// Optional wrapper.
    Optional(Option<Box<CadenceValue>>),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    String(String),
    /// Account address in `0x` hex form.
    Address(String),
    /// Arbitrary precision signed integer, decimal string.
    Int(String),
    /// 8-bit unsigned integer, decimal string.
    UInt8(String),
    /// 32-bit unsigned integer, decimal string.
    UInt32(String),
    /// 64-bit unsigned integer, decimal string.
    UInt64(String),
    /// 64-bit signed integer, decimal string.
    Int64(String),
    /// Fixed point number, decimal string.
    UFix64(String),
    /// Variable sized array.
    Array(Vec<CadenceValue>),
    /// Key/value pairs in declaration order.
    Dictionary(Vec<DictionaryEntry>),
    /// Composite struct value.
    Struct(Composite),
    /// Composite resource value (read through a reference).
    Resource(Composite),
}

/// One dictionary entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    /// Entry key.
    pub key: CadenceValue,
    /// Entry value.
    pub value: CadenceValue,
}

/// Composite type payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composite {
    /// Fully qualified type id, e.g. `A.5d572e6f1bd2f5da.Buzz4.Chip`.
    pub id: String,
    /// Field values.
    pub fields: Vec<CompositeField>,
}

/// One composite field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeField {
    /// Field name.
    pub name: String,
    /// Field value.
    pub value: CadenceValue,
}

impl CadenceValue {
    /// Build a dictionary from entries.
    pub fn dictionary<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (CadenceValue, CadenceValue)>,
    {
        Self::Dictionary(
            entries
                .into_iter()
                .map(|(key, value)| DictionaryEntry { key, value })
                .collect(),
        )
    }

    /// Decode into plain JSON the way the client hands results to the UI.
    ///
    /// Integers that fit in 64 bits become JSON numbers. Dictionary keys are
    /// rendered as strings.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Void | Self::Optional(None) => Value::Null,
            Self::Optional(Some(inner)) => inner.to_json(),
            Self::Bool(b) => Value::Bool(*b),
            Self::String(s) | Self::Address(s) | Self::UFix64(s) => Value::String(s.clone()),
            Self::Int(s) | Self::UInt8(s) | Self::UInt32(s) | Self::UInt64(s) | Self::Int64(s) => {
                integer_json(s)
            }
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Dictionary(entries) => Value::Object(
                entries
                    .iter()
                    .map(|entry| (entry.key.key_string(), entry.value.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
            Self::Struct(composite) | Self::Resource(composite) => Value::Object(
                composite
                    .fields
                    .iter()
                    .map(|field| (field.name.clone(), field.value.to_json()))
                    .collect::<Map<String, Value>>(),
            ),
        }
    }

    /// Render a value used as a dictionary key.
    pub fn key_string(&self) -> String {
        match self {
            Self::String(s)
            | Self::Address(s)
            | Self::Int(s)
            | Self::UInt8(s)
            | Self::UInt32(s)
            | Self::UInt64(s)
            | Self::Int64(s)
            | Self::UFix64(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
            other => other.to_json().to_string(),
        }
    }

    /// Name of the JSON-Cadence type tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Void => "Void",
            Self::Optional(_) => "Optional",
            Self::Bool(_) => "Bool",
            Self::String(_) => "String",
            Self::Address(_) => "Address",
            Self::Int(_) => "Int",
            Self::UInt8(_) => "UInt8",
            Self::UInt32(_) => "UInt32",
            Self::UInt64(_) => "UInt64",
            Self::Int64(_) => "Int64",
            Self::UFix64(_) => "UFix64",
            Self::Array(_) => "Array",
            Self::Dictionary(_) => "Dictionary",
            Self::Struct(_) => "Struct",
            Self::Resource(_) => "Resource",
        }
    }
}

fn integer_json(s: &str) -> Value {
    if let Ok(n) = s.parse::<u64>() {
        Value::from(n)
    } else if let Ok(n) = s.parse::<i64>() {
        Value::from(n)
    } else {
        Value::String(s.to_string())
    }
}

/// Declared parameter type in an operation schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// `String`
    String,
    /// `UInt64`
    UInt64,
    /// `Address`
    Address,
    /// `{String: String}`
    StringDictionary,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::UInt64 => "UInt64",
            Self::Address => "Address",
            Self::StringDictionary => "{String: String}",
        };
        f.write_str(name)
    }
}

/// A typed argument value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    /// `String`
    String(String),
    /// `UInt64`
    UInt64(u64),
    /// `Address`
    Address(Address),
    /// `{String: String}`
    StringDictionary(BTreeMap<String, String>),
}

impl Argument {
    /// Declared type of this value.
    pub fn param_type(&self) -> ParamType {
        match self {
            Self::String(_) => ParamType::String,
            Self::UInt64(_) => ParamType::UInt64,
            Self::Address(_) => ParamType::Address,
            Self::StringDictionary(_) => ParamType::StringDictionary,
        }
    }

    /// Encode as a JSON-Cadence value.
    pub fn to_cadence(&self) -> CadenceValue {
        match self {
            Self::String(s) => CadenceValue::String(s.clone()),
            Self::UInt64(n) => CadenceValue::UInt64(n.to_string()),
            Self::Address(a) => CadenceValue::Address(a.to_string()),
            Self::StringDictionary(map) => {
                let string = |s: &String| CadenceValue::String(s.clone());
                CadenceValue::dictionary(map.iter().map(|(k, v)| (string(k), string(v))))
            }
        }
    }

    /// Decode a JSON-Cadence value against an expected type.
    pub fn from_cadence(value: &CadenceValue, expected: ParamType) -> Result<Self, String> {
        match (expected, value) {
            (ParamType::String, CadenceValue::String(s)) => Ok(Self::String(s.clone())),
            (ParamType::UInt64, CadenceValue::UInt64(s)) => s
                .parse()
                .map(Self::UInt64)
                .map_err(|_| format!("UInt64 out of range: {}", s)),
            (ParamType::Address, CadenceValue::Address(s)) => s
                .parse()
                .map(Self::Address)
                .map_err(|e| e.to_string()),
            (ParamType::StringDictionary, CadenceValue::Dictionary(entries)) => {
                let mut map = BTreeMap::new();
                for entry in entries {
                    match (&entry.key, &entry.value) {
                        (CadenceValue::String(k), CadenceValue::String(v)) => {
                            map.insert(k.clone(), v.clone());
                        }
                        (k, v) => {
                            return Err(format!(
                                "expected String: String entry, got {}: {}",
                                k.type_name(),
                                v.type_name()
                            ))
                        }
                    }
                }
                Ok(Self::StringDictionary(map))
            }
            (expected, other) => Err(format!("expected {}, got {}", expected, other.type_name())),
        }
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<u64> for Argument {
    fn from(value: u64) -> Self {
        Self::UInt64(value)
    }
}

impl From<Address> for Argument {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

impl From<BTreeMap<String, String>> for Argument {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::StringDictionary(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uint64_wire_form() {
        let encoded = serde_json::to_value(Argument::UInt64(42).to_cadence()).unwrap();
        assert_eq!(encoded, json!({"type": "UInt64", "value": "42"}));
    }

    #[test]
    fn test_dictionary_wire_form() {
        let mut fields = BTreeMap::new();
        fields.insert("color".to_string(), "red".to_string());
        let cadence = Argument::StringDictionary(fields).to_cadence();
        let encoded = serde_json::to_value(cadence).unwrap();
        assert_eq!(
            encoded,
            json!({
                "type": "Dictionary",
                "value": [
                    {"key": {"type": "String", "value": "color"},
                     "value": {"type": "String", "value": "red"}}
                ]
            })
        );
    }

    #[test]
    fn test_void_has_no_value() {
        let encoded = serde_json::to_value(CadenceValue::Void).unwrap();
        assert_eq!(encoded, json!({"type": "Void"}));
        let decoded: CadenceValue = serde_json::from_value(json!({"type": "Void"})).unwrap();
        assert_eq!(decoded, CadenceValue::Void);
    }

    #[test]
    fn test_result_to_json() {
        let raw = json!({
            "type": "Dictionary",
            "value": [
                {"key": {"type": "String", "value": "name"},
                 "value": {"type": "String", "value": "Alice"}},
                {"key": {"type": "String", "value": "companyId"},
                 "value": {"type": "UInt64", "value": "9"}},
                {"key": {"type": "String", "value": "owner"},
                 "value": {"type": "Optional", "value": null}}
            ]
        });
        let value: CadenceValue = serde_json::from_value(raw).unwrap();
        assert_eq!(
            value.to_json(),
            json!({"name": "Alice", "companyId": 9, "owner": null})
        );
    }

    #[test]
    fn test_struct_to_json() {
        let value = CadenceValue::Struct(Composite {
            id: "A.5d572e6f1bd2f5da.Buzz4.Info".to_string(),
            fields: vec![CompositeField {
                name: "id".to_string(),
                value: CadenceValue::UInt64("3".to_string()),
            }],
        });
        assert_eq!(value.to_json(), json!({"id": 3}));
    }

    #[test]
    fn test_from_cadence_type_mismatch() {
        let err = Argument::from_cadence(&CadenceValue::String("x".into()), ParamType::UInt64)
            .unwrap_err();
        assert!(err.contains("expected UInt64, got String"));
    }

    #[test]
    fn test_from_cadence_dictionary() {
        let mut fields = BTreeMap::new();
        fields.insert("a".to_string(), "b".to_string());
        let arg = Argument::StringDictionary(fields);
        let back = Argument::from_cadence(&arg.to_cadence(), ParamType::StringDictionary).unwrap();
        assert_eq!(back, arg);
    }
}
