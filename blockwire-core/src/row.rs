// Cell values and row shapes accepted by the block container

use crate::schema::DataType;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// A single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Boolean(bool),
    String(String),
    Binary(Vec<u8>),
    Timestamp(i64),
    Date(i32),
    Json(JsonValue),
    Null,
    Array(Vec<Value>),
}

/// Positional row: one value per schema entry, in schema order.
pub type SequenceRow = Vec<Value>;

/// Keyed row: values looked up by column name.
pub type MappingRow = BTreeMap<String, Value>;

/// Container kind of a row as supplied by a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Mapping,
    Sequence,
}

impl RowKind {
    /// Kind of a dynamic JSON row, or `None` for scalars.
    pub fn of_json(row: &JsonValue) -> Option<RowKind> {
        match row {
            JsonValue::Object(_) => Some(RowKind::Mapping),
            JsonValue::Array(_) => Some(RowKind::Sequence),
            _ => None,
        }
    }
}

impl fmt::Display for RowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKind::Mapping => write!(f, "mapping"),
            RowKind::Sequence => write!(f, "sequence"),
        }
    }
}

/// Short name of a JSON node kind, used in error messages.
pub fn json_kind_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

impl Value {
    /// Natural type of this value. `Null` reports `Nullable(Json)` because it
    /// carries no inner type; arrays report the type of their first element.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int8(_) => DataType::Int8,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::UInt8(_) => DataType::UInt8,
            Value::UInt16(_) => DataType::UInt16,
            Value::UInt32(_) => DataType::UInt32,
            Value::UInt64(_) => DataType::UInt64,
            Value::Float32(_) => DataType::Float32,
            Value::Float64(_) => DataType::Float64,
            Value::Boolean(_) => DataType::Boolean,
            Value::String(_) => DataType::String,
            Value::Binary(_) => DataType::Binary,
            Value::Timestamp(_) => DataType::Timestamp,
            Value::Date(_) => DataType::Date,
            Value::Json(_) => DataType::Json,
            Value::Null => DataType::Nullable(Box::new(DataType::Json)),
            Value::Array(items) => DataType::Array(Box::new(
                items.first().map(Value::data_type).unwrap_or(DataType::Json),
            )),
        }
    }

    /// Whether this value may be stored in a column declared as `data_type`.
    pub fn is_compatible_with(&self, data_type: &DataType) -> bool {
        match (self, data_type) {
            (_, DataType::Json) => true,
            (Value::Null, DataType::Nullable(_)) => true,
            (Value::Null, _) => false,
            (value, DataType::Nullable(inner)) => value.is_compatible_with(inner),
            (Value::Array(items), DataType::Array(inner)) => {
                items.iter().all(|item| item.is_compatible_with(inner))
            }
            (Value::Array(_), _) | (_, DataType::Array(_)) => false,
            (_, DataType::Map(_, _)) => false,
            (value, expected) => value.data_type() == *expected,
        }
    }

    /// Convert a JSON node without a type hint.
    pub fn from_json(json: &JsonValue) -> Value {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Boolean(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt64(u)
                } else {
                    Value::Float64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(_) => Value::Json(json.clone()),
        }
    }

    /// Convert a JSON node into the representation declared by `data_type`.
    /// Falls back to [`Value::from_json`] when the node does not fit, leaving
    /// the mismatch for type checking to report.
    pub fn from_json_typed(json: &JsonValue, data_type: &DataType) -> Value {
        coerce_json(json, data_type).unwrap_or_else(|| Value::from_json(json))
    }

    /// Plain JSON rendering of the value.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Int8(v) => JsonValue::from(*v),
            Value::Int16(v) => JsonValue::from(*v),
            Value::Int32(v) => JsonValue::from(*v),
            Value::Int64(v) => JsonValue::from(*v),
            Value::UInt8(v) => JsonValue::from(*v),
            Value::UInt16(v) => JsonValue::from(*v),
            Value::UInt32(v) => JsonValue::from(*v),
            Value::UInt64(v) => JsonValue::from(*v),
            Value::Float32(v) => JsonValue::from(*v),
            Value::Float64(v) => JsonValue::from(*v),
            Value::Boolean(v) => JsonValue::from(*v),
            Value::String(v) => JsonValue::from(v.as_str()),
            Value::Binary(v) => JsonValue::from(v.clone()),
            Value::Timestamp(v) => JsonValue::from(*v),
            Value::Date(v) => JsonValue::from(*v),
            Value::Json(v) => v.clone(),
            Value::Null => JsonValue::Null,
            Value::Array(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
        }
    }
}

fn coerce_json(json: &JsonValue, data_type: &DataType) -> Option<Value> {
    match data_type {
        DataType::Nullable(inner) => {
            if json.is_null() {
                Some(Value::Null)
            } else {
                coerce_json(json, inner)
            }
        }
        DataType::Json => Some(Value::Json(json.clone())),
        DataType::Int8 => json.as_i64().and_then(|v| i8::try_from(v).ok()).map(Value::Int8),
        DataType::Int16 => json.as_i64().and_then(|v| i16::try_from(v).ok()).map(Value::Int16),
        DataType::Int32 => json.as_i64().and_then(|v| i32::try_from(v).ok()).map(Value::Int32),
        DataType::Int64 => json.as_i64().map(Value::Int64),
        DataType::UInt8 => json.as_u64().and_then(|v| u8::try_from(v).ok()).map(Value::UInt8),
        DataType::UInt16 => json.as_u64().and_then(|v| u16::try_from(v).ok()).map(Value::UInt16),
        DataType::UInt32 => json.as_u64().and_then(|v| u32::try_from(v).ok()).map(Value::UInt32),
        DataType::UInt64 => json.as_u64().map(Value::UInt64),
        DataType::Float32 => json.as_f64().map(|v| Value::Float32(v as f32)),
        DataType::Float64 => json.as_f64().map(Value::Float64),
        DataType::Boolean => json.as_bool().map(Value::Boolean),
        DataType::String => json.as_str().map(|s| Value::String(s.to_string())),
        DataType::Binary => match json {
            JsonValue::String(s) => Some(Value::Binary(s.as_bytes().to_vec())),
            JsonValue::Array(items) => items
                .iter()
                .map(|item| item.as_u64().and_then(|b| u8::try_from(b).ok()))
                .collect::<Option<Vec<u8>>>()
                .map(Value::Binary),
            _ => None,
        },
        DataType::Timestamp => json.as_i64().map(Value::Timestamp),
        DataType::Date => json.as_i64().and_then(|v| i32::try_from(v).ok()).map(Value::Date),
        DataType::Array(inner) => json.as_array().map(|items| {
            Value::Array(items.iter().map(|item| Value::from_json_typed(item, inner)).collect())
        }),
        DataType::Map(_, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_data_type() {
        assert_eq!(Value::Int32(42).data_type(), DataType::Int32);
        assert_eq!(Value::String("test".to_string()).data_type(), DataType::String);
        assert_eq!(Value::Boolean(true).data_type(), DataType::Boolean);
    }

    #[test]
    fn test_compatibility() {
        let nullable_int = DataType::Nullable(Box::new(DataType::Int32));
        assert!(Value::Int32(1).is_compatible_with(&DataType::Int32));
        assert!(Value::Int32(1).is_compatible_with(&nullable_int));
        assert!(Value::Null.is_compatible_with(&nullable_int));
        assert!(!Value::Null.is_compatible_with(&DataType::Int32));
        assert!(!Value::Int64(1).is_compatible_with(&DataType::Int32));
        assert!(Value::String("x".into()).is_compatible_with(&DataType::Json));

        let ints = DataType::Array(Box::new(DataType::Int8));
        assert!(Value::Array(vec![Value::Int8(1), Value::Int8(2)]).is_compatible_with(&ints));
        assert!(!Value::Array(vec![Value::Int8(1), Value::Null]).is_compatible_with(&ints));
        assert!(Value::Array(vec![]).is_compatible_with(&ints));
    }

    #[test]
    fn test_from_json_untyped() {
        assert_eq!(Value::from_json(&json!(null)), Value::Null);
        assert_eq!(Value::from_json(&json!(-3)), Value::Int64(-3));
        assert_eq!(Value::from_json(&json!(u64::MAX)), Value::UInt64(u64::MAX));
        assert_eq!(Value::from_json(&json!(1.5)), Value::Float64(1.5));
        assert_eq!(
            Value::from_json(&json!([1, "a"])),
            Value::Array(vec![Value::Int64(1), Value::String("a".into())])
        );
    }

    #[test]
    fn test_from_json_typed() {
        assert_eq!(Value::from_json_typed(&json!(7), &DataType::Int32), Value::Int32(7));
        assert_eq!(Value::from_json_typed(&json!(7), &DataType::UInt8), Value::UInt8(7));
        assert_eq!(
            Value::from_json_typed(&json!(null), &DataType::Nullable(Box::new(DataType::Int32))),
            Value::Null
        );
        assert_eq!(
            Value::from_json_typed(&json!("ab"), &DataType::Binary),
            Value::Binary(vec![b'a', b'b'])
        );
        // Out of range for Int8: falls back to the untyped conversion
        assert_eq!(Value::from_json_typed(&json!(300), &DataType::Int8), Value::Int64(300));
        assert_eq!(
            Value::from_json_typed(&json!("x"), &DataType::Int32),
            Value::String("x".into())
        );
    }

    #[test]
    fn test_to_json() {
        assert_eq!(Value::Int32(5).to_json(), json!(5));
        assert_eq!(Value::Null.to_json(), json!(null));
        assert_eq!(
            Value::Array(vec![Value::Boolean(true), Value::String("s".into())]).to_json(),
            json!([true, "s"])
        );
    }

    #[test]
    fn test_row_kind_of_json() {
        assert_eq!(RowKind::of_json(&json!({"a": 1})), Some(RowKind::Mapping));
        assert_eq!(RowKind::of_json(&json!([1])), Some(RowKind::Sequence));
        assert_eq!(RowKind::of_json(&json!("not a row")), None);
        assert_eq!(json_kind_name(&json!("not a row")), "string");
    }
}
