use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Column type descriptor. The block container treats it as opaque except
/// for cell validation when type checking is enabled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Boolean,
    String,
    Binary,
    Timestamp,
    Date,
    Json,
    Nullable(Box<DataType>),
    Array(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int8 => write!(f, "Int8"),
            DataType::Int16 => write!(f, "Int16"),
            DataType::Int32 => write!(f, "Int32"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::UInt8 => write!(f, "UInt8"),
            DataType::UInt16 => write!(f, "UInt16"),
            DataType::UInt32 => write!(f, "UInt32"),
            DataType::UInt64 => write!(f, "UInt64"),
            DataType::Float32 => write!(f, "Float32"),
            DataType::Float64 => write!(f, "Float64"),
            DataType::Boolean => write!(f, "Boolean"),
            DataType::String => write!(f, "String"),
            DataType::Binary => write!(f, "Binary"),
            DataType::Timestamp => write!(f, "Timestamp"),
            DataType::Date => write!(f, "Date"),
            DataType::Json => write!(f, "Json"),
            DataType::Nullable(inner) => write!(f, "Nullable({})", inner),
            DataType::Array(inner) => write!(f, "Array({})", inner),
            DataType::Map(k, v) => write!(f, "Map({}, {})", k, v),
        }
    }
}

/// One schema entry: a column name and its type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// Ordered column list. Position is significant: it is the column index in
/// block storage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    pub fields: Vec<Field>,
    #[serde(skip)]
    field_map: HashMap<String, usize>,
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Accept either `{"fields": [...]}` or a bare array of fields
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum SchemaHelper {
            Wrapped { fields: Vec<Field> },
            Bare(Vec<Field>),
        }

        let fields = match SchemaHelper::deserialize(deserializer)? {
            SchemaHelper::Wrapped { fields } => fields,
            SchemaHelper::Bare(fields) => fields,
        };

        Schema::try_new(fields).map_err(serde::de::Error::custom)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Schema {
    /// Build a schema. With duplicate names, keyed lookup resolves to the last one.
    pub fn new(fields: Vec<Field>) -> Self {
        let field_map: HashMap<String, usize> = fields
            .iter()
            .enumerate()
            .map(|(idx, field)| (field.name.clone(), idx))
            .collect();

        Self { fields, field_map }
    }

    /// Build a schema, rejecting duplicate column names.
    pub fn try_new(fields: Vec<Field>) -> Result<Self> {
        let mut field_map = HashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if field_map.insert(field.name.clone(), idx).is_some() {
                return Err(Error::Schema(format!(
                    "Duplicate column name: {}",
                    field.name
                )));
            }
        }

        Ok(Self { fields, field_map })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Shorthand for `(name, type)` pairs.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, DataType)>,
        S: Into<String>,
    {
        Self::try_new(
            pairs
                .into_iter()
                .map(|(name, data_type)| Field::new(name, data_type))
                .collect(),
        )
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.field_map.get(name).copied()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.field_index(name).map(|idx| &self.fields[idx])
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_type_display() {
        assert_eq!(DataType::Int32.to_string(), "Int32");
        assert_eq!(
            DataType::Nullable(Box::new(DataType::String)).to_string(),
            "Nullable(String)"
        );
    }

    #[test]
    fn test_schema_creation() {
        let schema = Schema::from_pairs([("id", DataType::Int64), ("name", DataType::String)]).unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.field_index("id"), Some(0));
        assert_eq!(schema.field_index("name"), Some(1));
        assert_eq!(schema.field_index("nonexistent"), None);
        assert_eq!(schema.names().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let result = Schema::from_pairs([("a", DataType::Int32), ("a", DataType::String)]);
        assert!(matches!(result, Err(Error::Schema(_))));
    }

    #[test]
    fn test_schema_deserialize_bare_and_wrapped() {
        let bare: Schema =
            serde_json::from_str(r#"[{"name": "x", "data_type": "Int32"}]"#).unwrap();
        assert_eq!(bare.field_index("x"), Some(0));

        let wrapped: Schema = serde_json::from_str(
            r#"{"fields": [{"name": "x", "data_type": "Int32"}, {"name": "y", "data_type": {"Nullable": "String"}}]}"#,
        )
        .unwrap();
        assert_eq!(wrapped.len(), 2);
        assert_eq!(
            wrapped.field("y").unwrap().data_type,
            DataType::Nullable(Box::new(DataType::String))
        );
    }

    #[test]
    fn test_empty_schema() {
        let schema = Schema::empty();
        assert!(schema.is_empty());
        assert_eq!(schema.field("a"), None);
    }
}
