use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, ValidationError};
use crate::utils::is_boolean;

/// EDM (Entity Data Model) types accepted in an index schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdmType {
    String,
    StringCollection,
    Boolean,
    Int32,
    Int64,
    Double,
    DateTimeOffset,
    GeographyPoint,
}

impl EdmType {
    pub const ALL: [EdmType; 8] = [
        EdmType::String,
        EdmType::StringCollection,
        EdmType::Boolean,
        EdmType::Int32,
        EdmType::Int64,
        EdmType::Double,
        EdmType::DateTimeOffset,
        EdmType::GeographyPoint,
    ];

    /// Wire name of the type, e.g. `Edm.Int32`
    pub fn as_str(&self) -> &'static str {
        match self {
            EdmType::String => "Edm.String",
            EdmType::StringCollection => "Collection(Edm.String)",
            EdmType::Boolean => "Edm.Boolean",
            EdmType::Int32 => "Edm.Int32",
            EdmType::Int64 => "Edm.Int64",
            EdmType::Double => "Edm.Double",
            EdmType::DateTimeOffset => "Edm.DateTimeOffset",
            EdmType::GeographyPoint => "Edm.GeographyPoint",
        }
    }
}

impl fmt::Display for EdmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdmType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        EdmType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ValidationError::InvalidFieldType(s.to_string()))
    }
}

/// One column of an index schema.
///
/// Built with consuming setters; attributes that were never set are left out
/// of the serialized form so the service applies its own defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexField {
    name: String,
    field_type: EdmType,
    analyzer: Option<String>,
    searchable: Option<bool>,
    filterable: Option<bool>,
    retrievable: Option<bool>,
    sortable: Option<bool>,
    facetable: Option<bool>,
    key: Option<bool>,
}

impl IndexField {
    /// Create a field from its name and EDM type tag (e.g. `"Edm.String"`)
    pub fn new(name: impl Into<String>, type_tag: &str) -> Result<Self> {
        let field_type = type_tag.parse()?;
        Self::with_type(name, field_type)
    }

    /// Create a field from an already parsed EDM type
    pub fn with_type(name: impl Into<String>, field_type: EdmType) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyFieldName);
        }

        Ok(Self {
            name,
            field_type,
            analyzer: None,
            searchable: None,
            filterable: None,
            retrievable: None,
            sortable: None,
            facetable: None,
            key: None,
        })
    }

    /// Build a field from a JSON schema entry such as
    /// `{"name": "id", "type": "Edm.String", "key": true}`.
    ///
    /// Every attribute goes through the same setter a caller would use, so a
    /// schema file gets exactly the checks the builder applies.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            ValidationError::InvalidDefinition("field entry must be a JSON object".to_string())
        })?;

        let name = obj.get("name").and_then(Value::as_str).unwrap_or_default();
        let type_tag = obj.get("type").and_then(Value::as_str).ok_or_else(|| {
            ValidationError::InvalidFieldType(
                obj.get("type").map(|t| t.to_string()).unwrap_or_default(),
            )
        })?;

        let mut field = Self::new(name, type_tag)?;

        for (attr, val) in obj {
            match attr.as_str() {
                "name" | "type" => {}
                "analyzer" => {
                    let analyzer = val.as_str().ok_or_else(|| {
                        ValidationError::InvalidDefinition("analyzer must be a string".to_string())
                    })?;
                    field = field.analyzer(analyzer);
                }
                "searchable" => field = field.searchable(bool_attr(attr, val)?),
                "filterable" => field = field.filterable(bool_attr(attr, val)?),
                "retrievable" => field = field.retrievable(bool_attr(attr, val)?),
                "sortable" => field = field.sortable(bool_attr(attr, val)?),
                "facetable" => field = field.facetable(bool_attr(attr, val)?),
                "key" => field = field.key(bool_attr(attr, val)?)?,
                other => return Err(ValidationError::UnknownAttribute(other.to_string())),
            }
        }

        Ok(field)
    }

    /// Field name as declared in the schema
    pub fn name(&self) -> &str {
        &self.name
    }

    /// EDM type of the field
    pub fn field_type(&self) -> EdmType {
        self.field_type
    }

    /// Whether the field was marked as the document key
    pub fn is_key(&self) -> bool {
        self.key.unwrap_or(false)
    }

    /// Analyzer used for search and indexing
    pub fn analyzer(mut self, analyzer: impl Into<String>) -> Self {
        self.analyzer = Some(analyzer.into());
        self
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = Some(searchable);
        self
    }

    pub fn filterable(mut self, filterable: bool) -> Self {
        self.filterable = Some(filterable);
        self
    }

    pub fn retrievable(mut self, retrievable: bool) -> Self {
        self.retrievable = Some(retrievable);
        self
    }

    pub fn sortable(mut self, sortable: bool) -> Self {
        self.sortable = Some(sortable);
        self
    }

    pub fn facetable(mut self, facetable: bool) -> Self {
        self.facetable = Some(facetable);
        self
    }

    /// Mark the field as the document key. Only `Edm.String` fields can be keys.
    pub fn key(mut self, key: bool) -> Result<Self> {
        if key && self.field_type != EdmType::String {
            return Err(ValidationError::KeyRequiresString {
                field: self.name,
                field_type: self.field_type.to_string(),
            });
        }
        self.key = Some(key);
        Ok(self)
    }

    /// Wire representation: `name`, `type`, then each attribute that was set.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("name".to_string(), Value::from(self.name.clone()));
        map.insert("type".to_string(), Value::from(self.field_type.as_str()));

        if let Some(analyzer) = &self.analyzer {
            map.insert("analyzer".to_string(), Value::from(analyzer.clone()));
        }

        let flags = [
            ("searchable", self.searchable),
            ("filterable", self.filterable),
            ("retrievable", self.retrievable),
            ("sortable", self.sortable),
            ("facetable", self.facetable),
            ("key", self.key),
        ];
        for (attr, flag) in flags {
            if let Some(flag) = flag {
                map.insert(attr.to_string(), Value::Bool(flag));
            }
        }

        map
    }
}

impl Serialize for IndexField {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

fn bool_attr(attr: &str, value: &Value) -> Result<bool> {
    if !is_boolean(value) {
        return Err(ValidationError::NotBoolean(attr.to_string()));
    }
    Ok(value.as_bool().unwrap_or_default())
}
