use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{Result, ValidationError};
use crate::field::IndexField;

/// Suggester attached to an index, used for autocomplete / suggestions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggester {
    pub name: String,
    pub search_mode: String,
    pub source_fields: Vec<String>,
}

impl Suggester {
    pub fn new<I, S>(name: impl Into<String>, source_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            // The only mode the service accepts
            search_mode: "analyzingInfixMatching".to_string(),
            source_fields: source_fields.into_iter().map(Into::into).collect(),
        }
    }
}

/// Schema of an index as sent to the create / update endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub fields: Vec<IndexField>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggesters: Vec<Suggester>,
    /// Other top-level properties (scoringProfiles, corsOptions, ...) passed through as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl IndexDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn field(mut self, field: IndexField) -> Self {
        self.fields.push(field);
        self
    }

    pub fn suggester(mut self, suggester: Suggester) -> Self {
        self.suggesters.push(suggester);
        self
    }

    /// Set `name` to `index_name` unless the definition already carries a
    /// non-empty one
    pub fn with_default_name(mut self, index_name: &str) -> Self {
        if self.name.as_deref().map_or(true, str::is_empty) {
            self.name = Some(index_name.to_string());
        }
        self
    }

    /// The key field, if one was declared
    pub fn key_field(&self) -> Option<&IndexField> {
        self.fields.iter().find(|f| f.is_key())
    }

    /// Parse a definition from JSON, validating every field through
    /// [`IndexField::from_value`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            ValidationError::InvalidDefinition("index definition must be a JSON object".to_string())
        })?;

        let mut definition = IndexDefinition::new();

        for (prop, val) in obj {
            match prop.as_str() {
                "name" => {
                    let name = val.as_str().ok_or_else(|| {
                        ValidationError::InvalidDefinition("name must be a string".to_string())
                    })?;
                    definition.name = Some(name.to_string());
                }
                "fields" => {
                    let fields = val.as_array().ok_or_else(|| {
                        ValidationError::InvalidDefinition("fields must be an array".to_string())
                    })?;
                    definition.fields = fields
                        .iter()
                        .map(IndexField::from_value)
                        .collect::<Result<Vec<_>>>()?;
                }
                "suggesters" => {
                    let suggesters = val.as_array().ok_or_else(|| {
                        ValidationError::InvalidDefinition("suggesters must be an array".to_string())
                    })?;
                    definition.suggesters = suggesters
                        .iter()
                        .map(suggester_from_value)
                        .collect::<Result<Vec<_>>>()?;
                }
                _ => {
                    definition.extra.insert(prop.clone(), val.clone());
                }
            }
        }

        tracing::debug!(
            "Parsed index definition with {} fields, {} suggesters",
            definition.fields.len(),
            definition.suggesters.len()
        );

        Ok(definition)
    }

    /// Load a definition from a JSON schema file
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&contents)?;
        Ok(Self::from_value(&value)?)
    }
}

fn suggester_from_value(value: &Value) -> Result<Suggester> {
    let name = value
        .get("name")
        .and_then(Value::as_str)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ValidationError::InvalidDefinition("suggester requires a name".to_string()))?;

    let source_fields = value
        .get("sourceFields")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ValidationError::InvalidDefinition(format!("suggester '{}' requires sourceFields", name))
        })?
        .iter()
        .map(|f| {
            f.as_str().map(str::to_string).ok_or_else(|| {
                ValidationError::InvalidDefinition("sourceFields must be strings".to_string())
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Suggester::new(name, source_fields))
}
