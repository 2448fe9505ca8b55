/// Raised while building request models, before anything is sent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Field name is required.")]
    EmptyFieldName,

    #[error("Invalid field type: {0}")]
    InvalidFieldType(String),

    #[error("{0} must be a boolean.")]
    NotBoolean(String),

    #[error("Only Edm.String fields can be keys (field '{field}' is {field_type}).")]
    KeyRequiresString { field: String, field_type: String },

    #[error("Unknown field attribute: {0}")]
    UnknownAttribute(String),

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Invalid search mode: {0} (expected \"any\" or \"all\")")]
    InvalidSearchMode(String),

    #[error("{name} requires an HTML string, got {value:?}")]
    InvalidMarkup { name: &'static str, value: String },

    #[error("Batch request must not exceed {max} documents (got {requested}).")]
    BatchTooLarge { requested: usize, max: usize },

    #[error("Batch size must be at least 1.")]
    InvalidBatchSize,

    #[error("Must provide service_name, index_name and api_key when creating client.")]
    MissingIdentity,

    #[error("Invalid index definition: {0}")]
    InvalidDefinition(String),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
