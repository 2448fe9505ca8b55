use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// Field injected into every document of an indexing batch.
pub const SEARCH_ACTION: &str = "@search.action";

/// A document as sent to the service: field name to value
pub type Document = Map<String, Value>;

/// Action tag of a batch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Upload,
    Delete,
    Merge,
    MergeOrUpload,
}

impl BatchAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchAction::Upload => "upload",
            BatchAction::Delete => "delete",
            BatchAction::Merge => "merge",
            BatchAction::MergeOrUpload => "mergeOrUpload",
        }
    }
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One document-level mutation in a bulk indexing request.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexBatchOperation {
    Upload(Document),
    Delete { key_name: String, key_value: String },
    Merge(Document),
    MergeOrUpload(Document),
}

impl IndexBatchOperation {
    /// Insert the document, replacing it if the key already exists
    pub fn upload(document: Document) -> Self {
        IndexBatchOperation::Upload(document)
    }

    /// Remove the document whose key field `key_name` equals `key_value`
    pub fn delete(key_name: impl Into<String>, key_value: impl Into<String>) -> Self {
        IndexBatchOperation::Delete {
            key_name: key_name.into(),
            key_value: key_value.into(),
        }
    }

    /// Update the given fields of an existing document
    pub fn merge(document: Document) -> Self {
        IndexBatchOperation::Merge(document)
    }

    /// Merge into an existing document, or upload it if absent
    pub fn merge_or_upload(document: Document) -> Self {
        IndexBatchOperation::MergeOrUpload(document)
    }

    pub fn action(&self) -> BatchAction {
        match self {
            IndexBatchOperation::Upload(_) => BatchAction::Upload,
            IndexBatchOperation::Delete { .. } => BatchAction::Delete,
            IndexBatchOperation::Merge(_) => BatchAction::Merge,
            IndexBatchOperation::MergeOrUpload(_) => BatchAction::MergeOrUpload,
        }
    }

    /// The flat mapping placed in the batch body, action tag included.
    pub fn into_document(self) -> Document {
        let action = self.action();
        match self {
            IndexBatchOperation::Upload(mut doc)
            | IndexBatchOperation::Merge(mut doc)
            | IndexBatchOperation::MergeOrUpload(mut doc) => {
                doc.insert(SEARCH_ACTION.to_string(), Value::from(action.as_str()));
                doc
            }
            IndexBatchOperation::Delete {
                key_name,
                key_value,
            } => {
                let mut doc = Map::new();
                doc.insert(key_name, Value::from(key_value));
                doc.insert(SEARCH_ACTION.to_string(), Value::from(action.as_str()));
                doc
            }
        }
    }
}

impl Serialize for IndexBatchOperation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.clone().into_document().serialize(serializer)
    }
}
