use anyhow::{bail, Context, Result};
use azsearch_rs::{
    ClientConfig, Document, IndexBatchOperation, IndexDefinition, SearchIndexClient, SearchMode,
    SearchOptions,
};
use serde_json::{json, Value};
use std::path::Path;

/// Which batch action `upload` wraps each document in
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum UploadAction {
    Upload,
    Merge,
    MergeOrUpload,
}

impl UploadAction {
    pub fn wrap(self, document: Document) -> IndexBatchOperation {
        match self {
            UploadAction::Upload => IndexBatchOperation::upload(document),
            UploadAction::Merge => IndexBatchOperation::merge(document),
            UploadAction::MergeOrUpload => IndexBatchOperation::merge_or_upload(document),
        }
    }
}

/// Connection settings given on the command line or through the environment
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub service: Option<String>,
    pub index: Option<String>,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
}

/// Load `path` if present, then apply command line overrides
pub fn resolve_config(path: &str, overrides: Overrides) -> Result<ClientConfig> {
    let mut config = if Path::new(path).exists() {
        ClientConfig::load(path).with_context(|| format!("Failed to load {}", path))?
    } else {
        tracing::warn!("{} not found, using defaults", path);
        ClientConfig::default()
    };

    if let Some(service) = overrides.service {
        config.service_name = service;
    }
    if let Some(index) = overrides.index {
        config.index_name = index;
    }
    if let Some(api_key) = overrides.api_key {
        config.api_key = api_key;
    }
    if overrides.endpoint.is_some() {
        config.endpoint = overrides.endpoint;
    }

    Ok(config)
}

/// Read documents from a JSON file holding either an array of objects or a
/// batch body of the form `{"value": [...]}`
pub fn load_documents(path: &str) -> Result<Vec<Document>> {
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let value: Value = serde_json::from_str(&contents)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("value") {
            Some(Value::Array(items)) => items,
            _ => bail!("{} must contain a JSON array or an object with a \"value\" array", path),
        },
        _ => bail!("{} must contain a JSON array or an object with a \"value\" array", path),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(doc) => Ok(doc),
            other => bail!("document #{} is not a JSON object: {}", i, other),
        })
        .collect()
}

pub async fn exists(client: &SearchIndexClient) -> Result<Value> {
    let exists = client.index_exists().await?;
    Ok(json!({ "index": client.index_name(), "exists": exists }))
}

pub async fn create(client: &SearchIndexClient, schema: &str) -> Result<Value> {
    let definition = IndexDefinition::load(schema)?;
    Ok(client.create(&definition).await?)
}

pub async fn create_or_update(client: &SearchIndexClient, schema: &str) -> Result<Value> {
    let definition = IndexDefinition::load(schema)?;
    Ok(client
        .create_or_update(&definition)
        .await?
        .unwrap_or(Value::Null))
}

pub async fn delete_index(client: &SearchIndexClient) -> Result<Value> {
    let deleted = client.delete_index().await?;
    Ok(json!({ "index": client.index_name(), "deleted": deleted }))
}

pub async fn upload(
    client: &SearchIndexClient,
    path: &str,
    action: UploadAction,
    chunk_size: Option<usize>,
) -> Result<Value> {
    let operations: Vec<IndexBatchOperation> = load_documents(path)?
        .into_iter()
        .map(|doc| action.wrap(doc))
        .collect();

    match chunk_size {
        Some(size) => client.batch_insert_chunked(&operations, size).await?,
        None => client.batch_insert(&operations).await?,
    }

    Ok(json!({ "index": client.index_name(), "documents": operations.len() }))
}

pub async fn delete_docs(
    client: &SearchIndexClient,
    key_field: &str,
    keys: &[String],
) -> Result<Value> {
    let operations: Vec<IndexBatchOperation> = keys
        .iter()
        .map(|key| IndexBatchOperation::delete(key_field, key.as_str()))
        .collect();

    client.batch_insert(&operations).await?;
    Ok(json!({ "index": client.index_name(), "deleted": keys.len() }))
}

/// Flags of the `search` subcommand
#[derive(Debug, Default, Clone, clap::Args)]
pub struct SearchArgs {
    /// Text to search for ("*" matches everything)
    pub text: String,

    /// OData filter expression
    #[arg(long)]
    pub filter: Option<String>,

    /// Comma-separated fields to return
    #[arg(long)]
    pub select: Option<String>,

    /// Comma-separated sort expressions
    #[arg(long)]
    pub order_by: Option<String>,

    /// Comma-separated fields to match the text against
    #[arg(long)]
    pub search_fields: Option<String>,

    /// Field to facet by (repeatable)
    #[arg(long = "facet")]
    pub facets: Vec<String>,

    #[arg(long)]
    pub top: Option<u32>,

    #[arg(long)]
    pub skip: Option<u32>,

    /// Include the total match count
    #[arg(long)]
    pub count: bool,

    /// "any" or "all"
    #[arg(long)]
    pub search_mode: Option<String>,

    #[arg(long)]
    pub minimum_coverage: Option<f64>,
}

impl SearchArgs {
    pub fn to_options(&self) -> Result<SearchOptions> {
        let mut options = SearchOptions::new();

        if self.count {
            options = options.include_count(true);
        }
        if let Some(filter) = &self.filter {
            options = options.filter(filter.as_str());
        }
        if let Some(select) = &self.select {
            options = options.select(select.as_str());
        }
        if let Some(order_by) = &self.order_by {
            options = options.order_by(order_by.as_str());
        }
        if let Some(fields) = &self.search_fields {
            options = options.search_fields(fields.as_str());
        }
        if !self.facets.is_empty() {
            options = options.facets(self.facets.iter().map(String::as_str));
        }
        if let Some(top) = self.top {
            options = options.top(top);
        }
        if let Some(skip) = self.skip {
            options = options.skip(skip);
        }
        if let Some(mode) = &self.search_mode {
            options = options.search_mode(mode.parse::<SearchMode>()?);
        }
        if let Some(coverage) = self.minimum_coverage {
            options = options.minimum_coverage(coverage)?;
        }

        Ok(options)
    }
}

pub async fn search(client: &SearchIndexClient, args: &SearchArgs) -> Result<Value> {
    let options = args.to_options()?;
    Ok(client.search(&args.text, &options).await?)
}

pub async fn lookup(client: &SearchIndexClient, key: &str) -> Result<Value> {
    Ok(Value::Object(client.lookup(key).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_config_overrides_file() {
        let file = write_temp(r#"{"service_name": "acme", "index_name": "hotels", "api_key": "k1"}"#);
        let path = file.path().to_str().unwrap();

        let config = resolve_config(
            path,
            Overrides {
                index: Some("motels".to_string()),
                endpoint: Some("http://localhost:7700".to_string()),
                ..Overrides::default()
            },
        )
        .unwrap();

        assert_eq!(config.service_name, "acme");
        assert_eq!(config.index_name, "motels");
        assert_eq!(config.api_key, "k1");
        assert_eq!(config.base_url(), "http://localhost:7700");
    }

    #[test]
    fn test_resolve_config_missing_file() {
        let config = resolve_config(
            "/nonexistent/azsearch.json",
            Overrides {
                service: Some("acme".to_string()),
                ..Overrides::default()
            },
        )
        .unwrap();

        assert_eq!(config.service_name, "acme");
        assert_eq!(config.api_version, "2016-09-01");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_documents() {
        let array = write_temp(r#"[{"id": "1"}, {"id": "2"}]"#);
        assert_eq!(load_documents(array.path().to_str().unwrap()).unwrap().len(), 2);

        let batch = write_temp(r#"{"value": [{"id": "1"}]}"#);
        let docs = load_documents(batch.path().to_str().unwrap()).unwrap();
        assert_eq!(docs[0]["id"], json!("1"));

        let bad = write_temp(r#"[{"id": "1"}, 42]"#);
        assert!(load_documents(bad.path().to_str().unwrap()).is_err());
    }

    #[test]
    fn test_upload_action_wrap() {
        let doc = json!({"id": "1"}).as_object().cloned().unwrap();
        let out = UploadAction::MergeOrUpload.wrap(doc).into_document();
        assert_eq!(out["@search.action"], json!("mergeOrUpload"));
    }

    #[test]
    fn test_search_args_to_options() {
        let args = SearchArgs {
            text: "spa".to_string(),
            filter: Some("rating ge 4".to_string()),
            facets: vec!["category".to_string()],
            top: Some(3),
            count: true,
            search_mode: Some("all".to_string()),
            ..SearchArgs::default()
        };

        let map = args.to_options().unwrap().to_map();
        assert_eq!(map["$filter"], json!("rating ge 4"));
        assert_eq!(map["facet"], json!(["category"]));
        assert_eq!(map["$top"], json!(3));
        assert_eq!(map["$count"], json!(true));
        assert_eq!(map["searchMode"], json!("all"));
    }

    #[test]
    fn test_search_args_rejects_bad_values() {
        let bad_mode = SearchArgs {
            search_mode: Some("some".to_string()),
            ..SearchArgs::default()
        };
        assert!(bad_mode.to_options().is_err());

        let bad_coverage = SearchArgs {
            minimum_coverage: Some(101.0),
            ..SearchArgs::default()
        };
        assert!(bad_coverage.to_options().is_err());
    }
}
