use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// REST API version sent with every request
pub const API_VERSION: &str = "2016-09-01";

/// Largest number of documents the service accepts in one indexing request
pub const MAX_BATCH_SIZE: usize = 1000;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub service_name: String,
    #[serde(default)]
    pub index_name: String,
    #[serde(default)]
    pub api_key: String,

    /// Base URL override; defaults to `https://{service_name}.search.windows.net`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Documents per indexing request in `batch_insert`
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub insecure_skip_verify: bool,
}

fn default_api_version() -> String {
    API_VERSION.to_string()
}

fn default_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

impl ClientConfig {
    pub fn new(
        service_name: impl Into<String>,
        index_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            index_name: index_name.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn load(path: &str) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: ClientConfig = serde_json::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.service_name.is_empty() || self.index_name.is_empty() || self.api_key.is_empty() {
            return Err(ValidationError::MissingIdentity);
        }
        if self.batch_size == 0 {
            return Err(ValidationError::InvalidBatchSize);
        }
        if self.batch_size > MAX_BATCH_SIZE {
            return Err(ValidationError::BatchTooLarge {
                requested: self.batch_size,
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(())
    }

    /// Scheme and host every request URL starts with, without a trailing slash
    pub fn base_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.search.windows.net", self.service_name),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            index_name: String::new(),
            api_key: String::new(),
            endpoint: None,
            api_version: default_api_version(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            insecure_skip_verify: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config: ClientConfig = serde_json::from_str(
            r#"{"service_name": "acme", "index_name": "hotels", "api_key": "secret"}"#,
        )
        .unwrap();

        assert_eq!(config.api_version, "2016-09-01");
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.insecure_skip_verify);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url() {
        let mut config = ClientConfig::new("acme", "hotels", "secret");
        assert_eq!(config.base_url(), "https://acme.search.windows.net");

        config.endpoint = Some("http://127.0.0.1:8080/".to_string());
        assert_eq!(config.base_url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_validate() {
        assert_eq!(
            ClientConfig::new("acme", "", "secret").validate(),
            Err(ValidationError::MissingIdentity)
        );

        let mut config = ClientConfig::new("acme", "hotels", "secret");
        config.batch_size = 1001;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::BatchTooLarge { requested: 1001, max: 1000 })
        ));

        config.batch_size = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidBatchSize));
    }
}
