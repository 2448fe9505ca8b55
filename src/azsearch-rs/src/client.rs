use crate::transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
use crate::{classify, ClientConfig, ClientError, Result};
use azsearch_core::utils::encode_query_string;
use azsearch_core::{
    Document, IndexBatchOperation, IndexDefinition, SearchOptions, ValidationError,
    MAX_BATCH_SIZE,
};
use reqwest::Method;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Azure Search REST API client bound to one index
pub struct SearchIndexClient {
    service_name: String,
    index_name: String,
    api_key: String,
    base_url: String,
    api_version: String,
    batch_size: usize,
    transport: Arc<dyn Transport>,
}

impl SearchIndexClient {
    /// Create a client for `index_name` on the given search service
    pub fn new(
        service_name: impl Into<String>,
        index_name: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self> {
        Self::from_config(&ClientConfig::new(service_name, index_name, api_key))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            service_name: config.service_name.clone(),
            index_name: config.index_name.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url(),
            api_version: config.api_version.clone(),
            batch_size: config.batch_size,
            transport: Arc::new(ReqwestTransport::from_config(config)?),
        })
    }

    /// Send requests through `transport` instead of the default reqwest one
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Point the client at another base URL (proxies, local emulators)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.base_url = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    /// Check whether the index exists
    pub async fn index_exists(&self) -> Result<bool> {
        let response = self
            .send(Method::GET, self.index_definition_url(), None)
            .await?;

        if response.status == 404 {
            return Ok(false);
        }

        classify(response.status, &response.body)?;
        Ok(true)
    }

    /// Create the index; the definition's name defaults to this client's index
    pub async fn create(&self, definition: &IndexDefinition) -> Result<Value> {
        let definition = definition.clone().with_default_name(&self.index_name);
        tracing::info!("Creating index {:?}", definition.name);

        let body = serde_json::to_value(&definition)?;
        let response = self
            .send(Method::POST, self.index_list_url(), Some(body))
            .await?;

        classify(response.status, &response.body)?;
        parse_body(&response.body)
    }

    /// Create the index or update its definition in place.
    ///
    /// Returns `None` when the service answers with an empty body (204).
    pub async fn create_or_update(&self, definition: &IndexDefinition) -> Result<Option<Value>> {
        let definition = definition.clone().with_default_name(&self.index_name);
        tracing::info!("Creating or updating index {:?}", definition.name);

        let body = serde_json::to_value(&definition)?;
        let response = self
            .send(Method::PUT, self.index_definition_url(), Some(body))
            .await?;

        classify(response.status, &response.body)?;

        if response.body.trim().is_empty() {
            return Ok(None);
        }
        parse_body(&response.body).map(Some)
    }

    /// Delete the index. Returns `false` if it did not exist.
    pub async fn delete_index(&self) -> Result<bool> {
        tracing::info!("Deleting index {}", self.index_name);

        let response = self
            .send(Method::DELETE, self.index_definition_url(), None)
            .await?;

        if response.status == 404 {
            return Ok(false);
        }

        classify(response.status, &response.body)?;
        Ok(true)
    }

    /// Index `operations` in chunks of the configured batch size
    pub async fn batch_insert(&self, operations: &[IndexBatchOperation]) -> Result<()> {
        self.batch_insert_chunked(operations, self.batch_size).await
    }

    /// Index `operations` in consecutive chunks of at most `chunk_size`.
    ///
    /// Chunks are sent one after another. A failing chunk stops the call, but
    /// the chunks before it stay applied.
    pub async fn batch_insert_chunked(
        &self,
        operations: &[IndexBatchOperation],
        chunk_size: usize,
    ) -> Result<()> {
        if chunk_size > MAX_BATCH_SIZE {
            return Err(ValidationError::BatchTooLarge {
                requested: chunk_size,
                max: MAX_BATCH_SIZE,
            }
            .into());
        }
        if chunk_size == 0 {
            return Err(ValidationError::InvalidBatchSize.into());
        }

        let total_chunks = operations.len().div_ceil(chunk_size);

        for (i, chunk) in operations.chunks(chunk_size).enumerate() {
            tracing::info!(
                "Indexing batch {}/{} ({} documents) into {}",
                i + 1,
                total_chunks,
                chunk.len(),
                self.index_name
            );

            let body = json!({ "value": chunk });
            let response = self
                .send(Method::POST, self.indexing_url(), Some(body))
                .await?;

            classify(response.status, &response.body)?;
        }

        Ok(())
    }

    /// Search the index for `text`
    pub async fn search(&self, text: &str, options: &SearchOptions) -> Result<Value> {
        let response = self
            .send(Method::GET, self.search_url(text, options), None)
            .await?;

        classify(response.status, &response.body)?;
        parse_body(&response.body)
    }

    /// Fetch a single document by key
    pub async fn lookup(&self, key: &str) -> Result<Document> {
        let response = self
            .send(Method::GET, self.lookup_url(key), None)
            .await?;

        classify(response.status, &response.body)?;

        match parse_body(&response.body)? {
            Value::Object(mut doc) => {
                doc.remove("@odata.context");
                Ok(doc)
            }
            other => Err(ClientError::InvalidResponse(format!(
                "expected a document object, got {}",
                other
            ))),
        }
    }

    async fn send(&self, method: Method, url: String, body: Option<Value>) -> Result<HttpResponse> {
        tracing::debug!("{} {}", method, url);

        let request = HttpRequest {
            method,
            url,
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                ("api-key".to_string(), self.api_key.clone()),
            ],
            body,
        };

        let response = self.transport.execute(request).await?;

        if response.status == 503 {
            tracing::warn!("Search service asked for backoff (503)");
        } else if response.status > 399 && response.status != 404 {
            tracing::warn!("Search service returned status {}", response.status);
        }

        Ok(response)
    }

    fn index_definition_url(&self) -> String {
        format!(
            "{}/indexes/{}?api-version={}",
            self.base_url, self.index_name, self.api_version
        )
    }

    fn index_list_url(&self) -> String {
        format!("{}/indexes?api-version={}", self.base_url, self.api_version)
    }

    fn indexing_url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/index?api-version={}",
            self.base_url, self.index_name, self.api_version
        )
    }

    fn search_url(&self, text: &str, options: &SearchOptions) -> String {
        let mut query = Map::new();
        query.insert("search".to_string(), Value::from(urlencoding::encode(text).into_owned()));
        query.extend(options.to_map());

        format!(
            "{}/indexes/{}/docs?api-version={}&{}",
            self.base_url,
            self.index_name,
            self.api_version,
            encode_query_string(&query)
        )
    }

    fn lookup_url(&self, key: &str) -> String {
        format!(
            "{}/indexes/{}/docs('{}')?api-version={}",
            self.base_url, self.index_name, key, self.api_version
        )
    }
}

fn parse_body(body: &str) -> Result<Value> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every request
    struct RecordingTransport {
        responses: Mutex<Vec<HttpResponse>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl RecordingTransport {
        fn new(responses: Vec<(u16, &str)>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(
                    responses
                        .into_iter()
                        .rev()
                        .map(|(status, body)| HttpResponse {
                            status,
                            body: body.to_string(),
                        })
                        .collect(),
                ),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Transport for RecordingTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
            self.requests.lock().unwrap().push(request);
            Ok(self.responses.lock().unwrap().pop().unwrap_or(HttpResponse {
                status: 200,
                body: String::new(),
            }))
        }
    }

    fn client(transport: Arc<RecordingTransport>) -> SearchIndexClient {
        SearchIndexClient::new("acme", "hotels", "secret")
            .unwrap()
            .with_transport(transport)
    }

    fn doc(id: usize) -> Document {
        json!({ "id": id.to_string() }).as_object().cloned().unwrap()
    }

    #[test]
    fn test_new_requires_identity() {
        assert!(matches!(
            SearchIndexClient::new("", "hotels", "secret"),
            Err(ClientError::Validation(ValidationError::MissingIdentity))
        ));
        assert!(SearchIndexClient::new("acme", "", "secret").is_err());
        assert!(SearchIndexClient::new("acme", "hotels", "").is_err());
    }

    #[test]
    fn test_from_config_keeps_validation_error() {
        let mut config = ClientConfig::new("acme", "hotels", "secret");
        config.batch_size = 5000;

        match SearchIndexClient::from_config(&config) {
            Err(ClientError::Validation(ValidationError::BatchTooLarge { requested, max })) => {
                assert_eq!(requested, 5000);
                assert_eq!(max, MAX_BATCH_SIZE);
            }
            Err(other) => panic!("unexpected error: {other:?}"),
            Ok(_) => panic!("oversized batch accepted"),
        }
    }

    #[tokio::test]
    async fn test_index_exists() {
        let transport = RecordingTransport::new(vec![(200, "{}"), (404, "")]);
        let client = client(transport.clone());

        assert!(client.index_exists().await.unwrap());
        assert!(!client.index_exists().await.unwrap());

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::GET);
        assert_eq!(
            requests[0].url,
            "https://acme.search.windows.net/indexes/hotels?api-version=2016-09-01"
        );
        assert!(requests[0]
            .headers
            .contains(&("api-key".to_string(), "secret".to_string())));
        assert!(requests[0]
            .headers
            .contains(&("Content-Type".to_string(), "application/json".to_string())));
    }

    #[tokio::test]
    async fn test_index_exists_surfaces_errors() {
        let transport = RecordingTransport::new(vec![(503, "try later"), (403, "forbidden")]);
        let client = client(transport);

        let err = client.index_exists().await.unwrap_err();
        assert!(err.is_retriable());
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("try later"));

        let err = client.index_exists().await.unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 403, ref body } if body == "forbidden"));
    }

    #[tokio::test]
    async fn test_create_defaults_name() {
        let transport = RecordingTransport::new(vec![(201, r#"{"name":"hotels","fields":[]}"#)]);
        let client = client(transport.clone());

        let definition = IndexDefinition::new()
            .field(azsearch_core::IndexField::new("id", "Edm.String").unwrap().key(true).unwrap());
        let created = client.create(&definition).await.unwrap();
        assert_eq!(created["name"], json!("hotels"));

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::POST);
        assert_eq!(
            requests[0].url,
            "https://acme.search.windows.net/indexes?api-version=2016-09-01"
        );
        let body = requests[0].body.as_ref().unwrap();
        assert_eq!(body["name"], json!("hotels"));
        assert_eq!(body["fields"][0]["key"], json!(true));
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_name() {
        let transport = RecordingTransport::new(vec![(201, "{}")]);
        let client = client(transport.clone());

        client
            .create(&IndexDefinition::new().named("motels"))
            .await
            .unwrap();
        assert_eq!(transport.requests()[0].body.as_ref().unwrap()["name"], json!("motels"));
    }

    #[tokio::test]
    async fn test_create_or_update() {
        let transport = RecordingTransport::new(vec![(204, ""), (201, r#"{"name":"hotels"}"#)]);
        let client = client(transport.clone());

        assert_eq!(client.create_or_update(&IndexDefinition::new()).await.unwrap(), None);
        assert_eq!(
            client.create_or_update(&IndexDefinition::new()).await.unwrap(),
            Some(json!({"name": "hotels"}))
        );
        assert_eq!(transport.requests()[0].method, Method::PUT);
    }

    #[tokio::test]
    async fn test_create_or_update_fatal() {
        let transport = RecordingTransport::new(vec![(400, "bad field")]);
        let client = client(transport);

        let err = client.create_or_update(&IndexDefinition::new()).await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_delete_index() {
        let transport = RecordingTransport::new(vec![(204, ""), (404, ""), (500, "boom")]);
        let client = client(transport.clone());

        assert!(client.delete_index().await.unwrap());
        assert!(!client.delete_index().await.unwrap());
        assert!(matches!(
            client.delete_index().await,
            Err(ClientError::Server { status: 500, .. })
        ));
        assert_eq!(transport.requests()[0].method, Method::DELETE);
    }

    #[tokio::test]
    async fn test_batch_insert_chunks_sequentially() {
        let transport = RecordingTransport::new(vec![]);
        let client = client(transport.clone());

        let ops: Vec<_> = (0..2500).map(|i| IndexBatchOperation::upload(doc(i))).collect();
        client.batch_insert_chunked(&ops, 1000).await.unwrap();

        let requests = transport.requests();
        let sizes: Vec<usize> = requests
            .iter()
            .map(|r| r.body.as_ref().unwrap()["value"].as_array().unwrap().len())
            .collect();
        assert_eq!(sizes, vec![1000, 1000, 500]);

        assert_eq!(
            requests[0].url,
            "https://acme.search.windows.net/indexes/hotels/docs/index?api-version=2016-09-01"
        );
        let first = &requests[0].body.as_ref().unwrap()["value"][0];
        assert_eq!(first, &json!({"id": "0", "@search.action": "upload"}));
        let last = &requests[2].body.as_ref().unwrap()["value"][499];
        assert_eq!(last["id"], json!("2499"));
    }

    #[tokio::test]
    async fn test_batch_insert_uses_configured_size() {
        let transport = RecordingTransport::new(vec![]);
        let mut config = ClientConfig::new("acme", "hotels", "secret");
        config.batch_size = 2;
        let client = SearchIndexClient::from_config(&config)
            .unwrap()
            .with_transport(transport.clone());

        let ops: Vec<_> = (0..5).map(|i| IndexBatchOperation::delete("id", i.to_string())).collect();
        client.batch_insert(&ops).await.unwrap();

        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_batch_insert_rejects_oversized_chunks() {
        let transport = RecordingTransport::new(vec![]);
        let client = client(transport.clone());

        let err = client.batch_insert_chunked(&[], 1001).await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(ValidationError::BatchTooLarge { requested: 1001, max: 1000 })
        ));
        assert!(client.batch_insert_chunked(&[], 0).await.is_err());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_batch_insert_stops_at_failing_chunk() {
        let transport = RecordingTransport::new(vec![(200, ""), (503, "throttled"), (200, "")]);
        let client = client(transport.clone());

        let ops: Vec<_> = (0..30).map(|i| IndexBatchOperation::upload(doc(i))).collect();
        let err = client.batch_insert_chunked(&ops, 10).await.unwrap_err();

        assert!(err.is_retriable());
        // The first chunk went through, the third was never sent
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_search_url() {
        let transport = RecordingTransport::new(vec![(200, r#"{"value":[]}"#)]);
        let client = client(transport.clone());

        let options = SearchOptions::new()
            .include_count(true)
            .facets(["category", "rating"])
            .top(5);
        let result = client.search("budget hotel", &options).await.unwrap();
        assert_eq!(result, json!({"value": []}));

        assert_eq!(
            transport.requests()[0].url,
            "https://acme.search.windows.net/indexes/hotels/docs?api-version=2016-09-01\
             &search=budget%20hotel&$count=true&facet=category&facet=rating&$top=5"
        );
    }

    #[tokio::test]
    async fn test_search_invalid_json() {
        let transport = RecordingTransport::new(vec![(200, "not json")]);
        let client = client(transport);

        assert!(matches!(
            client.search("*", &SearchOptions::new()).await,
            Err(ClientError::Serialization(_))
        ));
    }

    #[tokio::test]
    async fn test_lookup_strips_odata_context() {
        let transport = RecordingTransport::new(vec![(
            200,
            r#"{"@odata.context":"https://acme/$metadata#docs/$entity","id":"1","name":"Fancy Stay"}"#,
        )]);
        let client = client(transport.clone());

        let doc = client.lookup("1").await.unwrap();
        assert_eq!(Value::Object(doc), json!({"id": "1", "name": "Fancy Stay"}));
        assert_eq!(
            transport.requests()[0].url,
            "https://acme.search.windows.net/indexes/hotels/docs('1')?api-version=2016-09-01"
        );
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_fatal() {
        let transport = RecordingTransport::new(vec![(404, "")]);
        let client = client(transport);

        assert_eq!(client.lookup("nope").await.unwrap_err().status(), Some(404));
    }

    #[tokio::test]
    async fn test_with_endpoint() {
        let transport = RecordingTransport::new(vec![(200, "{}")]);
        let client = client(transport.clone()).with_endpoint("http://localhost:7700/");

        client.index_exists().await.unwrap();
        assert_eq!(
            transport.requests()[0].url,
            "http://localhost:7700/indexes/hotels?api-version=2016-09-01"
        );
    }
}
