//! HTTP-backed service
//!
//! Each method maps to `POST {endpoint}/{method}` with the merged request
//! parameters as the JSON body. The JSON response is handed back untouched;
//! entity extraction happens in the data fetcher.

use crate::source::descriptor::ServiceApi;
use crate::source::error::{EngineError, EngineResult};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde_json::Value;
use std::collections::HashSet;

/// Service calling a JSON-over-HTTP API
#[derive(Debug, Clone)]
pub struct HttpService {
    endpoint: String,
    client: reqwest::Client,
    methods: Option<HashSet<String>>,
}

impl HttpService {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            methods: None,
        }
    }

    /// Restrict the methods this service advertises
    ///
    /// Without a restriction every method name is accepted.
    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }
}

#[async_trait::async_trait]
impl ServiceApi for HttpService {
    fn has_method(&self, method: &str) -> bool {
        self.methods
            .as_ref()
            .map_or(true, |methods| methods.contains(method))
    }

    async fn call(&self, method: &str, params: Value) -> EngineResult<Value> {
        let fetch_error = |cause: String| EngineError::Fetch {
            api: method.to_string(),
            cause,
        };

        let body = serde_json::to_vec(&params).map_err(|e| fetch_error(e.to_string()))?;
        log::debug!("HttpService: POST {}", self.method_url(method));

        let response = self
            .client
            .post(self.method_url(method))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?
            .error_for_status()
            .map_err(|e| fetch_error(e.to_string()))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        serde_json::from_slice(&bytes).map_err(|e| EngineError::ResponseShape {
            api: method.to_string(),
            message: format!("response is not JSON: {}", e),
        })
    }
}
