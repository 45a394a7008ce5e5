use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::Serialize;

use super::RequestError;

/// One call through [`ApiClient::call`](super::ApiClient::call).
///
/// `endpoint` is relative to the client's base URL and must start with `/`.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub(crate) method: Method,
    pub(crate) endpoint: String,
    pub(crate) body: Option<Vec<u8>>,
    pub(crate) headers: HeaderMap,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::GET, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::POST, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::PUT, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::DELETE, endpoint)
    }

    /// Serialize `body` as the JSON request body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, RequestError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| RequestError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        self.body = Some(bytes);
        Ok(self)
    }

    /// Add a header that replaces the client default of the same name.
    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self, RequestError> {
        let value = HeaderValue::from_str(value)
            .map_err(|e| RequestError::InvalidRequest(format!("Invalid value for {}: {}", name, e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
