//! API client for communicating with the AntiqBot backend.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! API requests: account, credits, image analysis and support endpoints.

use std::fmt;

use reqwest::multipart::Form;
use reqwest::{header, Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::models::{
    AnalysisResult, AuthResponse, Credits, LoginRequest, ProfileUpdate, RegisterRequest,
    UserProfile,
};

use super::{ApiRequest, ImageUpload, RequestError};

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when nothing is configured (local development backend)
pub const DEFAULT_API_URL: &str = "http://localhost:3001/api";

const ANALYZE_IMAGE_PATH: &str = "/analyze/image";

/// API client for the AntiqBot backend.
///
/// Holds the credential it sends, so independent clients (one per session)
/// can coexist. Clone is cheap - reqwest::Client uses Arc internally for
/// connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a new API client. A trailing `/` on `base_url` is dropped.
    pub fn new(base_url: impl Into<String>) -> Result<Self, RequestError> {
        let client = Client::builder().build().map_err(RequestError::Network)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Stop sending a bearer token
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, RequestError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| RequestError::InvalidRequest("Token is not a valid header value".to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn json_headers(&self) -> Result<header::HeaderMap, RequestError> {
        let mut headers = self.auth_headers()?;
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    /// Perform one JSON request and decode the response.
    ///
    /// Sends `Content-Type: application/json` and the bearer token (if any);
    /// headers on `request` replace those defaults. Non-2xx responses become
    /// [`RequestError::Status`]. Nothing is retried.
    pub async fn call<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, RequestError> {
        let url = self.url(&request.endpoint);

        let mut headers = self.json_headers()?;
        for (name, value) in request.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        debug!(
            method = %request.method,
            endpoint = %request.endpoint,
            authenticated = self.token.is_some(),
            "Sending API request"
        );

        let mut builder = self.client.request(request.method.clone(), &url).headers(headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, endpoint = %request.endpoint, error = %e, "API request failed to send");
            RequestError::Network(e)
        })?;

        Self::read_response(&request.endpoint, response).await
    }

    /// Error for a non-2xx response. The status is what matters, so a body
    /// that cannot be read is logged and treated as empty.
    fn rejection<E: fmt::Display>(
        endpoint: &str,
        status: StatusCode,
        body: Result<String, E>,
    ) -> RequestError {
        warn!(endpoint = endpoint, status = status.as_u16(), "API request rejected");
        let body = match body {
            Ok(body) => body,
            Err(e) => {
                warn!(endpoint = endpoint, error = %e, "Failed to read error response body");
                String::new()
            }
        };
        debug!(body = %RequestError::truncate_body(&body), "Error response body");
        RequestError::from_status(status, &body)
    }

    /// Turn a response into the decoded body or a `RequestError`.
    /// An empty 2xx body decodes as JSON `null`.
    async fn read_response<T: DeserializeOwned>(
        endpoint: &str,
        response: Response,
    ) -> Result<T, RequestError> {
        let status = response.status();

        if !status.is_success() {
            return Err(Self::rejection(endpoint, status, response.text().await));
        }

        let bytes = response.bytes().await.map_err(RequestError::Network)?;
        let parsed = if bytes.iter().all(u8::is_ascii_whitespace) {
            serde_json::from_value(Value::Null)
        } else {
            serde_json::from_slice(&bytes)
        };

        parsed.map_err(|e| {
            warn!(endpoint = endpoint, error = %e, "Failed to parse JSON response");
            RequestError::InvalidResponse {
                status,
                message: format!("Failed to parse JSON response from {}: {}", endpoint, e),
            }
        })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RequestError> {
        self.call(ApiRequest::get(endpoint)).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        self.call(ApiRequest::post(endpoint).json(body)?).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, RequestError> {
        self.call(ApiRequest::put(endpoint).json(body)?).await
    }

    async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, RequestError> {
        self.call(ApiRequest::delete(endpoint)).await
    }

    // ===== Authentication =====

    /// Log in. Returns the backend's response; persisting the session is up
    /// to the caller (see `SessionManager`).
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, RequestError> {
        self.post("/auth/login", &LoginRequest::new(email, password)).await
    }

    /// Create an account. Like `login`, does not persist anything.
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, RequestError> {
        self.post("/auth/register", request).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<Value, RequestError> {
        self.post("/auth/password-reset-request", &json!({ "email": email }))
            .await
    }

    pub async fn reset_password(
        &self,
        reset_token: &str,
        new_password: &str,
    ) -> Result<Value, RequestError> {
        self.post(
            "/auth/password-reset",
            &json!({ "resetToken": reset_token, "newPassword": new_password }),
        )
        .await
    }

    /// Ask the backend to mail a verification link to the logged-in user
    pub async fn request_email_verification(&self) -> Result<Value, RequestError> {
        self.call(ApiRequest::post("/auth/verify-email-request")).await
    }

    pub async fn verify_email(&self, verification_token: &str) -> Result<Value, RequestError> {
        self.post(
            "/auth/verify-email",
            &json!({ "verificationToken": verification_token }),
        )
        .await
    }

    // ===== User =====

    /// Fetch the current profile. Does not touch the persisted session.
    pub async fn get_user_profile(&self) -> Result<UserProfile, RequestError> {
        self.get("/user/profile").await
    }

    pub async fn update_user_profile(
        &self,
        update: &ProfileUpdate,
    ) -> Result<UserProfile, RequestError> {
        self.put("/user/profile", update).await
    }

    pub async fn get_user_subscription(&self) -> Result<Value, RequestError> {
        self.get("/user/subscription").await
    }

    // ===== Credits =====

    pub async fn get_credits(&self) -> Result<Credits, RequestError> {
        self.get("/user/credits").await
    }

    pub async fn purchase_credits(&self, package_id: impl Into<Value>) -> Result<Value, RequestError> {
        let package_id: Value = package_id.into();
        self.post("/user/credits/purchase", &json!({ "packageId": package_id }))
            .await
    }

    pub async fn get_available_packages(&self) -> Result<Value, RequestError> {
        self.get("/packages").await
    }

    // ===== Analysis =====

    /// Upload an image for appraisal. Costs one credit on success; the
    /// caller re-fetches the balance afterwards.
    ///
    /// Sent as multipart with `image` and `comment` fields. No JSON content
    /// type is set so reqwest can add the multipart boundary.
    pub async fn analyze_image(
        &self,
        image: ImageUpload,
        comment: &str,
    ) -> Result<AnalysisResult, RequestError> {
        let url = self.url(ANALYZE_IMAGE_PATH);

        debug!(
            file_name = %image.file_name,
            size = image.len(),
            has_comment = !comment.is_empty(),
            "Uploading image for analysis"
        );

        let form = Form::new()
            .part("image", image.into_part()?)
            .text("comment", comment.to_string());

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers()?)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Image upload failed to send");
                RequestError::Network(e)
            })?;

        Self::read_response(ANALYZE_IMAGE_PATH, response).await
    }

    pub async fn get_analysis_history(&self) -> Result<Value, RequestError> {
        self.get("/analysis/history").await
    }

    pub async fn get_analysis_by_id(
        &self,
        analysis_id: impl fmt::Display,
    ) -> Result<AnalysisResult, RequestError> {
        self.get(&format!("/analysis/{}", analysis_id)).await
    }

    pub async fn delete_analysis(&self, analysis_id: impl fmt::Display) -> Result<Value, RequestError> {
        self.delete(&format!("/analysis/{}", analysis_id)).await
    }

    // ===== Feedback and Support =====

    pub async fn submit_feedback<B: Serialize + ?Sized>(
        &self,
        feedback: &B,
    ) -> Result<Value, RequestError> {
        self.post("/feedback", feedback).await
    }

    pub async fn contact_support<B: Serialize + ?Sized>(
        &self,
        request: &B,
    ) -> Result<Value, RequestError> {
        self.post("/support/contact", request).await
    }

    // ===== Admin =====

    pub async fn get_user_statistics(&self) -> Result<Value, RequestError> {
        self.get("/admin/users/statistics").await
    }

    pub async fn get_analysis_statistics(&self) -> Result<Value, RequestError> {
        self.get("/admin/analysis/statistics").await
    }
}
