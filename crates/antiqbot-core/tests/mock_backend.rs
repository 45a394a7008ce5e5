//! Mock backend tests for the antiqbot-core library.
//!
//! These tests use wiremock to simulate the AntiqBot backend and check the
//! request/response contract and session persistence without network access.

use antiqbot_core::api::{ApiClient, ApiRequest, ImageUpload, RequestError};
use antiqbot_core::auth::{MemoryStorage, SessionManager, SessionStore, Storage, TOKEN_KEY, USER_KEY};
use antiqbot_core::models::{ProfileUpdate, RegisterRequest};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// Base URL with the `/api` prefix the real backend uses.
fn api_url(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(api_url(server)).unwrap()
}

fn manager(server: &MockServer, storage: &MemoryStorage) -> SessionManager {
    SessionManager::new(client(server), SessionStore::new(storage.clone()))
}

async fn mount_login(server: &MockServer, token: &str) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "a@b.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": token,
            "user": {"id": 1, "email": "a@b.com", "first_name": "Anna", "credits": 3}
        })))
        .mount(server)
        .await;
}

async fn requests_to(server: &MockServer, request_path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == request_path)
        .collect()
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_login_persists_session_and_authenticates_requests() {
    let server = MockServer::start().await;
    mount_login(&server, "abc123").await;

    Mock::given(method("GET"))
        .and(path("/api/user/credits"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": 3})))
        .expect(1)
        .mount(&server)
        .await;

    let storage = MemoryStorage::new();
    let mut manager = manager(&server, &storage);

    let response = manager.login("a@b.com", "secret").await.unwrap();
    assert_eq!(response.token.as_deref(), Some("abc123"));
    assert!(manager.is_authenticated());

    // Persisted before login returned
    assert_eq!(storage.get(TOKEN_KEY).unwrap().as_deref(), Some("abc123"));
    assert!(storage.get(USER_KEY).unwrap().is_some());

    let credits = manager.client().get_credits().await.unwrap();
    assert_eq!(credits.balance(), 3);
}

#[tokio::test]
async fn test_login_with_float_credits_is_stored_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "abc123",
            "user": {"id": 1, "email": "a@b.com", "credits": 3.0, "created_at": 1709287200}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/credits"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": 2.0})))
        .mount(&server)
        .await;

    let storage = MemoryStorage::new();
    let mut manager = manager(&server, &storage);

    let response = manager.login("a@b.com", "secret").await.unwrap();
    assert!(manager.is_authenticated());
    assert_eq!(response.user.as_ref().map(|u| u.credit_balance()), Some(3));

    // The cached profile is the backend's record, unchanged
    let stored: Value = serde_json::from_str(&storage.get(USER_KEY).unwrap().unwrap()).unwrap();
    assert_eq!(stored["credits"], json!(3.0));
    assert_eq!(stored["created_at"], json!(1709287200));

    let restored = SessionStore::new(storage).load();
    assert_eq!(restored.token(), Some("abc123"));
    assert_eq!(restored.profile.map(|p| p.credit_balance()), Some(3));

    let credits = manager.client().get_credits().await.unwrap();
    assert_eq!(credits.balance(), 2);
    assert!(credits.can_analyze());
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"message": "invalid credentials"})),
        )
        .mount(&server)
        .await;

    let storage = MemoryStorage::new();
    let mut manager = manager(&server, &storage);

    let err = manager.login("a@b.com", "wrong").await.unwrap_err();
    let request_err = err.request_error().expect("expected a request error");
    assert_eq!(request_err.message(), "invalid credentials");
    assert_eq!(err.to_string(), "invalid credentials");
    assert!(err.is_unauthorized());

    assert!(!manager.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_login_then_logout_drops_authorization() {
    let server = MockServer::start().await;
    mount_login(&server, "abc123").await;

    Mock::given(method("GET"))
        .and(path("/api/packages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "pack-10"}])))
        .mount(&server)
        .await;

    let storage = MemoryStorage::new();
    let mut manager = manager(&server, &storage);

    manager.login("a@b.com", "secret").await.unwrap();
    manager.client().get_available_packages().await.unwrap();

    manager.logout().unwrap();
    assert!(!manager.is_authenticated());
    assert!(storage.is_empty());

    manager.client().get_available_packages().await.unwrap();

    let requests = requests_to(&server, "/api/packages").await;
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].headers.get(AUTHORIZATION).unwrap(), "Bearer abc123");
    assert!(requests[1].headers.get(AUTHORIZATION).is_none());

    // Logout never talks to the backend
    assert!(requests_to(&server, "/api/auth/logout").await.is_empty());
}

#[tokio::test]
async fn test_register_persists_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/register"))
        .and(body_json(json!({
            "email": "new@b.com",
            "password": "pw",
            "first_name": "Nieuw",
            "last_name": "Lid"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "fresh-token",
            "user": {"id": 9, "email": "new@b.com", "credits": 1}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage = MemoryStorage::new();
    let mut manager = manager(&server, &storage);

    let request = RegisterRequest {
        email: "new@b.com".to_string(),
        password: "pw".to_string(),
        first_name: "Nieuw".to_string(),
        last_name: "Lid".to_string(),
    };
    manager.register(&request).await.unwrap();

    assert_eq!(manager.client().token(), Some("fresh-token"));
    let reloaded = SessionStore::new(storage).load();
    assert_eq!(reloaded.token(), Some("fresh-token"));
    assert_eq!(reloaded.profile.map(|p| p.credit_balance()), Some(1));
}

#[tokio::test]
async fn test_login_without_token_persists_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"message": "verify your email first"})),
        )
        .mount(&server)
        .await;

    let storage = MemoryStorage::new();
    let mut manager = manager(&server, &storage);

    let response = manager.login("a@b.com", "secret").await.unwrap();
    assert_eq!(
        response.extra.get("message").and_then(Value::as_str),
        Some("verify your email first")
    );
    assert!(!manager.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_restored_session_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user/profile"))
        .and(header("authorization", "Bearer saved-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "credits": 7})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/credits"))
        .and(header("authorization", "Bearer saved-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": 7})))
        .mount(&server)
        .await;

    let storage = MemoryStorage::new();
    storage.set(TOKEN_KEY, "saved-token").unwrap();
    storage.set(USER_KEY, r#"{"id": 1, "credits": 2}"#).unwrap();

    let mut manager = manager(&server, &storage);
    assert!(manager.restore());

    let snapshot = manager.refresh().await.unwrap().unwrap();
    assert_eq!(snapshot.credits.balance(), 7);

    // Refresh itself does not write; the caller decides
    assert_eq!(
        SessionStore::new(storage.clone()).load().profile.map(|p| p.credit_balance()),
        Some(2)
    );

    manager.update_profile(snapshot.profile).unwrap();
    assert_eq!(SessionStore::new(storage).load().profile.map(|p| p.credit_balance()), Some(7));
}

#[tokio::test]
async fn test_refresh_with_rejected_token_ends_session() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "token expired"})))
        .mount(&server)
        .await;

    let storage = MemoryStorage::new();
    storage.set(TOKEN_KEY, "old-token").unwrap();
    storage.set(USER_KEY, r#"{"id": 1}"#).unwrap();

    let mut manager = manager(&server, &storage);
    manager.restore();

    let err = manager.refresh().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert!(!manager.is_authenticated());
    assert!(storage.is_empty());
}

#[tokio::test]
async fn test_refresh_when_anonymous_sends_nothing() {
    let server = MockServer::start().await;
    let storage = MemoryStorage::new();
    let mut manager = manager(&server, &storage);

    assert!(manager.refresh().await.unwrap().is_none());
    assert!(server.received_requests().await.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_independent_sessions_do_not_share_credentials() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user/credits"))
        .and(header("authorization", "Bearer token-a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": 1})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/credits"))
        .and(header("authorization", "Bearer token-b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"balance": 20})))
        .mount(&server)
        .await;

    let storage_a = MemoryStorage::new();
    storage_a.set(TOKEN_KEY, "token-a").unwrap();
    let storage_b = MemoryStorage::new();
    storage_b.set(TOKEN_KEY, "token-b").unwrap();

    let mut a = manager(&server, &storage_a);
    let mut b = manager(&server, &storage_b);
    a.restore();
    b.restore();

    let (credits_a, credits_b) =
        tokio::join!(a.client().get_credits(), b.client().get_credits());
    assert_eq!(credits_a.unwrap().balance(), 1);
    assert_eq!(credits_b.unwrap().balance(), 20);
}

// ============================================================================
// Request/Response Tests
// ============================================================================

#[tokio::test]
async fn test_server_error_with_non_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/user/credits"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/analysis/history"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client.get_credits().await.unwrap_err();
    assert!(matches!(err, RequestError::Status { .. }));
    assert!(err.to_string().contains("500"));
    assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));

    let err = client.get_analysis_history().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP error! status: 500");
}

#[tokio::test]
async fn test_json_requests_send_json_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/user/profile"))
        .and(header("content-type", "application/json"))
        .and(header("authorization", "Bearer abc123"))
        .and(body_json(json!({"first_name": "Anna"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": 1, "first_name": "Anna"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_token("abc123".to_string());
    let update = ProfileUpdate {
        first_name: Some("Anna".to_string()),
        ..Default::default()
    };
    let profile = client.update_user_profile(&update).await.unwrap();
    assert_eq!(profile.first_name().as_deref(), Some("Anna"));
}

#[tokio::test]
async fn test_header_overrides_replace_defaults() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/feedback"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = client(&server).with_token("abc123".to_string());
    let request = ApiRequest::post("/feedback")
        .json(&json!({"rating": 5}))
        .unwrap()
        .header(CONTENT_TYPE, "application/vnd.antiqbot+json")
        .unwrap()
        .header(AUTHORIZATION, "Bearer override")
        .unwrap();

    let response: Value = client.call(request).await.unwrap();
    assert_eq!(response, json!({"ok": true}));

    let requests = requests_to(&server, "/api/feedback").await;
    let headers = &requests[0].headers;
    assert_eq!(headers.get_all(CONTENT_TYPE).iter().count(), 1);
    assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/vnd.antiqbot+json");
    assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer override");
}

#[tokio::test]
async fn test_empty_success_body_reads_as_null() {
    let server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/analysis/42"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_token("abc123".to_string());
    let response = client.delete_analysis(42).await.unwrap();
    assert_eq!(response, Value::Null);
}

#[tokio::test]
async fn test_invalid_success_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/analysis/7"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let client = client(&server).with_token("abc123".to_string());
    let err = client.get_analysis_by_id(7).await.unwrap_err();
    assert!(matches!(err, RequestError::InvalidResponse { .. }));
    assert_eq!(err.status(), Some(StatusCode::OK));
}

#[tokio::test]
async fn test_network_failure() {
    // Nothing listens on port 1
    let client = ApiClient::new("http://127.0.0.1:1/api").unwrap();
    let err = client.get_credits().await.unwrap_err();
    assert!(matches!(err, RequestError::Network(_)));
    assert!(err.status().is_none());
}

// ============================================================================
// Endpoint Tests
// ============================================================================

#[tokio::test]
async fn test_analyze_image_sends_multipart() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analyze/image"))
        .and(header("authorization", "Bearer abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object_type": "Vase",
            "period": "Ming",
            "estimated_value": "EUR 1.200",
            "description": "Blue and white porcelain"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_token("abc123".to_string());
    let image = ImageUpload::new("vase.jpg", vec![0xFF, 0xD8, 0xFF, 0xE0]);
    let result = client.analyze_image(image, "nice vase").await.unwrap();
    assert_eq!(result.object_type().as_deref(), Some("Vase"));
    assert_eq!(result.period().as_deref(), Some("Ming"));

    let requests = requests_to(&server, "/api/analyze/image").await;
    let request = &requests[0];

    let content_type = request.headers.get(CONTENT_TYPE).unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    assert!(!content_type.contains("application/json"));

    let body = String::from_utf8_lossy(&request.body);
    assert_eq!(body.matches("Content-Disposition: form-data;").count(), 2);
    assert!(body.contains(r#"name="image"; filename="vase.jpg""#));
    assert!(body.contains("Content-Type: image/jpeg"));
    assert!(body.contains("name=\"comment\"\r\n\r\nnice vase\r\n"));
}

#[tokio::test]
async fn test_analyze_image_passes_numeric_fields_through() {
    let server = MockServer::start().await;

    let appraisal = json!({
        "id": 42,
        "object_type": "Mantel clock",
        "period": 1750,
        "estimated_value": 900,
        "description": null,
        "confidence": 0.7
    });
    Mock::given(method("POST"))
        .and(path("/api/analyze/image"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appraisal.clone()))
        .mount(&server)
        .await;

    let client = client(&server).with_token("abc123".to_string());
    let image = ImageUpload::new("clock.png", vec![0x89, 0x50, 0x4E, 0x47]);
    let result = client.analyze_image(image, "").await.unwrap();

    assert_eq!(result.period().as_deref(), Some("1750"));
    assert_eq!(result.display_estimated_value(), "900");
    assert!(result.description().is_none());

    // null is dropped on output, everything else is the backend's JSON
    let mut expected = appraisal;
    expected.as_object_mut().unwrap().remove("description");
    assert_eq!(serde_json::to_value(&result).unwrap(), expected);
}

#[tokio::test]
async fn test_analyze_image_empty_comment_and_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/analyze/image"))
        .respond_with(
            ResponseTemplate::new(402).set_body_json(json!({"message": "insufficient credits"})),
        )
        .mount(&server)
        .await;

    let client = client(&server).with_token("abc123".to_string());
    let err = client
        .analyze_image(ImageUpload::new("clock.png", vec![1, 2, 3]), "")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "insufficient credits");
    assert_eq!(err.status(), Some(StatusCode::PAYMENT_REQUIRED));

    let requests = requests_to(&server, "/api/analyze/image").await;
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"comment\"\r\n\r\n\r\n"));
}

#[tokio::test]
async fn test_endpoint_payloads() {
    let server = MockServer::start().await;

    let ok = || ResponseTemplate::new(200).set_body_json(json!({"message": "ok"}));

    Mock::given(method("POST"))
        .and(path("/api/user/credits/purchase"))
        .and(body_json(json!({"packageId": "pack-10"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/password-reset-request"))
        .and(body_json(json!({"email": "a@b.com"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/password-reset"))
        .and(body_json(json!({"resetToken": "rt", "newPassword": "new-pw"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-email"))
        .and(body_json(json!({"verificationToken": "vt"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/verify-email-request"))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/support/contact"))
        .and(body_json(json!({"subject": "help", "message": "upload fails"})))
        .respond_with(ok())
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/users/statistics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"total": 12})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/admin/analysis/statistics"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"message": "admin only"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"plan": "basic"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server).with_token("abc123".to_string());

    client.purchase_credits("pack-10").await.unwrap();
    client.request_password_reset("a@b.com").await.unwrap();
    client.reset_password("rt", "new-pw").await.unwrap();
    client.verify_email("vt").await.unwrap();
    client.request_email_verification().await.unwrap();
    client
        .contact_support(&json!({"subject": "help", "message": "upload fails"}))
        .await
        .unwrap();

    let stats = client.get_user_statistics().await.unwrap();
    assert_eq!(stats["total"], 12);

    let err = client.get_analysis_statistics().await.unwrap_err();
    assert_eq!(err.to_string(), "admin only");

    let subscription = client.get_user_subscription().await.unwrap();
    assert_eq!(subscription["plan"], "basic");
}
