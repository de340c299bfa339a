use serde_json::json;
use codeswap::auth::AuthChangeKind;
use codeswap::backend::{Backend, SupabaseBackend};
use codeswap::config::{AppConfig, ClientOptions};
use codeswap::model::{RecordFields, RecordId};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer) -> SupabaseBackend {
    let config = AppConfig::new(&server.uri(), "anon-key").unwrap();
    SupabaseBackend::new(&config).unwrap()
}

fn session_body(expires_at: Option<i64>) -> serde_json::Value {
    let mut body = json!({
        "access_token": "user-access-token",
        "refresh_token": "user-refresh-token",
        "token_type": "bearer",
        "expires_in": 3600,
        "user": {
            "id": "manager-id",
            "email": "manager@shop.test",
            "role": "authenticated"
        }
    });
    if let Some(at) = expires_at {
        body["expires_at"] = json!(at);
    }
    body
}

async fn mount_sign_in(server: &MockServer, expires_at: Option<i64>) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(expires_at)))
        .mount(server)
        .await;
}

fn kiwi() -> RecordFields {
    RecordFields {
        product_name: "Kiwi".to_string(),
        old_code: "4".to_string(),
        new_code: "44".to_string(),
        notes: None,
    }
}

#[tokio::test]
async fn list_orders_by_product_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/product_codes"))
        .and(query_param("select", "*"))
        .and(query_param("order", "product_name.asc"))
        .and(header("apikey", "anon-key"))
        .and(header("Authorization", "Bearer anon-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "product_name": "Apple", "old_code": "1", "new_code": "2", "notes": null },
            { "id": 2, "product_name": "Banana", "old_code": "0", "new_code": "17", "notes": "Loose" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let records = backend_for(&server).list().await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[1].notes.as_deref(), Some("Loose"));
}

#[tokio::test]
async fn list_failure_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/product_codes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("relation does not exist"))
        .mount(&server)
        .await;

    let failure = backend_for(&server).list().await.unwrap_err();
    assert_eq!(failure.to_string(), "Could not load the substitution list.");
}

#[tokio::test]
async fn sign_in_then_create_with_user_token() {
    let server = MockServer::start().await;
    mount_sign_in(&server, None).await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/product_codes"))
        .and(header("Authorization", "Bearer user-access-token"))
        .and(header("Prefer", "return=minimal"))
        .and(body_json(json!({
            "product_name": "Kiwi",
            "old_code": "4",
            "new_code": "44",
            "notes": null
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let mut changes = backend.on_session_change();

    let session = backend.sign_in("manager@shop.test", "secret").await.unwrap();
    assert_eq!(session.user_id().as_deref(), Some("manager-id"));
    assert!(session.expires_at.is_some());

    let event = changes.recv().await.unwrap();
    assert_eq!(event.kind, AuthChangeKind::SignedIn);

    backend.create(&kiwi()).await.unwrap();
}

#[tokio::test]
async fn writes_without_session_stay_local() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/product_codes"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let failure = backend.create(&kiwi()).await.unwrap_err();
    assert_eq!(failure.to_string(), "Could not save the entry.");
}

#[tokio::test]
async fn update_filtered_by_row_policy_fails() {
    let server = MockServer::start().await;
    mount_sign_in(&server, None).await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/product_codes"))
        .and(query_param("id", "eq.7"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend.sign_in("manager@shop.test", "secret").await.unwrap();

    let failure = backend.update(&RecordId::Int(7), &kiwi()).await.unwrap_err();
    assert_eq!(failure.to_string(), "Could not save the entry.");
}

#[tokio::test]
async fn delete_by_id() {
    let server = MockServer::start().await;
    mount_sign_in(&server, None).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/product_codes"))
        .and(query_param("id", "eq.abc-123"))
        .and(header("Authorization", "Bearer user-access-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "abc-123", "product_name": "Kiwi", "old_code": "4", "new_code": "44", "notes": null }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend.sign_in("manager@shop.test", "secret").await.unwrap();
    backend.delete(&RecordId::from("abc-123")).await.unwrap();
}

#[tokio::test]
async fn rejected_sign_in_is_generic() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let failure = backend.sign_in("manager@shop.test", "wrong").await.unwrap_err();

    assert_eq!(failure.to_string(), "Login failed.");
    assert!(backend.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn expired_session_is_refreshed() {
    let server = MockServer::start().await;
    mount_sign_in(&server, Some(1)).await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_json(json!({ "refresh_token": "user-refresh-token" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body(None)))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend.sign_in("manager@shop.test", "secret").await.unwrap();
    let mut changes = backend.on_session_change();

    let session = backend.current_session().await.unwrap().unwrap();
    assert!(!session.is_expired());
    assert_eq!(changes.recv().await.unwrap().kind, AuthChangeKind::TokenRefreshed);
}

#[tokio::test]
async fn expired_session_is_dropped_without_auto_refresh() {
    let server = MockServer::start().await;
    mount_sign_in(&server, Some(1)).await;

    let config = AppConfig::new(&server.uri(), "anon-key")
        .unwrap()
        .with_options(ClientOptions::default().with_auto_refresh_token(false));
    let backend = SupabaseBackend::new(&config).unwrap();
    backend.sign_in("manager@shop.test", "secret").await.unwrap();
    let mut changes = backend.on_session_change();

    assert!(backend.current_session().await.unwrap().is_none());
    assert_eq!(changes.recv().await.unwrap().kind, AuthChangeKind::SignedOut);
}

#[tokio::test]
async fn custom_schema_sends_profile_header() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/codes"))
        .and(header("Accept-Profile", "retail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let config = AppConfig::new(&server.uri(), "anon-key").unwrap().with_options(
        ClientOptions::default()
            .with_table("codes")
            .with_db_schema("retail"),
    );
    let records = SupabaseBackend::new(&config).unwrap().list().await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn sign_out_clears_session_even_if_server_fails() {
    let server = MockServer::start().await;
    mount_sign_in(&server, None).await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend.sign_in("manager@shop.test", "secret").await.unwrap();

    assert!(backend.sign_out().await.is_err());
    assert!(backend.current_session().await.unwrap().is_none());
}

#[tokio::test]
async fn write_with_expired_session_refreshes_first() {
    let server = MockServer::start().await;
    mount_sign_in(&server, Some(1)).await;
    let mut refreshed = session_body(None);
    refreshed["access_token"] = json!("fresh-access-token");
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(refreshed))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/product_codes"))
        .and(header("Authorization", "Bearer fresh-access-token"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    backend.sign_in("manager@shop.test", "secret").await.unwrap();
    let mut changes = backend.on_session_change();

    backend.create(&kiwi()).await.unwrap();
    assert_eq!(changes.recv().await.unwrap().kind, AuthChangeKind::TokenRefreshed);
}

#[tokio::test]
async fn write_with_expired_session_and_no_refresh_stays_local() {
    let server = MockServer::start().await;
    mount_sign_in(&server, Some(1)).await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/product_codes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let config = AppConfig::new(&server.uri(), "anon-key")
        .unwrap()
        .with_options(ClientOptions::default().with_auto_refresh_token(false));
    let backend = SupabaseBackend::new(&config).unwrap();
    backend.sign_in("manager@shop.test", "secret").await.unwrap();
    let mut changes = backend.on_session_change();

    let failure = backend.delete(&RecordId::Int(7)).await.unwrap_err();
    assert_eq!(failure.to_string(), "Could not delete the entry.");
    assert_eq!(changes.recv().await.unwrap().kind, AuthChangeKind::SignedOut);
}
