mod common;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rest_session_client::{
    ConfigLocation, Credentials, Error, ErrorKind, OpContext, RecoveryStep, RequestDescriptor,
    RestApiClient,
};
use serde::Deserialize;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{alice, client, header_value, init_logging, requests_to, resumed_alice};

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: u64,
    name: String,
}

async fn mount_challenge(server: &MockServer, salt: &str) {
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .insert_header("x-auth-login-salt", salt)
                .set_body_json(json!({"code": "credentials_required", "message": "who are you"})),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_answers_challenge_with_default_proof() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header("x-auth-login-phash", "jw/atRcUbuYwdN7hQp+w1cLVXXidj5L7ucaPGM/8ljI="))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-auth-access-token", "a1")
                .insert_header("x-auth-refresh-token", "r1"),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    mount_challenge(&server, "abc123").await;

    let client = client(&server, alice());
    client
        .login(&OpContext::new(), &Credentials::new("alice", "secret"))
        .await
        .unwrap();

    let session = client.session().await;
    assert_eq!(session.access_token(), "a1");
    assert_eq!(session.refresh_token(), "r1");
}

#[tokio::test]
async fn login_uses_configured_proof_function() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(header("x-auth-login-phash", "salt-1:hunter2"))
        .respond_with(ResponseTemplate::new(204).insert_header("x-auth-access-token", "a1"))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_challenge(&server, "salt-1").await;

    let client = client(&server, alice())
        .with_proof(Arc::new(|password: &str, salt: &str| format!("{salt}:{password}")));
    client
        .login(&OpContext::new(), &Credentials::new("bob", "hunter2"))
        .await
        .unwrap();

    let logins = requests_to(&server, "/auth/login").await;
    assert_eq!(header_value(&logins[1], "x-auth-login").as_deref(), Some("bob"));
    assert_eq!(client.session().await.access_token(), "a1");
}

#[tokio::test]
async fn rejected_proof_is_a_login_error() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(wiremock::matchers::header_exists("x-auth-login-phash"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"code": "login_failed", "message": "bad password"})),
        )
        .with_priority(1)
        .mount(&server)
        .await;
    mount_challenge(&server, "abc123").await;

    let client = client(&server, alice());
    let err = client
        .login(&OpContext::new(), &Credentials::new("alice", "wrong"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::AuthRecovery {
            step: RecoveryStep::LoginProof,
            status: 401,
            ..
        }
    ));
    assert_eq!(err.api_error().unwrap().code, "login_failed");
    assert!(client.session().await.access_token().is_empty());
}

#[tokio::test]
async fn challenge_without_salt_is_rejected() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"code": "credentials_required"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, alice());
    let err = client
        .login(&OpContext::new(), &Credentials::new("alice", "secret"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::AuthRecovery {
            step: RecoveryStep::LoginChallenge,
            ..
        }
    ));
    assert_eq!(err.api_error().unwrap().code, "missing_salt");
}

#[tokio::test]
async fn typed_get_encodes_query_and_decodes_body() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("limit", "2"))
        .and(query_param("name", "a b"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "name": "a b"},
            {"id": 2, "name": "a b"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, alice());
    let items: Vec<Item> = client
        .get(&OpContext::new(), "/items", &json!({"limit": 2, "name": "a b"}))
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0], Item { id: 1, name: "a b".into() });
    let sent = requests_to(&server, "/items").await;
    assert!(sent[0].body.is_empty());
}

#[tokio::test]
async fn typed_post_sends_json_body() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(body_json(json!({"name": "lamp"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": 5, "name": "lamp"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, alice());
    let created: Item = client
        .post(&OpContext::new(), "/items", &json!({"name": "lamp"}))
        .await
        .unwrap();
    assert_eq!(created, Item { id: 5, name: "lamp".into() });
}

#[tokio::test]
async fn typed_call_surfaces_unrecovered_failure() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/items/1"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"code": "conflict", "message": "taken"})),
        )
        .mount(&server)
        .await;

    let credentials = resumed_alice();
    let client = client(&server, credentials);
    client
        .dispatcher()
        .update_session(|s| s.set_access_token("a1"))
        .await;

    let err = client
        .put::<_, Item>(&OpContext::new(), "/items/1", &json!({"name": "x"}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
    assert_eq!(err.status(), Some(409));
    assert_eq!(err.api_error().unwrap().message, "taken");
}

#[tokio::test]
async fn logout_clears_session_and_stored_token() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("x-auth-access-token", "a1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = resumed_alice();
    let client = client(&server, credentials.clone());
    client
        .dispatcher()
        .update_session(|s| s.set_access_token("a1"))
        .await;

    client.logout(&OpContext::new()).await.unwrap();

    let session = client.session().await;
    assert!(!session.has_access_token());
    assert!(!session.has_refresh_token());
    assert_eq!(credentials.stored_refresh_token().as_deref(), Some(""));
}

#[tokio::test]
async fn logout_recovers_from_stale_csrf_token() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("x-csrf", "fresh"))
        .respond_with(ResponseTemplate::new(200))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({"code": "csrf_token_invalid"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/check"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-csrf", "fresh"))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = resumed_alice();
    let client = client(&server, credentials.clone());
    client
        .dispatcher()
        .update_session(|s| {
            s.set_access_token("a1");
            s.set_csrf_token("stale");
        })
        .await;

    client.logout(&OpContext::new()).await.unwrap();

    let session = client.session().await;
    assert!(!session.has_access_token());
    assert_eq!(session.csrf_token(), "");
    assert_eq!(credentials.stored_refresh_token().as_deref(), Some(""));
}

#[tokio::test]
async fn sms_confirmation_echoes_server_token() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/transfers"))
        .and(header("x-auth-sms-code", "4321"))
        .and(header("x-auth-sms-token", "t-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1, "name": "done"})))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/transfers"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-auth-sms-token", "t-9")
                .set_body_json(json!({"code": "sms_confirmation_required"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let credentials = resumed_alice();
    let client = client(&server, credentials);
    client
        .dispatcher()
        .update_session(|s| s.set_access_token("a1"))
        .await;
    let ctx = OpContext::new();
    let request = RequestDescriptor::post("/transfers")
        .with_payload(&json!({"amount": 10}))
        .unwrap();

    let challenge = client.send_with(&ctx, &request).await.unwrap();
    assert_eq!(challenge.error_code(), "sms_confirmation_required");

    let confirmed = client
        .send_sms_confirmation(&ctx, &challenge, "4321", &request)
        .await
        .unwrap();
    let item: Item = confirmed.json().unwrap();
    assert_eq!(item.name, "done");
}

#[tokio::test]
async fn prepare_fetches_initial_csrf_token() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/check"))
        .respond_with(ResponseTemplate::new(200).insert_header("x-csrf", "c0"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, alice());
    client.prepare(&OpContext::new()).await.unwrap();
    assert_eq!(client.session().await.csrf_token(), "c0");
}

#[tokio::test]
async fn client_from_config_file_resumes_stored_session() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/items"))
        .and(header("user-agent", "file-agent/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    // Write per-test config file to avoid global env races
    let cfg = json!({
        "base_url": format!("{}/api/v1/", server.uri()),
        "user_agent": "file-agent/2",
        "timeout_secs": 5,
        "recovery": {"max_logins": 1}
    });
    let mut cfg_path = PathBuf::from("target");
    cfg_path.push(format!("test-config-{}.json", server.address().port()));
    fs::create_dir_all("target").ok();
    fs::write(&cfg_path, serde_json::to_string(&cfg).unwrap()).unwrap();

    let credentials = resumed_alice();
    let client = RestApiClient::from_location(
        ConfigLocation::File(cfg_path.to_string_lossy().to_string()),
        credentials,
    )
    .await
    .expect("client from file");

    assert_eq!(client.session().await.refresh_token(), "r1");
    client
        .dispatcher()
        .update_session(|s| s.set_access_token("a1"))
        .await;
    let items: Vec<Item> = client
        .get(&OpContext::new(), "/items", &json!({}))
        .await
        .unwrap();
    assert!(items.is_empty());
}
