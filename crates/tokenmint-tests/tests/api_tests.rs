//! API integration tests.
//!
//! Run with: `cargo test -p tokenmint-tests --test api_tests`

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;
use tokenmint_auth::AssertionClaims;
use tokenmint_tests::{
    CredentialFixture, ProviderFixture, TEST_API_KEY, TEST_CLIENT_EMAIL, TEST_KEY_ID,
    TEST_PUBLIC_KEY, TestContext, assertion_from_form,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, ResponseTemplate};

async fn mount_token(ctx: &TestContext, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(response)
        .mount(&ctx.provider)
        .await;
}

#[tokio::test]
async fn test_token_issued() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains(
            "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(ProviderFixture::token("ya29.abc", 1800)))
        .expect(1)
        .mount(&ctx.provider)
        .await;

    let before = Utc::now().timestamp();
    let resp = ctx.client.post_token(TEST_API_KEY).await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["access_token"], "ya29.abc");
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 1800);

    let expires_at = chrono::DateTime::parse_from_rfc3339(body["expires_at"].as_str().unwrap())
        .unwrap()
        .timestamp();
    assert!((expires_at - (before + 1800)).abs() <= 5);

    let snapshot = ctx.health.snapshot();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.successful_requests, 1);
    assert_eq!(snapshot.consecutive_failures, 0);
    assert!(snapshot.last_success.is_some());
}

#[tokio::test]
async fn test_assertion_sent_to_provider() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    mount_token(&ctx, ResponseTemplate::new(200).set_body_json(ProviderFixture::token("t", 3600))).await;

    let resp = ctx.client.post_token(TEST_API_KEY).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let requests = ctx.provider.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let jwt = assertion_from_form(&requests[0].body).expect("assertion missing from form");

    let header = decode_header(&jwt).unwrap();
    assert_eq!(header.alg, Algorithm::RS256);
    assert_eq!(header.kid.as_deref(), Some(TEST_KEY_ID));

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[ctx.token_url()]);
    let key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY.as_bytes()).unwrap();
    let claims = decode::<AssertionClaims>(&jwt, &key, &validation).unwrap().claims;

    assert_eq!(claims.iss, TEST_CLIENT_EMAIL);
    assert_eq!(claims.sub, TEST_CLIENT_EMAIL);
    assert_eq!(claims.scope, "https://www.googleapis.com/auth/cloud-platform");
    assert_eq!(claims.exp - claims.iat, 3600);
}

#[tokio::test]
async fn test_missing_expires_in_defaults_to_an_hour() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    mount_token(
        &ctx,
        ResponseTemplate::new(200).set_body_json(serde_json::json!({ "access_token": "t" })),
    )
    .await;

    let body: Value = ctx.client.post_token(TEST_API_KEY).await.unwrap().json().await.unwrap();
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
async fn test_out_of_range_expires_in_maps_to_502() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    mount_token(
        &ctx,
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "access_token": "t", "expires_in": 9_000_000_000_000_000_i64 })),
    )
    .await;

    let resp = ctx.client.post_token(TEST_API_KEY).await.expect("Request failed");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

    let snapshot = ctx.health.snapshot();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.successful_requests, 0);
    assert_eq!(snapshot.consecutive_failures, 1);
}

#[tokio::test]
async fn test_provider_bad_gateway_maps_to_502() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    mount_token(&ctx, ResponseTemplate::new(502).set_body_string("upstream down")).await;

    let resp = ctx.client.post_token(TEST_API_KEY).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let body: Value = resp.json().await.unwrap();
    assert!(body["detail"].is_string());

    let snapshot = ctx.health.snapshot();
    assert_eq!(snapshot.total_requests, 1);
    assert_eq!(snapshot.successful_requests, 0);
    assert_eq!(snapshot.consecutive_failures, 1);
}

#[tokio::test]
async fn test_rejected_assertion_maps_to_400() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    mount_token(&ctx, ResponseTemplate::new(400).set_body_json(ProviderFixture::invalid_grant())).await;

    let resp = ctx.client.post_token(TEST_API_KEY).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_other_provider_status_maps_to_500() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    mount_token(&ctx, ResponseTemplate::new(403).set_body_string("forbidden")).await;

    let resp = ctx.client.post_token(TEST_API_KEY).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_slow_provider_maps_to_504() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    mount_token(
        &ctx,
        ResponseTemplate::new(200)
            .set_body_json(ProviderFixture::token("late", 3600))
            .set_delay(Duration::from_secs(3)),
    )
    .await;

    let resp = ctx.client.post_token(TEST_API_KEY).await.unwrap();
    assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(ctx.health.snapshot().consecutive_failures, 1);
}

#[tokio::test]
async fn test_missing_api_key_rejected_without_counting() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    mount_token(&ctx, ResponseTemplate::new(200).set_body_json(ProviderFixture::token("t", 3600))).await;

    let resp = ctx.client.post_token_anonymous().await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key("www-authenticate"));

    let resp = ctx.client.post_token("wrong-key").await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(ctx.health.snapshot().total_requests, 0);
    assert!(ctx.provider.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_repeated_failures_degrade_health() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    mount_token(&ctx, ResponseTemplate::new(502)).await;

    for _ in 0..6 {
        let resp = ctx.client.post_token(TEST_API_KEY).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    let body = ctx.client.get_json("/health").await.unwrap();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["total_requests"], 6);
    assert_eq!(body["consecutive_failures"], 6);
    assert!(body["issues"].as_array().unwrap().len() >= 2);
}

#[tokio::test]
async fn test_success_resets_consecutive_failures() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&ctx.provider)
        .await;
    mount_token(&ctx, ResponseTemplate::new(200).set_body_json(ProviderFixture::token("t", 3600))).await;

    for expected in [502, 502, 200] {
        let resp = ctx.client.post_token(TEST_API_KEY).await.unwrap();
        assert_eq!(resp.status().as_u16(), expected);
    }

    let snapshot = ctx.health.snapshot();
    assert_eq!(snapshot.total_requests, 3);
    assert_eq!(snapshot.successful_requests, 1);
    assert_eq!(snapshot.consecutive_failures, 0);
}

#[tokio::test]
async fn test_health_is_read_only() {
    let ctx = TestContext::new().await.expect("Failed to create test context");

    let first = ctx.client.get_json("/health").await.unwrap();
    let second = ctx.client.get_json("/health").await.unwrap();

    assert_eq!(first["status"], "healthy");
    assert_eq!(first["service_account_email"], TEST_CLIENT_EMAIL);
    assert_eq!(first["total_requests"], 0);
    assert_eq!(second["total_requests"], 0);
    assert!(second["success_rate"].is_null());
    assert!(second["last_success"].is_null());
}

#[tokio::test]
async fn test_incomplete_credential_is_unhealthy() {
    let ctx = TestContext::with(|config| config, CredentialFixture::incomplete())
        .await
        .expect("Failed to create test context");

    let body = ctx.client.get_json("/health").await.unwrap();
    assert_eq!(body["status"], "unhealthy");
    assert!(body["service_account_email"].is_null());

    let resp = ctx.client.post_token(TEST_API_KEY).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(ctx.provider.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_readiness_when_provider_reachable() {
    let ctx = TestContext::new().await.expect("Failed to create test context");
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&ctx.provider)
        .await;

    let body = ctx.client.get_json("/readiness").await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["google_reachable"], true);
}

#[tokio::test]
async fn test_readiness_when_provider_unreachable() {
    let closed = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let ctx = TestContext::with(
        |config| config.with_probe_url(format!("http://{}", closed)),
        CredentialFixture::credential(),
    )
    .await
    .expect("Failed to create test context");

    let resp = ctx.client.get("/readiness").await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "not_ready");
    assert_eq!(body["google_reachable"], false);
}

#[tokio::test]
async fn test_liveness_and_root() {
    let ctx = TestContext::new().await.expect("Failed to create test context");

    let live = ctx.client.get_json("/liveness").await.unwrap();
    assert_eq!(live["status"], "alive");
    assert!(live["uptime_seconds"].is_u64());

    let root = ctx.client.get_json("/").await.unwrap();
    assert_eq!(root["status"], "healthy");
    assert!(root["version"].is_string());
    assert!(root["timestamp"].is_string());
}

#[tokio::test]
async fn test_usage_documents() {
    let ctx = TestContext::new().await.expect("Failed to create test context");

    let info = ctx.client.get_json("/info").await.unwrap();
    assert_eq!(info["usage"]["endpoint"], "/token");
    assert_eq!(ctx.client.get_json("/docs-info").await.unwrap(), info);

    let openapi = ctx.client.get_json("/openapi.json").await.unwrap();
    assert!(openapi["paths"]["/token"]["post"].is_object());
}

#[tokio::test]
async fn test_openapi_hidden_in_production() {
    let ctx = TestContext::with(
        |config| config.with_environment("production"),
        CredentialFixture::credential(),
    )
    .await
    .expect("Failed to create test context");

    let resp = ctx.client.get("/openapi.json").await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
