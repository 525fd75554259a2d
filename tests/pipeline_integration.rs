//! Request pipeline against a local HTTP server: header injection, bearer
//! tokens, error normalization and transport retry

mod common;

use anyhow::Result;
use async_trait::async_trait;
use common::{NoSessionCredential, RecordingCredential, config_from};
use reqwest::{Method, Request, Response, StatusCode};
use serde_json::json;
use spo_connect::api::pipeline::RetryFetch;
use spo_connect::api::{
    Behavior, Next, Pipeline, RetryConfig, RetryPolicy, SharePointClient, SharePointError,
};
use spo_connect::{SiteIdentity, TokenCredential};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const USER_AGENT: &str = "NONISV|Contoso|Webhooks/1.0";

fn fast_retry() -> RetryConfig {
    RetryConfig {
        base_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        jitter: false,
        ..RetryConfig::default()
    }
}

fn client_for(server: &MockServer, credential: Arc<dyn TokenCredential>) -> SharePointClient {
    let config = config_from(&[("UserAgent", USER_AGENT), ("TenantPrefix", "contoso")]);
    let scopes = vec!["https://contoso.sharepoint.com/.default".to_string()];
    let pipeline = Pipeline::sharepoint_with_client(
        &config,
        credential,
        scopes.clone(),
        reqwest::Client::new(),
        fast_retry(),
    )
    .unwrap();

    SharePointClient::with_base_url(
        SiteIdentity::new("contoso", "/sites/Test"),
        server.uri(),
        scopes,
        pipeline,
    )
}

#[tokio::test]
async fn test_requests_carry_injected_and_auth_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_api/web"))
        .and(header("UserAgent", USER_AGENT))
        .and(header("X-ClientTag", USER_AGENT))
        .and(header("Authorization", "Bearer token-1"))
        .and(header("Accept", "application/json;odata=nometadata"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Title": "Test",
            "Url": "https://contoso.sharepoint.com/sites/Test"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(RecordingCredential::new()));
    let web = client.web().await.unwrap();

    assert_eq!(web["Title"], "Test");
}

#[tokio::test]
async fn test_injected_headers_override_caller_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(RecordingCredential::new()));
    let builder = client
        .request(Method::GET, "web")
        .header("X-ClientTag", "caller-tag")
        .header("UserAgent", "caller-agent");
    client.send(builder).await.unwrap();

    let received = server.received_requests().await.unwrap();
    let headers = &received[0].headers;
    assert_eq!(headers.get_all("x-clienttag").iter().count(), 1);
    assert_eq!(headers.get("x-clienttag").unwrap(), USER_AGENT);
    assert_eq!(headers.get("useragent").unwrap(), USER_AGENT);
    assert!(headers.get("user-agent").unwrap().to_str().unwrap().starts_with("NONISV|"));
    assert!(headers.contains_key("client-request-id"));
}

#[tokio::test]
async fn test_token_is_requested_for_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let credential = Arc::new(RecordingCredential::new());
    let client = client_for(&server, credential.clone());

    for _ in 0..3 {
        client.web().await.unwrap();
    }

    assert_eq!(credential.calls(), 3);
    assert_eq!(
        credential.last_scopes().unwrap(),
        vec!["https://contoso.sharepoint.com/.default"]
    );

    let received = server.received_requests().await.unwrap();
    assert_eq!(received[2].headers.get("authorization").unwrap(), "Bearer token-3");
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Title": "Test"})))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(RecordingCredential::new()));
    let web = client.web().await.unwrap();

    assert_eq!(web["Title"], "Test");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_retry_budget_is_four_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "odata.error": {
                "code": "-1, System.InvalidOperationException",
                "message": {"lang": "en-US", "value": "Operation is not valid."}
            }
        })))
        .expect(4)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(RecordingCredential::new()));
    let err = client.web().await.unwrap_err();

    let sp_error = err.downcast_ref::<SharePointError>().unwrap();
    assert_eq!(sp_error.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(sp_error.message, "Operation is not valid.");
}

#[tokio::test]
async fn test_throttling_honours_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "0"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Title": "Test"})))
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(RecordingCredential::new()));

    assert!(client.web().await.is_ok());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "odata.error": {
                "code": "-2130575322, Microsoft.SharePoint.SPException",
                "message": {"lang": "en-US", "value": "List 'Missing' does not exist at site with URL 'https://contoso.sharepoint.com/sites/Test'."}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(RecordingCredential::new()));
    let err = client.list_by_title("Missing").await.unwrap_err();

    let sp_error = err.downcast_ref::<SharePointError>().unwrap();
    assert_eq!(sp_error.status, StatusCode::NOT_FOUND);
    assert!(sp_error.message.starts_with("List 'Missing' does not exist"));
}

#[tokio::test]
async fn test_credential_errors_surface_unchanged() {
    let server = MockServer::start().await;

    let client = client_for(&server, Arc::new(NoSessionCredential));
    let err = client.web().await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "AzureCliCredential: Please run 'az login' to set up an account"
    );
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_post_json_sends_body_and_handles_empty_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_api/web/lists/getbytitle('webhookHistory')/items"))
        .and(body_json(json!({"Title": "notification"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Arc::new(RecordingCredential::new()));
    let value = client
        .post_json(
            "web/lists/getbytitle('webhookHistory')/items",
            &json!({"Title": "notification"}),
        )
        .await
        .unwrap();

    assert!(value.is_null());
}

/// Counts how often the transport below the retry behavior is reached
struct CountingTransport {
    attempts: Arc<AtomicU32>,
}

#[async_trait]
impl Behavior for CountingTransport {
    fn name(&self) -> &'static str {
        "CountingTransport"
    }

    async fn handle(&self, request: Request, next: Next<'_>) -> Result<Response> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        next.run(request).await
    }
}

#[tokio::test]
async fn test_connection_failures_are_retried_then_surface() {
    let attempts = Arc::new(AtomicU32::new(0));
    let pipeline = Pipeline::new(reqwest::Client::new())
        .with(RetryFetch::new(RetryPolicy::new(fast_retry())))
        .with(CountingTransport {
            attempts: attempts.clone(),
        });

    // nothing listens on port 1
    let request = Request::new(Method::GET, "http://127.0.0.1:1/_api/web".parse().unwrap());
    let err = pipeline.send(request).await.unwrap_err();

    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert!(err.downcast_ref::<reqwest::Error>().is_some());
}
