//! Tests for the HTTP module

use super::*;
use crate::decode;
use crate::error::Error;
use crate::types::QueryParams;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use test_case::test_case;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoint(server: &MockServer, route: &str) -> Endpoint {
    Endpoint::new(server.uri(), route)
}

fn fetcher<D: serde::de::DeserializeOwned + 'static>(endpoint: Endpoint) -> SingleFetcher<D> {
    SingleFetcher::new(HttpClient::new().unwrap(), endpoint, decode::envelope())
}

async fn request_count(server: &MockServer) -> usize {
    server.received_requests().await.unwrap_or_default().len()
}

// ============================================================================
// Config Tests
// ============================================================================

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.user_agent.starts_with("fanout-pager/"));
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .timeout(Duration::from_secs(5))
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_retry_policy_presets() {
    let single = RetryPolicy::default();
    assert_eq!(single.max_attempts, 1);
    assert_eq!(single.interval(), Duration::from_secs(1));

    let paging = RetryPolicy::paging();
    assert_eq!(paging.max_attempts, 100);
    assert_eq!(paging.interval(), Duration::from_secs(1));
}

#[test]
fn test_retry_policy_deserialize_defaults() {
    let policy: RetryPolicy = serde_yaml::from_str("max_attempts: 3").unwrap();
    assert_eq!(policy, RetryPolicy::new(3, Duration::from_millis(1000)));
}

// ============================================================================
// Status Interpreter Tests
// ============================================================================

#[test_case(401 ; "unauthorized")]
#[test_case(403 ; "forbidden")]
#[test_case(404 ; "not found")]
#[test_case(429 ; "too many requests")]
#[test_case(500 ; "server error")]
#[test_case(502 ; "bad gateway is unknown")]
#[test_case(201 ; "created is unknown")]
fn test_status_classification(code: u16) {
    let status = StatusCode::from_u16(code).unwrap();
    let err = interpret_status(status, b"").unwrap_err();
    assert_eq!(err.status(), Some(code));
    assert!(err.is_transient());
}

#[test]
fn test_status_ok() {
    assert!(interpret_status(StatusCode::OK, b"").is_ok());
}

#[test]
fn test_status_mapping_variants() {
    assert!(matches!(
        interpret_status(StatusCode::UNAUTHORIZED, b""),
        Err(Error::Unauthorized)
    ));
    assert!(matches!(
        interpret_status(StatusCode::TOO_MANY_REQUESTS, b""),
        Err(Error::RateLimited)
    ));
    assert!(matches!(
        interpret_status(StatusCode::BAD_GATEWAY, b""),
        Err(Error::UnknownStatus { status: 502 })
    ));
}

#[test]
fn test_status_bad_request_extracts_message() {
    let body = br#"{"success": false, "errors": {"code": 1100, "message": "page_size invalid"}}"#;
    let err = interpret_status(StatusCode::BAD_REQUEST, body).unwrap_err();
    match err {
        Error::ClientError { message } => {
            assert_eq!(message, "code: 1100, message: page_size invalid");
        }
        other => panic!("Expected ClientError, got {other:?}"),
    }
}

#[test]
fn test_status_bad_request_unreadable_body() {
    let err = interpret_status(StatusCode::BAD_REQUEST, b"oops").unwrap_err();
    assert!(matches!(err, Error::ClientError { .. }));
    assert!(err.to_string().contains("can not unmarshal body"));
}

// ============================================================================
// SingleFetcher Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_decodes_envelope_with_headers_and_query() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account/detail"))
        .and(query_param("address", "abc"))
        .and(header("token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"lamports": 42}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let target = endpoint(&server, "/account/detail")
        .with_query(QueryParams::new().with("address", "abc"))
        .header("token", "secret");

    let data: Value = fetcher(target)
        .fetch(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(data["lamports"], 42);
}

#[tokio::test]
async fn test_fetch_empty_payload_is_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/token/list"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "data": []})),
        )
        .mount(&server)
        .await;

    let data: Vec<Value> = fetcher(endpoint(&server, "token/list"))
        .fetch(&CancellationToken::new())
        .await
        .unwrap();

    assert!(data.is_empty());
}

#[tokio::test]
async fn test_fetch_single_attempt_returns_underlying_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher::<Value>(endpoint(&server, "missing"))
        .fetch(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound));
}

#[tokio::test]
async fn test_fetch_retries_exhausted_after_exact_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let interval = Duration::from_millis(25);
    let start = Instant::now();
    let err = fetcher::<Value>(endpoint(&server, "flaky"))
        .with_retry(RetryPolicy::new(3, interval))
        .fetch(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(start.elapsed() >= interval * 2);
    match err {
        Error::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, Error::ServerError));
        }
        other => panic!("Expected RetriesExhausted, got {other:?}"),
    }
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_fetch_invalid_header_is_config_error_without_retry() {
    let server = MockServer::start().await;

    let interval = Duration::from_millis(100);
    let start = Instant::now();
    let err = fetcher::<Value>(endpoint(&server, "chaininfo").header("token", "bad\nvalue"))
        .with_retry(RetryPolicy::new(4, interval))
        .fetch(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Config { .. }), "got {err:?}");
    assert!(!err.is_transient());
    assert!(start.elapsed() < interval);
    assert_eq!(request_count(&server).await, 0);
}

#[tokio::test]
async fn test_fetch_recovers_after_transient_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/recovering"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/recovering"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [1, 2]})))
        .mount(&server)
        .await;

    let data: Vec<u32> = fetcher(endpoint(&server, "recovering"))
        .with_retry(RetryPolicy::new(5, Duration::from_millis(5)))
        .fetch(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(data, vec![1, 2]);
    assert_eq!(request_count(&server).await, 3);
}

#[tokio::test]
async fn test_fetch_decode_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .expect(1)
        .mount(&server)
        .await;

    let err = fetcher::<Value>(endpoint(&server, "broken"))
        .with_retry(RetryPolicy::new(5, Duration::from_millis(5)))
        .fetch(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_fetch_raw_export_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/account/transfer/export"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n1,2\n"))
        .mount(&server)
        .await;

    let bytes = SingleFetcher::new(
        HttpClient::new().unwrap(),
        endpoint(&server, "account/transfer/export"),
        decode::raw(),
    )
    .fetch(&CancellationToken::new())
    .await
    .unwrap();

    assert_eq!(&bytes[..], b"a,b\n1,2\n");
}

#[tokio::test]
async fn test_fetch_custom_status_interpreter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"data": "made"})))
        .mount(&server)
        .await;

    let lenient: StatusInterpreter = Arc::new(|status: StatusCode, body: &[u8]| {
        if status.is_success() {
            Ok(())
        } else {
            interpret_status(status, body)
        }
    });
    let client = HttpClient::new().unwrap().with_status_interpreter(lenient);

    let data: String = SingleFetcher::new(client, endpoint(&server, "create"), decode::envelope())
        .fetch(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(data, "made");
}

// ============================================================================
// Rate Gate and Cancellation Tests
// ============================================================================

#[tokio::test]
async fn test_fetch_draws_from_rate_gate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": 1})))
        .mount(&server)
        .await;

    let gate = RateGate::new(&RateGateConfig::new(2, Duration::from_secs(60)));
    let client = HttpClient::new().unwrap().with_gate(gate.clone());
    let unit: SingleFetcher<u32> =
        SingleFetcher::new(client, endpoint(&server, "limited"), decode::envelope());

    let cancel = CancellationToken::new();
    unit.fetch(&cancel).await.unwrap();
    unit.fetch(&cancel).await.unwrap();
    assert!(!gate.try_acquire());

    let blocked = CancellationToken::new();
    let trigger = blocked.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = unit
        .clone()
        .with_retry(RetryPolicy::new(3, Duration::from_millis(1)))
        .fetch(&blocked)
        .await
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(request_count(&server).await, 2);
}

#[tokio::test]
async fn test_fetch_cancelled_before_start_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": 1})))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = fetcher::<u32>(endpoint(&server, "never"))
        .fetch(&cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Cancelled));
}

#[tokio::test]
async fn test_fetch_cancel_aborts_slow_response() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": 1}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = fetcher::<u32>(endpoint(&server, "slow"))
        .fetch(&cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_fetch_cancel_interrupts_retry_sleep() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = Instant::now();
    let err = fetcher::<u32>(endpoint(&server, "down"))
        .with_retry(RetryPolicy::new(10, Duration::from_secs(10)))
        .fetch(&cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Cancelled));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_fetch_describe_uses_full_url() {
    let server = MockServer::start().await;
    let unit = fetcher::<u32>(
        endpoint(&server, "/block/last").with_query(QueryParams::new().with("limit", 10)),
    );

    assert_eq!(
        Fetch::describe(&unit),
        format!("{}/block/last?limit=10", server.uri())
    );
}
