//! Transport behaviour against a mock server: status mapping, empty bodies,
//! timeouts, multipart upload, streamed export and server-push events.

use reqwest::Method;
use serde_json::json;
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shilp_client::transport::NO_BODY;
use shilp_client::{ClientConfig, HttpTransport, ShilpClient};
use shilp_core::Error;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn client_for(server: &MockServer) -> ShilpClient {
    init_tracing();
    ShilpClient::new(ClientConfig::new(server.uri()).with_timeout_secs(2)).unwrap()
}

#[tokio::test]
async fn test_api_error_keeps_body_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/collections/v1/docs/load"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .load_collection("docs")
        .await
        .unwrap_err();
    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "Internal Server Error");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_api_error_display_matches_server_text() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/collections/v1/missing"))
        .respond_with(ResponseTemplate::new(400).set_body_string("collection not found"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .drop_collection("missing")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "API error: collection not found (status: 400)"
    );
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_api_error_body_ignores_declared_charset() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/collections/v1/docs/flush"))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("content-type", "text/plain; charset=iso-8859-1")
                .set_body_bytes("unknown collection café".as_bytes()),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .flush_collection("docs")
        .await
        .unwrap_err();
    match err {
        Error::Api { status, body } => {
            assert_eq!(status, 400);
            assert_eq!(body, "unknown collection café");
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_empty_body_reads_as_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ping"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&ClientConfig::new(server.uri())).unwrap();
    let value = transport
        .exchange(Method::GET, "/ping", NO_BODY, &[])
        .await
        .unwrap();
    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn test_empty_body_fails_typed_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let err = client_for(&server).health_check().await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_malformed_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = client_for(&server).health_check().await.unwrap_err();
    assert!(matches!(err, Error::Decode(_)));
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"success": true, "version": "0.9.1"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let health = client_for(&server).health_check().await.unwrap();
    assert!(health.success);
    assert_eq!(health.version, "0.9.1");
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let client = ShilpClient::new(ClientConfig::new(server.uri()).with_timeout_secs(1)).unwrap();
    let err = client.health_check().await.unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let client = ShilpClient::connect("http://127.0.0.1:9").unwrap();
    let err = client.health_check().await.unwrap_err();
    assert!(matches!(err, Error::Transport(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_user_agent_header_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .and(wiremock::matchers::header("user-agent", "replica-sync/2.0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ClientConfig::new(server.uri()).with_user_agent("replica-sync/2.0");
    ShilpClient::new(config)
        .unwrap()
        .health_check()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_import_uploads_multipart_file_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/collections/v1/import"))
        .and(body_string_contains("name=\"file\""))
        .and(body_string_contains("filename=\"docs.shilp\""))
        .and(body_string_contains("exported-bytes"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": true, "message": "imported"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("docs.shilp");
    let mut file = std::fs::File::create(&file_path).unwrap();
    file.write_all(b"exported-bytes").unwrap();

    let resp = client_for(&server)
        .import_collection(&file_path)
        .await
        .unwrap();
    assert!(resp.success);
    assert_eq!(resp.message, "imported");
}

#[tokio::test]
async fn test_upload_missing_file_is_io_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = client_for(&server)
        .upload_data_file(std::path::Path::new("/nonexistent/data.csv"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[tokio::test]
async fn test_export_streams_into_file() {
    let server = MockServer::start().await;
    let blob: Vec<u8> = (0..=255u8).cycle().take(64 * 1024).collect();
    Mock::given(method("POST"))
        .and(path("/api/collections/v1/docs/export"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(blob.clone()))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("docs.export");
    let written = client_for(&server)
        .export_collection_to_file("docs", &dest)
        .await
        .unwrap();

    assert_eq!(written, blob.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), blob);
}

#[tokio::test]
async fn test_stalled_export_removes_partial_file() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 1000\r\n\r\nPARTIAL")
            .await
            .unwrap();
        // Hold the connection open without sending the rest.
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    init_tracing();
    let client =
        ShilpClient::new(ClientConfig::new(format!("http://{}", addr)).with_timeout_secs(1))
            .unwrap();
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("docs.export");

    let err = client
        .export_collection_to_file("docs", &dest)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout(_)), "got {:?}", err);
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_export_error_status_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/collections/v1/docs/export"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such collection"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .export_collection("docs")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn test_ingest_stats_events_in_order() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/v1/ingest/stats"))
        .and(query_param("collection", "docs"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string("data: {\"processed\":10}\r\n\r\ndata: {\"processed\":20}\n\ndata: done"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut sub = client_for(&server)
        .stream_ingest_stats("docs")
        .await
        .unwrap();

    let mut events = Vec::new();
    while let Some(event) = sub.next().await {
        events.push(event.unwrap());
    }
    assert_eq!(
        events,
        vec![
            "data: {\"processed\":10}",
            "data: {\"processed\":20}",
            "data: done"
        ]
    );
}

#[tokio::test]
async fn test_watch_ingest_stats_drains_to_callback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/v1/ingest/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("a\nb\nc\n"))
        .mount(&server)
        .await;

    let mut seen = Vec::new();
    client_for(&server)
        .watch_ingest_stats("docs", |line| seen.push(line))
        .await
        .unwrap();
    assert_eq!(seen, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_cancelled_subscription_delivers_nothing_more() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/v1/ingest/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_string("one\ntwo\nthree\n"))
        .mount(&server)
        .await;

    let mut sub = client_for(&server)
        .stream_ingest_stats("docs")
        .await
        .unwrap();
    assert_eq!(sub.next().await.unwrap().unwrap(), "one");

    sub.cancel();
    assert!(sub.next().await.is_none());
}

#[tokio::test]
async fn test_subscription_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/v1/ingest/stats"))
        .respond_with(ResponseTemplate::new(503).set_body_string("ingestion unavailable"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .stream_ingest_stats("docs")
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert!(err.is_retryable());
}
