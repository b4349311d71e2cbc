use std::time::Duration;

use redis_connect::{disconnect, ConnectError, Connector, Settings, DEFAULT_REDIS_URL};
use serde_json::json;

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
}

#[test]
fn test_explicit_url_is_used_verbatim() {
    let connector = Connector::new(Settings::with_url("redis://cache-host:7000/1"));
    let conn = connector.connect(Some("redis://localhost:6380/2")).unwrap();
    assert_eq!(conn.url(), "redis://localhost:6380/2");
}

#[test]
fn test_configured_url_used_when_argument_missing() {
    let settings = Settings::from_vars(vec![(
        "REDIS_URL".to_string(),
        "redis://cache-host:7000/1".to_string(),
    )])
    .unwrap();
    let conn = Connector::new(settings).connect(None).unwrap();
    assert_eq!(conn.url(), "redis://cache-host:7000/1");
}

#[test]
fn test_default_url_used_when_nothing_configured() {
    let settings = Settings::from_vars(Vec::new()).unwrap();
    let conn = Connector::new(settings).connect(Some("")).unwrap();
    assert_eq!(conn.url(), DEFAULT_REDIS_URL);
    assert_eq!(conn.db(), 0);
}

#[test]
fn test_non_string_argument_is_rejected() {
    let err = Connector::default().connect_value(Some(&json!(42))).unwrap_err();
    assert!(matches!(err, ConnectError::InvalidArgument(_)));
}

#[test]
fn test_connect_and_disconnect_without_runtime() {
    let conn = Connector::default().connect(None).unwrap();
    assert_eq!(disconnect(&conn).code(), 0);
    assert_eq!(disconnect(&conn).code(), 1);
}

#[tokio::test]
async fn test_unreachable_server_reports_through_channel() {
    let (connector, mut errors) = Connector::default().error_channel();

    // Returns before the dial happens
    let conn = connector.connect(Some("redis://127.0.0.1:1/0")).unwrap();
    assert!(!conn.is_closed());

    let err = tokio::time::timeout(Duration::from_secs(5), errors.recv())
        .await
        .expect("no connection error reported")
        .expect("error channel closed");
    assert!(!err.message().is_empty());

    assert_eq!(disconnect(&conn).code(), 0);
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_ping_and_close_live_server() {
    let conn = Connector::default().connect(Some(&redis_url())).unwrap();
    conn.ping().await.unwrap();
    conn.close().await.unwrap();
    assert!(conn.is_closed());
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_disconnect_live_server() {
    let conn = Connector::default().connect(Some(&redis_url())).unwrap();
    conn.ping().await.unwrap();
    assert_eq!(disconnect(&conn).code(), 0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(matches!(conn.ping().await, Err(ConnectError::Closed)));
}
