use std::time::Duration;

use common::{LogOptions, Severity, log_args};
use futures_util::{SinkExt, StreamExt};
use protocol::{ControlLevel, RELAY_PATH, THREAD_PLACEHOLDER, WELCOME_MESSAGE};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;

use crate::support::{Harness, WAIT, next_json, root_update, send_text};

// --- handshake ---

#[tokio::test]
async fn welcome_precedes_log_traffic() {
    let harness = Harness::start().await;
    let app = harness.relay.logger("app", None);
    let mut client = harness.connect().await;
    app.info(&log_args!["first", 1]);

    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["path"], RELAY_PATH);
    assert_eq!(welcome["data"]["type"], "welcome");
    assert_eq!(welcome["data"]["message"], WELCOME_MESSAGE);
    assert_eq!(welcome["data"]["path"], RELAY_PATH);
    assert_eq!(welcome["data"]["remoteAddress"], "127.0.0.1");
    assert!(welcome["data"]["timestamp"].as_str().unwrap().ends_with('Z'));

    let log = next_json(&mut client).await;
    assert_eq!(log["path"], RELAY_PATH);
    assert_eq!(log["data"]["type"], "log");
    assert_eq!(log["data"]["level"], "INFO");
    assert_eq!(log["data"]["logger"], "app");
    assert_eq!(log["data"]["thread"], THREAD_PLACEHOLDER);
    assert_eq!(log["data"]["message"], serde_json::json!(["first", 1]));
    assert!(log["data"]["ts"].as_i64().unwrap() > 0);

    harness.listener.shutdown().await;
}

#[tokio::test]
async fn welcome_echoes_request_target() {
    let harness = Harness::start().await;
    let mut client = harness.connect_with_query("?session=7").await;

    let welcome = next_json(&mut client).await;
    assert_eq!(welcome["path"], format!("{RELAY_PATH}?session=7"));
    assert_eq!(welcome["data"]["path"], format!("{RELAY_PATH}?session=7"));

    harness.listener.shutdown().await;
}

// --- control ---

#[tokio::test]
async fn root_update_changes_what_is_relayed() {
    let harness = Harness::start().await;
    let db = harness.relay.logger("db", Some(LogOptions::from("error")));
    let mut client = harness.connect().await;
    next_json(&mut client).await;

    db.debug(&log_args!["suppressed"]);
    send_text(&mut client, root_update(ControlLevel::Debug)).await;
    let factory = harness.relay.factory().clone();
    harness.wait_for(|| factory.root_level() == Severity::Debug).await;

    db.debug(&log_args!["visible"]);
    let log = next_json(&mut client).await;
    assert_eq!(log["data"]["level"], "DEBUG");
    assert_eq!(log["data"]["message"][0], "visible");

    harness.listener.shutdown().await;
}

#[tokio::test]
async fn malformed_frame_keeps_connection_open() {
    let harness = Harness::start().await;
    let app = harness.relay.logger("app", None);
    let mut client = harness.connect().await;
    next_json(&mut client).await;

    send_text(&mut client, "definitely not json").await;
    send_text(&mut client, r#"{"invalid":"message"}"#).await;
    send_text(&mut client, root_update(ControlLevel::Warn)).await;
    let factory = harness.relay.factory().clone();
    harness.wait_for(|| factory.root_level() == Severity::Warn).await;

    app.info(&log_args!["hidden"]);
    app.warn(&log_args!["shown"]);
    let log = next_json(&mut client).await;
    assert_eq!(log["data"]["level"], "WARN");
    assert_eq!(harness.relay.hub().viewer_count(), 1);

    harness.listener.shutdown().await;
}

#[tokio::test]
async fn binary_control_frame_is_applied() {
    let harness = Harness::start().await;
    let mut client = harness.connect().await;
    next_json(&mut client).await;

    let frame = root_update(ControlLevel::Error).into_bytes();
    client.send(Message::Binary(frame.into())).await.unwrap();
    let factory = harness.relay.factory().clone();
    harness.wait_for(|| factory.root_level() == Severity::Error).await;

    harness.listener.shutdown().await;
}

// --- lifecycle ---

#[tokio::test]
async fn every_viewer_receives_each_event() {
    let harness = Harness::start().await;
    let app = harness.relay.logger("app", None);
    let mut first = harness.connect().await;
    let mut second = harness.connect().await;
    next_json(&mut first).await;
    next_json(&mut second).await;

    app.error(&log_args!["fan out"]);
    for client in [&mut first, &mut second] {
        let log = next_json(client).await;
        assert_eq!(log["data"]["message"][0], "fan out");
    }

    harness.listener.shutdown().await;
}

#[tokio::test]
async fn last_disconnect_restores_loggers() {
    let harness = Harness::start().await;
    let db = harness.relay.logger("db", Some(LogOptions::from("warn")));
    let factory = harness.relay.factory().clone();
    let hub = harness.relay.hub().clone();

    let mut first = harness.connect().await;
    let mut second = harness.connect().await;
    assert!(factory.is_active());
    assert_eq!(db.level(), Severity::Info);

    first.close(None).await.unwrap();
    harness.wait_for(|| hub.viewer_count() == 1).await;
    assert!(factory.is_active());

    second.close(None).await.unwrap();
    harness.wait_for(|| !factory.is_active()).await;
    assert_eq!(db.level(), Severity::Warn);
    assert!(!db.has_pristine());

    harness.listener.shutdown().await;
}

#[tokio::test]
async fn shutdown_closes_viewers() {
    let harness = Harness::start().await;
    let mut client = harness.connect().await;
    next_json(&mut client).await;
    let factory = harness.relay.factory().clone();

    harness.listener.shutdown().await;

    let closed = timeout(WAIT, async {
        loop {
            match client.next().await {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok());

    let deactivated = timeout(WAIT, async {
        while factory.is_active() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(deactivated.is_ok());
}

// --- metrics ---

#[tokio::test]
async fn metrics_endpoint_reports_viewers() {
    let harness = Harness::start().await;
    let _client = harness.connect().await;

    let response = harness.http_get("/metrics").await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("relay_viewers 1"));
    assert!(response.contains("relay_events_broadcast_total"));

    harness.listener.shutdown().await;
}
