//! The `/ws` change feed: subscriptions, mutation events and quotes.

#![allow(clippy::panic)]

mod common;

use std::time::Duration;

use common::TestSite;
use energies_site::backend::Row;
use energies_site::domain::{NewsItem, Service};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Socket = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

async fn connect(site: &TestSite) -> Socket {
    let url = format!("ws://{}/ws", site.addr);
    let Ok((socket, _)) = connect_async(url).await else {
        panic!("ws connect failed");
    };
    socket
}

async fn send(socket: &mut Socket, id: &str, payload: Value) {
    let envelope = json!({
        "id": id,
        "type": "command",
        "timestamp": chrono::Utc::now(),
        "payload": payload,
    });
    let Ok(()) = socket.send(Message::text(envelope.to_string())).await else {
        panic!("ws send failed");
    };
}

async fn next_json(socket: &mut Socket) -> Value {
    let Ok(Some(Ok(Message::Text(text)))) =
        tokio::time::timeout(Duration::from_secs(2), socket.next()).await
    else {
        panic!("no ws message");
    };
    let Ok(value) = serde_json::from_str::<Value>(&text) else {
        panic!("ws message must be JSON");
    };
    value
}

fn news_row(title: &str) -> Row {
    json!({ "title": title, "content": "Body", "is_published": true })
        .as_object()
        .cloned()
        .unwrap_or_default()
}

#[tokio::test]
async fn subscribed_tables_receive_content_events() {
    let site = TestSite::start().await;
    let mut socket = connect(&site).await;

    send(&mut socket, "sub-1", json!({ "command": "subscribe", "tables": ["news"] })).await;
    let ack = next_json(&mut socket).await;
    assert_eq!(ack.get("type"), Some(&Value::from("response")));
    assert_eq!(ack.get("id"), Some(&Value::from("sub-1")));

    let Ok(created) = site
        .state
        .content
        .table::<NewsItem>()
        .create(None, news_row("Tanker fleet grows"))
        .await
    else {
        panic!("create failed");
    };

    let event = next_json(&mut socket).await;
    assert_eq!(event.get("type"), Some(&Value::from("event")));
    let Some(payload) = event.get("payload") else {
        panic!("event without payload");
    };
    assert_eq!(payload.get("event_type"), Some(&Value::from("content_changed")));
    assert_eq!(payload.get("table"), Some(&Value::from("news")));
    assert_eq!(payload.get("action"), Some(&Value::from("created")));
    assert_eq!(
        payload.get("record_id"),
        Some(&Value::from(created.id.to_string()))
    );
}

#[tokio::test]
async fn unsubscribed_tables_stay_quiet() {
    let site = TestSite::start().await;
    let mut socket = connect(&site).await;
    send(&mut socket, "sub-1", json!({ "command": "subscribe", "tables": ["news"] })).await;
    let _ack = next_json(&mut socket).await;

    let row = json!({ "title": "Lubricants", "description": "Engine oils" })
        .as_object()
        .cloned()
        .unwrap_or_default();
    let Ok(_) = site.state.content.table::<Service>().create(None, row).await else {
        panic!("create failed");
    };
    let quiet = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(quiet.is_err(), "services change must not reach a news subscriber");
}

#[tokio::test]
async fn quote_command_answers_inline() {
    let site = TestSite::start().await;
    let mut socket = connect(&site).await;
    send(
        &mut socket,
        "q-1",
        json!({ "command": "quote", "fuel_type": "Diesel", "quantity": "10000" }),
    )
    .await;
    let reply = next_json(&mut socket).await;
    assert_eq!(reply.get("type"), Some(&Value::from("response")));
    let Some(payload) = reply.get("payload") else {
        panic!("reply without payload");
    };
    assert_eq!(payload.get("total"), Some(&Value::from(28_500_000u64)));
}

#[tokio::test]
async fn malformed_messages_get_an_error() {
    let site = TestSite::start().await;
    let mut socket = connect(&site).await;
    let Ok(()) = socket.send(Message::text("not json")).await else {
        panic!("ws send failed");
    };
    let reply = next_json(&mut socket).await;
    assert_eq!(reply.get("type"), Some(&Value::from("error")));
}
