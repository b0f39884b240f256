//! Integration tests over a real websocket messagebus
//!
//! Each test binds a throwaway websocket server on an ephemeral port, points
//! the plugin at it and plays the part of the rest of the OVOS stack. The
//! service manager is a shell script standing in for `systemctl`.

use futures_util::{SinkExt, StreamExt};
use ovos_dashboard::{
    build_plexus,
    bus::{MessageBus, WebsocketBus},
    Config, Message,
};
use serde_json::Value;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::Message as Frame, WebSocketStream};

type ServerSocket = WebSocketStream<TcpStream>;

/// A `systemctl` stand-in that keeps unit state in a file
fn fake_systemctl(dir: &Path) -> String {
    let state = dir.join("active");
    let path = dir.join("systemctl");
    let script = format!(
        "#!/bin/sh\ncase \"$2\" in\n  start) touch {s} ;;\n  stop) rm -f {s} ;;\n  is-active) test -f {s} ;;\nesac\n",
        s = state.display()
    );
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.dashboard.systemctl = fake_systemctl(dir);
    config.timing.settle_poll_ms = 20;
    config.timing.settle_max_ms = 500;
    config.timing.command_timeout_ms = 5_000;
    config
}

async fn accept(listener: &TcpListener) -> ServerSocket {
    let (stream, _) = listener.accept().await.unwrap();
    accept_async(stream).await.unwrap()
}

async fn send(server: &mut ServerSocket, msg_type: &str) {
    let text = Message::new(msg_type)
        .with_context("source", "skills")
        .to_json()
        .unwrap();
    server.send(Frame::Text(text)).await.unwrap();
}

/// Read frames until a status response shows up
async fn status_response(server: &mut ServerSocket) -> Message {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), server.next())
            .await
            .expect("Timeout waiting for status response")
            .expect("Socket closed")
            .expect("Socket error");
        if let Frame::Text(text) = frame {
            let message: Message = text.parse().expect("Plugin sent malformed JSON");
            if message.msg_type == "ovos.PHAL.dashboard.status.response" {
                return message;
            }
        }
    }
}

#[tokio::test]
async fn test_enable_status_disable_over_websocket() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/core", listener.local_addr().unwrap());

    let (bus, mut server) = tokio::join!(
        WebsocketBus::connect(url, Duration::from_millis(50)),
        accept(&listener)
    );
    let bus: Arc<dyn MessageBus> = Arc::new(bus.unwrap());
    let plexus = build_plexus(&config).unwrap();
    let _task = plexus.spawn(bus);

    send(&mut server, "ovos.PHAL.dashboard.get.status").await;
    let reply = status_response(&mut server).await;
    assert_eq!(
        Value::Object(reply.data),
        serde_json::json!({"status": false, "url": null, "user": null, "password": null})
    );
    assert_eq!(reply.context["destination"], "skills");

    send(&mut server, "ovos.PHAL.dashboard.enable").await;
    let reply = status_response(&mut server).await;
    assert_eq!(reply.data["status"], true);
    assert_eq!(reply.data["user"], "OVOS");
    let url = reply.data["url"].as_str().unwrap();
    assert!(url.starts_with("https://") && url.ends_with(":5000"), "url was {}", url);
    let password = reply.data["password"].as_str().unwrap();
    assert_eq!(password.len(), 5);
    assert!(password.chars().all(|c| c.is_ascii_alphanumeric()));

    send(&mut server, "ovos.PHAL.dashboard.get.status").await;
    let again = status_response(&mut server).await;
    assert_eq!(again.data["password"], password);
    assert_eq!(again.data["url"], url);

    send(&mut server, "ovos.PHAL.dashboard.disable").await;
    let reply = status_response(&mut server).await;
    assert_eq!(reply.data["status"], false);
    assert_eq!(reply.data["password"], Value::Null);
}

#[tokio::test]
async fn test_reconnects_after_server_drop() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/core", listener.local_addr().unwrap());

    let (bus, server) = tokio::join!(
        WebsocketBus::connect(url, Duration::from_millis(50)),
        accept(&listener)
    );
    let bus = Arc::new(bus.unwrap());
    let plexus = build_plexus(&config).unwrap();
    let _task = plexus.spawn(bus.clone());

    // Kill the first connection; the client should come back on its own.
    drop(server);
    let mut server = tokio::time::timeout(Duration::from_secs(5), accept(&listener))
        .await
        .expect("Client did not reconnect");

    send(&mut server, "ovos.PHAL.dashboard.get.status").await;
    let reply = status_response(&mut server).await;
    assert_eq!(reply.data["status"], false);
    assert!(bus.is_connected());
}

#[tokio::test]
async fn test_foreign_and_malformed_traffic_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/core", listener.local_addr().unwrap());

    let (bus, mut server) = tokio::join!(
        WebsocketBus::connect(url, Duration::from_millis(50)),
        accept(&listener)
    );
    let bus: Arc<dyn MessageBus> = Arc::new(bus.unwrap());
    let plexus = build_plexus(&config).unwrap();
    let _task = plexus.spawn(bus);

    server.send(Frame::Text("not json".to_string())).await.unwrap();
    send(&mut server, "recognizer_loop:utterance").await;
    send(&mut server, "ovos.PHAL.dashboard.status.response").await;
    send(&mut server, "ovos.PHAL.dashboard.get.status").await;

    let reply = status_response(&mut server).await;
    assert_eq!(reply.data["status"], false);
    assert_eq!(reply.context["destination"], "skills");
}

#[tokio::test]
async fn test_null_context_still_gets_a_reply() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/core", listener.local_addr().unwrap());

    let (bus, mut server) = tokio::join!(
        WebsocketBus::connect(url, Duration::from_millis(50)),
        accept(&listener)
    );
    let bus: Arc<dyn MessageBus> = Arc::new(bus.unwrap());
    let plexus = build_plexus(&config).unwrap();
    let _task = plexus.spawn(bus);

    let frame = r#"{"type": "ovos.PHAL.dashboard.get.status", "data": {}, "context": null}"#;
    server.send(Frame::Text(frame.to_string())).await.unwrap();

    let reply = status_response(&mut server).await;
    assert_eq!(reply.data["status"], false);
    assert!(reply.context.is_empty());
}
