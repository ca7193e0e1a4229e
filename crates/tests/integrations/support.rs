use std::{sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use intercept::LogFacility;
use protocol::{ClientCodec, ControlLevel, LoggerDirective, LoggingUpdate};
use serde_json::Value;
use server::{LogRelay, RelayConfig, RelayListener};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    time::{sleep, timeout},
};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub const WAIT: Duration = Duration::from_secs(5);

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct Harness {
    pub relay: LogRelay,
    pub listener: RelayListener,
}

impl Harness {
    pub async fn start() -> Self {
        let config = RelayConfig { ports: vec![0], ..RelayConfig::default() };
        let relay = LogRelay::new(Arc::new(LogFacility::with_tracing()), config).unwrap();
        let listener = relay.start().await.unwrap();
        Self { relay, listener }
    }

    pub fn url(&self, query: &str) -> String {
        format!("ws://{}{}{}", self.listener.local_addr(), self.relay.config().path, query)
    }

    /// Connects and waits until the hub has counted the new viewer.
    pub async fn connect(&self) -> Client {
        self.connect_with_query("").await
    }

    pub async fn connect_with_query(&self, query: &str) -> Client {
        let expected = self.relay.hub().viewer_count() + 1;
        let (client, _) = connect_async(self.url(query)).await.unwrap();
        self.wait_for(|| self.relay.hub().viewer_count() == expected).await;
        client
    }

    pub async fn wait_for(&self, condition: impl Fn() -> bool) {
        timeout(WAIT, async {
            while !condition() {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    /// Raw HTTP GET against the listener.
    pub async fn http_get(&self, path: &str) -> String {
        let mut stream = TcpStream::connect(self.listener.local_addr()).await.unwrap();
        let request =
            format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        timeout(WAIT, stream.read_to_string(&mut response)).await.unwrap().unwrap();
        response
    }
}

/// Next text frame, parsed as JSON.
pub async fn next_json(client: &mut Client) -> Value {
    loop {
        let frame = timeout(WAIT, client.next()).await.expect("no frame in time");
        match frame.expect("socket closed").unwrap() {
            Message::Text(text) => return serde_json::from_str(text.as_str()).unwrap(),
            Message::Binary(bytes) => return serde_json::from_slice(&bytes).unwrap(),
            _ => continue,
        }
    }
}

pub async fn send_text(client: &mut Client, text: impl Into<String>) {
    let text: String = text.into();
    client.send(Message::Text(text.into())).await.unwrap();
}

pub fn root_update(level: ControlLevel) -> String {
    let update = LoggingUpdate::new(vec![
        LoggerDirective { logger: "db".into(), level: ControlLevel::Error, group: true },
        LoggerDirective { logger: "root".into(), level, group: false },
    ]);
    ClientCodec.encode(&update).unwrap()
}
