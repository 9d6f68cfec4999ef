use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use futures::{StreamExt, SinkExt};
use tracing::{debug, error, info};

use crate::error::{AppError, WebSocketError};
use crate::game::Game;
use crate::websocket::{Connection as WebSocketConnection, ConnectionPool, Heartbeat};

pub struct WebSocketServer {
    game: Arc<Game>,
    pool: Arc<ConnectionPool>,
    heartbeat: Heartbeat,
}

impl WebSocketServer {
    pub fn new(game: Arc<Game>, heartbeat: Heartbeat) -> Self {
        let pool = game.hub().pool();
        Self {
            game,
            pool,
            heartbeat,
        }
    }

    /// Accepts sockets until the listener fails.
    pub async fn serve(self: Arc<Self>, listener: TcpListener) -> Result<(), AppError> {
        loop {
            let (stream, addr) = listener
                .accept()
                .await
                .map_err(|e| WebSocketError::ConnectionError(format!("accept failed: {}", e)))?;

            let server = self.clone();
            tokio::spawn(async move {
                server.handle_connection(stream, addr).await;
            });
        }
    }

    pub async fn handle_connection(self: Arc<Self>, raw_stream: TcpStream, addr: SocketAddr) {
        info!("New WebSocket connection from: {}", addr);

        let ws_stream = match tokio_tungstenite::accept_async(raw_stream).await {
            Ok(ws) => ws,
            Err(e) => {
                error!("Error during WebSocket handshake: {}", e);
                return;
            }
        };

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut connection = WebSocketConnection::new(tx.clone(), self.game.clone());
        let connection_id = connection.id();

        connection.start_heartbeat(self.heartbeat);
        self.pool.add(connection_id, tx).await;

        // Forward queued messages to the socket
        let mut send_task = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let closing = matches!(message, tungstenite::Message::Close(_));
                if let Err(e) = ws_sink.send(message).await {
                    debug!("Error sending WebSocket message: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            let _ = ws_sink.close().await;
        });

        let receive = async {
            while let Some(message) = ws_stream.next().await {
                match message {
                    Ok(msg) => {
                        if let Err(e) = connection.handle_message(msg).await {
                            debug!("Ending connection {}: {}", connection_id, e);
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error receiving WebSocket message: {}", e);
                        break;
                    }
                }
            }
        };

        tokio::select! {
            _ = &mut send_task => {
                info!("Send task completed for connection {}", connection_id);
            }
            _ = receive => {
                info!("Receive task completed for connection {}", connection_id);
            }
        }

        self.pool.remove(&connection_id).await;
        self.game.unregister(connection_id).await;
        send_task.abort();
        info!("Connection {} closed", connection_id);
    }

    pub fn pool(&self) -> Arc<ConnectionPool> {
        self.pool.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use serde_json::{json, Value};
    use tokio::time::{sleep, timeout};
    use tokio_tungstenite::{connect_async, tungstenite::Message};
    use url::Url;
    use crate::game::NamePolicy;
    use crate::websocket::BroadcastHub;

    const POLL_INTERVAL: Duration = Duration::from_millis(100);

    async fn next_of_type<S>(read: &mut S, kind: &str) -> Value
    where
        S: futures::Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
    {
        timeout(Duration::from_secs(5), async {
            loop {
                if let Some(Ok(Message::Text(text))) = read.next().await {
                    let value: Value = serde_json::from_str(&text).unwrap();
                    if value["type"] == kind {
                        return value;
                    }
                }
            }
        })
        .await
        .expect("timed out waiting for message")
    }

    #[tokio::test]
    async fn test_websocket_server() {
        let _ = tracing_subscriber::fmt::try_init();

        let pool = Arc::new(ConnectionPool::new());
        let game = Arc::new(Game::new(NamePolicy::Reject, BroadcastHub::new(pool)));
        let server = Arc::new(WebSocketServer::new(game.clone(), Heartbeat::default()));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(server.clone().serve(listener));

        let url = Url::parse(&format!("ws://{}", addr)).unwrap();
        let (ws_stream, _) = connect_async(url.as_str()).await.unwrap();
        let (mut write, mut read) = ws_stream.split();

        let register = json!({ "type": "register", "payload": { "name": "Alice" } });
        write.send(Message::Text(register.to_string())).await.unwrap();
        let reply = next_of_type(&mut read, "registered").await;
        assert_eq!(reply["payload"]["success"], true);
        assert_eq!(server.pool().connection_count().await, 1);

        write.send(Message::Text(json!({ "type": "ping" }).to_string())).await.unwrap();
        next_of_type(&mut read, "pong").await;

        write.close().await.unwrap();
        sleep(POLL_INTERVAL * 2).await;

        assert_eq!(server.pool().connection_count().await, 0);
        assert_eq!(game.view().await.guest_count, 0);
    }
}
