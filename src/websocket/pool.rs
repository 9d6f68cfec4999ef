use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;
use crate::error::WebSocketError;
use tracing::{debug, error, info};

/// Outbound queues of every open socket, participants and host views alike.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    connections: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<Message>>>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn add(&self, id: Uuid, sender: mpsc::UnboundedSender<Message>) {
        self.connections.write().await.insert(id, sender);
        info!("Added connection {} to pool", id);
    }

    pub async fn remove(&self, id: &Uuid) -> bool {
        let removed = self.connections.write().await.remove(id).is_some();
        if removed {
            info!("Removed connection {} from pool", id);
        }
        removed
    }

    pub async fn broadcast(&self, msg: &str) {
        let connections = self.connections.read().await;
        let message = Message::Text(msg.to_string());

        for (id, sender) in connections.iter() {
            if let Err(e) = sender.send(message.clone()) {
                error!("Failed to broadcast to connection {}: {}", id, e);
            }
        }
        debug!("Broadcast to {} connections", connections.len());
    }

    pub async fn send_to(&self, id: &Uuid, msg: &str) -> Result<(), WebSocketError> {
        if let Some(sender) = self.connections.read().await.get(id) {
            sender
                .send(Message::Text(msg.to_string()))
                .map_err(|e| WebSocketError::SendError(e.to_string()))
        } else {
            Err(WebSocketError::ConnectionError(format!("Connection {} not found", id)))
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }
}
