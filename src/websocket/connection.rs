use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, RwLock};
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::WebSocketError;
use crate::game::{BuzzRecord, Game, Rejection};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientMessage {
    #[serde(rename = "register")]
    Register { name: String },
    #[serde(rename = "buzz")]
    Buzz,
    #[serde(rename = "startRound")]
    StartRound,
    #[serde(rename = "clearRecords")]
    ClearRecords,
    #[serde(rename = "getState")]
    GetState,
    #[serde(rename = "ping")]
    Ping,
    #[serde(rename = "pong")]
    Pong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerMessage {
    #[serde(rename = "registered")]
    Registered {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename = "guestCount")]
    GuestCount { count: usize },
    #[serde(rename = "buzzResult")]
    BuzzResult {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    #[serde(rename = "buzzUpdate")]
    BuzzUpdate { records: Vec<BuzzRecord> },
    #[serde(rename = "roundStarted")]
    RoundStarted,
    #[serde(rename = "recordsCleared")]
    RecordsCleared,
    #[serde(rename = "roundState")]
    RoundState { active: bool },
    #[serde(rename = "error")]
    Error { message: String },
    #[serde(rename = "pong")]
    Pong,
}

impl ServerMessage {
    pub fn registration(result: &Result<String, Rejection>) -> Self {
        match result {
            Ok(name) => ServerMessage::Registered {
                success: true,
                name: Some(name.clone()),
                message: None,
            },
            Err(reason) => ServerMessage::Registered {
                success: false,
                name: None,
                message: Some(reason.to_string()),
            },
        }
    }

    pub fn buzz_result(result: &Result<usize, Rejection>) -> Self {
        match result {
            Ok(position) => ServerMessage::BuzzResult {
                success: true,
                position: Some(*position),
                message: None,
            },
            Err(reason) => ServerMessage::BuzzResult {
                success: false,
                position: None,
                message: Some(reason.to_string()),
            },
        }
    }
}

/// Heartbeat timing for one session.
#[derive(Debug, Clone, Copy)]
pub struct Heartbeat {
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            timeout: Duration::from_secs(40),
        }
    }
}

/// Per-socket session. Caches the registered name so `buzz` needs no payload.
pub struct Connection {
    id: Uuid,
    name: Option<String>,
    tx: mpsc::UnboundedSender<Message>,
    game: Arc<Game>,
    last_heartbeat: Arc<RwLock<Instant>>,
}

impl Connection {
    pub fn new(tx: mpsc::UnboundedSender<Message>, game: Arc<Game>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: None,
            tx,
            game,
            last_heartbeat: Arc::new(RwLock::new(Instant::now())),
        }
    }

    pub async fn handle_message(&mut self, msg: Message) -> Result<(), WebSocketError> {
        match msg {
            Message::Text(text) => {
                self.touch().await;
                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => self.dispatch(client_msg).await?,
                    Err(e) => {
                        debug!("Unparseable message on connection {}: {}", self.id, e);
                        self.send_error(&format!("Invalid message format: {}", e))?;
                    }
                }
            }
            Message::Close(_) => {
                info!("Client initiated close for connection {}", self.id);
                return Err(WebSocketError::ConnectionError(
                    "Connection closed by client".to_string(),
                ));
            }
            Message::Ping(data) => {
                self.touch().await;
                self.tx
                    .send(Message::Pong(data))
                    .map_err(|e| WebSocketError::SendError(e.to_string()))?;
            }
            Message::Pong(_) => {
                self.touch().await;
            }
            Message::Binary(_) => {
                self.send_error("Binary messages are not supported")?;
            }
            _ => {
                warn!("Received unsupported message type on connection {}", self.id);
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, msg: ClientMessage) -> Result<(), WebSocketError> {
        match msg {
            ClientMessage::Register { name } => {
                if let Ok(name) = self.game.register(self.id, &name).await {
                    self.name = Some(name);
                }
            }
            ClientMessage::Buzz => {
                // The outcome has already been unicast to this socket
                if let Ok(rank) = self.game.buzz(self.id, self.name.as_deref()).await {
                    debug!("Connection {} buzzed in at rank {}", self.id, rank);
                }
            }
            ClientMessage::StartRound => self.game.start_round().await,
            ClientMessage::ClearRecords => self.game.clear_round().await,
            ClientMessage::GetState => self.game.send_state(self.id).await,
            ClientMessage::Ping => self.send_message(&ServerMessage::Pong)?,
            ClientMessage::Pong => {}
        }
        Ok(())
    }

    async fn touch(&self) {
        *self.last_heartbeat.write().await = Instant::now();
    }

    fn send_message(&self, msg: &ServerMessage) -> Result<(), WebSocketError> {
        let text = serde_json::to_string(msg)
            .map_err(|e| WebSocketError::InvalidFormat(e.to_string()))?;

        self.tx
            .send(Message::Text(text))
            .map_err(|e| WebSocketError::SendError(e.to_string()))
    }

    fn send_error(&self, message: &str) -> Result<(), WebSocketError> {
        self.send_message(&ServerMessage::Error {
            message: message.to_string(),
        })
    }

    /// Pings the peer every `interval` and closes the session once nothing
    /// has been heard from it for `timeout`.
    pub fn start_heartbeat(&self, heartbeat: Heartbeat) {
        let last_heartbeat = self.last_heartbeat.clone();
        let tx = self.tx.clone();
        let id = self.id;

        tokio::spawn(async move {
            loop {
                sleep(heartbeat.interval).await;

                let elapsed = last_heartbeat.read().await.elapsed();
                if elapsed > heartbeat.timeout {
                    warn!("Heartbeat timeout for connection {}", id);
                    let _ = tx.send(Message::Close(None));
                    break;
                }

                if tx.send(Message::Ping(vec![])).is_err() {
                    // Writer is gone, the session already ended
                    break;
                }
            }
        });
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
