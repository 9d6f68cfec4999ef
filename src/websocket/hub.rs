use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::game::{BuzzRecord, GameView, Rejection};
use crate::websocket::{ConnectionPool, ServerMessage};

/// Typed fan-out over the [`ConnectionPool`].
///
/// Holds no state of its own; callers hand it the data to deliver.
/// Delivery failures are logged and never reach the caller.
pub struct BroadcastHub {
    pool: Arc<ConnectionPool>,
}

impl BroadcastHub {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> Arc<ConnectionPool> {
        self.pool.clone()
    }

    async fn broadcast(&self, msg: &ServerMessage) {
        match serde_json::to_string(msg) {
            Ok(text) => self.pool.broadcast(&text).await,
            Err(e) => error!("Failed to serialize server message: {}", e),
        }
    }

    async fn unicast(&self, connection: Uuid, msg: &ServerMessage) {
        let text = match serde_json::to_string(msg) {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to serialize server message: {}", e);
                return;
            }
        };
        if let Err(e) = self.pool.send_to(&connection, &text).await {
            // Usually a socket that closed while its request was queued
            debug!("Dropped reply to {}: {}", connection, e);
        }
    }

    pub async fn notify_guest_count(&self, count: usize) {
        self.broadcast(&ServerMessage::GuestCount { count }).await;
    }

    pub async fn notify_ledger(&self, records: Vec<BuzzRecord>) {
        self.broadcast(&ServerMessage::BuzzUpdate { records }).await;
    }

    pub async fn notify_round_started(&self) {
        self.broadcast(&ServerMessage::RoundStarted).await;
    }

    pub async fn notify_records_cleared(&self) {
        self.broadcast(&ServerMessage::RecordsCleared).await;
    }

    pub async fn notify_round_state(&self, active: bool) {
        self.broadcast(&ServerMessage::RoundState { active }).await;
    }

    pub async fn reply_registration(&self, connection: Uuid, result: &Result<String, Rejection>) {
        self.unicast(connection, &ServerMessage::registration(result)).await;
    }

    pub async fn reply_to_submitter(&self, connection: Uuid, result: &Result<usize, Rejection>) {
        self.unicast(connection, &ServerMessage::buzz_result(result)).await;
    }

    pub async fn reply_state(&self, connection: Uuid, view: &GameView) {
        self.unicast(
            connection,
            &ServerMessage::BuzzUpdate {
                records: view.records.clone(),
            },
        )
        .await;
        self.unicast(connection, &ServerMessage::GuestCount { count: view.guest_count })
            .await;
        self.unicast(connection, &ServerMessage::RoundState { active: view.active })
            .await;
    }
}
