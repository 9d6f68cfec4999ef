//! Round, registration and ranking state for the buzzer.
//!
//! All of it lives behind one lock owned by [`Game`]. Every operation
//! mutates under that lock and hands the resulting view to the
//! [`BroadcastHub`] before releasing it, so observers see changes in the
//! same order they were applied.

mod error;
mod ledger;
mod registry;
mod round;

pub use error::Rejection;
pub use ledger::{BuzzLedger, BuzzRecord};
pub use registry::{NamePolicy, Registry};
pub use round::RoundController;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::websocket::BroadcastHub;

/// Point-in-time copy of everything an observer renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub records: Vec<BuzzRecord>,
    pub guest_count: usize,
    pub active: bool,
}

#[derive(Debug)]
struct GameState {
    registry: Registry,
    round: RoundController,
    ledger: BuzzLedger,
}

impl GameState {
    fn view(&self) -> GameView {
        GameView {
            records: self.ledger.snapshot(),
            guest_count: self.registry.count(),
            active: self.round.is_active(),
        }
    }
}

pub struct Game {
    state: Mutex<GameState>,
    hub: BroadcastHub,
}

impl Game {
    pub fn new(policy: NamePolicy, hub: BroadcastHub) -> Self {
        Self {
            state: Mutex::new(GameState {
                registry: Registry::new(policy),
                round: RoundController::new(),
                ledger: BuzzLedger::new(),
            }),
            hub,
        }
    }

    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    pub async fn register(&self, connection: Uuid, raw_name: &str) -> Result<String, Rejection> {
        let mut state = self.state.lock().await;
        let result = state.registry.register(connection, raw_name);

        self.hub.reply_registration(connection, &result).await;
        match &result {
            Ok(name) => {
                info!("Connection {} registered as {}", connection, name);
                self.hub.notify_guest_count(state.registry.count()).await;
            }
            Err(reason) => debug!("Registration refused for {}: {}", connection, reason),
        }

        result
    }

    /// Disconnect cleanup. Releases the name owned by `connection`, even one
    /// its session never got to cache.
    pub async fn unregister(&self, connection: Uuid) {
        let mut state = self.state.lock().await;
        if let Some(name) = state.registry.release(connection) {
            info!("{} left (connection {})", name, connection);
        }
        self.hub.notify_guest_count(state.registry.count()).await;
    }

    /// Submits a buzz for the session's cached `name`, timed on arrival.
    pub async fn buzz(&self, connection: Uuid, name: Option<&str>) -> Result<usize, Rejection> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        self.submit(&mut state, connection, name, now).await
    }

    /// [`Game::buzz`] with the arrival time supplied by the caller.
    #[doc(hidden)]
    pub async fn buzz_at(
        &self,
        connection: Uuid,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<usize, Rejection> {
        let mut state = self.state.lock().await;
        self.submit(&mut state, connection, name, now).await
    }

    async fn submit(
        &self,
        state: &mut GameState,
        connection: Uuid,
        name: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<usize, Rejection> {
        let result = if !state.round.is_active() {
            Err(Rejection::NotActive)
        } else {
            match name {
                Some(name) if state.registry.owner(name) == Some(connection) => {
                    state.ledger.submit(&state.round, name, now)
                }
                _ => Err(Rejection::NotRegistered),
            }
        };

        self.hub.reply_to_submitter(connection, &result).await;
        match &result {
            Ok(rank) => {
                debug!("Buzz from {:?} accepted at rank {}", name, rank);
                self.hub.notify_ledger(state.ledger.snapshot()).await;
            }
            Err(reason) => debug!("Buzz from {:?} refused: {}", name, reason),
        }

        result
    }

    pub async fn start_round(&self) {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        self.restart(&mut state, now).await;
    }

    /// [`Game::start_round`] anchored at a caller-supplied time.
    #[doc(hidden)]
    pub async fn start_round_at(&self, now: DateTime<Utc>) {
        let mut state = self.state.lock().await;
        self.restart(&mut state, now).await;
    }

    async fn restart(&self, state: &mut GameState, now: DateTime<Utc>) {
        state.round.start(now);
        state.ledger.reset();
        info!("Round started at {}", now.to_rfc3339());

        self.hub.notify_ledger(Vec::new()).await;
        self.hub.notify_round_started().await;
        self.hub.notify_round_state(true).await;
    }

    pub async fn clear_round(&self) {
        let mut state = self.state.lock().await;
        state.round.clear();
        state.ledger.reset();
        info!("Round cleared");

        self.hub.notify_ledger(Vec::new()).await;
        self.hub.notify_records_cleared().await;
        self.hub.notify_round_state(false).await;
    }

    /// Unicasts the current view to one connection.
    pub async fn send_state(&self, connection: Uuid) {
        let state = self.state.lock().await;
        self.hub.reply_state(connection, &state.view()).await;
    }

    pub async fn view(&self) -> GameView {
        self.state.lock().await.view()
    }
}
