use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

use crate::game::NamePolicy;
use crate::websocket::Heartbeat;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: u32,
    /// Address participants should use, when it differs from the bind address.
    pub public_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebSocketConfig {
    pub host: String,
    pub port: u16,
    pub heartbeat_interval_secs: u64,
    pub heartbeat_timeout_secs: u64,
}

impl WebSocketConfig {
    pub fn heartbeat(&self) -> Heartbeat {
        Heartbeat {
            interval: Duration::from_secs(self.heartbeat_interval_secs),
            timeout: Duration::from_secs(self.heartbeat_timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    pub name_policy: NamePolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allow_any_origin: bool,
    pub max_age: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub environment: String,
    pub server: ServerConfig,
    pub websocket: WebSocketConfig,
    pub game: GameConfig,
    pub cors: CorsConfig,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("websocket.host", "0.0.0.0")?
            .set_default("websocket.port", 8081)?
            .set_default("websocket.heartbeat_interval_secs", 30)?
            .set_default("websocket.heartbeat_timeout_secs", 40)?
            .set_default("game.name_policy", "reject")?
            .set_default("cors.enabled", true)?
            .set_default("cors.allow_any_origin", true)?
            .set_default("cors.max_age", 3600)?

            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))

            // E.g., `APP_WEBSOCKET__PORT=5001` would set `Settings.websocket.port`
            .add_source(
                Environment::with_prefix("app")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        s.try_deserialize()
    }

    pub fn new_for_test() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("environment", "test")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", 1)?
            .set_default("websocket.host", "127.0.0.1")?
            .set_default("websocket.port", 8081)?
            .set_default("websocket.heartbeat_interval_secs", 30)?
            .set_default("websocket.heartbeat_timeout_secs", 40)?
            .set_default("game.name_policy", "reject")?
            .set_default("cors.enabled", false)?
            .set_default("cors.allow_any_origin", false)?
            .set_default("cors.max_age", 3600)?
            .build()?
            .try_deserialize()
    }

    /// WebSocket address advertised to participants.
    pub fn join_url(&self) -> String {
        match &self.server.public_url {
            Some(url) => url.clone(),
            None => format!("ws://{}:{}/", self.websocket.host, self.websocket.port),
        }
    }
}
