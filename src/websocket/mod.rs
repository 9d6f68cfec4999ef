//! WebSocket transport for the buzzer.
//!
//! Sockets are accepted by [`WebSocketServer`], each one driven by a
//! [`Connection`] session. Outbound traffic goes through the
//! [`ConnectionPool`], typed by [`BroadcastHub`].

mod connection;
mod hub;
mod pool;
mod server;

pub use connection::{ClientMessage, Connection, Heartbeat, ServerMessage};
pub use hub::BroadcastHub;
pub use pool::ConnectionPool;
pub use server::WebSocketServer;
