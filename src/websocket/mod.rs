//! WebSocket module for the chat relay
//!
//! This module holds the connection registry, the per-connection driver
//! that feeds it, and the actix session that terminates each websocket.

mod channel;
mod driver;
mod registry;
mod session;

pub use channel::{Channel, ChannelId, SharedChannel};
pub use driver::{ConnectionDriver, DEPARTURE_ANNOUNCEMENT};
pub use registry::{BroadcastReport, ConnectionRegistry};
pub use session::{OutboundText, WebSocketSession, WsChannel};
