//! HTTP surface of the relay: the chat page, the websocket upgrade
//! and a health probe.

pub mod handlers;
mod page;

pub use handlers::{configure, health_check, index, websocket_route};
pub use page::CHAT_PAGE;
