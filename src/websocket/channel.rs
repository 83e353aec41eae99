use std::sync::Arc;
use async_trait::async_trait;
use uuid::Uuid;

use crate::error::ChannelError;

/// Identity of one accepted connection. Generated fresh per connection, so
/// two sockets from the same peer never share an id.
pub type ChannelId = Uuid;

/// Outbound half of a client connection.
///
/// The inbound half is a `Stream` of `Result<String, ChannelError>` handed to
/// [`ConnectionDriver::run`](super::ConnectionDriver::run); the stream ending
/// or yielding an error is the disconnect signal.
#[async_trait]
pub trait Channel: Send + Sync {
    fn id(&self) -> ChannelId;

    /// Deliver one text message, resolving once the transport accepted it.
    async fn send_text(&self, text: &str) -> Result<(), ChannelError>;
}

pub type SharedChannel = Arc<dyn Channel>;
