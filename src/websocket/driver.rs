use std::sync::Arc;
use futures::{Stream, StreamExt};
use tracing::{debug, error, info};

use crate::error::ChannelError;
use super::channel::SharedChannel;
use super::registry::ConnectionRegistry;

/// Broadcast to the remaining clients after a connection drops.
pub const DEPARTURE_ANNOUNCEMENT: &str = "A user has left the chat.";

/// Owns one connection's receive loop and turns its events into registry
/// calls.
pub struct ConnectionDriver {
    registry: Arc<ConnectionRegistry>,
    channel: SharedChannel,
}

impl ConnectionDriver {
    pub fn new(registry: Arc<ConnectionRegistry>, channel: SharedChannel) -> Self {
        Self { registry, channel }
    }

    /// Register the channel, relay every inbound message, then unregister and
    /// announce the departure once `inbound` errors or ends.
    pub async fn run<S>(self, mut inbound: S)
    where
        S: Stream<Item = Result<String, ChannelError>> + Unpin,
    {
        let id = self.channel.id();

        if let Err(e) = self.registry.register(self.channel.clone()).await {
            error!("Failed to register connection {}: {}", id, e);
            return;
        }

        while let Some(message) = inbound.next().await {
            match message {
                Ok(text) => {
                    debug!("Relaying {} bytes from connection {}", text.len(), id);
                    self.registry.broadcast(&text).await;
                }
                Err(e) => {
                    info!("Connection {} dropped: {}", id, e);
                    break;
                }
            }
        }

        self.registry.unregister(id).await;
        let report = self.registry.broadcast(DEPARTURE_ANNOUNCEMENT).await;
        info!(
            "Connection {} closed, departure announced to {} connections",
            id, report.delivered
        );
    }
}
