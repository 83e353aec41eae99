use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::RegistryError;
use super::channel::{ChannelId, SharedChannel};

/// Outcome of one [`ConnectionRegistry::broadcast`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    /// Recipients whose send failed. They have been removed from the registry.
    pub failed: Vec<ChannelId>,
}

/// The set of channels currently eligible to receive broadcasts.
///
/// Register, unregister and the broadcast snapshot are serialized by one
/// mutex. Sends happen after the lock is released.
#[derive(Default)]
pub struct ConnectionRegistry {
    connections: Mutex<Vec<SharedChannel>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, channel: SharedChannel) -> Result<(), RegistryError> {
        let id = channel.id();
        let mut connections = self.connections.lock().await;
        if connections.iter().any(|c| c.id() == id) {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        connections.push(channel);
        info!("Added connection {} to registry", id);
        Ok(())
    }

    /// Remove a channel. Returns `false` if it was not registered.
    pub async fn unregister(&self, id: ChannelId) -> bool {
        let mut connections = self.connections.lock().await;
        match connections.iter().position(|c| c.id() == id) {
            Some(index) => {
                connections.remove(index);
                info!("Removed connection {} from registry", id);
                true
            }
            None => {
                debug!("Connection {} already removed from registry", id);
                false
            }
        }
    }

    /// Send `message` to every registered channel, one at a time, in
    /// registration order.
    ///
    /// A failed send does not stop delivery to the remaining recipients; the
    /// failed channels are pruned once the fan-out finishes.
    pub async fn broadcast(&self, message: &str) -> BroadcastReport {
        let recipients: Vec<SharedChannel> = self.connections.lock().await.clone();
        let mut report = BroadcastReport::default();

        for channel in &recipients {
            match channel.send_text(message).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("Failed to broadcast to connection {}: {}", channel.id(), e);
                    report.failed.push(channel.id());
                }
            }
        }

        if !report.failed.is_empty() {
            self.prune(&report.failed).await;
        }

        debug!(
            "Broadcast {} bytes to {} of {} connections",
            message.len(),
            report.delivered,
            recipients.len()
        );
        report
    }

    pub async fn contains(&self, id: ChannelId) -> bool {
        self.connections.lock().await.iter().any(|c| c.id() == id)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.lock().await.len()
    }

    pub async fn connection_ids(&self) -> Vec<ChannelId> {
        self.connections.lock().await.iter().map(|c| c.id()).collect()
    }

    async fn prune(&self, stale: &[ChannelId]) {
        let mut connections = self.connections.lock().await;
        connections.retain(|c| !stale.contains(&c.id()));
        for id in stale {
            info!("Removed unreachable connection {}", id);
        }
    }
}
