use tokio::sync::broadcast;

use stockpile_types::events::GatewayEvent;

/// Fans persisted-event notifications out to every connected client. The
/// per-inventory filtering happens at each connection, against the
/// inventories that client subscribed to.
#[derive(Clone)]
pub struct Dispatcher {
    broadcast_tx: broadcast::Sender<GatewayEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        Self { broadcast_tx }
    }

    /// Subscribe to gateway events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Publish an event. Delivery is best-effort: no subscribers is fine.
    pub fn publish(&self, event: GatewayEvent) {
        let _ = self.broadcast_tx.send(event);
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
