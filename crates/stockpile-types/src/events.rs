use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication
    Ready { user_id: Uuid, username: String },

    /// A comment was posted on an inventory
    CommentCreate {
        id: Uuid,
        inventory_id: Uuid,
        user_id: Uuid,
        username: String,
        text: String,
        created_at: chrono::DateTime<chrono::Utc>,
    },
}

impl GatewayEvent {
    /// Returns the inventory_id if this event is scoped to one inventory.
    /// Events that return `None` are delivered to all clients.
    pub fn inventory_id(&self) -> Option<Uuid> {
        match self {
            Self::CommentCreate { inventory_id, .. } => Some(*inventory_id),
            Self::Ready { .. } => None,
        }
    }
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },

    /// Subscribe to events for specific inventories. The server only
    /// forwards inventory-scoped events for subscribed inventories.
    Subscribe { inventory_ids: Vec<Uuid> },
}
