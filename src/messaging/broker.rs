use crate::messaging::event::{EventMessage, EventType, Notification};
use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Callback function type for event handling
pub type EventCallback = Arc<dyn Fn(EventMessage) -> Result<()> + Send + Sync>;

/// Message broker service trait
#[async_trait]
pub trait MessageBrokerTrait: Send + Sync {
    /// Publish a notification
    async fn publish(&self, notification: Notification) -> Result<()>;

    /// Subscribe to an event type
    async fn subscribe(&self, event_type: EventType, callback: EventCallback) -> Result<String>;

    /// Subscribe to every event
    async fn subscribe_all(&self, callback: EventCallback) -> Result<String>;

    /// Unsubscribe from a subscription
    async fn unsubscribe(&self, subscription_id: &str) -> Result<()>;
}

struct Subscription {
    event_type: Option<EventType>,
    callback: EventCallback,
}

/// In-process broker delivering notifications to the hosting environment
#[derive(Default)]
pub struct MessageBroker {
    /// Subscriptions map
    subscriptions: RwLock<HashMap<String, Subscription>>,
}

impl MessageBroker {
    /// Create a new message broker
    pub fn new() -> Self {
        Self::default()
    }

    async fn add_subscription(&self, event_type: Option<EventType>, callback: EventCallback) -> String {
        let subscription_id = Uuid::new_v4().to_string();
        self.subscriptions.write().await.insert(
            subscription_id.clone(),
            Subscription {
                event_type,
                callback,
            },
        );
        subscription_id
    }
}

#[async_trait]
impl MessageBrokerTrait for MessageBroker {
    async fn publish(&self, notification: Notification) -> Result<()> {
        let message = EventMessage::new(notification);
        let subscriptions = self.subscriptions.read().await;

        debug!(
            "Publishing {} to {} subscription(s)",
            message.routing_key(),
            subscriptions.len()
        );

        for (subscription_id, subscription) in subscriptions.iter() {
            if subscription
                .event_type
                .map_or(true, |event_type| event_type == message.event_type())
            {
                // A failing subscriber must not stop delivery to the others
                if let Err(e) = (subscription.callback)(message.clone()) {
                    warn!(
                        "Subscriber {} failed to handle {}: {}",
                        subscription_id,
                        message.routing_key(),
                        e
                    );
                }
            }
        }

        Ok(())
    }

    async fn subscribe(&self, event_type: EventType, callback: EventCallback) -> Result<String> {
        Ok(self.add_subscription(Some(event_type), callback).await)
    }

    async fn subscribe_all(&self, callback: EventCallback) -> Result<String> {
        Ok(self.add_subscription(None, callback).await)
    }

    async fn unsubscribe(&self, subscription_id: &str) -> Result<()> {
        match self.subscriptions.write().await.remove(subscription_id) {
            Some(_) => Ok(()),
            None => Err(crate::error::Error::NotFound(format!(
                "Subscription not found: {}",
                subscription_id
            ))
            .into()),
        }
    }
}

/// Create a message broker shared by the cache and the controller
pub fn create_message_broker() -> Arc<MessageBroker> {
    Arc::new(MessageBroker::new())
}
