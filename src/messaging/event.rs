use crate::models::View;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Notification kinds emitted to the hosting environment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventType {
    FetchError,
    ThumbnailsOpened,
    ThumbnailsClosed,
    ViewChanged,
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FetchError => write!(f, "timeline.fetch_error"),
            Self::ThumbnailsOpened => write!(f, "thumbnails.open"),
            Self::ThumbnailsClosed => write!(f, "thumbnails.close"),
            Self::ViewChanged => write!(f, "view.changed"),
        }
    }
}

/// Notification payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// A media query failed; the message is meant for the end user
    FetchError { message: String },
    ThumbnailsOpened,
    ThumbnailsClosed,
    /// The view holder should adopt this evolved view
    ViewChanged(Box<View>),
}

impl Notification {
    pub fn event_type(&self) -> EventType {
        match self {
            Self::FetchError { .. } => EventType::FetchError,
            Self::ThumbnailsOpened => EventType::ThumbnailsOpened,
            Self::ThumbnailsClosed => EventType::ThumbnailsClosed,
            Self::ViewChanged(_) => EventType::ViewChanged,
        }
    }
}

/// Event message structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    /// Unique message ID
    pub id: Uuid,
    /// Message timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub notification: Notification,
}

impl EventMessage {
    /// Create a new event message
    pub fn new(notification: Notification) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            notification,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.notification.event_type()
    }

    /// Get the routing key for the event
    pub fn routing_key(&self) -> String {
        self.event_type().to_string()
    }
}
