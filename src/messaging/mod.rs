pub mod broker;
pub mod event;

pub use broker::{create_message_broker, EventCallback, MessageBroker, MessageBrokerTrait};
pub use event::{EventMessage, EventType, Notification};
