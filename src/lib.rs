pub mod cache;
pub mod config;
pub mod error;
pub mod media_query;
pub mod messaging;
pub mod models;
pub mod services;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export main components for easier use
pub use cache::{EventCache, FetchOutcome};
pub use error::Error;
pub use media_query::{MediaQuery, MediaQueryParameters, StaticMediaSource};
pub use services::{ControllerInput, SyncState, TimelineController};
