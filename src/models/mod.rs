pub mod event_models;
pub mod media_models;
pub mod timeline_models;
pub mod view_models;

pub use event_models::Event;
pub use media_models::{BrowseMedia, FrigateMetadata, MediaFilter, MediaKind};
pub use timeline_models::{TimelineItem, TimelineWindow};
pub use view_models::{TimelineContext, View, ViewChanges, ViewContext, ViewName};
