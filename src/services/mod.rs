pub mod clustering;
pub mod thumbnails;
pub mod timeline_controller;
pub mod widget;

pub use clustering::{ClusterCriteria, ClusterOptions};
pub use thumbnails::{ThumbnailProjector, ThumbnailSnapshot};
pub use timeline_controller::{ControllerInput, SyncState, TimelineController};
pub use widget::{SelectionOptions, TimelineWidget, WidgetEvent, WidgetFactory, WidgetOptions};
