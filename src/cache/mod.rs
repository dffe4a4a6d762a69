pub mod coverage;
pub mod dataset;
pub mod event_cache;

pub use coverage::CoverageWindow;
pub use dataset::{DatasetChange, TimelineDataset};
pub use event_cache::{EventCache, FetchOutcome};
