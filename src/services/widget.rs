use super::clustering::{ClusterCriteria, ClusterOptions};
use crate::cache::DatasetChange;
use crate::config::{CameraConfig, ThumbnailsConfig, TimelineConfig};
use crate::models::TimelineWindow;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use tokio::sync::{broadcast, mpsc};

/// Events raised by the rendering widget
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEvent {
    SelectionChanged {
        items: Vec<String>,
    },
    RangeChanged {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        /// False when the change came from `set_window`
        by_user: bool,
    },
}

/// How a selection is applied to the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionOptions {
    /// Move the window to the selection
    pub focus: bool,
    pub animation: bool,
}

impl SelectionOptions {
    /// Highlight only; never navigates.
    pub fn echo() -> Self {
        Self {
            focus: false,
            animation: false,
        }
    }
}

/// One widget row per camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetGroup {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct WidgetOptions {
    pub groups: Vec<WidgetGroup>,
    pub cluster: Option<ClusterOptions>,
    pub zoom_min: Duration,
    pub zoom_max: Duration,
    pub selectable: bool,
    pub stack: bool,
    pub max_height: Option<u32>,
    pub thumbnails: ThumbnailsConfig,
}

impl WidgetOptions {
    pub fn from_config(
        config: &TimelineConfig,
        cameras: &BTreeMap<String, CameraConfig>,
        criteria: &ClusterCriteria,
    ) -> Self {
        let groups = cameras
            .iter()
            .map(|(id, camera)| WidgetGroup {
                id: id.clone(),
                content: camera.title.clone().unwrap_or_else(|| camera.camera_name.clone()),
            })
            .collect();

        Self {
            groups,
            cluster: config.cluster_max_items().map(|max_items| ClusterOptions {
                max_items,
                fit_on_double_click: true,
                criteria: criteria.clone(),
            }),
            zoom_min: Duration::seconds(1),
            zoom_max: Duration::days(1),
            selectable: true,
            stack: true,
            max_height: config.max_height,
            thumbnails: config.thumbnails.clone(),
        }
    }
}

/// Stateful timeline renderer driven by the controller
pub trait TimelineWidget: Send {
    fn window(&self) -> TimelineWindow;

    /// Programmatic move; the widget reports it with `by_user = false`.
    fn set_window(&mut self, window: TimelineWindow);

    fn selection(&self) -> Vec<String>;

    fn set_selection(&mut self, ids: Vec<String>, options: SelectionOptions);
}

/// Builds widget instances. Called once per instance; `events` is the only
/// channel through which the widget reports back.
pub trait WidgetFactory: Send + Sync {
    fn create(
        &self,
        dataset: broadcast::Receiver<DatasetChange>,
        options: WidgetOptions,
        events: mpsc::UnboundedSender<WidgetEvent>,
    ) -> Box<dyn TimelineWidget>;
}
