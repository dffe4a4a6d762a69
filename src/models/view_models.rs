use super::event_models::Event;
use super::media_models::BrowseMedia;
use super::timeline_models::TimelineWindow;
use serde::{Deserialize, Serialize};

/// Card views the host can show
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ViewName {
    #[default]
    Live,
    Clip,
    Clips,
    Snapshot,
    Snapshots,
    Timeline,
}

/// Timeline state persisted in the view context
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineContext {
    #[serde(default)]
    pub window: Option<TimelineWindow>,
}

/// Opaque state carried across view transitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewContext {
    #[serde(default)]
    pub timeline: Option<TimelineContext>,
    /// Entries owned by other components, preserved untouched
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ViewContext {
    pub fn timeline_window(&self) -> Option<&TimelineWindow> {
        self.timeline.as_ref().and_then(|timeline| timeline.window.as_ref())
    }

    /// Copy of this context with the timeline window replaced.
    pub fn with_timeline_window(&self, window: TimelineWindow) -> Self {
        let mut context = self.clone();
        context.timeline = Some(TimelineContext {
            window: Some(window),
        });
        context
    }
}

/// Externally owned view; never mutated in place, only evolved
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub view: ViewName,
    pub camera: String,
    #[serde(default)]
    pub target: Option<BrowseMedia>,
    #[serde(default)]
    pub child_index: Option<usize>,
    #[serde(default)]
    pub context: ViewContext,
}

/// Partial changes applied by [`View::evolve`]
#[derive(Debug, Clone, Default)]
pub struct ViewChanges {
    pub view: Option<ViewName>,
    pub camera: Option<String>,
    pub target: Option<Option<BrowseMedia>>,
    pub child_index: Option<Option<usize>>,
    pub context: Option<ViewContext>,
}

impl ViewChanges {
    pub fn target(mut self, target: Option<BrowseMedia>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn child_index(mut self, child_index: Option<usize>) -> Self {
        self.child_index = Some(child_index);
        self
    }

    pub fn context(mut self, context: ViewContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl View {
    pub fn new(view: ViewName, camera: impl Into<String>) -> Self {
        Self {
            view,
            camera: camera.into(),
            ..Default::default()
        }
    }

    /// Selected media: the target child at `child_index`, or the target itself
    /// when it is playable.
    pub fn media(&self) -> Option<&BrowseMedia> {
        let target = self.target.as_ref()?;
        match self.child_index {
            Some(index) => target.children.get(index),
            None if target.is_true_media() => Some(target),
            None => None,
        }
    }

    /// Event the view is focused on, if any.
    pub fn focused_event(&self) -> Option<&Event> {
        self.media().and_then(|media| media.event())
    }

    /// New, independent view with `changes` applied.
    pub fn evolve(&self, changes: ViewChanges) -> View {
        let mut view = self.clone();
        if let Some(name) = changes.view {
            view.view = name;
        }
        if let Some(camera) = changes.camera {
            view.camera = camera;
        }
        if let Some(target) = changes.target {
            view.target = target;
        }
        if let Some(child_index) = changes.child_index {
            view.child_index = child_index;
        }
        if let Some(context) = changes.context {
            view.context = context;
        }
        view
    }
}
