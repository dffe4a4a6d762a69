use super::clustering::ClusterCriteria;
use super::thumbnails::{ThumbnailProjector, ThumbnailSnapshot};
use super::widget::{SelectionOptions, TimelineWidget, WidgetEvent, WidgetFactory, WidgetOptions};
use crate::cache::EventCache;
use crate::config::{CameraConfig, TimelineConfig};
use crate::messaging::{MessageBrokerTrait, Notification};
use crate::models::{Event, TimelineWindow, View, ViewChanges};
use crate::utils::Clock;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, trace, warn};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Padding around a focused event, and the span of the live window
const WINDOW_PADDING_HOURS: i64 = 1;

/// Synchronization state of the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No widget; waiting for cameras and configuration
    Uninitialized,
    /// Widget created, no view applied yet
    Ready,
    /// Widget reflects the current view
    Synchronized,
}

/// Inputs that drive the controller
#[derive(Debug, Clone)]
pub enum ControllerInput {
    CamerasChanged(BTreeMap<String, CameraConfig>),
    ConfigChanged(TimelineConfig),
    ViewChanged(View),
    Widget(WidgetEvent),
}

/// Window to show for a view: padded around the focused event, or the last hour.
pub fn window_for_view(focused: Option<&Event>, now: DateTime<Utc>) -> TimelineWindow {
    let padding = Duration::hours(WINDOW_PADDING_HOURS);
    match focused {
        Some(event) => {
            let start = event.start_time - padding;
            let end = match event.end_time {
                Some(end_time) => end_time + padding,
                None => event.start_time + padding,
            };
            TimelineWindow::new(start, end)
        }
        None => TimelineWindow::new(now - padding, now),
    }
}

/// Keeps the timeline widget, the event cache and the external view in step
pub struct TimelineController {
    cache: Arc<EventCache>,
    broker: Arc<dyn MessageBrokerTrait>,
    clock: Arc<dyn Clock>,
    factory: Arc<dyn WidgetFactory>,
    state: SyncState,
    cameras: Option<BTreeMap<String, CameraConfig>>,
    config: Option<TimelineConfig>,
    view: Option<View>,
    widget: Option<Box<dyn TimelineWidget>>,
    widget_events: Option<mpsc::UnboundedReceiver<WidgetEvent>>,
    criteria: ClusterCriteria,
    thumbnails: ThumbnailProjector,
}

impl TimelineController {
    pub fn new(
        cache: Arc<EventCache>,
        broker: Arc<dyn MessageBrokerTrait>,
        clock: Arc<dyn Clock>,
        factory: Arc<dyn WidgetFactory>,
    ) -> Self {
        Self {
            cache,
            broker,
            clock,
            factory,
            state: SyncState::Uninitialized,
            cameras: None,
            config: None,
            view: None,
            widget: None,
            widget_events: None,
            criteria: ClusterCriteria::new(),
            thumbnails: ThumbnailProjector::new(),
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Last view the controller knows of, including its own evolutions.
    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn thumbnails(&self) -> Option<&ThumbnailSnapshot> {
        self.thumbnails.current()
    }

    pub fn cluster_criteria(&self) -> &ClusterCriteria {
        &self.criteria
    }

    /// Apply one input.
    pub async fn handle(&mut self, input: ControllerInput) {
        match input {
            ControllerInput::CamerasChanged(cameras) => self.on_cameras_changed(cameras).await,
            ControllerInput::ConfigChanged(config) => self.on_config_changed(config).await,
            ControllerInput::ViewChanged(view) => self.on_view_changed(view).await,
            ControllerInput::Widget(event) => self.on_widget_event(event).await,
        }
    }

    /// Handle every event the widget has queued; returns how many were handled.
    pub async fn process_widget_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.widget_events.as_mut() {
                Some(events) => match events.try_recv() {
                    Ok(event) => event,
                    Err(_) => break,
                },
                None => break,
            };
            self.on_widget_event(event).await;
            handled += 1;
        }
        handled
    }

    async fn on_cameras_changed(&mut self, cameras: BTreeMap<String, CameraConfig>) {
        if self.cameras.as_ref() == Some(&cameras) {
            trace!("Camera set unchanged");
            return;
        }
        info!("Camera set changed ({} camera(s)), rebuilding timeline", cameras.len());
        self.cache.set_cameras(cameras.clone()).await;
        self.cameras = Some(cameras);
        self.destroy_widget();

        if self.ensure_widget().await {
            self.update_timeline_from_view().await;
        }
    }

    async fn on_config_changed(&mut self, config: TimelineConfig) {
        self.cache.set_media_filter(config.media).await;
        let media_changed = self
            .config
            .as_ref()
            .map_or(false, |current| current.media != config.media);
        if self.widget.is_some() && self.config.as_ref() != Some(&config) {
            // Options of a live widget are fixed at creation
            debug!("Timeline configuration changed; options apply to the next widget instance");
        }
        self.config = Some(config);

        if self.ensure_widget().await {
            self.update_timeline_from_view().await;
        } else if media_changed {
            self.regenerate_thumbnails().await;
        }
    }

    async fn on_view_changed(&mut self, view: View) {
        self.view = Some(view);
        if self.widget.is_none() {
            trace!("View changed before the timeline widget exists");
            return;
        }
        self.update_timeline_from_view().await;
    }

    fn destroy_widget(&mut self) {
        if self.widget.take().is_some() {
            debug!("Timeline widget destroyed");
        }
        self.widget_events = None;
        self.state = SyncState::Uninitialized;
    }

    /// Create the widget once cameras and configuration are both known.
    async fn ensure_widget(&mut self) -> bool {
        if self.widget.is_some() {
            return false;
        }
        let (Some(cameras), Some(config)) = (self.cameras.as_ref(), self.config.as_ref()) else {
            return false;
        };

        let options = WidgetOptions::from_config(config, cameras, &self.criteria);
        let (sender, receiver) = mpsc::unbounded_channel();
        let dataset = self.cache.subscribe().await;
        self.widget = Some(self.factory.create(dataset, options, sender));
        self.widget_events = Some(receiver);
        self.state = SyncState::Ready;
        info!("Timeline widget created");
        true
    }

    async fn update_timeline_from_view(&mut self) {
        let Some(view) = self.view.clone() else {
            return;
        };
        if self.config.is_none() {
            return;
        }

        let focused = view.focused_event().cloned();
        let window = window_for_view(focused.as_ref(), self.clock.now());
        let outcome = self.cache.fetch_events_if_necessary(window.start, window.end).await;

        let Some(widget) = self.widget.as_mut() else {
            return;
        };
        let current = widget.window();

        if let Some(context_window) = view.context.timeline_window() {
            // The user's last manual pan/zoom wins
            if *context_window != current {
                debug!("Restoring persisted timeline window");
                widget.set_window(*context_window);
            }
        } else if let Some(event) = focused.as_ref() {
            if !current.contains_range(event.start_time, event.end_or_start()) {
                debug!("Moving timeline window to event {}", event.id);
                widget.set_window(window);
            }
        } else {
            widget.set_window(window);
        }

        let selected: Vec<String> = focused.iter().map(|event| event.id.clone()).collect();
        widget.set_selection(selected, SelectionOptions::echo());
        self.criteria.set_selected(focused.as_ref().map(|event| event.id.clone()));

        let clustering = self
            .config
            .as_ref()
            .and_then(|config| config.cluster_max_items())
            .is_some();
        if clustering {
            if let Some(event) = focused.as_ref() {
                // Cluster membership is only recomputed when the data changes
                self.cache.touch(&event.id).await;
            }
        }

        if outcome.has_new_data() {
            self.regenerate_thumbnails().await;
        }
        self.state = SyncState::Synchronized;
    }

    async fn on_widget_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::RangeChanged { start, end, by_user } => {
                if !by_user {
                    return;
                }
                self.persist_window(TimelineWindow::new(start, end)).await;
                let outcome = self.cache.fetch_events_if_necessary(start, end).await;
                if outcome.has_new_data() {
                    self.regenerate_thumbnails().await;
                }
            }
            WidgetEvent::SelectionChanged { items } => {
                let index = items.first().and_then(|id| self.thumbnails.index_of(id));
                match index {
                    Some(index) => {
                        self.thumbnails.set_focus(Some(index));
                        self.publish(Notification::ThumbnailsOpened).await;
                    }
                    None => self.publish(Notification::ThumbnailsClosed).await,
                }
            }
        }
    }

    async fn persist_window(&mut self, window: TimelineWindow) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        let context = view.context.with_timeline_window(window);
        self.dispatch_view(ViewChanges::default().context(context)).await;
    }

    async fn regenerate_thumbnails(&mut self) {
        let Some(config) = self.config.as_ref() else {
            return;
        };
        let media = config.media;
        let selected = self
            .widget
            .as_ref()
            .map(|widget| widget.selection())
            .unwrap_or_default();
        let items = self.cache.items_by_start().await;

        let Some(snapshot) = self.thumbnails.update(&items, media, &selected).cloned() else {
            return;
        };
        debug!(
            "Thumbnails changed: {} item(s), focus {:?}",
            snapshot.target.children.len(),
            snapshot.child_index
        );
        self.dispatch_view(
            ViewChanges::default()
                .target(Some(snapshot.target))
                .child_index(snapshot.child_index),
        )
        .await;
    }

    /// Evolve the known view and tell the host about it.
    async fn dispatch_view(&mut self, changes: ViewChanges) {
        let Some(view) = self.view.as_ref() else {
            return;
        };
        let evolved = view.evolve(changes);
        self.view = Some(evolved.clone());
        self.publish(Notification::ViewChanged(Box::new(evolved))).await;
    }

    async fn publish(&self, notification: Notification) {
        if let Err(e) = self.broker.publish(notification).await {
            warn!("Failed to publish timeline notification: {}", e);
        }
    }
}
