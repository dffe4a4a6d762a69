//! Fakes shared by the unit tests.

use crate::cache::DatasetChange;
use crate::media_query::{MediaQuery, MediaQueryParameters};
use crate::messaging::{MessageBrokerTrait, Notification};
use crate::models::{BrowseMedia, MediaKind, TimelineWindow};
use crate::services::widget::{
    SelectionOptions, TimelineWidget, WidgetEvent, WidgetFactory, WidgetOptions,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc, Semaphore};

/// Media source with canned answers per camera name and kind
#[derive(Default)]
pub struct ScriptedMediaQuery {
    folders: HashMap<(String, MediaKind), Vec<BrowseMedia>>,
    failures: HashSet<(String, MediaKind)>,
    calls: Mutex<Vec<MediaQueryParameters>>,
    hold: Option<Semaphore>,
    by_range: bool,
}

impl ScriptedMediaQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media(mut self, camera_name: &str, kind: MediaKind, children: Vec<BrowseMedia>) -> Self {
        self.folders
            .entry((camera_name.to_string(), kind))
            .or_default()
            .extend(children);
        self
    }

    pub fn failing(mut self, camera_name: &str, kind: MediaKind) -> Self {
        self.failures.insert((camera_name.to_string(), kind));
        self
    }

    /// Only answer with media whose event overlaps the queried range.
    pub fn filtering_by_range(mut self) -> Self {
        self.by_range = true;
        self
    }

    /// Queries block until [`release`](Self::release) hands out permits.
    pub fn holding(mut self) -> Self {
        self.hold = Some(Semaphore::new(0));
        self
    }

    pub fn release(&self, queries: usize) {
        if let Some(hold) = self.hold.as_ref() {
            hold.add_permits(queries);
        }
    }

    pub fn calls(&self) -> Vec<MediaQueryParameters> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaQuery for ScriptedMediaQuery {
    async fn browse(&self, params: &MediaQueryParameters) -> Result<BrowseMedia> {
        self.calls.lock().unwrap().push(params.clone());
        if let Some(hold) = self.hold.as_ref() {
            hold.acquire().await?.forget();
        }

        let key = (params.camera_name.clone(), params.media_type);
        if self.failures.contains(&key) {
            return Err(anyhow!("connection refused"));
        }
        let mut children = self.folders.get(&key).cloned().unwrap_or_default();
        if self.by_range {
            children.retain(|child| {
                child.event().map_or(false, |event| {
                    params.after.map_or(true, |after| event.end_or_start() >= after)
                        && params.before.map_or(true, |before| event.start_time <= before)
                })
            });
        }
        Ok(BrowseMedia::folder(params.media_type.to_string(), children))
    }
}

/// Collect every notification published on `broker`.
pub async fn record_notifications(broker: &impl MessageBrokerTrait) -> Arc<Mutex<Vec<Notification>>> {
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    broker
        .subscribe_all(Arc::new(move |message| {
            sink.lock().unwrap().push(message.notification);
            Ok(())
        }))
        .await
        .unwrap();
    received
}

/// What the fake widget has been told
#[derive(Debug, Clone)]
pub struct WidgetRecord {
    pub window: TimelineWindow,
    pub selection: Vec<String>,
    pub set_window_calls: Vec<TimelineWindow>,
    pub selection_calls: Vec<(Vec<String>, SelectionOptions)>,
}

struct FakeWidget {
    record: Arc<Mutex<WidgetRecord>>,
    events: mpsc::UnboundedSender<WidgetEvent>,
}

impl TimelineWidget for FakeWidget {
    fn window(&self) -> TimelineWindow {
        self.record.lock().unwrap().window
    }

    fn set_window(&mut self, window: TimelineWindow) {
        {
            let mut record = self.record.lock().unwrap();
            record.window = window;
            record.set_window_calls.push(window);
        }
        let _ = self.events.send(WidgetEvent::RangeChanged {
            start: window.start,
            end: window.end,
            by_user: false,
        });
    }

    fn selection(&self) -> Vec<String> {
        self.record.lock().unwrap().selection.clone()
    }

    fn set_selection(&mut self, ids: Vec<String>, options: SelectionOptions) {
        let mut record = self.record.lock().unwrap();
        record.selection = ids.clone();
        record.selection_calls.push((ids, options));
    }
}

/// Factory handing out one shared fake widget record
pub struct FakeWidgetFactory {
    initial_window: TimelineWindow,
    record: Arc<Mutex<WidgetRecord>>,
    created: Mutex<usize>,
    events: Mutex<Option<mpsc::UnboundedSender<WidgetEvent>>>,
    options: Mutex<Option<WidgetOptions>>,
    dataset: Mutex<Option<broadcast::Receiver<DatasetChange>>>,
}

impl FakeWidgetFactory {
    pub fn new(initial_window: TimelineWindow) -> Self {
        Self {
            initial_window,
            record: Arc::new(Mutex::new(WidgetRecord {
                window: initial_window,
                selection: Vec::new(),
                set_window_calls: Vec::new(),
                selection_calls: Vec::new(),
            })),
            created: Mutex::new(0),
            events: Mutex::new(None),
            options: Mutex::new(None),
            dataset: Mutex::new(None),
        }
    }

    pub fn created(&self) -> usize {
        *self.created.lock().unwrap()
    }

    pub fn record(&self) -> WidgetRecord {
        self.record.lock().unwrap().clone()
    }

    pub fn options(&self) -> Option<WidgetOptions> {
        self.options.lock().unwrap().clone()
    }

    /// Dataset changes the current widget instance has been sent.
    pub fn dataset_changes(&self) -> Vec<DatasetChange> {
        let mut changes = Vec::new();
        if let Some(receiver) = self.dataset.lock().unwrap().as_mut() {
            while let Ok(change) = receiver.try_recv() {
                changes.push(change);
            }
        }
        changes
    }

    /// Queue an event as if the user interacted with the widget.
    pub fn emit(&self, event: WidgetEvent) {
        if let WidgetEvent::RangeChanged { start, end, .. } = &event {
            self.record.lock().unwrap().window = TimelineWindow::new(*start, *end);
        }
        if let WidgetEvent::SelectionChanged { items } = &event {
            self.record.lock().unwrap().selection = items.clone();
        }
        if let Some(events) = self.events.lock().unwrap().as_ref() {
            let _ = events.send(event);
        }
    }
}

impl WidgetFactory for FakeWidgetFactory {
    fn create(
        &self,
        dataset: broadcast::Receiver<DatasetChange>,
        options: WidgetOptions,
        events: mpsc::UnboundedSender<WidgetEvent>,
    ) -> Box<dyn TimelineWidget> {
        *self.created.lock().unwrap() += 1;
        {
            let mut record = self.record.lock().unwrap();
            record.window = self.initial_window;
            record.selection.clear();
            record.set_window_calls.clear();
            record.selection_calls.clear();
        }
        *self.events.lock().unwrap() = Some(events.clone());
        *self.options.lock().unwrap() = Some(options);
        *self.dataset.lock().unwrap() = Some(dataset);
        Box::new(FakeWidget {
            record: self.record.clone(),
            events,
        })
    }
}
