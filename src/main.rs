use anyhow::{Context, Result};
use event_timeline::cache::{DatasetChange, EventCache};
use event_timeline::config::{self, Config};
use event_timeline::messaging::{create_message_broker, MessageBrokerTrait};
use event_timeline::models::{TimelineWindow, View, ViewName};
use event_timeline::services::{
    ControllerInput, SelectionOptions, TimelineController, TimelineWidget, WidgetEvent,
    WidgetFactory, WidgetOptions,
};
use event_timeline::utils::SystemClock;
use event_timeline::StaticMediaSource;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Widget that only logs what it is told
struct LoggingWidget {
    window: TimelineWindow,
    selection: Vec<String>,
    events: mpsc::UnboundedSender<WidgetEvent>,
}

impl TimelineWidget for LoggingWidget {
    fn window(&self) -> TimelineWindow {
        self.window
    }

    fn set_window(&mut self, window: TimelineWindow) {
        info!("Timeline window: {} .. {}", window.start, window.end);
        self.window = window;
        let _ = self.events.send(WidgetEvent::RangeChanged {
            start: window.start,
            end: window.end,
            by_user: false,
        });
    }

    fn selection(&self) -> Vec<String> {
        self.selection.clone()
    }

    fn set_selection(&mut self, ids: Vec<String>, options: SelectionOptions) {
        debug!("Timeline selection: {:?} ({:?})", ids, options);
        self.selection = ids;
    }
}

/// Log dataset changes until the cache goes away; returns how many were seen.
async fn log_dataset_changes(mut dataset: broadcast::Receiver<DatasetChange>) -> usize {
    let mut seen = 0;
    loop {
        match dataset.recv().await {
            Ok(DatasetChange::Upserted(items)) => info!("Timeline received {} item(s)", items.len()),
            Ok(DatasetChange::Cleared) => info!("Timeline cleared"),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Timeline widget skipped {} dataset change(s)", skipped);
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => return seen,
        }
        seen += 1;
    }
}

struct LoggingWidgetFactory;

impl WidgetFactory for LoggingWidgetFactory {
    fn create(
        &self,
        dataset: broadcast::Receiver<DatasetChange>,
        options: WidgetOptions,
        events: mpsc::UnboundedSender<WidgetEvent>,
    ) -> Box<dyn TimelineWidget> {
        info!(
            "Creating timeline widget with {} group(s), clustering {}",
            options.groups.len(),
            if options.cluster.is_some() { "on" } else { "off" }
        );
        tokio::spawn(log_dataset_changes(dataset));
        let now = chrono::Utc::now();
        Box::new(LoggingWidget {
            window: TimelineWindow::new(now, now),
            selection: Vec::new(),
            events,
        })
    }
}

fn init_logging(config: &Config) {
    // RUST_LOG takes precedence over the configured level
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_level.as_str()))
        .init();
}

async fn run_app() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let config_path = args.next().map(PathBuf::from);
    let fixture_path = args
        .next()
        .map(PathBuf::from)
        .context("Usage: event-timeline <config> <media-fixture.json>")?;

    let config = config::load_config(config_path.as_deref())?;
    init_logging(&config);
    info!("Starting event timeline with {} camera(s)", config.cameras.len());

    let source = StaticMediaSource::from_file(&fixture_path)?;
    let broker = create_message_broker();
    broker
        .subscribe_all(Arc::new(|message| {
            println!("[{}] {:?}", message.routing_key(), message.notification);
            Ok(())
        }))
        .await?;

    let clock = Arc::new(SystemClock);
    let cache = Arc::new(EventCache::new(
        &config.cache,
        Arc::new(source),
        broker.clone(),
        clock.clone(),
    ));
    let mut controller = TimelineController::new(cache, broker, clock, Arc::new(LoggingWidgetFactory));

    controller.handle(ControllerInput::ConfigChanged(config.timeline.clone())).await;
    controller.handle(ControllerInput::CamerasChanged(config.cameras.clone())).await;
    let camera = config.cameras.keys().next().cloned().unwrap_or_default();
    controller
        .handle(ControllerInput::ViewChanged(View::new(ViewName::Live, camera)))
        .await;
    let handled = controller.process_widget_events().await;
    debug!("Handled {} widget event(s)", handled);

    match controller.thumbnails() {
        Some(snapshot) => {
            println!("{}:", snapshot.target.title);
            for (index, child) in snapshot.target.children.iter().enumerate() {
                let marker = if Some(index) == snapshot.child_index { '*' } else { ' ' };
                println!("{} {} ({})", marker, child.title, child.media_content_type);
            }
        }
        None => println!("No thumbnails"),
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run_app().await {
        eprintln!("Application error: {:#}", e);
        std::process::exit(1);
    }
}
