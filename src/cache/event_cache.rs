use super::coverage::CoverageWindow;
use super::dataset::{DatasetChange, TimelineDataset};
use crate::config::{CacheConfig, CameraConfig};
use crate::media_query::{MediaQuery, MediaQueryParameters};
use crate::messaging::{MessageBrokerTrait, Notification};
use crate::models::{MediaFilter, TimelineItem};
use crate::utils::Clock;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch, RwLock};
use tokio_util::sync::CancellationToken;

/// Result of an attempt to ensure coverage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Data already covered the range
    NotFetched,
    /// This call fetched and merged new data
    Fetched,
    /// Another in-flight fetch covering the range completed
    Coalesced,
    /// The cache was reset while the fetch was in flight; results were dropped
    Cancelled,
}

impl FetchOutcome {
    /// Whether the dataset may have changed.
    pub fn has_new_data(&self) -> bool {
        matches!(self, Self::Fetched | Self::Coalesced)
    }
}

struct CacheState {
    cameras: BTreeMap<String, CameraConfig>,
    media: MediaFilter,
    coverage: CoverageWindow,
    dataset: TimelineDataset,
    /// Cancelled and replaced on every reset
    generation: CancellationToken,
}

impl CacheState {
    fn reset(&mut self) {
        let previous = std::mem::replace(&mut self.generation, CancellationToken::new());
        previous.cancel();
        self.coverage.clear();
        self.dataset.clear();
    }
}

struct InFlightFetch {
    id: u64,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    done: watch::Receiver<Option<FetchOutcome>>,
}

/// Removes its registry entry and wakes joiners however the fetch ends.
struct InFlightGuard<'a> {
    registry: &'a Mutex<Vec<InFlightFetch>>,
    id: u64,
    done: watch::Sender<Option<FetchOutcome>>,
    outcome: FetchOutcome,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|pending| pending.id != self.id);
        let _ = self.done.send(Some(self.outcome));
    }
}

/// A registered fetch whose queries have not been issued yet
struct PendingFetch<'a> {
    queries: Vec<(String, MediaQueryParameters)>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    token: CancellationToken,
    guard: InFlightGuard<'a>,
}

/// Merged event dataset plus the bookkeeping that decides when to refetch
pub struct EventCache {
    query: Arc<dyn MediaQuery>,
    broker: Arc<dyn MessageBrokerTrait>,
    clock: Arc<dyn Clock>,
    state: RwLock<CacheState>,
    in_flight: Mutex<Vec<InFlightFetch>>,
    next_fetch_id: AtomicU64,
}

impl EventCache {
    /// Create a new event cache
    pub fn new(
        config: &CacheConfig,
        query: Arc<dyn MediaQuery>,
        broker: Arc<dyn MessageBrokerTrait>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let max_age = config.max_age().and_then(|age| chrono::Duration::from_std(age).ok());
        Self {
            query,
            broker,
            clock,
            state: RwLock::new(CacheState {
                cameras: BTreeMap::new(),
                media: MediaFilter::default(),
                coverage: CoverageWindow::new(max_age),
                dataset: TimelineDataset::new(),
                generation: CancellationToken::new(),
            }),
            in_flight: Mutex::new(Vec::new()),
            next_fetch_id: AtomicU64::new(0),
        }
    }

    /// Replace the camera set. A different set resets the cache; returns whether it changed.
    pub async fn set_cameras(&self, cameras: BTreeMap<String, CameraConfig>) -> bool {
        let mut state = self.state.write().await;
        if state.cameras == cameras {
            return false;
        }
        state.reset();
        state.cameras = cameras;
        info!("Timeline event cache reset for {} camera(s)", state.cameras.len());
        true
    }

    pub async fn set_media_filter(&self, media: MediaFilter) {
        self.state.write().await.media = media;
    }

    /// Drop all fetched data and cancel any fetch in flight.
    pub async fn reset(&self) {
        self.state.write().await.reset();
        info!("Timeline event cache reset");
    }

    pub async fn has_coverage(&self, start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> bool {
        self.state
            .read()
            .await
            .coverage
            .has_coverage(start, end, self.clock.now())
    }

    pub async fn coverage(&self) -> CoverageWindow {
        self.state.read().await.coverage
    }

    /// Fetch unless `[start, end]` is already covered or being fetched.
    pub async fn fetch_events_if_necessary(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> FetchOutcome {
        let pending = {
            // Checked and registered under one guard so overlapping callers see each other
            let mut state = self.state.write().await;
            if let Some(done) = self.in_flight_covering(start, end) {
                drop(state);
                debug!("Joining in-flight fetch covering {} .. {}", start, end);
                return Self::join_in_flight(done).await;
            }
            if state.coverage.has_coverage(start, Some(end), self.clock.now()) {
                return FetchOutcome::NotFetched;
            }
            match self.begin_fetch(&mut state, start, end) {
                Some(pending) => pending,
                None => return FetchOutcome::NotFetched,
            }
        };
        self.run_fetch(pending).await
    }

    /// Widen the coverage window to include `[start, end]` and refetch all of it.
    ///
    /// The whole window is fetched rather than the new part only, so range
    /// events stored while still open get their end time.
    pub async fn fetch(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> FetchOutcome {
        let pending = {
            let mut state = self.state.write().await;
            match self.begin_fetch(&mut state, start, end) {
                Some(pending) => pending,
                None => return FetchOutcome::NotFetched,
            }
        };
        self.run_fetch(pending).await
    }

    fn in_flight_covering(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<watch::Receiver<Option<FetchOutcome>>> {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .find(|pending| pending.start <= start && end <= pending.end)
            .map(|pending| pending.done.clone())
    }

    async fn join_in_flight(mut done: watch::Receiver<Option<FetchOutcome>>) -> FetchOutcome {
        match done.wait_for(|outcome| outcome.is_some()).await {
            Ok(outcome) => match *outcome {
                Some(FetchOutcome::Fetched) => FetchOutcome::Coalesced,
                Some(other) => other,
                None => FetchOutcome::Cancelled,
            },
            // Sender gone without a result
            Err(_) => FetchOutcome::Cancelled,
        }
    }

    /// Widen, stamp and register a fetch. Must be called with the state write guard held.
    fn begin_fetch(
        &self,
        state: &mut CacheState,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Option<PendingFetch<'_>> {
        if state.cameras.is_empty() {
            debug!("No cameras configured, skipping timeline fetch");
            return None;
        }
        state.coverage.widen(start, end);
        let (fetch_start, fetch_end) = state.coverage.bounds()?;
        // Stamped before the queries resolve: the range counts as fresh while in flight
        state.coverage.mark_fetched(self.clock.now());

        let kinds = state.media.kinds();
        let queries: Vec<(String, MediaQueryParameters)> = state
            .cameras
            .iter()
            .flat_map(|(camera_id, camera)| {
                kinds.iter().map(move |kind| {
                    (
                        camera_id.clone(),
                        MediaQueryParameters::for_camera(camera, *kind, fetch_start, fetch_end),
                    )
                })
            })
            .collect();

        Some(PendingFetch {
            queries,
            start: fetch_start,
            end: fetch_end,
            token: state.generation.clone(),
            guard: self.register_in_flight(fetch_start, fetch_end),
        })
    }

    fn register_in_flight(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> InFlightGuard<'_> {
        let id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        let (done, receiver) = watch::channel(None);
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(InFlightFetch {
                id,
                start,
                end,
                done: receiver,
            });
        InFlightGuard {
            registry: &self.in_flight,
            id,
            done,
            outcome: FetchOutcome::Cancelled,
        }
    }

    async fn run_fetch(&self, pending: PendingFetch<'_>) -> FetchOutcome {
        let PendingFetch {
            queries,
            start,
            end,
            token,
            mut guard,
        } = pending;
        info!(
            "Fetching timeline events {} .. {} ({} queries)",
            start,
            end,
            queries.len()
        );

        let fetches = queries
            .iter()
            .map(|(camera_id, params)| self.fetch_one(camera_id, params));

        let results = tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Timeline fetch cancelled by cache reset");
                return FetchOutcome::Cancelled;
            }
            results = join_all(fetches) => results,
        };

        let items: Vec<TimelineItem> = results.into_iter().flatten().collect();
        let mut state = self.state.write().await;
        // Resets cancel under the same guard, so this check is final
        if token.is_cancelled() {
            info!("Discarding timeline fetch results after cache reset");
            return FetchOutcome::Cancelled;
        }
        debug!("Merging {} timeline item(s)", items.len());
        state.dataset.upsert(items);
        guard.outcome = FetchOutcome::Fetched;
        FetchOutcome::Fetched
    }

    /// Run one camera/media-kind query; failures are reported and yield no items.
    async fn fetch_one(&self, camera_id: &str, params: &MediaQueryParameters) -> Vec<TimelineItem> {
        match self.query.browse(params).await {
            Ok(folder) => folder
                .children
                .iter()
                .filter_map(|child| TimelineItem::from_media(camera_id, child))
                .collect(),
            Err(e) => {
                let message = format!(
                    "Failed to fetch {} for camera {}: {}",
                    params.media_type, camera_id, e
                );
                warn!("{}", message);
                if let Err(e) = self.broker.publish(Notification::FetchError { message }).await {
                    warn!("Failed to publish fetch error: {}", e);
                }
                Vec::new()
            }
        }
    }

    pub async fn subscribe(&self) -> broadcast::Receiver<DatasetChange> {
        self.state.read().await.dataset.subscribe()
    }

    /// Items ordered by start time.
    pub async fn items_by_start(&self) -> Vec<TimelineItem> {
        self.state
            .read()
            .await
            .dataset
            .items_by_start()
            .into_iter()
            .cloned()
            .collect()
    }

    pub async fn item(&self, id: &str) -> Option<TimelineItem> {
        self.state.read().await.dataset.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.dataset.len()
    }

    /// Re-upsert an item unchanged so subscribers recompute derived state.
    pub async fn touch(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        match state.dataset.get(id).cloned() {
            Some(item) => {
                state.dataset.upsert(vec![item]);
                true
            }
            None => false,
        }
    }
}
