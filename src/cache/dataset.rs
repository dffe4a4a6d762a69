use crate::models::TimelineItem;
use std::collections::HashMap;
use tokio::sync::broadcast;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Change notification for dataset subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetChange {
    /// Items as stored after the merge
    Upserted(Vec<TimelineItem>),
    Cleared,
}

/// Insertion-ordered timeline items keyed by event id.
///
/// Upserting an existing id merges into the stored item; every mutation is
/// broadcast so renderers never read the map directly.
#[derive(Debug)]
pub struct TimelineDataset {
    items: Vec<TimelineItem>,
    index: HashMap<String, usize>,
    changes: broadcast::Sender<DatasetChange>,
}

impl TimelineDataset {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            items: Vec::new(),
            index: HashMap::new(),
            changes,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DatasetChange> {
        self.changes.subscribe()
    }

    /// Insert or merge `items`, then notify subscribers once.
    pub fn upsert(&mut self, items: Vec<TimelineItem>) {
        if items.is_empty() {
            return;
        }
        let mut changed_ids = Vec::with_capacity(items.len());
        for item in items {
            let id = item.id.clone();
            match self.index.get(&id).copied() {
                Some(position) => self.items[position].merge(item),
                None => {
                    self.index.insert(id.clone(), self.items.len());
                    self.items.push(item);
                }
            }
            if !changed_ids.contains(&id) {
                changed_ids.push(id);
            }
        }

        let changed = changed_ids
            .iter()
            .filter_map(|id| self.get(id).cloned())
            .collect();
        // No subscribers is fine
        let _ = self.changes.send(DatasetChange::Upserted(changed));
    }

    pub fn get(&self, id: &str) -> Option<&TimelineItem> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Items ordered by start time; ties keep insertion order.
    pub fn items_by_start(&self) -> Vec<&TimelineItem> {
        let mut items: Vec<&TimelineItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.start);
        items
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
        let _ = self.changes.send(DatasetChange::Cleared);
    }
}

impl Default for TimelineDataset {
    fn default() -> Self {
        Self::new()
    }
}
