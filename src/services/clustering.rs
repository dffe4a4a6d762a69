use crate::models::TimelineItem;
use std::sync::{Arc, RwLock};

/// Decides which timeline items the widget may merge into a cluster.
///
/// Clones share the selected id, so the widget's copy follows the
/// controller's selection.
#[derive(Debug, Clone, Default)]
pub struct ClusterCriteria {
    selected: Arc<RwLock<Option<String>>>,
}

impl ClusterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_selected(&self, id: Option<String>) {
        *self.selected.write().unwrap_or_else(|e| e.into_inner()) = id;
    }

    pub fn selected(&self) -> Option<String> {
        self.selected.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The selected event is never clustered, and labels never mix.
    pub fn can_cluster(&self, first: &TimelineItem, second: &TimelineItem) -> bool {
        let selected = self.selected.read().unwrap_or_else(|e| e.into_inner());
        if let Some(selected) = selected.as_deref() {
            if first.id == selected || second.id == selected {
                return false;
            }
        }
        first.event.label == second.event.label
    }
}

/// Widget cluster settings
#[derive(Debug, Clone)]
pub struct ClusterOptions {
    pub max_items: usize,
    pub fit_on_double_click: bool,
    pub criteria: ClusterCriteria,
}
