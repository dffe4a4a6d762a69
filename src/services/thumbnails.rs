use crate::models::{BrowseMedia, MediaFilter, TimelineItem};

pub const THUMBNAILS_TITLE: &str = "Timeline events";

/// Playable media derived from the dataset, plus the focused position
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailSnapshot {
    pub target: BrowseMedia,
    pub child_index: Option<usize>,
}

/// Build the thumbnail playlist for `items` (already in start order).
pub fn project(items: &[TimelineItem], filter: MediaFilter, selected: &[String]) -> ThumbnailSnapshot {
    let mut children = Vec::new();
    let mut child_index = None;

    for item in items {
        let position = children.len();
        if filter.wants_clips() {
            if let Some(clip) = item.clip.as_ref().filter(|clip| clip.is_true_media()) {
                children.push(clip.clone());
            }
        }
        if filter.wants_snapshots() {
            if let Some(snapshot) = item.snapshot.as_ref().filter(|snapshot| snapshot.is_true_media()) {
                children.push(snapshot.clone());
            }
        }
        if child_index.is_none() && children.len() > position && selected.contains(&item.id) {
            child_index = Some(position);
        }
    }

    ThumbnailSnapshot {
        target: BrowseMedia::folder(THUMBNAILS_TITLE, children),
        child_index,
    }
}

/// Keeps the last published snapshot and reports only real changes
#[derive(Debug, Default)]
pub struct ThumbnailProjector {
    current: Option<ThumbnailSnapshot>,
}

impl ThumbnailProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute; returns the new snapshot when its playlist differs from the current one.
    ///
    /// An empty playlist with nothing published before is not a change.
    pub fn update(
        &mut self,
        items: &[TimelineItem],
        filter: MediaFilter,
        selected: &[String],
    ) -> Option<&ThumbnailSnapshot> {
        let snapshot = project(items, filter, selected);
        let changed = match &self.current {
            Some(current) => current.target != snapshot.target,
            None => !snapshot.target.children.is_empty(),
        };
        if !changed {
            return None;
        }
        self.current = Some(snapshot);
        self.current.as_ref()
    }

    pub fn current(&self) -> Option<&ThumbnailSnapshot> {
        self.current.as_ref()
    }

    /// Position of the first media belonging to `event_id`.
    pub fn index_of(&self, event_id: &str) -> Option<usize> {
        self.current.as_ref()?.target.children.iter().position(|child| {
            child.event().map_or(false, |event| event.id == event_id)
        })
    }

    pub fn set_focus(&mut self, index: Option<usize>) {
        if let Some(current) = self.current.as_mut() {
            current.child_index = index;
        }
    }
}
