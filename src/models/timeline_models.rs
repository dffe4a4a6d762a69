use super::event_models::Event;
use super::media_models::BrowseMedia;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Displayed time window of the timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimelineWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Whether `[start, end]` lies entirely inside this window.
    pub fn contains_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.start && end <= self.end
    }
}

/// Renderable timeline entry, one per event id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: String,
    /// Camera id the item is grouped under
    pub group: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub content: String,
    pub tooltip: String,
    pub event: Event,
    pub clip: Option<BrowseMedia>,
    pub snapshot: Option<BrowseMedia>,
}

impl TimelineItem {
    /// Build an item from a browse node.
    ///
    /// Only true media with a `video` or `image` content type that carries an
    /// event descriptor becomes an item.
    pub fn from_media(camera_id: &str, media: &BrowseMedia) -> Option<Self> {
        if !media.is_true_media() {
            return None;
        }
        let event = media.event()?;
        let (clip, snapshot) = if media.is_video() {
            (Some(media.clone()), None)
        } else if media.is_image() {
            (None, Some(media.clone()))
        } else {
            return None;
        };

        Some(Self {
            id: event.id.clone(),
            group: camera_id.to_string(),
            start: event.start_time,
            end: event.end_time,
            content: String::new(),
            tooltip: tooltip_for(event),
            event: event.clone(),
            clip,
            snapshot,
        })
    }

    /// Merge a newer record for the same event into this one.
    ///
    /// Scalar fields come from `newer`; media absent from `newer` is kept.
    pub fn merge(&mut self, newer: TimelineItem) {
        debug_assert_eq!(self.id, newer.id);
        self.group = newer.group;
        self.start = newer.start;
        self.end = newer.end;
        self.content = newer.content;
        self.tooltip = newer.tooltip;
        self.event = newer.event;
        if newer.clip.is_some() {
            self.clip = newer.clip;
        }
        if newer.snapshot.is_some() {
            self.snapshot = newer.snapshot;
        }
    }
}

fn tooltip_for(event: &Event) -> String {
    let mut label = capitalize(&event.label);
    if let Some(score) = event.top_score {
        label = format!("{} {}%", label, (score * 100.0).round() as i64);
    }
    if !event.zones.is_empty() {
        label = format!("{} [{}]", label, event.zones.join(", "));
    }
    label
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::media_models::FrigateMetadata;

    pub fn event(id: &str, start: i64, end: Option<i64>) -> Event {
        Event {
            id: id.to_string(),
            camera: "front_door".to_string(),
            label: "person".to_string(),
            start_time: DateTime::from_timestamp(start, 0).unwrap(),
            end_time: end.map(|end| DateTime::from_timestamp(end, 0).unwrap()),
            top_score: None,
            has_clip: true,
            has_snapshot: true,
            zones: vec![],
        }
    }

    pub fn media(event: &Event, content_type: &str) -> BrowseMedia {
        BrowseMedia {
            title: format!("{} {}", event.label, event.id),
            media_class: content_type.to_string(),
            media_content_type: content_type.to_string(),
            media_content_id: format!("media-source://frigate/{}/{}", content_type, event.id),
            can_play: content_type == "video",
            can_expand: false,
            thumbnail: None,
            children: vec![],
            frigate: Some(FrigateMetadata {
                event: Some(event.clone()),
            }),
        }
    }

    #[test]
    fn video_media_becomes_clip_item() {
        let event = event("e1", 100, Some(200));
        let item = TimelineItem::from_media("front", &media(&event, "video")).unwrap();

        assert_eq!(item.id, "e1");
        assert_eq!(item.group, "front");
        assert!(item.clip.is_some());
        assert!(item.snapshot.is_none());
        assert_eq!(item.end, event.end_time);
    }

    #[test]
    fn folders_and_unknown_types_are_skipped() {
        let event = event("e1", 100, None);
        let mut folder = media(&event, "video");
        folder.can_expand = true;
        assert!(TimelineItem::from_media("front", &folder).is_none());

        assert!(TimelineItem::from_media("front", &media(&event, "audio")).is_none());

        let mut bare = media(&event, "image");
        bare.frigate = None;
        assert!(TimelineItem::from_media("front", &bare).is_none());
    }

    #[test]
    fn merge_keeps_media_found_earlier() {
        let open = event("e1", 100, None);
        let closed = event("e1", 100, Some(500));
        let mut item = TimelineItem::from_media("front", &media(&open, "video")).unwrap();

        item.merge(TimelineItem::from_media("front", &media(&closed, "image")).unwrap());

        assert!(item.clip.is_some());
        assert!(item.snapshot.is_some());
        assert_eq!(item.end, closed.end_time);
        assert_eq!(item.event, closed);
    }

    #[test]
    fn tooltip_includes_score_and_zones() {
        let mut event = event("e1", 100, None);
        event.top_score = Some(0.876);
        event.zones = vec!["porch".to_string()];

        assert_eq!(tooltip_for(&event), "Person 88% [porch]");
    }

    #[test]
    fn window_containment_is_inclusive() {
        let window = TimelineWindow::new(
            DateTime::from_timestamp(100, 0).unwrap(),
            DateTime::from_timestamp(200, 0).unwrap(),
        );
        assert!(window.contains_range(window.start, window.end));
        assert!(!window.contains_range(DateTime::from_timestamp(99, 0).unwrap(), window.end));
    }
}
