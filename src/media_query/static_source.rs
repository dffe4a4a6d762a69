use super::{MediaQuery, MediaQueryParameters};
use crate::error::Error;
use crate::models::{BrowseMedia, MediaKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::collections::HashMap;
use std::path::Path;

/// Media source answering queries from a browse-media fixture.
///
/// The fixture maps camera names to one browse folder per media kind:
/// `{"front_door": {"clips": {...}, "snapshots": {...}}}`.
#[derive(Debug, Default)]
pub struct StaticMediaSource {
    folders: HashMap<String, HashMap<MediaKind, BrowseMedia>>,
}

impl StaticMediaSource {
    pub fn new(folders: HashMap<String, HashMap<MediaKind, BrowseMedia>>) -> Self {
        Self { folders }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read media fixture: {:?}", path))?;
        let folders = serde_json::from_str(&content).context("Failed to parse media fixture")?;
        Ok(Self::new(folders))
    }
}

/// Whether the event behind `media` overlaps the queried range.
fn in_range(media: &BrowseMedia, params: &MediaQueryParameters) -> bool {
    let Some(event) = media.event() else {
        return true;
    };
    if params.label.as_ref().map_or(false, |label| label != &event.label) {
        return false;
    }
    if params.zone.as_ref().map_or(false, |zone| !event.zones.contains(zone)) {
        return false;
    }
    let after_ok = params.after.map_or(true, |after| event.end_or_start() >= after);
    let before_ok = params.before.map_or(true, |before| event.start_time <= before);
    after_ok && before_ok
}

#[async_trait]
impl MediaQuery for StaticMediaSource {
    async fn browse(&self, params: &MediaQueryParameters) -> Result<BrowseMedia> {
        let folder = self
            .folders
            .get(&params.camera_name)
            .and_then(|kinds| kinds.get(&params.media_type))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No {} for camera {}",
                    params.media_type, params.camera_name
                ))
            })?;

        let mut result = folder.clone();
        result.children.retain(|child| in_range(child, params));
        debug!(
            "Static source answered {} {} with {} item(s)",
            params.camera_name,
            params.media_type,
            result.children.len()
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;
    use crate::models::timeline_models::tests::{event, media};
    use chrono::DateTime;

    fn source() -> StaticMediaSource {
        let early = event("early", 1_000, Some(1_100));
        let late = event("late", 5_000, None);
        let folder = BrowseMedia::folder("Clips", vec![media(&early, "video"), media(&late, "video")]);
        StaticMediaSource::new(HashMap::from([(
            "front_door".to_string(),
            HashMap::from([(MediaKind::Clips, folder)]),
        )]))
    }

    #[tokio::test]
    async fn filters_children_by_range() {
        let params = MediaQueryParameters::for_camera(
            &CameraConfig::new("front_door"),
            MediaKind::Clips,
            DateTime::from_timestamp(1_050, 0).unwrap(),
            DateTime::from_timestamp(2_000, 0).unwrap(),
        );

        let result = source().browse(&params).await.unwrap();
        assert_eq!(result.children.len(), 1);
        assert_eq!(result.children[0].event().unwrap().id, "early");
    }

    #[tokio::test]
    async fn unknown_kind_is_an_error() {
        let params = MediaQueryParameters::for_camera(
            &CameraConfig::new("front_door"),
            MediaKind::Snapshots,
            DateTime::from_timestamp(0, 0).unwrap(),
            DateTime::from_timestamp(10_000, 0).unwrap(),
        );

        assert!(source().browse(&params).await.is_err());
    }
}
