use crate::error::Error;
use crate::models::media_models::MediaFilter;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub cameras: BTreeMap<String, CameraConfig>,
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Timeline widget configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TimelineConfig {
    /// Which kinds of media populate the timeline and thumbnails
    #[serde(default)]
    pub media: MediaFilter,
    /// Maximum items per cluster; zero or negative disables clustering
    #[serde(default = "default_clustering_threshold")]
    pub clustering_threshold: i32,
    /// Maximum widget height in pixels
    #[serde(default)]
    pub max_height: Option<u32>,
    /// Thumbnail carousel options, passed through to the host untouched
    #[serde(default)]
    pub thumbnails: ThumbnailsConfig,
}

fn default_clustering_threshold() -> i32 {
    3
}

impl TimelineConfig {
    /// Clustering threshold when clustering is enabled.
    pub fn cluster_max_items(&self) -> Option<usize> {
        if self.clustering_threshold > 0 {
            Some(self.clustering_threshold as usize)
        } else {
            None
        }
    }
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            media: MediaFilter::default(),
            clustering_threshold: default_clustering_threshold(),
            max_height: None,
            thumbnails: ThumbnailsConfig::default(),
        }
    }
}

/// Thumbnail carousel placement and sizing
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ThumbnailsConfig {
    /// Placement of the carousel relative to the timeline (above, below, left, right, none)
    #[serde(default = "default_thumbnails_mode")]
    pub mode: String,
    /// Thumbnail size in pixels
    #[serde(default = "default_thumbnails_size")]
    pub size: u32,
    /// Whether event details are rendered next to each thumbnail
    #[serde(default = "default_show_details")]
    pub show_details: bool,
}

fn default_thumbnails_mode() -> String {
    "above".to_string()
}

fn default_thumbnails_size() -> u32 {
    100
}

fn default_show_details() -> bool {
    true
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            mode: default_thumbnails_mode(),
            size: default_thumbnails_size(),
            show_details: default_show_details(),
        }
    }
}

/// Event cache configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum age of fetched data in seconds before it is refetched.
    /// `None` means recency cannot be bounded.
    #[serde(default = "default_max_age_seconds")]
    pub max_age_seconds: Option<u64>,
}

/// Fetched timeline data is considered fresh for this many seconds.
pub const DEFAULT_MAX_AGE_SECONDS: u64 = 10;

fn default_max_age_seconds() -> Option<u64> {
    Some(DEFAULT_MAX_AGE_SECONDS)
}

impl CacheConfig {
    pub fn max_age(&self) -> Option<Duration> {
        self.max_age_seconds.map(Duration::from_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_age_seconds: default_max_age_seconds(),
        }
    }
}

/// Camera configuration; the fields form the camera's base media query
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CameraConfig {
    /// Display title of the camera
    #[serde(default)]
    pub title: Option<String>,
    /// Camera name on the media server
    pub camera_name: String,
    /// Media server client instance
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Restrict events to a label
    #[serde(default)]
    pub label: Option<String>,
    /// Restrict events to a zone
    #[serde(default)]
    pub zone: Option<String>,
}

fn default_client_id() -> String {
    "frigate".to_string()
}

impl CameraConfig {
    pub fn new(camera_name: impl Into<String>) -> Self {
        Self {
            title: None,
            camera_name: camera_name.into(),
            client_id: default_client_id(),
            label: None,
            zone: None,
        }
    }
}

/// Load configuration from a file or use default
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .context(format!("Failed to read config file: {:?}", path))?;

            let config = if path.extension().map_or(false, |ext| ext == "json") {
                serde_json::from_str(&config_str).context("Failed to parse JSON config")?
            } else if path.extension().map_or(false, |ext| ext == "toml") {
                toml::from_str(&config_str).context("Failed to parse TOML config")?
            } else {
                return Err(Error::Config(format!("Unsupported config file format: {:?}", path)).into());
            };

            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: Config = toml::from_str(
            r#"
            [cameras.front]
            camera_name = "front_door"
            "#,
        )
        .unwrap();

        assert_eq!(config.timeline.media, MediaFilter::All);
        assert_eq!(config.timeline.clustering_threshold, 3);
        assert_eq!(config.cache.max_age(), Some(Duration::from_secs(10)));
        assert_eq!(config.cameras["front"].client_id, "frigate");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn non_positive_threshold_disables_clustering() {
        let mut timeline = TimelineConfig::default();
        assert_eq!(timeline.cluster_max_items(), Some(3));

        timeline.clustering_threshold = 0;
        assert_eq!(timeline.cluster_max_items(), None);

        timeline.clustering_threshold = -4;
        assert_eq!(timeline.cluster_max_items(), None);
    }

    #[test]
    fn json_config_parses_media_filter() {
        let config: Config = serde_json::from_str(
            r#"{"timeline": {"media": "snapshots", "clustering_threshold": 0}, "cache": {"max_age_seconds": null}}"#,
        )
        .unwrap();

        assert_eq!(config.timeline.media, MediaFilter::Snapshots);
        assert_eq!(config.cache.max_age(), None);
    }

    #[test]
    fn missing_config_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert!(config.cameras.is_empty());
        assert_eq!(config.timeline, TimelineConfig::default());
    }

    #[test]
    fn unknown_extension_is_a_config_error() {
        let path = std::env::temp_dir().join(format!("event-timeline-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "log_level: debug").unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Config(_))));
    }
}
