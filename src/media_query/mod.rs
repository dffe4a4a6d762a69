pub mod static_source;

use crate::config::CameraConfig;
use crate::models::{BrowseMedia, MediaKind};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use static_source::StaticMediaSource;

/// Parameters of one media server query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaQueryParameters {
    pub media_type: MediaKind,
    pub client_id: String,
    pub camera_name: String,
    pub label: Option<String>,
    pub zone: Option<String>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    /// Return every match rather than the server's default page
    pub unlimited: bool,
}

impl MediaQueryParameters {
    /// Camera base parameters narrowed to a media kind and time range.
    pub fn for_camera(
        camera: &CameraConfig,
        media_type: MediaKind,
        after: DateTime<Utc>,
        before: DateTime<Utc>,
    ) -> Self {
        Self {
            media_type,
            client_id: camera.client_id.clone(),
            camera_name: camera.camera_name.clone(),
            label: camera.label.clone(),
            zone: camera.zone.clone(),
            after: Some(after),
            before: Some(before),
            unlimited: true,
        }
    }
}

/// Remote media browsing collaborator
#[async_trait]
pub trait MediaQuery: Send + Sync {
    /// Browse media matching `params`; returns the folder node whose children are the results.
    async fn browse(&self, params: &MediaQueryParameters) -> Result<BrowseMedia>;
}
