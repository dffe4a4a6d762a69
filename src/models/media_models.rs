use super::event_models::Event;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Media kinds requested from the media server
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Clips,
    Snapshots,
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clips => write!(f, "clips"),
            Self::Snapshots => write!(f, "snapshots"),
        }
    }
}

/// Configured media filter; `All` expands to every kind
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MediaFilter {
    #[default]
    All,
    Clips,
    Snapshots,
}

impl MediaFilter {
    pub fn kinds(&self) -> Vec<MediaKind> {
        match self {
            Self::All => vec![MediaKind::Clips, MediaKind::Snapshots],
            Self::Clips => vec![MediaKind::Clips],
            Self::Snapshots => vec![MediaKind::Snapshots],
        }
    }

    pub fn wants_clips(&self) -> bool {
        matches!(self, Self::All | Self::Clips)
    }

    pub fn wants_snapshots(&self) -> bool {
        matches!(self, Self::All | Self::Snapshots)
    }
}

pub const MEDIA_CONTENT_TYPE_VIDEO: &str = "video";
pub const MEDIA_CONTENT_TYPE_IMAGE: &str = "image";

/// Media server metadata attached to a browse node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrigateMetadata {
    #[serde(default)]
    pub event: Option<Event>,
}

/// A node in the media server's browse tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseMedia {
    pub title: String,
    #[serde(default)]
    pub media_class: String,
    #[serde(default)]
    pub media_content_type: String,
    #[serde(default)]
    pub media_content_id: String,
    #[serde(default)]
    pub can_play: bool,
    #[serde(default)]
    pub can_expand: bool,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub children: Vec<BrowseMedia>,
    #[serde(default)]
    pub frigate: Option<FrigateMetadata>,
}

impl BrowseMedia {
    /// Virtual, non-playable container holding `children` in order.
    pub fn folder(title: impl Into<String>, children: Vec<BrowseMedia>) -> Self {
        Self {
            title: title.into(),
            media_class: "directory".to_string(),
            media_content_type: String::new(),
            media_content_id: String::new(),
            can_play: false,
            can_expand: true,
            thumbnail: None,
            children,
            frigate: None,
        }
    }

    /// True media is an actual playable item rather than a folder or placeholder.
    pub fn is_true_media(&self) -> bool {
        !self.can_expand
    }

    pub fn is_video(&self) -> bool {
        self.media_content_type == MEDIA_CONTENT_TYPE_VIDEO
    }

    pub fn is_image(&self) -> bool {
        self.media_content_type == MEDIA_CONTENT_TYPE_IMAGE
    }

    pub fn event(&self) -> Option<&Event> {
        self.frigate.as_ref().and_then(|frigate| frigate.event.as_ref())
    }
}
