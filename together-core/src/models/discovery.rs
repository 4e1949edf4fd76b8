use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Something one partner found and shared with the other: an article, a
/// song, a place to visit someday.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Discovery {
    pub id: Uuid,
    pub couple_id: Uuid,
    pub shared_by: Uuid,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub kind: DiscoveryKind,
    pub reaction: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryKind {
    Article,
    Song,
    Video,
    Place,
    Other,
}

impl DiscoveryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Song => "song",
            Self::Video => "video",
            Self::Place => "place",
            Self::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "article" => Some(Self::Article),
            "song" => Some(Self::Song),
            "video" => Some(Self::Video),
            "place" => Some(Self::Place),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDiscoveryInput {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub kind: Option<DiscoveryKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDiscoveryInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reaction: Option<String>,
}
