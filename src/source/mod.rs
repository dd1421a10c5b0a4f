// src/source/mod.rs
pub mod fixture;
pub mod truth_social;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media kind as far as classification cares: images get inlined, the rest is described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    #[serde(untagged)]
    Other(String),
}

impl MediaKind {
    pub fn from_api(kind: &str) -> Self {
        if kind.eq_ignore_ascii_case("image") {
            MediaKind::Image
        } else {
            MediaKind::Other(kind.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl MediaRef {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Image,
            url: url.into(),
            detail: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPost {
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub media: Vec<MediaRef>,
}

/// Where posts come from. Implementations return posts newest-first and only
/// those strictly newer than `created_after`.
#[async_trait::async_trait]
pub trait PostSource: Send + Sync {
    async fn pull(&self, author: &str, created_after: DateTime<Utc>) -> Result<Vec<RawPost>>;
    fn name(&self) -> &'static str;
}

/// Status shape shared by the live API and fixture dumps (Mastodon-compatible).
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiStatus {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub media_attachments: Vec<ApiAttachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub url: Option<String>,
}

impl From<ApiStatus> for RawPost {
    fn from(s: ApiStatus) -> Self {
        let media = s
            .media_attachments
            .into_iter()
            .map(|m| MediaRef {
                kind: MediaKind::from_api(&m.kind),
                url: m.url.unwrap_or_default(),
                detail: None,
            })
            .collect();
        RawPost {
            created_at: s.created_at,
            content: s.content,
            media,
        }
    }
}

/// Keep statuses newer than `created_after`, preserving order.
pub(crate) fn within_window(
    statuses: Vec<ApiStatus>,
    created_after: DateTime<Utc>,
) -> Vec<RawPost> {
    statuses
        .into_iter()
        .filter(|s| s.created_at > created_after)
        .map(RawPost::from)
        .collect()
}
