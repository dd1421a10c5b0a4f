// src/source/fixture.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::counter;
use std::path::PathBuf;

use super::{within_window, ApiStatus, PostSource, RawPost};

/// Reads a saved dump of API statuses instead of hitting the network.
/// The author handle is ignored; the dump is assumed to belong to one account.
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PostSource for FixtureSource {
    async fn pull(&self, author: &str, created_after: DateTime<Utc>) -> Result<Vec<RawPost>> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading status fixture {}", self.path.display()))?;
        let statuses: Vec<ApiStatus> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing status fixture {}", self.path.display()))?;
        let posts = within_window(statuses, created_after);
        counter!("posts_pulled_total").increment(posts.len() as u64);
        tracing::info!(author, posts = posts.len(), path = %self.path.display(), "loaded fixture statuses");
        Ok(posts)
    }

    fn name(&self) -> &'static str {
        "fixture"
    }
}
