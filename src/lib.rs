// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod ai_bootstrap;
pub mod classify;
pub mod config;
pub mod media;
pub mod output;
pub mod partition;
pub mod pipeline;
pub mod prompt;
pub mod source;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::classify::{ClassificationResult, Classifier};
pub use crate::partition::{partition, Tier, Tiers};
pub use crate::pipeline::{EnrichedPost, PipelinePool};
pub use crate::source::{MediaKind, MediaRef, PostSource, RawPost};

use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::media::MediaFetcher;
use crate::output::OutputSink;

/// Summary of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub all: usize,
    pub relevant: usize,
    pub rate_present: usize,
    pub errors: usize,
}

/// Pull -> enrich -> partition -> write. The whole batch finishes before
/// anything is written.
pub async fn run_batch(
    source: &dyn PostSource,
    author: &str,
    created_after: DateTime<Utc>,
    pool: &PipelinePool,
    sink: &OutputSink,
) -> Result<RunSummary> {
    let posts = source.pull(author, created_after).await?;
    tracing::info!(
        source = source.name(),
        author,
        created_after = %created_after,
        posts = posts.len(),
        "posts retrieved"
    );

    let enriched = pool.run(posts).await;
    let tiers = partition(&enriched);
    sink.write_tiers(&tiers)?;

    let summary = RunSummary {
        all: tiers.all.len(),
        relevant: tiers.relevant.len(),
        rate_present: tiers.rate_present.len(),
        errors: enriched.iter().filter(|p| p.classification.is_error()).count(),
    };
    tracing::info!(?summary, dir = %sink.dir().display(), "run complete");
    Ok(summary)
}

/// Convenience constructor used by the binary.
pub fn build_pool(
    classifier: Classifier,
    fetcher: Arc<dyn MediaFetcher>,
    cfg: &config::pipeline::PipelineConfig,
) -> PipelinePool {
    PipelinePool::new(
        Arc::new(classifier),
        fetcher,
        cfg.concurrency,
        cfg.per_item_delay(),
    )
}
