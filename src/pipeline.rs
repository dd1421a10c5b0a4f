// src/pipeline.rs
//! Bounded-concurrency enrichment: media inlining, prompt building and
//! classification for every post, results returned in input order.

use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use metrics::gauge;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::Instrument;

use crate::classify::{ClassificationResult, Classifier};
use crate::media::{inline_all, MediaFetcher};
use crate::prompt::{build_prompt, SYSTEM_INSTRUCTION};
use crate::source::RawPost;

pub const DEFAULT_CONCURRENCY: usize = 10;
pub const DEFAULT_PER_ITEM_DELAY: Duration = Duration::from_secs(1);

/// A post plus its classification. Serializes flat: post fields, then `classification`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedPost {
    #[serde(flatten)]
    pub post: RawPost,
    pub classification: ClassificationResult,
}

pub struct PipelinePool {
    classifier: Arc<Classifier>,
    fetcher: Arc<dyn MediaFetcher>,
    concurrency: usize,
    per_item_delay: Duration,
    progress: Option<ProgressBar>,
}

impl PipelinePool {
    /// `concurrency` is clamped to at least one worker.
    pub fn new(
        classifier: Arc<Classifier>,
        fetcher: Arc<dyn MediaFetcher>,
        concurrency: usize,
        per_item_delay: Duration,
    ) -> Self {
        Self {
            classifier,
            fetcher,
            concurrency: concurrency.max(1),
            per_item_delay,
            progress: None,
        }
    }

    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.progress = Some(pb);
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Enrich every post. Returns exactly one record per input, in input order,
    /// once the whole batch has finished.
    pub async fn run(&self, posts: Vec<RawPost>) -> Vec<EnrichedPost> {
        crate::telemetry::ensure_metrics_described();
        let total = posts.len();
        tracing::info!(
            posts = total,
            concurrency = self.concurrency,
            delay_ms = self.per_item_delay.as_millis() as u64,
            "pipeline started"
        );

        if let Some(pb) = &self.progress {
            pb.set_length(total as u64);
        }
        let slots = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(total);

        for (index, post) in posts.into_iter().enumerate() {
            let slots = Arc::clone(&slots);
            let classifier = Arc::clone(&self.classifier);
            let fetcher = Arc::clone(&self.fetcher);
            let delay = self.per_item_delay;
            let progress = self.progress.clone();
            let keep = post.clone();

            let span = tracing::debug_span!("post", index);
            let handle = tokio::spawn(
                async move {
                    let Ok(_slot) = slots.acquire_owned().await else {
                        return EnrichedPost {
                            post,
                            classification: ClassificationResult::error("worker pool closed"),
                        };
                    };
                    let classification = enrich(&classifier, fetcher.as_ref(), &post).await;
                    if let Some(pb) = &progress {
                        pb.inc(1);
                    }
                    // Pacing: the slot stays taken until the delay has passed.
                    tokio::time::sleep(delay).await;
                    EnrichedPost {
                        post,
                        classification,
                    }
                }
                .instrument(span),
            );
            handles.push((keep, handle));
        }

        let mut out = Vec::with_capacity(total);
        for (post, handle) in handles {
            match handle.await {
                Ok(enriched) => out.push(enriched),
                Err(e) => {
                    tracing::warn!(error = %e, "pipeline task aborted");
                    out.push(EnrichedPost {
                        post,
                        classification: ClassificationResult::error(format!(
                            "pipeline task failed: {e}"
                        )),
                    });
                }
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish();
        }
        let errors = out.iter().filter(|p| p.classification.is_error()).count();
        gauge!("pipeline_last_run_ts").set(chrono::Utc::now().timestamp() as f64);
        tracing::info!(posts = out.len(), errors, "pipeline finished");
        out
    }
}

/// The per-post unit of work: inline media, build the prompt, classify.
pub async fn enrich(
    classifier: &Classifier,
    fetcher: &dyn MediaFetcher,
    post: &RawPost,
) -> ClassificationResult {
    let fragments = inline_all(fetcher, &post.media).await;
    let prompt = build_prompt(post, &fragments);
    tracing::debug!(chars = prompt.chars().count(), "prompt built");
    classifier.classify(&prompt, SYSTEM_INSTRUCTION).await
}
