//! Tariff post classifier: batch entrypoint.
//! Pulls the configured author's posts for the last `window_days`, classifies
//! them, and writes the three tiers to the output directory.

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use tariff_post_classifier::ai_bootstrap::build_classifier;
use tariff_post_classifier::config::{ai::DEFAULT_AI_CONFIG_PATH, pipeline};
use tariff_post_classifier::media::HttpFetcher;
use tariff_post_classifier::output::OutputSink;
use tariff_post_classifier::source::{
    fixture::FixtureSource, truth_social::TruthSocialSource, PostSource,
};
use tariff_post_classifier::{build_pool, run_batch, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    telemetry::init_tracing();
    let metrics = telemetry::install_metrics()?;

    let cfg = pipeline::load_default()?;
    tracing::info!(
        author = %cfg.author,
        window_days = cfg.window_days,
        concurrency = cfg.concurrency,
        delay_ms = cfg.per_item_delay_ms,
        "config loaded"
    );

    let source: Box<dyn PostSource> = match &cfg.source_fixture {
        Some(path) => Box::new(FixtureSource::new(path)),
        None => Box::new(TruthSocialSource::from_env(&cfg.source_base_url)?),
    };

    let classifier = build_classifier(Path::new(DEFAULT_AI_CONFIG_PATH))?;
    let fetcher = Arc::new(HttpFetcher::new()?);

    let progress = ProgressBar::new(0);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} posts ({eta})")?
            .progress_chars("=> "),
    );
    let pool = build_pool(classifier, fetcher, &cfg).with_progress(progress.clone());

    let created_after = cfg.created_after(chrono::Utc::now());
    let sink = OutputSink::new(&cfg.output_dir);

    let summary = run_batch(source.as_ref(), &cfg.author, created_after, &pool, &sink).await?;

    tracing::debug!(metrics = %metrics.render(), "metrics snapshot");
    println!(
        "All posts: {}  Tariff-related: {}  With tariff rate: {}  Errors: {}  -> {}",
        summary.all,
        summary.relevant,
        summary.rate_present,
        summary.errors,
        sink.dir().display()
    );
    Ok(())
}
