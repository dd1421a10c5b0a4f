// src/telemetry.rs
use anyhow::Context;
use metrics::{describe_counter, describe_gauge, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "tariff_post_classifier=info,warn";

/// Install the global subscriber. `LOG_FORMAT=json` switches to JSON lines;
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    let res = if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().compact().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(e) = res {
        eprintln!("tracing already initialized: {e}");
    }
}

/// Install a Prometheus recorder so the run can log a metrics snapshot.
pub fn install_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("prometheus: install recorder")?;
    ensure_metrics_described();
    Ok(handle)
}

/// One-time metrics registration (so series show up in snapshots).
pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("posts_pulled_total", "Posts returned by the post source.");
        describe_counter!("media_fetch_total", "Image downloads attempted.");
        describe_counter!(
            "media_fetch_fallback_total",
            "Image downloads that degraded to a URL reference."
        );
        describe_counter!("classify_calls_total", "Structured-output calls issued.");
        describe_counter!(
            "classify_truncated_retries_total",
            "Retries with a truncated prompt after an oversize rejection."
        );
        describe_counter!(
            "classify_errors_total",
            "Posts whose classification ended in an error-result."
        );
        describe_histogram!("classify_call_ms", "Structured-output call time in milliseconds.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last finished.");
    });
}
