// src/config/pipeline.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::pipeline::{DEFAULT_CONCURRENCY, DEFAULT_PER_ITEM_DELAY};

pub const ENV_PIPELINE_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub author: String,
    pub window_days: i64,
    pub concurrency: usize,
    pub per_item_delay_ms: u64,
    pub output_dir: PathBuf,
    pub source_base_url: String,
    /// Read statuses from this JSON dump instead of the network.
    pub source_fixture: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            author: "realDonaldTrump".to_string(),
            window_days: 90,
            concurrency: DEFAULT_CONCURRENCY,
            per_item_delay_ms: DEFAULT_PER_ITEM_DELAY.as_millis() as u64,
            output_dir: PathBuf::from("outputs"),
            source_base_url: "https://truthsocial.com".to_string(),
            source_fixture: None,
        }
    }
}

impl PipelineConfig {
    pub fn per_item_delay(&self) -> Duration {
        Duration::from_millis(self.per_item_delay_ms)
    }

    pub fn created_after(&self, now: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
        now - chrono::Duration::days(self.window_days.max(0))
    }
}

/// Load pipeline config from an explicit path. Supports TOML or JSON formats.
pub fn load_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading pipeline config from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let cfg: PipelineConfig = if ext == "json" {
        serde_json::from_str(&content).context("parsing pipeline json")?
    } else {
        toml::from_str(&content).context("parsing pipeline toml")?
    };
    Ok(sanitize(cfg))
}

/// Load pipeline config using env var + fallbacks:
/// 1) $PIPELINE_CONFIG_PATH
/// 2) config/pipeline.toml
/// 3) config/pipeline.json
/// 4) built-in defaults
pub fn load_default() -> Result<PipelineConfig> {
    if let Ok(p) = std::env::var(ENV_PIPELINE_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if pb.exists() {
            return load_from(&pb);
        } else {
            return Err(anyhow!("PIPELINE_CONFIG_PATH points to non-existent path"));
        }
    }
    for candidate in ["config/pipeline.toml", "config/pipeline.json"] {
        let p = PathBuf::from(candidate);
        if p.exists() {
            return load_from(&p);
        }
    }
    Ok(PipelineConfig::default())
}

fn sanitize(mut cfg: PipelineConfig) -> PipelineConfig {
    if cfg.concurrency == 0 {
        cfg.concurrency = 1;
    }
    if cfg.window_days < 0 {
        cfg.window_days = 0;
    }
    cfg.author = cfg.author.trim().trim_start_matches('@').to_string();
    cfg
}
