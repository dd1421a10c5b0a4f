// src/ai_bootstrap.rs
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::classify::{Classifier, MockProvider, OpenAiProvider, Provider};
use crate::config::ai::AiConfig;

/// Build the classifier according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, uses the deterministic keyword mock (no key needed).
/// * Otherwise loads `config/ai.json` (or defaults) and builds the OpenAI provider.
pub fn build_classifier(config_path: &Path) -> anyhow::Result<Classifier> {
    let provider: Arc<dyn Provider> = if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        info!("AI_TEST_MODE=mock, using keyword mock provider");
        Arc::new(MockProvider::keyword())
    } else {
        let cfg = AiConfig::load_or_default(config_path)?;
        // Safe diagnostics: only provider + model + key length
        info!(
            "AI cfg loaded: provider={}, model={}, key_len={}",
            cfg.provider,
            cfg.model,
            cfg.api_key.len()
        );
        let mut p = OpenAiProvider::new(
            cfg.api_key.clone(),
            Some(cfg.model.as_str()),
            Duration::from_secs(cfg.timeout_secs),
        )?;
        if let Some(url) = &cfg.base_url {
            p = p.with_base_url(url.as_str());
        }
        Arc::new(p)
    };
    Ok(Classifier::new(provider))
}
